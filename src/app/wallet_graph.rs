use eframe::egui::{self, Align, Layout, Pos2, Rect, Sense, Ui, vec2};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::data::{FetchError, WalletGraph};
use crate::encoding::{EncodedVisual, encode_wallets};
use crate::layout::{ForceConfig, Simulation};
use crate::util::format_currency;

use super::LoadState;
use super::interaction::{
    HoverState, handle_pan, handle_zoom, show_tooltip, track_hover, wallet_tooltip,
};
use super::pool_map::show_placeholder;
use super::render::{Frame, graph_frame};
use super::render_utils::{ViewTransform, draw_background};
use super::surface::{Surface, SurfaceKind};

/// Wallet-to-wallet trade network for the selected pool. Unlike the pool map
/// its simulation stays alive: dragging a node pins it and reheats the layout
/// for a cooldown budget.
pub(super) struct WalletGraphView {
    surface: Surface,
    forces: ForceConfig,
    cooldown_ticks: usize,
    pool_id: Option<u64>,
    state: LoadState,
    graph: WalletGraph,
    visuals: Vec<EncodedVisual>,
    simulation: Option<Simulation>,
    positions: Vec<Pos2>,
    transform: ViewTransform,
    hover: Option<HoverState>,
    dragging: Option<usize>,
}

impl WalletGraphView {
    pub(super) fn new(settings: &Settings) -> Self {
        let surface = Surface::new(SurfaceKind::WalletGraph);
        Self {
            surface,
            forces: settings.wallet_forces(),
            cooldown_ticks: settings.wallet_cooldown_ticks,
            pool_id: None,
            state: LoadState::Idle,
            graph: WalletGraph::default(),
            visuals: Vec::new(),
            simulation: None,
            positions: Vec::new(),
            transform: ViewTransform::identity(surface.viewport()),
            hover: None,
            dragging: None,
        }
    }

    pub(super) fn pool_id(&self) -> Option<u64> {
        self.pool_id
    }

    /// Switches to another pool (or none). Everything tied to the previous
    /// pool is dropped, hover included.
    pub(super) fn select(&mut self, pool_id: Option<u64>) {
        self.pool_id = pool_id;
        self.state = if pool_id.is_some() {
            LoadState::Loading
        } else {
            LoadState::Idle
        };
        self.graph = WalletGraph::default();
        self.visuals.clear();
        self.simulation = None;
        self.positions.clear();
        self.transform = ViewTransform::identity(self.surface.viewport());
        self.hover = None;
        self.dragging = None;
    }

    pub(super) fn begin_loading(&mut self) {
        if self.pool_id.is_some() {
            self.state = LoadState::Loading;
            self.hover = None;
            self.dragging = None;
        }
    }

    pub(super) fn apply(&mut self, result: Result<WalletGraph, FetchError>) {
        self.hover = None;
        self.dragging = None;
        match result {
            Ok(graph) => {
                self.visuals = encode_wallets(&graph);
                self.graph = graph;
                self.state = LoadState::Ready;
                self.rebuild_layout();
            }
            Err(error) => {
                warn!(pool_id = ?self.pool_id, %error, "wallet graph fetch failed");
                self.graph = WalletGraph::default();
                self.visuals.clear();
                self.simulation = None;
                self.positions.clear();
                self.state = LoadState::Failed(error.to_string());
            }
        }
    }

    fn rebuild_layout(&mut self) {
        let radii = self
            .visuals
            .iter()
            .map(|visual| visual.radius)
            .collect::<Vec<_>>();
        let viewport = self.surface.viewport();
        let mut simulation =
            Simulation::new(&radii, &self.graph.endpoints, self.forces, viewport);
        simulation.run_to_end();
        self.positions = simulation.positions();
        self.simulation = Some(simulation);
        self.transform.center = viewport.center();
        debug!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            width = viewport.width,
            "wallet graph laid out"
        );
    }

    pub(super) fn observe_width(&mut self, width: f32) -> bool {
        if self.surface.observe_width(width).is_none() {
            return false;
        }
        self.hover = None;
        self.dragging = None;
        if self.state == LoadState::Ready {
            self.rebuild_layout();
        } else {
            self.transform.center = self.surface.viewport().center();
        }
        true
    }

    fn start_drag(&mut self, node: usize) {
        self.dragging = Some(node);
    }

    fn drag_to(&mut self, surface_pos: Pos2) {
        let (Some(node), Some(simulation)) = (self.dragging, self.simulation.as_mut()) else {
            return;
        };
        simulation.pin(node, surface_pos);
        simulation.reheat(self.cooldown_ticks);
    }

    fn end_drag(&mut self) {
        if self.dragging.take().is_some()
            && let Some(simulation) = self.simulation.as_mut()
        {
            simulation.unpin();
        }
    }

    /// Advances a reheated layout by one tick. Returns `true` while it is
    /// still moving.
    fn step(&mut self) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        if !simulation.is_running() {
            return false;
        }

        let running = simulation.advance();
        self.positions = simulation.positions();
        running
    }

    pub(super) fn frame(&self, bounds: Rect) -> Frame {
        graph_frame(
            &self.graph,
            &self.visuals,
            &self.positions,
            self.transform,
            bounds,
            self.hover.map(|hover| hover.node),
        )
    }

    fn header_summary(&self) -> String {
        let counts = format!(
            "Nodes: {} · Edges: {}",
            self.graph.nodes.len(),
            self.graph.edges.len()
        );
        if self.graph.pool_name.is_empty() {
            counts
        } else {
            format!("{} · {counts}", self.graph.pool_name)
        }
    }

    fn show_header(&self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(self.header_summary());
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.small(format!(
                    "Total volume: {} · Trades: {}",
                    format_currency(self.graph.meta.total_volume),
                    self.graph.meta.total_trades
                ));
            });
        });
    }

    pub(super) fn show(&mut self, ui: &mut Ui) {
        self.observe_width(ui.available_width());
        let viewport = self.surface.viewport();

        match &self.state {
            LoadState::Idle => {
                show_placeholder(ui, viewport.height, |ui| {
                    ui.label("Select a pool to see its wallet trade graph.");
                });
                return;
            }
            LoadState::Loading => {
                show_placeholder(ui, viewport.height, |ui| {
                    ui.spinner();
                });
                return;
            }
            LoadState::Failed(error) => {
                let error = error.clone();
                show_placeholder(ui, viewport.height, |ui| {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                });
                return;
            }
            LoadState::Ready if self.graph.is_empty() => {
                show_placeholder(ui, viewport.height, |ui| {
                    ui.label(
                        "No trade data available for this pool yet. \
                         Try syncing pools/metrics or pick another pool.",
                    );
                });
                return;
            }
            LoadState::Ready => {}
        }

        self.show_header(ui);

        let (rect, response) =
            ui.allocate_exact_size(vec2(viewport.width, viewport.height), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let origin = rect.min.to_vec2();

        let mut moved = handle_zoom(ui, rect, &response, &mut self.transform);
        moved |= handle_pan(&response, &mut self.transform);

        let pointer = response
            .interact_pointer_pos()
            .or_else(|| response.hover_pos())
            .map(|pointer| pointer - origin);

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(hover) = self.hover
        {
            self.start_drag(hover.node);
        }
        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = pointer
        {
            self.drag_to(self.transform.to_surface(pointer));
        }
        if response.drag_stopped() {
            self.end_drag();
        }

        if self.step() || moved || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }

        draw_background(&painter, rect, self.transform);
        let bounds = Rect::from_min_size(Pos2::ZERO, rect.size());
        let frame = self.frame(bounds);
        frame.paint(&painter, origin);

        if self.dragging.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grabbing);
            return;
        }

        self.hover = if response.hovered() {
            track_hover(&frame.circles, pointer)
        } else {
            None
        };
        if let Some(hover) = self.hover
            && let Some(tooltip) = wallet_tooltip(&self.graph, hover.node)
        {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grab);
            show_tooltip(ui, ui.id().with("wallet-tooltip"), hover.pointer + origin, &tooltip);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::data::wallet_graph_from_json;

    fn star_graph() -> WalletGraph {
        wallet_graph_from_json(
            r#"{
                "pool_id": 9,
                "nodes": [
                    {"id": "0xhub", "volume": 1000, "trades": 12, "risk": 0.8},
                    {"id": "0xa", "volume": 10, "trades": 1, "risk": 0.1},
                    {"id": "0xb", "volume": 10, "trades": 1, "risk": 0.2},
                    {"id": "0xc", "volume": 10, "trades": 1, "risk": 0.3}
                ],
                "edges": [
                    {"source": "0xhub", "target": "0xa", "volume": 300},
                    {"source": "0xhub", "target": "0xb", "volume": 300},
                    {"source": "0xhub", "target": "0xc", "volume": 400}
                ],
                "meta": {"total_volume": 1000, "total_trades": 3}
            }"#,
        )
        .expect("valid graph")
    }

    fn loaded_view() -> WalletGraphView {
        let mut view = WalletGraphView::new(&Settings::default());
        view.select(Some(9));
        view.apply(Ok(star_graph()));
        view
    }

    #[test]
    fn selection_change_resets_state() {
        let mut view = loaded_view();
        view.hover = Some(HoverState {
            node: 0,
            pointer: Pos2::ZERO,
        });

        view.select(Some(4));
        assert_eq!(view.pool_id(), Some(4));
        assert_eq!(&view.state, &LoadState::Loading);
        assert!(view.hover.is_none());
        assert!(view.graph.is_empty());

        view.select(None);
        assert_eq!(&view.state, &LoadState::Idle);
    }

    #[test]
    fn loaded_graph_stays_in_viewport() {
        let view = loaded_view();
        let viewport = view.surface.viewport();
        assert_eq!(view.positions.len(), 4);
        for position in &view.positions {
            assert!(viewport.contains(*position, 1.0));
        }
    }

    #[test]
    fn dragging_pins_node_and_reheats() {
        let mut view = loaded_view();
        let target = pos2(120.0, 100.0);

        view.start_drag(1);
        view.drag_to(target);
        assert!(view.step());
        assert!((view.positions[1] - target).length() < 1e-3);

        view.end_drag();
        for _ in 0..view.cooldown_ticks {
            view.step();
        }
        assert!(!view.step());
    }

    #[test]
    fn header_names_pool_and_counts() {
        let mut view = loaded_view();
        assert_eq!(view.header_summary(), "Nodes: 4 · Edges: 3");

        view.graph.pool_name = "SUI_USDC".to_owned();
        assert_eq!(view.header_summary(), "SUI_USDC · Nodes: 4 · Edges: 3");
    }

    #[test]
    fn drag_without_graph_is_ignored() {
        let mut view = WalletGraphView::new(&Settings::default());
        view.start_drag(0);
        view.drag_to(pos2(10.0, 10.0));
        assert!(!view.step());
        view.end_drag();
        assert!(view.dragging.is_none());
    }

    #[test]
    fn failure_shows_message_without_partial_graph() {
        let mut view = loaded_view();
        view.begin_loading();
        view.apply(Err(FetchError::Status {
            status: 404,
            body: "pool not found".to_owned(),
        }));

        assert!(view.graph.is_empty());
        assert!(view.positions.is_empty());
        assert!(matches!(&view.state, LoadState::Failed(message) if message.contains("404")));
    }

    #[test]
    fn resize_relays_out_loaded_graph() {
        let mut view = loaded_view();
        assert!(view.observe_width(420.0));
        let viewport = view.surface.viewport();
        assert_eq!(view.transform.center, viewport.center());
        for position in &view.positions {
            assert!(viewport.contains(*position, 1.0));
        }
    }
}
