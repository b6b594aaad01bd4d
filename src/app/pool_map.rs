use std::collections::HashSet;

use eframe::egui::{self, Pos2, Sense, Ui, vec2};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::data::{FetchError, PoolNode};
use crate::encoding::{EncodedVisual, encode_pools};
use crate::layout::{ForceConfig, layout};

use super::LoadState;
use super::interaction::{HoverState, pool_tooltip, show_tooltip, track_hover};
use super::render::{BubbleEmphasis, Frame, bubble_frame};
use super::render_utils::{ViewTransform, draw_background};
use super::surface::{Surface, SurfaceKind};

/// Static bubble map of every pool: area tracks TVL, color tracks risk.
/// Positions are computed once per dataset or width and never move after.
pub(super) struct PoolMapView {
    surface: Surface,
    forces: ForceConfig,
    radius_range: (f32, f32),
    state: LoadState,
    pools: Vec<PoolNode>,
    visuals: Vec<EncodedVisual>,
    positions: Vec<Pos2>,
    hover: Option<HoverState>,
}

impl PoolMapView {
    pub(super) fn new(settings: &Settings) -> Self {
        Self {
            surface: Surface::new(SurfaceKind::PoolMap),
            forces: settings.pool_forces(),
            radius_range: settings.radius_range(),
            state: LoadState::Loading,
            pools: Vec::new(),
            visuals: Vec::new(),
            positions: Vec::new(),
            hover: None,
        }
    }

    pub(super) fn pools(&self) -> &[PoolNode] {
        &self.pools
    }

    pub(super) fn state(&self) -> &LoadState {
        &self.state
    }

    pub(super) fn begin_loading(&mut self) {
        self.state = LoadState::Loading;
        self.hover = None;
    }

    pub(super) fn apply(&mut self, result: Result<Vec<PoolNode>, FetchError>) {
        self.hover = None;
        match result {
            Ok(pools) => self.set_pools(pools),
            Err(error) => {
                warn!(%error, "pool summary fetch failed");
                self.pools.clear();
                self.visuals.clear();
                self.positions.clear();
                self.state = LoadState::Failed(error.to_string());
            }
        }
    }

    fn set_pools(&mut self, pools: Vec<PoolNode>) {
        let (min_radius, max_radius) = self.radius_range;
        self.visuals = encode_pools(&pools, min_radius, max_radius);
        self.pools = pools;
        self.state = LoadState::Ready;
        self.relayout();
    }

    fn relayout(&mut self) {
        let radii = self
            .visuals
            .iter()
            .map(|visual| visual.radius)
            .collect::<Vec<_>>();
        let viewport = self.surface.viewport();
        self.positions = layout(&radii, &[], self.forces, viewport);
        debug!(
            pools = self.positions.len(),
            width = viewport.width,
            "pool map laid out"
        );
    }

    /// Re-runs layout when the container width changed. Data is untouched.
    pub(super) fn observe_width(&mut self, width: f32) -> bool {
        if self.surface.observe_width(width).is_none() {
            return false;
        }
        self.hover = None;
        self.relayout();
        true
    }

    pub(super) fn frame(&self, matches: Option<&HashSet<usize>>, selected: Option<u64>) -> Frame {
        let selected = selected.and_then(|id| self.pools.iter().position(|pool| pool.id == id));
        bubble_frame(
            &self.pools,
            &self.visuals,
            &self.positions,
            BubbleEmphasis {
                matches,
                selected,
                hovered: self.hover.map(|hover| hover.node),
            },
        )
    }

    /// Draws the map and returns the id of a clicked pool.
    pub(super) fn show(
        &mut self,
        ui: &mut Ui,
        matches: Option<&HashSet<usize>>,
        selected: Option<u64>,
    ) -> Option<u64> {
        self.observe_width(ui.available_width());
        let viewport = self.surface.viewport();

        match &self.state {
            LoadState::Idle | LoadState::Loading => {
                show_placeholder(ui, viewport.height, |ui| {
                    ui.spinner();
                });
                return None;
            }
            LoadState::Failed(error) => {
                let error = error.clone();
                show_placeholder(ui, viewport.height, |ui| {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                });
                return None;
            }
            LoadState::Ready if self.pools.is_empty() => {
                show_placeholder(ui, viewport.height, |ui| {
                    ui.label("No pool metrics available yet. Sync metrics to see the bubble map.");
                });
                return None;
            }
            LoadState::Ready => {}
        }

        // Click only: bubbles on this map cannot be dragged.
        let (rect, response) =
            ui.allocate_exact_size(vec2(viewport.width, viewport.height), Sense::click());
        let painter = ui.painter_at(rect);
        let origin = rect.min.to_vec2();
        draw_background(&painter, rect, ViewTransform::identity(viewport));

        let frame = self.frame(matches, selected);
        frame.paint(&painter, origin);

        let pointer = response.hover_pos().map(|pointer| pointer - origin);
        self.hover = track_hover(&frame.circles, pointer);

        let hovered_pool = self.hover.and_then(|hover| Some((hover, self.pools.get(hover.node)?)));
        if let Some((hover, pool)) = hovered_pool {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
            show_tooltip(
                ui,
                ui.id().with("pool-tooltip"),
                hover.pointer + origin,
                &pool_tooltip(pool),
            );
        }

        if response.clicked() {
            return hovered_pool.map(|(_, pool)| pool.id);
        }
        None
    }
}

pub(super) fn show_placeholder(ui: &mut Ui, height: f32, content: impl FnOnce(&mut Ui)) {
    ui.allocate_ui(vec2(ui.available_width(), height), |ui| {
        ui.set_min_height(height);
        ui.vertical_centered(|ui| {
            ui.add_space(height * 0.4);
            content(ui);
        });
    });
}
