use std::sync::Arc;

use eframe::egui::{self, Context};
use tracing::{debug, info};

use crate::config::Settings;
use crate::data::{DataSource, PoolNode, WalletGraph};

mod fetch;
mod interaction;
mod pool_map;
mod render;
mod render_utils;
mod surface;
mod ui;
mod wallet_graph;

use fetch::FetchSlot;
use pool_map::PoolMapView;
use ui::{PoolList, show_top_bar};
use wallet_graph::WalletGraphView;

/// Lifecycle of one surface's dataset.
#[derive(Clone, Debug, PartialEq)]
enum LoadState {
    /// Nothing requested yet.
    Idle,
    Loading,
    Failed(String),
    Ready,
}

pub struct RiskBubblesApp {
    source: Arc<dyn DataSource>,
    source_label: String,
    pool_fetch: FetchSlot<Vec<PoolNode>>,
    graph_fetch: FetchSlot<WalletGraph>,
    pool_map: PoolMapView,
    wallet_graph: WalletGraphView,
    pool_list: PoolList,
}

impl RiskBubblesApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        source: Arc<dyn DataSource>,
        settings: Settings,
    ) -> Self {
        let mut app = Self {
            source_label: source.describe(),
            source,
            pool_fetch: FetchSlot::new("pools"),
            graph_fetch: FetchSlot::new("wallet-graph"),
            pool_map: PoolMapView::new(&settings),
            wallet_graph: WalletGraphView::new(&settings),
            pool_list: PoolList::default(),
        };
        app.request_pools(&cc.egui_ctx);
        app
    }

    fn request_pools(&mut self, ctx: &Context) {
        self.pool_map.begin_loading();
        let source = Arc::clone(&self.source);
        self.pool_fetch
            .spawn(Some(ctx.clone()), move || source.pool_summaries());
    }

    fn request_wallet_graph(&mut self, ctx: &Context, pool_id: u64) {
        self.wallet_graph.begin_loading();
        let source = Arc::clone(&self.source);
        self.graph_fetch
            .spawn(Some(ctx.clone()), move || source.wallet_graph(pool_id));
    }

    fn select_pool(&mut self, ctx: &Context, pool_id: Option<u64>) {
        if self.wallet_graph.pool_id() == pool_id {
            return;
        }

        debug!(?pool_id, "pool selection changed");
        self.wallet_graph.select(pool_id);
        match pool_id {
            Some(pool_id) => self.request_wallet_graph(ctx, pool_id),
            None => self.graph_fetch.cancel(),
        }
    }

    fn refresh(&mut self, ctx: &Context) {
        info!(source = %self.source_label, "refreshing");
        self.request_pools(ctx);
        if let Some(pool_id) = self.wallet_graph.pool_id() {
            self.request_wallet_graph(ctx, pool_id);
        }
    }

    fn poll_fetches(&mut self, ctx: &Context) {
        if let Some(result) = self.pool_fetch.poll() {
            self.pool_map.apply(result);
            self.pool_list.rebuild(self.pool_map.pools());

            let selected = self.wallet_graph.pool_id();
            let still_listed = selected
                .is_some_and(|id| self.pool_map.pools().iter().any(|pool| pool.id == id));
            if selected.is_some() && !still_listed && self.pool_map.state() == &LoadState::Ready {
                self.select_pool(ctx, None);
            }
        }

        if let Some(result) = self.graph_fetch.poll() {
            self.wallet_graph.apply(result);
        }
    }
}

impl eframe::App for RiskBubblesApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_fetches(ctx);

        let is_loading = self.pool_fetch.is_loading() || self.graph_fetch.is_loading();
        let mut refresh_requested = false;
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                refresh_requested = show_top_bar(
                    ui,
                    &self.source_label,
                    self.pool_map.pools().len(),
                    is_loading,
                );
            });

        let selected = self.wallet_graph.pool_id();
        let mut clicked = None;
        egui::SidePanel::left("pool_list")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                clicked = self.pool_list.show(ui, self.pool_map.pools(), selected);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("surfaces")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.heading("Pool bubble map");
                    ui.small("Bubble area tracks TVL, color tracks risk score.");
                    ui.add_space(6.0);
                    if let Some(id) = self.pool_map.show(ui, self.pool_list.matches(), selected) {
                        clicked = Some(id);
                    }

                    ui.add_space(12.0);
                    ui.separator();
                    let title = selected
                        .and_then(|id| self.pool_map.pools().iter().find(|pool| pool.id == id))
                        .map(|pool| format!("Wallet trade graph: {}", pool.label))
                        .unwrap_or_else(|| "Wallet trade graph".to_owned());
                    ui.heading(title);
                    ui.add_space(6.0);
                    self.wallet_graph.show(ui);
                });
        });

        if let Some(pool_id) = clicked {
            self.select_pool(ctx, Some(pool_id));
        }
        if refresh_requested {
            self.refresh(ctx);
        }
    }
}
