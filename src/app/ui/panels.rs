use std::collections::HashSet;

use eframe::egui::{self, Align, Layout, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::data::PoolNode;
use crate::encoding::RiskTier;
use crate::util::format_compact;

const ROW_HEIGHT: f32 = 22.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Pool indices ordered by TVL, largest first. Ties keep id order.
pub(in crate::app) fn rank_by_tvl(pools: &[PoolNode]) -> Vec<usize> {
    let mut ranking = (0..pools.len()).collect::<Vec<_>>();
    ranking.sort_by(|&a, &b| {
        pools[b]
            .tvl
            .total_cmp(&pools[a].tvl)
            .then_with(|| pools[a].id.cmp(&pools[b].id))
    });
    ranking
}

/// Indices of pools whose label or dex fuzzily match `query`. `None` when
/// there is nothing to search for.
pub(in crate::app) fn search_matches(pools: &[PoolNode], query: &str) -> Option<HashSet<usize>> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let matcher = SkimMatcherV2::default();
    Some(
        pools
            .iter()
            .enumerate()
            .filter(|(_, pool)| {
                fuzzy_match_score(&matcher, &pool.label, query).is_some()
                    || fuzzy_match_score(&matcher, &pool.dex_name, query).is_some()
            })
            .map(|(index, _)| index)
            .collect(),
    )
}

/// Side panel listing pools by TVL with a search box that also highlights
/// matching bubbles on the map.
#[derive(Default)]
pub(in crate::app) struct PoolList {
    search: String,
    ranking: Vec<usize>,
    matches: Option<HashSet<usize>>,
}

impl PoolList {
    pub(in crate::app) fn rebuild(&mut self, pools: &[PoolNode]) {
        self.ranking = rank_by_tvl(pools);
        self.matches = search_matches(pools, &self.search);
    }

    pub(in crate::app) fn matches(&self) -> Option<&HashSet<usize>> {
        self.matches.as_ref()
    }

    /// Returns the id of a clicked row.
    pub(in crate::app) fn show(
        &mut self,
        ui: &mut Ui,
        pools: &[PoolNode],
        selected: Option<u64>,
    ) -> Option<u64> {
        ui.heading("Pools");
        ui.add_space(4.0);

        let search = ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Search pools or dex")
                .desired_width(f32::INFINITY),
        );
        if search.changed() {
            self.matches = search_matches(pools, &self.search);
        }

        if let Some(matches) = &self.matches {
            ui.small(format!("{} of {} pools match", matches.len(), pools.len()));
        }
        ui.add_space(6.0);

        let rows = self
            .ranking
            .iter()
            .copied()
            .filter(|index| {
                self.matches
                    .as_ref()
                    .is_none_or(|matches| matches.contains(index))
            })
            .filter(|&index| index < pools.len())
            .collect::<Vec<_>>();

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("pool_ranking")
            .auto_shrink([false, false])
            .show_rows(ui, ROW_HEIGHT, rows.len(), |ui, row_range| {
                for &index in &rows[row_range] {
                    let pool = &pools[index];
                    let tier = RiskTier::from_score(pool.risk_score);
                    let is_selected = selected == Some(pool.id);

                    let row_clicked = ui
                        .horizontal(|ui| {
                            ui.label(RichText::new("●").color(tier.color()))
                                .on_hover_text(tier.label());
                            let clicked = ui
                                .selectable_label(is_selected, pool.label.as_str())
                                .on_hover_text(pool.dex_name.as_str())
                                .clicked();
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.label(format!("${}", format_compact(pool.tvl)));
                            });
                            clicked
                        })
                        .inner;

                    if row_clicked {
                        clicked = Some(pool.id);
                    }
                }
            });

        clicked
    }
}

/// Top bar: data source, pool count and the refresh button. Returns whether
/// a refresh was requested.
pub(in crate::app) fn show_top_bar(
    ui: &mut Ui,
    source: &str,
    pool_count: usize,
    is_loading: bool,
) -> bool {
    let mut refresh = false;
    ui.horizontal(|ui| {
        ui.heading("Pool risk bubbles");
        ui.separator();
        ui.label(format!("source: {source}"));
        ui.label(format!("pools: {pool_count}"));
        let refresh_button = ui.add_enabled(!is_loading, egui::Button::new("Refresh"));
        if refresh_button.clicked() {
            refresh = true;
        }
        if is_loading {
            ui.spinner();
        }
    });
    refresh
}
