use eframe::egui::{self, Pos2, Rect, Ui, Vec2, vec2};

use crate::data::{PoolNode, WalletGraph};
use crate::encoding::RiskTier;
use crate::util::{format_currency, truncate_address};

use super::render::CircleMark;
use super::render_utils::ViewTransform;

/// Offset from the pointer to the tooltip's top-left corner.
pub(super) const TOOLTIP_OFFSET: Vec2 = vec2(14.0, 14.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct HoverState {
    pub(super) node: usize,
    pub(super) pointer: Pos2,
}

/// Node whose circle contains the pointer. Overlapping hits resolve to the
/// nearest center.
pub(super) fn hit_test(circles: &[CircleMark], pointer: Pos2) -> Option<usize> {
    circles
        .iter()
        .filter_map(|circle| {
            let distance = circle.center.distance(pointer);
            (distance <= circle.radius).then_some((circle.node, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(node, _)| node)
}

/// Pointer enter/move sets the hover state, leaving every node clears it.
pub(super) fn track_hover(
    circles: &[CircleMark],
    pointer: Option<Pos2>,
) -> Option<HoverState> {
    let pointer = pointer?;
    hit_test(circles, pointer).map(|node| HoverState { node, pointer })
}

#[derive(Clone, Debug, PartialEq)]
pub(super) struct Tooltip {
    pub(super) title: String,
    pub(super) category: String,
    pub(super) lines: Vec<String>,
    pub(super) tier: RiskTier,
}

pub(super) fn pool_tooltip(pool: &PoolNode) -> Tooltip {
    let tier = RiskTier::from_score(pool.risk_score);
    let mut lines = vec![
        format!("TVL: {}", format_currency(pool.tvl)),
        format!("24h volume: {}", format_currency(pool.volume_24h)),
        format!("Risk: {:.0} ({})", pool.risk_score, tier.label()),
    ];
    if let Some(sui_pool_id) = &pool.sui_pool_id {
        lines.push(format!("Pool: {}", truncate_address(sui_pool_id, 6, 4)));
    }
    if let Some(captured_at) = &pool.captured_at {
        lines.push(format!("Captured: {captured_at}"));
    }

    Tooltip {
        title: pool.label.clone(),
        category: pool.dex_name.clone(),
        lines,
        tier,
    }
}

pub(super) fn wallet_tooltip(graph: &WalletGraph, index: usize) -> Option<Tooltip> {
    let node = graph.nodes.get(index)?;
    let tier = RiskTier::from_score(node.risk * 100.0);

    Some(Tooltip {
        title: truncate_address(&node.id, 6, 4),
        category: node.id.clone(),
        lines: vec![
            format!("Volume: {}", format_currency(node.volume)),
            format!("Trades: {}", node.trades),
            format!("Risk: {:.2} ({})", node.risk, tier.label()),
            format!(
                "Edge volume: {} across {} edges",
                format_currency(graph.incident_volume(index)),
                graph.degree(index)
            ),
        ],
        tier,
    })
}

pub(super) fn show_tooltip(ui: &Ui, id: egui::Id, screen_pointer: Pos2, tooltip: &Tooltip) {
    egui::Area::new(id)
        .order(egui::Order::Tooltip)
        .fixed_pos(screen_pointer + TOOLTIP_OFFSET)
        .interactable(false)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(320.0);
                ui.small(&tooltip.category);
                ui.strong(&tooltip.title);
                for line in &tooltip.lines {
                    ui.label(line);
                }
                ui.colored_label(tooltip.tier.color(), tooltip.tier.label());
            });
        });
}

/// Scroll zoom around the pointer, clamped to a sane range.
pub(super) fn handle_zoom(
    ui: &Ui,
    rect: Rect,
    response: &egui::Response,
    transform: &mut ViewTransform,
) -> bool {
    if !response.hovered() {
        return false;
    }

    let scroll = ui.input(|input| input.raw_scroll_delta.y);
    if scroll.abs() <= f32::EPSILON {
        return false;
    }

    let pointer = ui
        .input(|input| input.pointer.hover_pos())
        .map(|pointer| pointer - rect.min.to_vec2())
        .unwrap_or(transform.center);
    let anchor = transform.to_surface(pointer);

    let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
    transform.zoom = (transform.zoom * zoom_factor).clamp(0.2, 6.0);
    transform.pan = pointer - transform.center - (anchor - transform.center) * transform.zoom;
    true
}

pub(super) fn handle_pan(response: &egui::Response, transform: &mut ViewTransform) -> bool {
    if response.dragged_by(egui::PointerButton::Secondary)
        || response.dragged_by(egui::PointerButton::Middle)
    {
        transform.pan += response.drag_delta();
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Color32, Stroke, pos2};

    use super::*;
    use crate::data::wallet_graph_from_json;

    fn circle(node: usize, x: f32, y: f32, radius: f32) -> CircleMark {
        CircleMark {
            node,
            center: pos2(x, y),
            radius,
            fill: Color32::WHITE,
            stroke: Stroke::NONE,
        }
    }

    #[test]
    fn hit_test_prefers_nearest_center() {
        let circles = [circle(0, 0.0, 0.0, 30.0), circle(1, 20.0, 0.0, 30.0)];
        assert_eq!(hit_test(&circles, pos2(15.0, 0.0)), Some(1));
        assert_eq!(hit_test(&circles, pos2(-10.0, 0.0)), Some(0));
        assert_eq!(hit_test(&circles, pos2(200.0, 0.0)), None);
    }

    #[test]
    fn hover_follows_pointer_and_clears_on_leave() {
        let circles = [circle(3, 50.0, 50.0, 10.0)];
        let hover = track_hover(&circles, Some(pos2(52.0, 48.0)));
        assert_eq!(
            hover,
            Some(HoverState {
                node: 3,
                pointer: pos2(52.0, 48.0)
            })
        );
        assert_eq!(track_hover(&circles, Some(pos2(90.0, 90.0))), None);
        assert_eq!(track_hover(&circles, None), None);
    }

    #[test]
    fn pool_tooltip_lists_metrics_and_tier() {
        let pool = PoolNode {
            id: 7,
            sui_pool_id: Some("0x1234567890abcdef".to_owned()),
            label: "SUI / USDC".to_owned(),
            dex_name: "cetus".to_owned(),
            tvl: 1234.5,
            volume_24h: 0.0,
            risk_score: 70.0,
            captured_at: Some("2024-05-01T00:00:00Z".to_owned()),
        };

        let tooltip = pool_tooltip(&pool);
        assert_eq!(tooltip.title, "SUI / USDC");
        assert_eq!(tooltip.category, "cetus");
        assert_eq!(tooltip.tier, RiskTier::High);
        assert!(tooltip.lines.contains(&"TVL: $1,234.50".to_owned()));
        assert!(tooltip.lines.contains(&"Pool: 0x1234...cdef".to_owned()));
        assert!(tooltip.lines.iter().any(|line| line.starts_with("Captured:")));
    }

    #[test]
    fn wallet_tooltip_reports_edge_volume_separately() {
        let graph = wallet_graph_from_json(
            r#"{
                "nodes": [{"id": "a", "volume": 10, "trades": 3, "risk": 0.2}, {"id": "b"}],
                "edges": [{"source": "a", "target": "b", "volume": 500}]
            }"#,
        )
        .expect("valid graph");

        let tooltip = wallet_tooltip(&graph, 0).expect("node exists");
        assert_eq!(tooltip.tier, RiskTier::Low);
        assert_eq!(tooltip.category, "a");
        assert!(tooltip.lines.contains(&"Volume: $10.00".to_owned()));
        assert!(tooltip
            .lines
            .contains(&"Edge volume: $500.00 across 1 edges".to_owned()));
        assert!(wallet_tooltip(&graph, 5).is_none());
    }
}
