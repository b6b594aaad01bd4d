use std::collections::HashSet;

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2};

use crate::data::{PoolNode, WalletGraph};
use crate::encoding::{EncodedVisual, edge_width};
use crate::util::{truncate_address, truncate_label};

use super::render_utils::{
    ViewTransform, blend_color, circle_visible, dim_color, edge_visible,
};

pub(super) const POOL_LABEL_BUDGET: usize = 12;
pub(super) const WALLET_LABEL_BUDGET: usize = 10;

const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(89, 98, 110, 153);
const OUTLINE: Stroke = Stroke {
    width: 1.0,
    color: Color32::from_rgba_premultiplied(15, 15, 15, 190),
};
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

#[derive(Clone, Debug, PartialEq)]
pub(super) struct CircleMark {
    pub(super) node: usize,
    pub(super) center: Pos2,
    pub(super) radius: f32,
    pub(super) fill: Color32,
    pub(super) stroke: Stroke,
}

#[derive(Clone, Debug, PartialEq)]
pub(super) struct LineMark {
    pub(super) from: Pos2,
    pub(super) to: Pos2,
    pub(super) stroke: Stroke,
}

#[derive(Clone, Debug, PartialEq)]
pub(super) struct LabelMark {
    pub(super) anchor: Pos2,
    pub(super) text: String,
    pub(super) size: f32,
}

/// Everything one surface draws, in surface coordinates. Lines paint first,
/// then circles, then labels.
#[derive(Clone, Debug, Default)]
pub(super) struct Frame {
    pub(super) lines: Vec<LineMark>,
    pub(super) circles: Vec<CircleMark>,
    pub(super) labels: Vec<LabelMark>,
}

impl Frame {
    pub(super) fn paint(&self, painter: &Painter, origin: Vec2) {
        for line in &self.lines {
            painter.line_segment([line.from + origin, line.to + origin], line.stroke);
        }

        for circle in &self.circles {
            painter.circle_filled(circle.center + origin, circle.radius, circle.fill);
            painter.circle_stroke(circle.center + origin, circle.radius, circle.stroke);
        }

        for label in &self.labels {
            painter.text(
                label.anchor + origin,
                Align2::CENTER_CENTER,
                &label.text,
                FontId::proportional(label.size),
                Color32::WHITE,
            );
        }
    }
}

/// Per-frame emphasis for the bubble map: search hits, the selected pool and
/// the hovered bubble.
#[derive(Clone, Copy, Default)]
pub(super) struct BubbleEmphasis<'a> {
    pub(super) matches: Option<&'a HashSet<usize>>,
    pub(super) selected: Option<usize>,
    pub(super) hovered: Option<usize>,
}

pub(super) fn bubble_frame(
    pools: &[PoolNode],
    visuals: &[EncodedVisual],
    positions: &[Pos2],
    emphasis: BubbleEmphasis<'_>,
) -> Frame {
    let count = pools.len().min(visuals.len()).min(positions.len());
    let mut frame = Frame::default();
    frame.circles.reserve(count);
    frame.labels.reserve(count);

    for index in 0..count {
        let visual = visuals[index];
        let is_match = emphasis
            .matches
            .is_some_and(|matches| matches.contains(&index));
        let searching = emphasis.matches.is_some_and(|matches| !matches.is_empty());

        let fill = if emphasis.hovered == Some(index) {
            blend_color(visual.color, Color32::WHITE, 0.18)
        } else if is_match {
            blend_color(visual.color, MATCH_COLOR, 0.35)
        } else if searching {
            dim_color(visual.color, 0.45)
        } else {
            visual.color
        };
        let stroke = if emphasis.selected == Some(index) {
            Stroke::new(2.5, SELECTED_COLOR)
        } else if is_match {
            Stroke::new(1.8, MATCH_COLOR)
        } else {
            OUTLINE
        };

        frame.circles.push(CircleMark {
            node: index,
            center: positions[index],
            radius: visual.radius,
            fill,
            stroke,
        });
        frame.labels.push(LabelMark {
            anchor: positions[index],
            text: truncate_label(&pools[index].label, POOL_LABEL_BUDGET),
            size: 12.0,
        });
    }

    frame
}

pub(super) fn wallet_label(id: &str) -> String {
    truncate_label(&truncate_address(id, 6, 4), WALLET_LABEL_BUDGET)
}

/// Node-link frame for a wallet graph. `bounds` is the visible surface rect;
/// marks entirely outside it are culled.
pub(super) fn graph_frame(
    graph: &WalletGraph,
    visuals: &[EncodedVisual],
    positions: &[Pos2],
    transform: ViewTransform,
    bounds: Rect,
    hovered: Option<usize>,
) -> Frame {
    let count = graph.nodes.len().min(visuals.len()).min(positions.len());
    let screen = positions[..count]
        .iter()
        .map(|position| transform.to_screen(*position))
        .collect::<Vec<_>>();
    let zoom = transform.zoom;

    let mut frame = Frame::default();
    for (edge, &(from, to)) in graph.edges.iter().zip(&graph.endpoints) {
        if from >= count || to >= count {
            continue;
        }
        let width = edge_width(edge.volume) * zoom.sqrt();
        if !edge_visible(bounds, screen[from], screen[to], width) {
            continue;
        }
        frame.lines.push(LineMark {
            from: screen[from],
            to: screen[to],
            stroke: Stroke::new(width, LINK_COLOR),
        });
    }

    let label_size = (10.0 * zoom).clamp(7.0, 16.0);
    for index in 0..count {
        let radius = visuals[index].radius * zoom;
        if !circle_visible(bounds, screen[index], radius) {
            continue;
        }

        let fill = if hovered == Some(index) {
            blend_color(visuals[index].color, Color32::WHITE, 0.18)
        } else {
            visuals[index].color
        };
        frame.circles.push(CircleMark {
            node: index,
            center: screen[index],
            radius,
            fill,
            stroke: OUTLINE,
        });
        frame.labels.push(LabelMark {
            anchor: screen[index],
            text: wallet_label(&graph.nodes[index].id),
            size: label_size,
        });
    }

    frame
}
