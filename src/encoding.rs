//! Scalar to visual mappings shared by both surfaces.
//!
//! Radius scales depend on the whole dataset (its min/max), so encodings are
//! always produced per dataset and never per node in isolation.

use eframe::egui::Color32;

use crate::data::{PoolNode, WalletGraph};

pub const POOL_MIN_RADIUS: f32 = 10.0;
pub const POOL_MAX_RADIUS: f32 = 70.0;
pub const WALLET_MIN_RADIUS: f32 = 6.0;
pub const WALLET_RADIUS_SCALE: f32 = 6.0;
pub const MIN_EDGE_WIDTH: f32 = 1.0;

pub const LOW_RISK_COLOR: Color32 = Color32::from_rgb(0x22, 0xc5, 0x5e);
pub const MID_RISK_COLOR: Color32 = Color32::from_rgb(0xea, 0xb3, 0x08);
pub const HIGH_RISK_COLOR: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);

const DOMAIN_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodedVisual {
    pub radius: f32,
    pub color: Color32,
}

/// Square-root scale: bubble area, not diameter, tracks the magnitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusScale {
    lo: f64,
    hi: f64,
    min_radius: f32,
    max_radius: f32,
}

impl RadiusScale {
    pub fn new(lo: f64, hi: f64, min_radius: f32, max_radius: f32) -> Self {
        let lo = if lo.is_finite() { lo.max(0.0) } else { 0.0 };
        let hi = if hi.is_finite() && hi - lo > DOMAIN_EPSILON {
            hi
        } else {
            lo + 1.0
        };
        let min_radius = if min_radius.is_finite() {
            min_radius.max(0.0)
        } else {
            POOL_MIN_RADIUS
        };
        let max_radius = if max_radius.is_finite() {
            max_radius.max(min_radius)
        } else {
            min_radius
        };

        Self {
            lo,
            hi,
            min_radius,
            max_radius,
        }
    }

    /// Domain `[0, max(values) or 1]`, the way the pool map sizes bubbles.
    pub fn zero_anchored(
        values: impl IntoIterator<Item = f64>,
        min_radius: f32,
        max_radius: f32,
    ) -> Self {
        let max = values
            .into_iter()
            .filter(|value| value.is_finite())
            .fold(0.0_f64, f64::max);
        let hi = if max > 0.0 { max } else { 1.0 };
        Self::new(0.0, hi, min_radius, max_radius)
    }

    pub fn radius(&self, value: f64) -> f32 {
        let value = if value.is_finite() {
            value.clamp(self.lo, self.hi)
        } else {
            self.lo
        };

        let t = (value.sqrt() - self.lo.sqrt()) / (self.hi.sqrt() - self.lo.sqrt());
        let t = t.clamp(0.0, 1.0) as f32;
        (self.min_radius + (self.max_radius - self.min_radius) * t).max(self.min_radius)
    }
}

/// Three-anchor color ramp, linear per RGB channel between breakpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskPalette {
    pub breakpoints: [f64; 3],
    pub anchors: [Color32; 3],
}

pub const POOL_PALETTE: RiskPalette = RiskPalette {
    breakpoints: [0.0, 50.0, 100.0],
    anchors: [LOW_RISK_COLOR, MID_RISK_COLOR, HIGH_RISK_COLOR],
};

pub const WALLET_PALETTE: RiskPalette = RiskPalette {
    breakpoints: [0.0, 0.5, 1.0],
    anchors: [LOW_RISK_COLOR, MID_RISK_COLOR, HIGH_RISK_COLOR],
};

impl RiskPalette {
    pub fn channels(&self, score: f64) -> [f32; 3] {
        let [low, mid, high] = self.breakpoints;
        let score = if score.is_finite() {
            score.clamp(low, high)
        } else {
            high
        };

        let (from, to, t) = if score <= mid {
            (self.anchors[0], self.anchors[1], span_fraction(score, low, mid))
        } else {
            (self.anchors[1], self.anchors[2], span_fraction(score, mid, high))
        };

        [
            lerp_channel(from.r(), to.r(), t),
            lerp_channel(from.g(), to.g(), t),
            lerp_channel(from.b(), to.b(), t),
        ]
    }

    pub fn color(&self, score: f64) -> Color32 {
        let [r, g, b] = self.channels(score);
        Color32::from_rgb(r.round() as u8, g.round() as u8, b.round() as u8)
    }
}

fn span_fraction(value: f64, start: f64, end: f64) -> f32 {
    let width = end - start;
    if width.abs() <= DOMAIN_EPSILON {
        return 1.0;
    }
    ((value - start) / width).clamp(0.0, 1.0) as f32
}

fn lerp_channel(from: u8, to: u8, t: f32) -> f32 {
    let from = from as f32;
    let to = to as f32;
    from + (to - from) * t
}

pub fn wallet_radius(volume: f64) -> f32 {
    let volume = if volume.is_finite() { volume.max(0.0) } else { 0.0 };
    WALLET_MIN_RADIUS + WALLET_RADIUS_SCALE * (volume + 1.0).ln() as f32
}

/// Line width for a trade edge. A zero or missing volume draws like a volume
/// of one.
pub fn edge_width(volume: f64) -> f32 {
    let volume = if volume.is_finite() && volume > 0.0 {
        volume
    } else {
        1.0
    };
    ((volume + 1.0).ln() as f32).max(MIN_EDGE_WIDTH)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tier for a 0-100 score.
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            return Self::High;
        }
        if score <= 33.0 {
            Self::Low
        } else if score <= 66.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }

    pub fn color(self) -> Color32 {
        match self {
            Self::Low => LOW_RISK_COLOR,
            Self::Medium => MID_RISK_COLOR,
            Self::High => HIGH_RISK_COLOR,
        }
    }
}

pub fn encode_pools(pools: &[PoolNode], min_radius: f32, max_radius: f32) -> Vec<EncodedVisual> {
    let scale = RadiusScale::zero_anchored(pools.iter().map(|pool| pool.tvl), min_radius, max_radius);
    pools
        .iter()
        .map(|pool| EncodedVisual {
            radius: scale.radius(pool.tvl),
            color: POOL_PALETTE.color(pool.risk_score),
        })
        .collect()
}

/// Wallet radius uses the node's own recorded volume, never the volume summed
/// over its edges.
pub fn encode_wallets(graph: &WalletGraph) -> Vec<EncodedVisual> {
    graph
        .nodes
        .iter()
        .map(|node| EncodedVisual {
            radius: wallet_radius(node.volume),
            color: WALLET_PALETTE.color(node.risk),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(id: u64, tvl: f64, risk_score: f64) -> PoolNode {
        PoolNode {
            id,
            sui_pool_id: None,
            label: format!("P{id}"),
            dex_name: "deepbook".to_owned(),
            tvl,
            volume_24h: 0.0,
            risk_score,
            captured_at: None,
        }
    }

    #[test]
    fn radius_is_monotone_and_bounded_below() {
        let scale = RadiusScale::zero_anchored([0.0, 10.0, 5_000.0, 2e7], 10.0, 70.0);
        let samples = [0.0, 0.5, 1.0, 9.0, 10.0, 400.0, 5_000.0, 1e6, 2e7, 5e7];
        let radii = samples.map(|value| scale.radius(value));
        for pair in radii.windows(2) {
            assert!(pair[0] <= pair[1], "{radii:?} is not monotone");
        }
        assert!(radii.iter().all(|radius| *radius >= 10.0));
        assert_eq!(scale.radius(0.0), 10.0);
        assert_eq!(scale.radius(2e7), 70.0);
        assert_eq!(scale.radius(5e7), 70.0);
    }

    #[test]
    fn radius_scale_survives_degenerate_domains() {
        let all_zero = RadiusScale::zero_anchored([0.0, 0.0], 10.0, 70.0);
        assert_eq!((all_zero.lo, all_zero.hi), (0.0, 1.0));
        assert_eq!(all_zero.radius(0.0), 10.0);

        let collapsed = RadiusScale::new(5.0, 5.0, 10.0, 70.0);
        assert_eq!((collapsed.lo, collapsed.hi), (5.0, 6.0));
        assert!(collapsed.radius(5.0).is_finite());

        let empty = RadiusScale::zero_anchored(std::iter::empty(), 10.0, 70.0);
        assert_eq!(empty.radius(f64::NAN), 10.0);
        assert_eq!(empty.radius(-3.0), 10.0);
    }

    #[test]
    fn radius_grows_with_square_root() {
        let scale = RadiusScale::new(0.0, 100.0, 0.0, 10.0);
        assert!((scale.radius(25.0) - 5.0).abs() < 1e-5);
        assert!((scale.radius(100.0) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn palette_hits_anchors_exactly() {
        assert_eq!(POOL_PALETTE.color(0.0), LOW_RISK_COLOR);
        assert_eq!(POOL_PALETTE.color(50.0), MID_RISK_COLOR);
        assert_eq!(POOL_PALETTE.color(100.0), HIGH_RISK_COLOR);
        assert_eq!(WALLET_PALETTE.color(0.0), LOW_RISK_COLOR);
        assert_eq!(WALLET_PALETTE.color(0.5), MID_RISK_COLOR);
        assert_eq!(WALLET_PALETTE.color(1.0), HIGH_RISK_COLOR);
    }

    #[test]
    fn palette_interpolates_strictly_between_anchors() {
        let check = |score: f64, from: Color32, to: Color32| {
            let channels = POOL_PALETTE.channels(score);
            let bounds = [(from.r(), to.r()), (from.g(), to.g()), (from.b(), to.b())];
            for (value, (a, b)) in channels.iter().zip(bounds) {
                let (lo, hi) = (a.min(b) as f32, a.max(b) as f32);
                assert!(*value > lo && *value < hi, "score {score}: {value} not in ({lo}, {hi})");
            }
        };

        for score in [0.5, 10.0, 25.0, 49.0] {
            check(score, LOW_RISK_COLOR, MID_RISK_COLOR);
        }
        for score in [51.0, 75.0, 99.5] {
            check(score, MID_RISK_COLOR, HIGH_RISK_COLOR);
        }
    }

    #[test]
    fn palette_is_continuous_at_breakpoints() {
        let below = POOL_PALETTE.channels(50.0 - 1e-6);
        let above = POOL_PALETTE.channels(50.0 + 1e-6);
        for (a, b) in below.iter().zip(above) {
            assert!((a - b).abs() < 0.01);
        }
    }

    #[test]
    fn palette_clamps_out_of_range() {
        assert_eq!(POOL_PALETTE.color(-20.0), LOW_RISK_COLOR);
        assert_eq!(POOL_PALETTE.color(250.0), HIGH_RISK_COLOR);
        assert_eq!(POOL_PALETTE.color(f64::NAN), HIGH_RISK_COLOR);
    }

    #[test]
    fn wallet_radius_and_edge_width_are_logarithmic() {
        assert_eq!(wallet_radius(0.0), WALLET_MIN_RADIUS);
        assert_eq!(wallet_radius(-5.0), WALLET_MIN_RADIUS);
        assert!(wallet_radius(1_000_000.0) > wallet_radius(1_000.0));
        assert!((wallet_radius(std::f64::consts::E - 1.0) - 12.0).abs() < 1e-4);

        assert_eq!(edge_width(0.0), MIN_EDGE_WIDTH);
        assert_eq!(edge_width(1.0), MIN_EDGE_WIDTH);
        assert!((edge_width(1_000_000.0) - 13.815_51).abs() < 1e-3);
    }

    #[test]
    fn risk_tiers_follow_thresholds() {
        assert_eq!(RiskTier::from_score(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(33.0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(33.5), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(66.0), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(100.0), RiskTier::High);
        assert_eq!(RiskTier::High.label(), "High Risk");
    }

    #[test]
    fn three_pools_scale_and_shade_in_order() {
        let pools = [
            pool(1, 0.0, 0.0),
            pool(2, 1_000_000.0, 50.0),
            pool(3, 50_000_000.0, 100.0),
        ];
        let visuals = encode_pools(&pools, POOL_MIN_RADIUS, POOL_MAX_RADIUS);

        assert!(visuals[0].radius < visuals[1].radius);
        assert!(visuals[1].radius < visuals[2].radius);
        assert_eq!(visuals[0].color, LOW_RISK_COLOR);
        assert_eq!(visuals[1].color, MID_RISK_COLOR);
        assert_eq!(visuals[2].color, HIGH_RISK_COLOR);
    }

    #[test]
    fn single_pool_gets_full_radius() {
        let visuals = encode_pools(&[pool(1, 250.0, 20.0)], POOL_MIN_RADIUS, POOL_MAX_RADIUS);
        assert_eq!(visuals[0].radius, POOL_MAX_RADIUS);
    }
}
