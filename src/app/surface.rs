use crate::layout::Viewport;

pub(in crate::app) const DEFAULT_WIDTH: f32 = 900.0;

/// Width changes smaller than this are layout noise, not a resize.
const WIDTH_EPSILON: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum SurfaceKind {
    PoolMap,
    WalletGraph,
}

impl SurfaceKind {
    pub(in crate::app) fn height(self) -> f32 {
        match self {
            Self::PoolMap => 450.0,
            Self::WalletGraph => 480.0,
        }
    }
}

/// Tracks the drawable size of one visualization. Height is fixed per kind,
/// width follows the container.
#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct Surface {
    kind: SurfaceKind,
    width: f32,
}

impl Surface {
    pub(in crate::app) fn new(kind: SurfaceKind) -> Self {
        Self {
            kind,
            width: DEFAULT_WIDTH,
        }
    }

    pub(in crate::app) fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.kind.height())
    }

    /// Returns the new viewport when the container width actually changed.
    pub(in crate::app) fn observe_width(&mut self, width: f32) -> Option<Viewport> {
        if !width.is_finite() || width <= 0.0 {
            return None;
        }
        if (width - self.width).abs() < WIDTH_EPSILON {
            return None;
        }

        self.width = width;
        Some(self.viewport())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_default_width_with_fixed_height() {
        let pools = Surface::new(SurfaceKind::PoolMap).viewport();
        let wallets = Surface::new(SurfaceKind::WalletGraph).viewport();
        assert_eq!(pools.width, DEFAULT_WIDTH);
        assert_eq!(pools.height, 450.0);
        assert_eq!(wallets.height, 480.0);
    }

    #[test]
    fn reports_only_real_changes() {
        let mut surface = Surface::new(SurfaceKind::PoolMap);
        assert!(surface.observe_width(DEFAULT_WIDTH).is_none());
        assert!(surface.observe_width(DEFAULT_WIDTH + 0.2).is_none());

        let resized = surface.observe_width(640.0).expect("width changed");
        assert_eq!(resized.width, 640.0);
        assert_eq!(resized.height, 450.0);
        assert!(surface.observe_width(640.0).is_none());
    }

    #[test]
    fn ignores_degenerate_widths() {
        let mut surface = Surface::new(SurfaceKind::WalletGraph);
        assert!(surface.observe_width(0.0).is_none());
        assert!(surface.observe_width(-20.0).is_none());
        assert!(surface.observe_width(f32::NAN).is_none());
        assert!(surface.observe_width(f32::INFINITY).is_none());
        assert_eq!(surface.viewport().width, DEFAULT_WIDTH);
    }
}
