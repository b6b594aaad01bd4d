use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::encoding::{POOL_MAX_RADIUS, POOL_MIN_RADIUS};
use crate::layout::ForceConfig;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_COOLDOWN_TICKS: usize = 120;

/// Optional JSON settings file. Every field may be omitted; command line
/// flags win over anything set here.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub api_url: Option<String>,
    pub snapshot_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    pub pool_iterations: usize,
    pub wallet_iterations: usize,
    pub wallet_cooldown_ticks: usize,
    /// Gap kept between neighbouring pool bubbles.
    pub collision_padding: f32,
    pub pool_min_radius: f32,
    pub pool_max_radius: f32,
}

impl Default for Settings {
    fn default() -> Self {
        let pool = ForceConfig::pool_map();
        Self {
            api_url: None,
            snapshot_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            pool_iterations: pool.iterations,
            wallet_iterations: ForceConfig::wallet_graph().iterations,
            wallet_cooldown_ticks: DEFAULT_COOLDOWN_TICKS,
            collision_padding: pool.collision_padding,
            pool_min_radius: POOL_MIN_RADIUS,
            pool_max_radius: POOL_MAX_RADIUS,
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw).context("settings are not valid JSON")?;
        Ok(settings.sanitized())
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.pool_iterations = self.pool_iterations.max(1);
        self.wallet_iterations = self.wallet_iterations.max(1);
        self.timeout_secs = self.timeout_secs.max(1);

        if !self.collision_padding.is_finite() || self.collision_padding < 0.0 {
            warn!(padding = self.collision_padding, "ignoring invalid collision padding");
            self.collision_padding = defaults.collision_padding;
        }

        let radii_valid = self.pool_min_radius.is_finite()
            && self.pool_max_radius.is_finite()
            && self.pool_min_radius > 0.0
            && self.pool_min_radius <= self.pool_max_radius;
        if !radii_valid {
            warn!(
                min = self.pool_min_radius,
                max = self.pool_max_radius,
                "ignoring invalid pool radius range"
            );
            self.pool_min_radius = defaults.pool_min_radius;
            self.pool_max_radius = defaults.pool_max_radius;
        }

        self
    }

    pub fn pool_forces(&self) -> ForceConfig {
        ForceConfig {
            iterations: self.pool_iterations,
            collision_padding: self.collision_padding,
            ..ForceConfig::pool_map()
        }
    }

    pub fn wallet_forces(&self) -> ForceConfig {
        ForceConfig {
            iterations: self.wallet_iterations,
            ..ForceConfig::wallet_graph()
        }
    }

    pub fn radius_range(&self) -> (f32, f32) {
        (self.pool_min_radius, self.pool_max_radius)
    }
}
