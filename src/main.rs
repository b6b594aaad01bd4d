mod app;
mod config;
mod data;
mod encoding;
mod layout;
mod util;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use config::{DEFAULT_API_URL, Settings};
use data::{DataSource, HttpApi, SnapshotDir, snapshot_dir_exists};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the risk backend.
    #[arg(long)]
    api_url: Option<String>,
    /// Read `pools.json` and `wallet-graphs/<id>.json` from a directory instead of the API.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// JSON settings file with layout tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn build_source(args: &Args, settings: &Settings) -> Result<Arc<dyn DataSource>> {
    let timeout = Duration::from_secs(args.timeout_secs.unwrap_or(settings.timeout_secs).max(1));

    let snapshot_dir = match (&args.snapshot_dir, &args.api_url) {
        (Some(dir), _) => Some(dir.clone()),
        (None, Some(_)) => None,
        (None, None) => settings.snapshot_dir.clone(),
    };

    if let Some(dir) = snapshot_dir {
        if !snapshot_dir_exists(&dir) {
            warn!(path = %dir.display(), "snapshot directory does not exist yet");
        }
        return Ok(Arc::new(SnapshotDir::new(dir)));
    }

    let api_url = args
        .api_url
        .clone()
        .or_else(|| settings.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
    Ok(Arc::new(HttpApi::new(&api_url, timeout)?))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let settings = Settings::load(args.config.as_deref())?;
    let source = build_source(&args, &settings)?;
    info!(source = %source.describe(), "starting viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 1080.0]),
        ..Default::default()
    };

    eframe::run_native(
        "pool-risk-bubbles",
        options,
        Box::new(move |cc| Ok(Box::new(app::RiskBubblesApp::new(cc, source, settings)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_snapshot_dir_wins_over_settings_api() {
        let args = Args::parse_from(["pool-risk-bubbles", "--snapshot-dir", "snapshots"]);
        let settings = Settings {
            api_url: Some("http://example.invalid".to_owned()),
            ..Settings::default()
        };

        let source = build_source(&args, &settings).expect("source");
        assert_eq!(source.describe(), SnapshotDir::new("snapshots").describe());
    }

    #[test]
    fn cli_api_url_wins_over_settings_snapshot_dir() {
        let args = Args::parse_from(["pool-risk-bubbles", "--api-url", "http://localhost:9000/"]);
        let settings = Settings {
            snapshot_dir: Some(PathBuf::from("snapshots")),
            ..Settings::default()
        };

        let source = build_source(&args, &settings).expect("source");
        assert_eq!(source.describe(), "api http://localhost:9000");
    }

    #[test]
    fn defaults_to_local_api() {
        let args = Args::parse_from(["pool-risk-bubbles"]);
        let source = build_source(&args, &Settings::default()).expect("source");
        assert_eq!(source.describe(), format!("api {DEFAULT_API_URL}"));
    }
}
