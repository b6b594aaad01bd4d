use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use super::error::FetchError;
use super::ingest::{pool_nodes_from_json, wallet_graph_from_json};
use super::records::{PoolNode, WalletGraph};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    PoolSummaries,
    WalletGraph(u64),
}

/// Supplier of raw metric payloads. Implementations only move bytes; every
/// payload goes through the same ingestion path.
pub trait DataSource: Send + Sync {
    fn describe(&self) -> String;

    fn fetch_text(&self, resource: Resource) -> Result<String, FetchError>;

    fn pool_summaries(&self) -> Result<Vec<PoolNode>, FetchError> {
        let raw = self.fetch_text(Resource::PoolSummaries)?;
        pool_nodes_from_json(&raw)
    }

    fn wallet_graph(&self, pool_id: u64) -> Result<WalletGraph, FetchError> {
        let raw = self.fetch_text(Resource::WalletGraph(pool_id))?;
        let mut graph = wallet_graph_from_json(&raw)?;
        graph.pool_id.get_or_insert(pool_id);
        Ok(graph)
    }
}

/// Reads `pools.json` and `wallet-graphs/<pool_id>.json` from a directory.
pub struct SnapshotDir {
    root: PathBuf,
}

impl SnapshotDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, resource: Resource) -> PathBuf {
        match resource {
            Resource::PoolSummaries => self.root.join("pools.json"),
            Resource::WalletGraph(pool_id) => self
                .root
                .join("wallet-graphs")
                .join(format!("{pool_id}.json")),
        }
    }
}

impl DataSource for SnapshotDir {
    fn describe(&self) -> String {
        format!("snapshot {}", self.root.display())
    }

    fn fetch_text(&self, resource: Resource) -> Result<String, FetchError> {
        let path = self.path_for(resource);
        debug!(path = %path.display(), "reading snapshot");
        fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }
}

/// Talks to the risk backend over HTTP.
pub struct HttpApi {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    pub fn url_for(&self, resource: Resource) -> String {
        match resource {
            Resource::PoolSummaries => format!("{}/pools/summary", self.base_url),
            Resource::WalletGraph(pool_id) => {
                format!("{}/pools/{pool_id}/wallet-graph", self.base_url)
            }
        }
    }
}

impl DataSource for HttpApi {
    fn describe(&self) -> String {
        format!("api {}", self.base_url)
    }

    fn fetch_text(&self, resource: Resource) -> Result<String, FetchError> {
        let url = self.url_for(resource);
        debug!(%url, "requesting");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|source| FetchError::Http { url, source })?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(FetchError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

pub fn snapshot_dir_exists(path: &Path) -> bool {
    path.join("pools.json").is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScratchDir(PathBuf);

    impl ScratchDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "pool-risk-bubbles-{name}-{}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&path);
            fs::create_dir_all(path.join("wallet-graphs")).expect("create scratch dir");
            Self(path)
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn snapshot_dir_reads_pools_and_graphs() {
        let scratch = ScratchDir::new("reads");
        fs::write(
            scratch.0.join("pools.json"),
            r#"[{"id": 1, "dex_name": "deepbook", "token0": "SUI", "token1": "USDC",
                "metric": {"tvl_usd": 100, "volume_24h": 5, "risk_score": 12, "captured_at": "t"}}]"#,
        )
        .expect("write pools");
        fs::write(
            scratch.0.join("wallet-graphs").join("1.json"),
            r#"{"pool_name": "SUI_USDC", "nodes": [{"id": "0xA", "volume": 1, "trades": 1, "risk": 0.1}], "edges": []}"#,
        )
        .expect("write graph");

        let source = SnapshotDir::new(scratch.0.clone());
        assert!(snapshot_dir_exists(&scratch.0));

        let pools = source.pool_summaries().expect("pools");
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].label, "SUI / USDC");

        let graph = source.wallet_graph(1).expect("graph");
        assert_eq!(graph.pool_id, Some(1));
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn snapshot_dir_missing_file_is_io_error() {
        let scratch = ScratchDir::new("missing");
        let source = SnapshotDir::new(scratch.0.clone());
        let error = source.wallet_graph(42).expect_err("missing graph");
        assert!(matches!(error, FetchError::Io { .. }));
        assert!(error.to_string().contains("42.json"));
    }

    #[test]
    fn http_urls_follow_backend_routes() {
        let api = HttpApi::new("http://localhost:8000/", Duration::from_secs(1)).expect("client");
        assert_eq!(
            api.url_for(Resource::PoolSummaries),
            "http://localhost:8000/pools/summary"
        );
        assert_eq!(
            api.url_for(Resource::WalletGraph(5)),
            "http://localhost:8000/pools/5/wallet-graph"
        );
    }
}
