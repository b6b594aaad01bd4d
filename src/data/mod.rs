mod error;
mod ingest;
mod raw;
mod records;
mod source;

pub use error::FetchError;
pub use ingest::{pool_nodes_from_json, wallet_graph_from_json};
pub use records::{PoolNode, WalletGraph};
pub use source::{DataSource, HttpApi, SnapshotDir, snapshot_dir_exists};
