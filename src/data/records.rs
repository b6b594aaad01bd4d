pub const DEFAULT_POOL_RISK: f64 = 100.0;
pub const DEFAULT_WALLET_RISK: f64 = 1.0;
pub const UNKNOWN_TOKEN: &str = "?";

#[derive(Clone, Debug, PartialEq)]
pub struct PoolNode {
    pub id: u64,
    pub sui_pool_id: Option<String>,
    pub label: String,
    pub dex_name: String,
    pub tvl: f64,
    pub volume_24h: f64,
    pub risk_score: f64,
    pub captured_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WalletNode {
    pub id: String,
    pub volume: f64,
    pub trades: u64,
    pub risk: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WalletEdge {
    pub source: String,
    pub target: String,
    pub volume: f64,
    pub trades: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GraphMeta {
    pub total_volume: f64,
    pub total_trades: u64,
}

/// Wallet-to-wallet trade graph for a single pool.
///
/// `endpoints[i]` holds the node indices of `edges[i]`; edges whose endpoints
/// are unknown never make it into the graph.
#[derive(Clone, Debug, Default)]
pub struct WalletGraph {
    pub pool_id: Option<u64>,
    pub pool_name: String,
    pub nodes: Vec<WalletNode>,
    pub edges: Vec<WalletEdge>,
    pub endpoints: Vec<(usize, usize)>,
    pub meta: GraphMeta,
}

impl WalletGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn degree(&self, index: usize) -> usize {
        self.endpoints
            .iter()
            .filter(|&&(from, to)| from == index || to == index)
            .count()
    }

    /// Sum of the volume on every edge touching the node. Shown next to the
    /// node's own volume; radius is always driven by `WalletNode::volume`.
    pub fn incident_volume(&self, index: usize) -> f64 {
        self.endpoints
            .iter()
            .zip(&self.edges)
            .filter(|((from, to), _)| *from == index || *to == index)
            .map(|(_, edge)| edge.volume)
            .sum()
    }
}
