use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::FetchError;
use super::raw::{
    RawGraphMeta, RawPoolMetric, RawPoolSummary, RawWalletEdge, RawWalletNode, decode_each,
    number_from_value,
};
use super::records::{
    DEFAULT_POOL_RISK, DEFAULT_WALLET_RISK, GraphMeta, PoolNode, UNKNOWN_TOKEN, WalletEdge,
    WalletGraph, WalletNode,
};

/// Negative and non-finite amounts collapse to zero.
pub fn sanitize_amount(value: Option<f64>) -> f64 {
    match value {
        Some(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// Clamps a risk value into `[0, max]`. Missing or non-finite risk means the
/// backend has not scored the entity yet, which is treated as maximal risk.
pub fn sanitize_risk(value: Option<f64>, max: f64) -> f64 {
    match value {
        Some(value) if value.is_finite() => value.clamp(0.0, max),
        _ => max,
    }
}

fn sanitize_count(value: Option<f64>) -> u64 {
    match value {
        Some(value) if value.is_finite() && value > 0.0 => value.round() as u64,
        _ => 0,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

pub fn pool_nodes_from_json(raw: &str) -> Result<Vec<PoolNode>, FetchError> {
    let parsed: Value = serde_json::from_str(raw)?;
    Ok(pool_nodes_from_value(&parsed))
}

pub fn pool_nodes_from_value(parsed: &Value) -> Vec<PoolNode> {
    if !parsed.is_array() {
        warn!("pool summary payload is not a list; rendering empty state");
        return Vec::new();
    }

    let (summaries, rejected) = decode_each::<RawPoolSummary>(Some(parsed));
    let mut seen = HashSet::with_capacity(summaries.len());
    let mut nodes = Vec::with_capacity(summaries.len());
    let mut dropped = rejected;

    for summary in summaries {
        let Some(id) = summary.id else {
            dropped += 1;
            continue;
        };
        if !seen.insert(id) {
            dropped += 1;
            continue;
        }

        let metric = summary
            .metric
            .as_ref()
            .filter(|value| !value.is_null())
            .and_then(|value| RawPoolMetric::deserialize(value).ok());

        let token0 = non_empty(summary.token0).unwrap_or_else(|| UNKNOWN_TOKEN.to_owned());
        let token1 = non_empty(summary.token1).unwrap_or_else(|| UNKNOWN_TOKEN.to_owned());
        let dex_name = non_empty(summary.dex_name)
            .or_else(|| non_empty(summary.pool_name))
            .unwrap_or_else(|| "unknown".to_owned());

        let (tvl, volume_24h, risk_score, captured_at) = match metric {
            Some(metric) => (
                sanitize_amount(metric.tvl_usd),
                sanitize_amount(metric.volume_24h),
                sanitize_risk(metric.risk_score, DEFAULT_POOL_RISK),
                non_empty(metric.captured_at),
            ),
            None => (0.0, 0.0, DEFAULT_POOL_RISK, None),
        };

        nodes.push(PoolNode {
            id,
            sui_pool_id: non_empty(summary.sui_pool_id),
            label: format!("{token0} / {token1}"),
            dex_name,
            tvl,
            volume_24h,
            risk_score,
            captured_at,
        });
    }

    if dropped > 0 {
        debug!(dropped, kept = nodes.len(), "dropped pool summary records");
    }
    nodes
}

pub fn wallet_graph_from_json(raw: &str) -> Result<WalletGraph, FetchError> {
    let parsed: Value = serde_json::from_str(raw)?;
    Ok(wallet_graph_from_value(&parsed))
}

pub fn wallet_graph_from_value(parsed: &Value) -> WalletGraph {
    let Some(object) = parsed.as_object() else {
        warn!("wallet graph payload is not an object; rendering empty state");
        return WalletGraph::default();
    };

    let pool_id = object
        .get("pool_id")
        .and_then(number_from_value)
        .filter(|id| id.is_finite() && *id >= 0.0)
        .map(|id| id as u64);
    let pool_name = object
        .get("pool_name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let (raw_nodes, rejected_nodes) = decode_each::<RawWalletNode>(object.get("nodes"));
    let (raw_edges, rejected_edges) = decode_each::<RawWalletEdge>(object.get("edges"));

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    let mut index_by_id = HashMap::with_capacity(raw_nodes.len());
    let mut dropped_nodes = rejected_nodes;
    for raw in raw_nodes {
        let Some(id) = non_empty(raw.id).or_else(|| non_empty(raw.address)) else {
            dropped_nodes += 1;
            continue;
        };
        if index_by_id.contains_key(&id) {
            dropped_nodes += 1;
            continue;
        }

        index_by_id.insert(id.clone(), nodes.len());
        nodes.push(WalletNode {
            id,
            volume: sanitize_amount(raw.volume),
            trades: sanitize_count(raw.trades),
            risk: sanitize_risk(raw.risk, DEFAULT_WALLET_RISK),
        });
    }

    let mut edges = Vec::with_capacity(raw_edges.len());
    let mut endpoints = Vec::with_capacity(raw_edges.len());
    let mut dropped_edges = rejected_edges;
    for raw in raw_edges {
        let (Some(source), Some(target)) = (non_empty(raw.source), non_empty(raw.target)) else {
            dropped_edges += 1;
            continue;
        };
        let (Some(&from), Some(&to)) = (index_by_id.get(&source), index_by_id.get(&target)) else {
            dropped_edges += 1;
            continue;
        };

        endpoints.push((from, to));
        edges.push(WalletEdge {
            source,
            target,
            volume: sanitize_amount(raw.volume),
            trades: sanitize_count(raw.trades),
        });
    }

    if dropped_nodes > 0 || dropped_edges > 0 {
        debug!(
            dropped_nodes,
            dropped_edges,
            kept_nodes = nodes.len(),
            kept_edges = edges.len(),
            "dropped wallet graph records"
        );
    }

    let meta = object
        .get("meta")
        .filter(|value| value.is_object())
        .and_then(|value| RawGraphMeta::deserialize(value).ok())
        .unwrap_or_default();
    let meta = GraphMeta {
        total_volume: match meta.total_volume {
            Some(total) => sanitize_amount(Some(total)),
            None => nodes.iter().map(|node| node.volume).sum(),
        },
        total_trades: match meta.total_trades {
            Some(total) => sanitize_count(Some(total)),
            None => edges.iter().map(|edge| edge.trades).sum(),
        },
    };

    WalletGraph {
        pool_id,
        pool_name,
        nodes,
        edges,
        endpoints,
        meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_without_metric_gets_safe_defaults() {
        let raw = r#"[
            {"id": 7, "sui_pool_id": "0xpool", "dex_name": "deepbook", "token0": null, "token1": "USDC", "metric": null}
        ]"#;

        let nodes = pool_nodes_from_json(raw).expect("valid json");
        assert_eq!(nodes.len(), 1);
        let node = &nodes[0];
        assert_eq!(node.id, 7);
        assert_eq!(node.label, "? / USDC");
        assert_eq!(node.dex_name, "deepbook");
        assert_eq!(node.tvl, 0.0);
        assert_eq!(node.risk_score, 100.0);
        assert_eq!(node.captured_at, None);
    }

    #[test]
    fn pool_metric_accepts_numeric_strings() {
        let raw = r#"[
            {"id": "3", "dex_name": "deepbook", "token0": "SUI", "token1": "USDC",
             "metric": {"tvl_usd": "1250000.5", "volume_24h": 10, "risk_score": 42, "captured_at": "2025-11-20T10:00:00Z"}}
        ]"#;

        let nodes = pool_nodes_from_json(raw).expect("valid json");
        assert_eq!(nodes[0].id, 3);
        assert_eq!(nodes[0].tvl, 1_250_000.5);
        assert_eq!(nodes[0].volume_24h, 10.0);
        assert_eq!(nodes[0].risk_score, 42.0);
        assert_eq!(nodes[0].captured_at.as_deref(), Some("2025-11-20T10:00:00Z"));
    }

    #[test]
    fn mistyped_optional_fields_keep_the_record() {
        let raw = r#"[
            {"id": 1, "dex_name": "cetus", "token0": 42, "token1": "USDC",
             "metric": {"tvl_usd": 10, "risk_score": 20, "captured_at": 1700000000}},
            {"id": 2, "sui_pool_id": 7, "dex_name": ["deepbook"], "token0": "SUI", "token1": {"symbol": "USDC"}}
        ]"#;

        let nodes = pool_nodes_from_json(raw).expect("valid json");
        let ids = nodes.iter().map(|node| node.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(nodes[0].label, "42 / USDC");
        assert_eq!(nodes[0].tvl, 10.0);
        assert_eq!(nodes[0].captured_at.as_deref(), Some("1700000000"));
        assert_eq!(nodes[1].sui_pool_id.as_deref(), Some("7"));
        assert_eq!(nodes[1].label, "SUI / ?");
        assert_eq!(nodes[1].dex_name, "unknown");
    }

    #[test]
    fn record_without_id_is_dropped_alone() {
        let raw = r#"[
            {"dex_name": "deepbook", "token0": "A", "token1": "B"},
            {"id": 2, "dex_name": "deepbook", "token0": "C", "token1": "D"},
            "garbage",
            {"id": 2, "dex_name": "duplicate"},
            {"id": 4, "dex_name": "deepbook", "metric": "not-an-object"}
        ]"#;

        let nodes = pool_nodes_from_json(raw).expect("valid json");
        let ids = nodes.iter().map(|node| node.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 4]);
        assert_eq!(nodes[0].label, "C / D");
        assert_eq!(nodes[1].risk_score, 100.0);
    }

    #[test]
    fn degenerate_pool_numbers_are_clamped() {
        let raw = r#"[
            {"id": 1, "dex_name": "x", "metric": {"tvl_usd": -50, "risk_score": 180}},
            {"id": 2, "dex_name": "x", "metric": {"tvl_usd": "NaN", "risk_score": -3}}
        ]"#;

        let nodes = pool_nodes_from_json(raw).expect("valid json");
        assert_eq!(nodes[0].tvl, 0.0);
        assert_eq!(nodes[0].risk_score, 100.0);
        assert_eq!(nodes[1].tvl, 0.0);
        assert_eq!(nodes[1].risk_score, 0.0);
    }

    #[test]
    fn non_list_pool_payload_is_empty_not_error() {
        assert!(pool_nodes_from_json(r#"{"detail": "nope"}"#).unwrap().is_empty());
        assert!(pool_nodes_from_json("not json").is_err());
    }

    #[test]
    fn wallet_graph_keeps_parallel_edges_and_drops_dangling() {
        let raw = r#"{
            "pool_id": 9,
            "pool_name": "SUI_USDC",
            "nodes": [
                {"id": "0xA", "volume": 10, "trades": 2, "risk": 0.2},
                {"address": "0xB", "volume": 5, "trades": 1, "risk": 1.7},
                {"volume": 1},
                {"id": "0xA", "volume": 99}
            ],
            "edges": [
                {"source": "0xA", "target": "0xB", "volume": 3, "trades": 1},
                {"source": "0xA", "target": "0xB", "volume": 4, "trades": 1},
                {"source": "0xA", "target": "0xZ", "volume": 4, "trades": 1}
            ],
            "meta": {"total_volume": 15, "total_trades": 3}
        }"#;

        let graph = wallet_graph_from_json(raw).expect("valid json");
        assert_eq!(graph.pool_id, Some(9));
        assert_eq!(graph.pool_name, "SUI_USDC");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].volume, 10.0);
        assert_eq!(graph.nodes[1].id, "0xB");
        assert_eq!(graph.nodes[1].risk, 1.0);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.endpoints, vec![(0, 1), (0, 1)]);
        assert_eq!(graph.meta.total_volume, 15.0);
        assert_eq!(graph.meta.total_trades, 3);
        assert_eq!(graph.degree(0), 2);
        assert_eq!(graph.incident_volume(1), 7.0);
    }

    #[test]
    fn wallet_graph_meta_defaults_to_record_sums() {
        let raw = r#"{
            "nodes": [{"id": "a", "volume": 2}, {"id": "b", "volume": 3}],
            "edges": [{"source": "a", "target": "b", "trades": 4}]
        }"#;

        let graph = wallet_graph_from_json(raw).expect("valid json");
        assert_eq!(graph.meta.total_volume, 5.0);
        assert_eq!(graph.meta.total_trades, 4);
        assert_eq!(graph.nodes[0].risk, 1.0);
    }

    #[test]
    fn wallet_graph_shape_mismatch_is_empty() {
        let graph = wallet_graph_from_json("[1, 2, 3]").expect("valid json");
        assert!(graph.is_empty());
        let graph = wallet_graph_from_json(r#"{"nodes": "oops"}"#).expect("valid json");
        assert!(graph.is_empty());
    }
}
