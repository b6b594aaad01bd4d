use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawPoolSummary {
    #[serde(default, deserialize_with = "lenient_id")]
    pub(super) id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) sui_pool_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) pool_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) dex_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) token0: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) token1: Option<String>,
    #[serde(default)]
    pub(super) metric: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct RawPoolMetric {
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) tvl_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) volume_24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) risk_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) captured_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawWalletNode {
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) address: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) trades: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) risk: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawWalletEdge {
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) source: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub(super) target: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) trades: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct RawGraphMeta {
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) total_volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(super) total_trades: Option<f64>,
}

/// Decodes every element of a JSON array on its own, so one malformed record
/// never takes its siblings down with it.
pub(super) fn decode_each<T>(value: Option<&Value>) -> (Vec<T>, usize)
where
    T: for<'de> Deserialize<'de>,
{
    let Some(items) = value.and_then(Value::as_array) else {
        return (Vec::new(), 0);
    };

    let mut decoded = Vec::with_capacity(items.len());
    let mut rejected = 0usize;
    for item in items {
        match T::deserialize(item) {
            Ok(entry) => decoded.push(entry),
            Err(_) => rejected += 1,
        }
    }
    (decoded, rejected)
}

pub(super) fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
