//! Key canonicalization and synonym resolution for external rows
//!
//! Upstream payloads drift between key spellings ("Creative Network",
//! "creative_network", "creative") and value conventions (numbers as
//! strings, empty strings for absent). Every flattened record passes
//! through here before the pipeline touches it.

use crate::types::CreativeCostRow;
use serde_json::{Map, Value};

/// Synonyms for the day column, in priority order
pub const DAY_KEYS: [&str; 2] = ["day", "date"];

/// Synonyms for the creative column, in priority order
pub const CREATIVE_KEYS: [&str; 3] = ["creative_network", "creative", "creative_name"];

/// Synonyms for the campaign column, in priority order
pub const CAMPAIGN_KEYS: [&str; 2] = ["campaign", "campaign_name"];

/// Synonyms for the cost column, in priority order
pub const COST_KEYS: [&str; 3] = ["cost", "spend", "ad_spend"];

/// Canonicalize a record key: trim, lowercase, collapse every run of
/// non-alphanumeric characters to a single underscore, strip edge
/// underscores.
///
/// `"Ad Spend (USD)"` becomes `"ad_spend_usd"`.
pub fn canonicalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut pending_sep = false;
    for c in key.trim().chars() {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            out.push(lower);
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Whether a value counts as present. Upstream uses empty strings and
/// zero values interchangeably with absent fields, so those fall through
/// to the next synonym.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First present value among `keys`, in table order
fn first_present<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| is_present(v))
}

/// Render a scalar value as text the way the upstream does
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Numeric cost from a value: numbers pass through, strings parse,
/// anything unparsable or missing is 0.0 (never an error)
fn cost_value(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    }
}

/// Rebuild a record with every key canonicalized
fn canonical_map(row: &Map<String, Value>) -> Map<String, Value> {
    let mut canon = Map::new();
    for (key, value) in row {
        canon.insert(canonicalize_key(key), value.clone());
    }
    canon
}

/// Reduce flattened records to canonical daily-cost rows.
///
/// A record is accepted only when it has a present day and a present
/// creative value after canonicalization; records missing either are
/// dropped silently as upstream data gaps. The day is truncated to its
/// first 10 characters ("2024-06-01T00:00:00" → "2024-06-01"); campaign
/// is optional and defaults to empty.
pub fn canonicalize_rows(rows: &[Map<String, Value>]) -> Vec<CreativeCostRow> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let canon = canonical_map(row);
        let (day, creative) = match (
            first_present(&canon, &DAY_KEYS),
            first_present(&canon, &CREATIVE_KEYS),
        ) {
            (Some(d), Some(c)) => (d, c),
            _ => continue,
        };
        let day: String = value_text(day).chars().take(10).collect();
        let creative = value_text(creative);
        let campaign = first_present(&canon, &CAMPAIGN_KEYS)
            .map(value_text)
            .unwrap_or_default();
        let cost = cost_value(first_present(&canon, &COST_KEYS));
        out.push(CreativeCostRow {
            day,
            creative,
            campaign,
            cost,
        });
    }
    out
}

/// Canonical keys of the first non-empty record, for fetch diagnostics
pub fn first_canonical_keys(rows: &[Map<String, Value>], limit: usize) -> Vec<String> {
    rows.iter()
        .find(|r| !r.is_empty())
        .map(|r| canonical_map(r).keys().take(limit).cloned().collect())
        .unwrap_or_default()
}
