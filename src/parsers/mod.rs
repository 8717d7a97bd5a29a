//! Decoding for upstream reporting payloads
//!
//! Reporting endpoints answer with JSON in several shapes, CSV exports,
//! or an HTML page when auth or routing goes sideways. This module turns
//! a raw body into flat records ready for canonicalization.

pub mod canonical;

pub use canonical::{canonicalize_rows, first_canonical_keys};

use crate::types::{Result, SpendError};
use regex::Regex;
use serde_json::{Map, Value};

/// Longest payload fragment quoted in error messages
const SNIPPET_CHARS: usize = 300;

/// Keys probed, in order, for the row list inside a keyed JSON response
const ROW_LIST_KEYS: [&str; 4] = ["rows", "data", "result", "results"];

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

fn starts_ignore_case(text: &str, prefix: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// A response body resolved into exactly one upstream shape.
///
/// Classification happens once per response; every later stage matches on
/// the variant instead of re-probing the bytes.
#[derive(Debug)]
pub enum ExternalPayload {
    /// Parsed JSON document, bare list or keyed object
    Json(Value),
    /// Records from a CSV body with a header row, every cell a string
    Csv(Vec<Value>),
    /// An HTML page where data should have been
    Html(String),
}

impl ExternalPayload {
    /// Classify a raw body by content type, falling back to sniffing the
    /// leading bytes. Parsing happens here, once: invalid JSON and an
    /// unreadable CSV header both fail classification.
    pub fn classify(content_type: &str, body: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(body);
        let ct = content_type.to_ascii_lowercase();

        let head = text.trim_start();
        if ct.contains("text/html")
            || starts_ignore_case(head, "<!doctype")
            || starts_ignore_case(head, "<html")
        {
            return Ok(Self::Html(text.into_owned()));
        }

        if ct.contains("application/json") || head.starts_with('{') || head.starts_with('[') {
            let mut buf = text.as_bytes().to_vec();
            let value: Value = simd_json::from_slice(&mut buf).map_err(|e| {
                SpendError::MalformedUpstream(format!("invalid JSON ({e}): {}", snippet(&text)))
            })?;
            return Ok(Self::Json(value));
        }

        Ok(Self::Csv(csv_rows(&text)?))
    }

    /// Extract the record list for this shape.
    ///
    /// HTML is always an error: a login or proxy page stood in for data.
    /// JSON may be a bare list or an object keyed by one of
    /// [`ROW_LIST_KEYS`]; an object without any of those keys holds no
    /// records.
    pub fn into_rows(self) -> Result<Vec<Value>> {
        match self {
            Self::Html(text) => Err(SpendError::MalformedUpstream(format!(
                "got an HTML page instead of data: {}",
                snippet(&text)
            ))),
            Self::Json(value) => Ok(json_rows(value)),
            Self::Csv(rows) => Ok(rows),
        }
    }
}

/// Decode a raw response body into a list of JSON records
pub fn decode_payload(content_type: &str, body: &[u8]) -> Result<Vec<Value>> {
    ExternalPayload::classify(content_type, body)?.into_rows()
}

fn json_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let key = ROW_LIST_KEYS
                .iter()
                .find(|k| matches!(map.get(**k), Some(Value::Array(_))));
            match key.and_then(|k| map.remove(*k)) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

fn csv_rows(text: &str) -> Result<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| SpendError::MalformedUpstream(format!("unreadable CSV header: {e}")))?
        .clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => continue, // exports sometimes carry a ragged trailer line
        };
        let mut row = Map::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

/// Flatten decoded records into one object per creative per day.
///
/// Some response shapes nest rows under date keys ("2024-06-01"). For
/// every date key, the inner rows come from a `rows` list, then a `data`
/// list, then the value itself when it is a list; a plain inner object
/// counts as a single row. Each inner row gets the date written into its
/// `day` field. A record with a date key whose value holds no rows is
/// dropped; records without any date key pass through unchanged.
pub fn flatten_rows(rows: Vec<Value>) -> Vec<Map<String, Value>> {
    let date_key = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex");
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let record = match row {
            Value::Object(map) if !map.is_empty() => map,
            _ => continue,
        };
        let mut found_nested = false;
        for (key, value) in &record {
            let day = key.trim();
            if !date_key.is_match(day) {
                continue;
            }
            found_nested = true;
            match value {
                Value::Object(inner) => {
                    let nested = inner
                        .get("rows")
                        .and_then(Value::as_array)
                        .or_else(|| inner.get("data").and_then(Value::as_array));
                    match nested {
                        Some(list) => push_inner_rows(&mut out, list, day),
                        // a bare object under a date key is itself the row
                        None => out.push(with_day(inner.clone(), day)),
                    }
                }
                Value::Array(list) => push_inner_rows(&mut out, list, day),
                // scalar under a date key carries no rows
                _ => {}
            }
        }
        if !found_nested {
            out.push(record);
        }
    }
    out
}

fn with_day(mut row: Map<String, Value>, day: &str) -> Map<String, Value> {
    row.insert("day".to_string(), Value::String(day.to_string()));
    row
}

fn push_inner_rows(out: &mut Vec<Map<String, Value>>, list: &[Value], day: &str) {
    for inner in list {
        if let Value::Object(map) = inner {
            out.push(with_day(map.clone(), day));
        }
    }
}
