//! JSONL performance source for exported analytics rows

use super::PerformanceSource;
use crate::services::normalizer::NameNormalizer;
use crate::types::{PerformanceRow, Result, SpendError};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// One exported analytics line (zero-copy with borrowed strings)
#[derive(Deserialize)]
struct RawPerformanceLine<'a> {
    asset_id: Option<u64>,
    asset_name: Option<&'a str>,
    video_title: Option<&'a str>,
    account: Option<&'a str>,
    campaign: Option<&'a str>,
    date: &'a str,
    cost: Option<f64>,
    cost_micros: Option<i64>,
    impressions: Option<u64>,
    installs: Option<f64>,
    conversions: Option<f64>,
}

/// Reads performance rows from a JSONL export file.
///
/// Lines that fail to parse are skipped; rows with an unparsable date are
/// skipped with a warning. Asset names are normalized (format suffixes
/// stripped) at ingestion so every consumer sees canonical names.
pub struct JsonlSource {
    path: PathBuf,
    label: String,
    normalizer: NameNormalizer,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self {
            path,
            label,
            normalizer: NameNormalizer::new(),
        }
    }

    /// Parse a single JSONL line into a performance row
    fn parse_line(&self, line: &mut [u8]) -> Option<PerformanceRow> {
        if line.is_empty() {
            return None;
        }

        let data: RawPerformanceLine = simd_json::from_slice(line).ok()?;

        // name fallback chain from the analytics export: asset name, then
        // video title, then a placeholder built from the asset id
        let name = match (data.asset_name, data.video_title, data.asset_id) {
            (Some(n), _, _) if !n.is_empty() => n.to_string(),
            (_, Some(t), _) if !t.is_empty() => t.to_string(),
            (_, _, Some(id)) => format!("Asset_{id}"),
            _ => return None,
        };

        let date = match NaiveDate::parse_from_str(data.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                eprintln!(
                    "[spendstack] Warning: invalid date '{}', skipping row",
                    data.date
                );
                return None;
            }
        };

        let cost = data
            .cost
            .or_else(|| data.cost_micros.map(|m| m as f64 / 1_000_000.0))
            .unwrap_or(0.0);
        let installs = data.installs.or(data.conversions).unwrap_or(0.0);

        Some(PerformanceRow {
            asset_name: self.normalizer.strip_format_suffix(&name),
            account: data.account.unwrap_or_default().to_string(),
            campaign: data.campaign.unwrap_or_default().to_string(),
            date,
            cost,
            impressions: data.impressions.unwrap_or(0),
            installs,
        })
    }
}

impl PerformanceSource for JsonlSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn fetch_rows(&self) -> Result<Vec<PerformanceRow>> {
        let file = File::open(&self.path).map_err(SpendError::Io)?;
        let reader = BufReader::new(file);
        let mut rows = Vec::new();

        // Stream line-by-line to avoid loading entire file into memory
        for line_result in reader.lines() {
            let line = match line_result {
                Ok(l) => l,
                Err(_) => continue, // Skip lines with read errors
            };

            if line.is_empty() {
                continue;
            }

            // Convert to mutable bytes for simd-json
            let mut line_bytes = line.into_bytes();
            if let Some(row) = self.parse_line(&mut line_bytes) {
                rows.push(row);
            }
        }

        Ok(rows)
    }
}
