//! Row and series types for the ad-spend pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One flat performance row from a structured analytics source.
///
/// `asset_name` is the normalized creative key; grouping dimensions
/// (`account`, `campaign`) ride along and are only consulted when the
/// report aggregation enables them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceRow {
    pub asset_name: String,
    pub account: String,
    pub campaign: String,
    pub date: NaiveDate,
    pub cost: f64,
    pub impressions: u64,
    /// Conversion count as reported by the network (fractional attribution)
    pub installs: f64,
}

/// Canonical daily-cost row produced from an external reporting payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreativeCostRow {
    pub day: String,
    #[serde(rename = "creative_network")]
    pub creative: String,
    pub campaign: String,
    pub cost: f64,
}

/// Input shape of the stacked-100 builder: one tagged value on one date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostPoint {
    pub key: String,
    pub date: String,
    pub value: f64,
}

/// One series of a stacked-100 chart.
///
/// `data_pct` and `data_cost` are aligned 1:1 with the chart's `dates`;
/// per index, the percentage is the share among the displayed top-N keys
/// only, and 0.0 on days where the displayed total is 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesEntry {
    pub name: String,
    #[serde(rename = "dataPct")]
    pub data_pct: Vec<f64>,
    #[serde(rename = "dataCost")]
    pub data_cost: Vec<f64>,
}

/// A stacked-100 chart: full requested date range plus top-N series
/// ordered by total cost descending
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackedSeries {
    pub dates: Vec<String>,
    pub series: Vec<SeriesEntry>,
}

impl StackedSeries {
    /// Chart with the requested dates and no series (no data / degraded)
    pub fn empty(dates: Vec<String>) -> Self {
        Self {
            dates,
            series: Vec::new(),
        }
    }
}

/// One aggregated report row, rounded for presentation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedReportRow {
    pub asset_name: String,
    pub account: String,
    pub campaign: String,
    pub cost: f64,
    pub impressions: u64,
    pub installs: u64,
}

/// Report totals, computed after per-row rounding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReportTotals {
    pub cost: f64,
    pub impressions: u64,
    pub installs: u64,
}

/// Aggregated report: rows sorted by cost descending, plus totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReportOutput {
    pub data: Vec<AggregatedReportRow>,
    pub totals: ReportTotals,
    pub count: usize,
}

/// Diagnostic record from one reporting-endpoint fetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FetchDiagnostics {
    pub content_type: String,
    pub method: String,
    pub body_len: usize,
    /// First 200 bytes of the raw body, lossy-decoded
    pub snippet: String,
    /// Canonical keys of the first non-empty flattened record (up to 40)
    pub first_row_keys: Vec<String>,
    /// Canonical rows before the platform filter
    pub raw_rows: usize,
    /// Canonical rows after the platform filter
    pub filtered_rows: usize,
}

/// Mobile platform a campaign targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Parse a user-supplied platform string. Anything other than "ios"
    /// (any case, surrounding whitespace ignored) means Android.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("ios") {
            Platform::Ios
        } else {
            Platform::Android
        }
    }

    /// Lowercase substring used to match campaign names
    pub fn substr(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }

    /// Display keyword as it appears in campaign naming conventions
    pub fn keyword(self) -> &'static str {
        match self {
            Platform::Android => "Android",
            Platform::Ios => "iOS",
        }
    }

    /// Store type for the reporting endpoint's `store_type__in` filter
    pub fn store_type(self) -> &'static str {
        match self {
            Platform::Android => "google_play",
            Platform::Ios => "app_store",
        }
    }

    /// Whether a campaign name targets this platform (case-insensitive
    /// substring match; empty names match nothing)
    pub fn matches_campaign(self, campaign: &str) -> bool {
        campaign.to_lowercase().contains(self.substr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Platform tests ==========

    #[test]
    fn test_platform_parse_ios_any_case() {
        assert_eq!(Platform::parse("iOS"), Platform::Ios);
        assert_eq!(Platform::parse("IOS"), Platform::Ios);
        assert_eq!(Platform::parse("  ios "), Platform::Ios);
    }

    #[test]
    fn test_platform_parse_defaults_to_android() {
        assert_eq!(Platform::parse("Android"), Platform::Android);
        assert_eq!(Platform::parse(""), Platform::Android);
        assert_eq!(Platform::parse("windows"), Platform::Android);
    }

    #[test]
    fn test_platform_store_type() {
        assert_eq!(Platform::Ios.store_type(), "app_store");
        assert_eq!(Platform::Android.store_type(), "google_play");
    }

    #[test]
    fn test_platform_matches_campaign_case_insensitive() {
        assert!(Platform::Ios.matches_campaign("Game_iOS_US"));
        assert!(Platform::Android.matches_campaign("game_ANDROID_ww"));
        assert!(!Platform::Ios.matches_campaign("Game_Android_US"));
        assert!(!Platform::Android.matches_campaign(""));
    }

    // ========== Serialization tests ==========

    #[test]
    fn test_series_entry_wire_names() {
        let entry = SeriesEntry {
            name: "hero".into(),
            data_pct: vec![100.0],
            data_cost: vec![12.5],
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"dataPct\""));
        assert!(json.contains("\"dataCost\""));
    }

    #[test]
    fn test_creative_cost_row_wire_names() {
        let row = CreativeCostRow {
            day: "2024-06-01".into(),
            creative: "hero".into(),
            campaign: "game_android".into(),
            cost: 3.5,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"creative_network\":\"hero\""));
    }

    #[test]
    fn test_stacked_series_empty() {
        let chart = StackedSeries::empty(vec!["2024-06-01".into()]);
        assert_eq!(chart.dates.len(), 1);
        assert!(chart.series.is_empty());
    }
}
