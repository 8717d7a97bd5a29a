//! Composite dashboard assembly across ad channels
//!
//! One primary chart from structured performance rows plus one chart per
//! reporting-API channel, all over the same date axis. A channel that
//! fails to fetch degrades to an empty chart with the error recorded in
//! its metadata; a broken channel never sinks the whole dashboard.

use crate::services::chart;
use crate::services::fetch::{CreativeCostQuery, ReportingClient};
use crate::services::normalizer::NameNormalizer;
use crate::types::{
    CostPoint, FetchDiagnostics, PerformanceRow, Platform, Result, StackedSeries,
};
use serde::{Deserialize, Serialize};

/// Channel id for AppLovin in the reporting API
pub const APPLOVIN_CHANNEL: &str = "partner_7";

/// Channel id for Mintegral in the reporting API
pub const MINTEGRAL_CHANNEL: &str = "partner_369";

/// Inputs for one dashboard assembly
#[derive(Debug)]
pub struct DashboardRequest<'a> {
    /// Structured performance rows feeding the primary chart
    pub rows: &'a [PerformanceRow],
    pub app_token: String,
    pub start_date: String,
    pub end_date: String,
    pub platform: Platform,
    pub top_n: usize,
}

/// Per-channel assembly facts carried alongside its chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMeta {
    pub raw_rows: usize,
    pub filtered_rows: usize,
    pub platform_sub: String,
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<FetchDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMeta {
    pub applovin: ChannelMeta,
    pub mintegral: ChannelMeta,
}

/// The three charts the dashboard renders, plus assembly metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub primary: StackedSeries,
    pub applovin: StackedSeries,
    pub mintegral: StackedSeries,
    pub meta: DashboardMeta,
}

/// Assemble the dashboard for one platform and date range.
///
/// The primary chart keys on normalized asset names from the structured
/// rows, restricted to campaigns matching the platform. Each channel
/// chart keys on creative names with hash prefixes stripped. Only a bad
/// date range fails the call; channel fetch errors degrade in place.
pub fn build_dashboard(
    client: &ReportingClient,
    request: &DashboardRequest,
) -> Result<DashboardResponse> {
    let dates = chart::date_range(&request.start_date, &request.end_date)?;

    let primary_points: Vec<CostPoint> = request
        .rows
        .iter()
        .filter(|row| request.platform.matches_campaign(&row.campaign))
        .map(|row| CostPoint {
            key: row.asset_name.clone(),
            date: row.date.to_string(),
            value: row.cost,
        })
        .collect();
    let primary = chart::build_stacked(&dates, &primary_points, request.top_n);

    let normalizer = NameNormalizer::new();
    let (applovin, applovin_meta) =
        build_channel(client, request, &normalizer, &dates, APPLOVIN_CHANNEL);
    let (mintegral, mintegral_meta) =
        build_channel(client, request, &normalizer, &dates, MINTEGRAL_CHANNEL);

    Ok(DashboardResponse {
        primary,
        applovin,
        mintegral,
        meta: DashboardMeta {
            applovin: applovin_meta,
            mintegral: mintegral_meta,
        },
    })
}

fn build_channel(
    client: &ReportingClient,
    request: &DashboardRequest,
    normalizer: &NameNormalizer,
    dates: &[String],
    channel_id: &str,
) -> (StackedSeries, ChannelMeta) {
    let query = CreativeCostQuery {
        app_token: request.app_token.clone(),
        channel_id: channel_id.to_string(),
        start_date: request.start_date.clone(),
        end_date: request.end_date.clone(),
        platform: Some(request.platform),
    };

    match client.fetch_creative_daily_cost(&query) {
        Ok((rows, diagnostics)) => {
            let points: Vec<CostPoint> = rows
                .iter()
                .map(|row| CostPoint {
                    key: normalizer.strip_hash_prefix(&row.creative),
                    date: row.day.clone(),
                    value: row.cost,
                })
                .collect();
            let series = chart::build_stacked(dates, &points, request.top_n);
            let meta = ChannelMeta {
                raw_rows: diagnostics.raw_rows,
                filtered_rows: diagnostics.filtered_rows,
                platform_sub: request.platform.substr().to_string(),
                channel_id: channel_id.to_string(),
                diagnostics: Some(diagnostics),
                error: None,
            };
            (series, meta)
        }
        Err(err) => {
            eprintln!("[spendstack] Warning: channel {channel_id} fetch failed: {err}");
            let meta = ChannelMeta {
                raw_rows: 0,
                filtered_rows: 0,
                platform_sub: request.platform.substr().to_string(),
                channel_id: channel_id.to_string(),
                diagnostics: None,
                error: Some(err.to_string()),
            };
            (StackedSeries::empty(dates.to_vec()), meta)
        }
    }
}
