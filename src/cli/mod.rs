use crate::services::chart::{build_stacked, date_range};
use crate::services::dashboard::{build_dashboard, DashboardRequest};
use crate::services::fetch::{CreativeCostQuery, ReportingClient, DEFAULT_ENDPOINT};
use crate::services::ReportAggregator;
use crate::sources::{collect_rows, JsonlSource, PerformanceSource};
use crate::types::{CostPoint, PerformanceRow, Platform, ReportOutput, StackedSeries};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable holding the reporting API token
const API_TOKEN_ENV: &str = "SPENDSTACK_API_TOKEN";

/// Creative ad spend normalization, reporting, and charting
#[derive(Parser)]
#[command(name = "spendstack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a stacked-100 cost share chart from exported rows
    Chart {
        /// JSONL rows file to read
        #[arg(long)]
        rows: PathBuf,

        /// Range start (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: String,

        /// Range end (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: String,

        /// How many top creatives to keep
        #[arg(long, default_value_t = 10)]
        top_n: usize,

        /// Keep only campaigns for this platform (android/ios)
        #[arg(long)]
        platform: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Aggregate rows into a cost/impressions/installs report
    Report {
        /// JSONL rows file(s) to read, repeatable
        #[arg(long, required = true)]
        rows: Vec<PathBuf>,

        /// Split rows by account
        #[arg(long)]
        by_account: bool,

        /// Split rows by campaign
        #[arg(long)]
        by_campaign: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch creative daily cost rows from the reporting API
    Fetch {
        /// App token scoping the query
        #[arg(long)]
        app_token: String,

        /// Reporting channel id (e.g. partner_7)
        #[arg(long)]
        channel: String,

        /// Range start (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: String,

        /// Range end (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: String,

        /// Keep only campaigns for this platform (android/ios)
        #[arg(long)]
        platform: Option<String>,

        /// Reporting endpoint override
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        base_url: String,

        /// Print fetch diagnostics to stderr
        #[arg(long)]
        debug: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compose the multi-channel dashboard (always JSON)
    Dashboard {
        /// JSONL rows file feeding the primary chart
        #[arg(long)]
        rows: PathBuf,

        /// App token scoping the channel queries
        #[arg(long)]
        app_token: String,

        /// Range start (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: String,

        /// Range end (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: String,

        /// Platform the dashboard is scoped to (android/ios)
        #[arg(long, default_value = "android")]
        platform: String,

        /// How many top creatives to keep per chart
        #[arg(long, default_value_t = 10)]
        top_n: usize,

        /// Reporting endpoint override
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        base_url: String,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Chart {
                rows,
                start,
                end,
                top_n,
                platform,
                json,
            } => run_chart(&[rows], &start, &end, top_n, platform.as_deref(), json),
            Commands::Report {
                rows,
                by_account,
                by_campaign,
                json,
            } => run_report(&rows, by_account, by_campaign, json),
            Commands::Fetch {
                app_token,
                channel,
                start,
                end,
                platform,
                base_url,
                debug,
                json,
            } => run_fetch(
                app_token,
                channel,
                start,
                end,
                platform.as_deref(),
                &base_url,
                debug,
                json,
            ),
            Commands::Dashboard {
                rows,
                app_token,
                start,
                end,
                platform,
                top_n,
                base_url,
            } => run_dashboard(&[rows], app_token, start, end, &platform, top_n, &base_url),
        }
    }
}

/// Read rows from every file; a bad file warns and contributes nothing
fn load_rows(paths: &[PathBuf]) -> Vec<PerformanceRow> {
    let sources: Vec<Box<dyn PerformanceSource>> = paths
        .iter()
        .map(|p| Box::new(JsonlSource::new(p.clone())) as Box<dyn PerformanceSource>)
        .collect();
    collect_rows(&sources)
}

/// API token from the environment, trimmed; empty counts as unset
fn api_token_from_env() -> anyhow::Result<String> {
    let token = std::env::var(API_TOKEN_ENV).unwrap_or_default();
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("{API_TOKEN_ENV} is not set");
    }
    Ok(token.to_string())
}

fn run_chart(
    paths: &[PathBuf],
    start: &str,
    end: &str,
    top_n: usize,
    platform: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let platform = platform.map(Platform::parse);
    let dates = date_range(start, end)?;
    let rows = load_rows(paths);
    let points: Vec<CostPoint> = rows
        .iter()
        .filter(|row| platform.map_or(true, |p| p.matches_campaign(&row.campaign)))
        .map(|row| CostPoint {
            key: row.asset_name.clone(),
            date: row.date.to_string(),
            value: row.cost,
        })
        .collect();
    let chart = build_stacked(&dates, &points, top_n);

    if json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else {
        print_chart(&chart);
    }
    Ok(())
}

fn print_chart(chart: &StackedSeries) {
    if chart.series.is_empty() {
        println!("No spend in range.");
        return;
    }
    for (i, date) in chart.dates.iter().enumerate() {
        println!("{date}");
        for entry in &chart.series {
            if entry.data_cost[i] > 0.0 {
                println!(
                    "  {:<40} {:>10.2} {:>6.1}%",
                    entry.name, entry.data_cost[i], entry.data_pct[i]
                );
            }
        }
    }
}

fn run_report(
    paths: &[PathBuf],
    by_account: bool,
    by_campaign: bool,
    json: bool,
) -> anyhow::Result<()> {
    let rows = load_rows(paths);
    let report = ReportAggregator::aggregate(&rows, by_account, by_campaign);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ReportOutput) {
    if report.data.is_empty() {
        println!("No rows.");
        return;
    }
    println!(
        "{:<40} {:<24} {:<32} {:>12} {:>12} {:>10}",
        "Asset", "Account", "Campaign", "Cost", "Impressions", "Installs"
    );
    for row in &report.data {
        println!(
            "{:<40} {:<24} {:<32} {:>12.2} {:>12} {:>10}",
            row.asset_name, row.account, row.campaign, row.cost, row.impressions, row.installs
        );
    }
    println!(
        "{:<40} {:<24} {:<32} {:>12.2} {:>12} {:>10}",
        "TOTAL", "", "", report.totals.cost, report.totals.impressions, report.totals.installs
    );
}

#[allow(clippy::too_many_arguments)]
fn run_fetch(
    app_token: String,
    channel: String,
    start: String,
    end: String,
    platform: Option<&str>,
    base_url: &str,
    debug: bool,
    json: bool,
) -> anyhow::Result<()> {
    let api_token = api_token_from_env()?;
    let client = ReportingClient::new(base_url, api_token)?;
    let query = CreativeCostQuery {
        app_token,
        channel_id: channel,
        start_date: start,
        end_date: end,
        platform: platform.map(Platform::parse),
    };

    let (rows, diagnostics) = client.fetch_creative_daily_cost(&query)?;
    if debug {
        eprintln!("{}", serde_json::to_string_pretty(&diagnostics)?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!(
                "{:<12} {:<40} {:<32} {:>10.2}",
                row.day, row.creative, row.campaign, row.cost
            );
        }
    }
    Ok(())
}

fn run_dashboard(
    paths: &[PathBuf],
    app_token: String,
    start: String,
    end: String,
    platform: &str,
    top_n: usize,
    base_url: &str,
) -> anyhow::Result<()> {
    let api_token = api_token_from_env()?;
    let client = ReportingClient::new(base_url, api_token)?;
    let rows = load_rows(paths);
    let request = DashboardRequest {
        rows: &rows,
        app_token,
        start_date: start,
        end_date: end,
        platform: Platform::parse(platform),
        top_n,
    };

    let response = build_dashboard(&client, &request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
