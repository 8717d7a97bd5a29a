//! Report aggregation across performance rows

use crate::types::{AggregatedReportRow, PerformanceRow, ReportOutput, ReportTotals};
use std::collections::HashMap;

/// Round to two decimals, ties to even, the way the report presents money
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

struct Accumulator {
    asset_name: String,
    account: String,
    campaign: String,
    cost: f64,
    impressions: u64,
    installs: f64,
}

/// Aggregator for flat report rows with configurable grouping dimensions
pub struct ReportAggregator;

impl ReportAggregator {
    /// Aggregate rows by normalized asset name, optionally splitting the
    /// groups further by account and campaign.
    ///
    /// Output rows are sorted by summed cost descending. Cost is rounded
    /// to cents and installs to whole numbers per row; the totals are
    /// computed from the ROUNDED rows, so they can drift from the raw
    /// sums by sub-cent amounts. That drift is the contract: totals always
    /// match what the table shows.
    pub fn aggregate(
        rows: &[PerformanceRow],
        group_by_account: bool,
        group_by_campaign: bool,
    ) -> ReportOutput {
        if rows.is_empty() {
            return ReportOutput::default();
        }

        let mut order: Vec<Vec<String>> = Vec::new();
        let mut groups: HashMap<Vec<String>, Accumulator> = HashMap::new();

        for row in rows {
            let mut key = vec![row.asset_name.clone()];
            if group_by_account {
                key.push(row.account.clone());
            }
            if group_by_campaign {
                key.push(row.campaign.clone());
            }

            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            let acc = groups.entry(key).or_insert_with(|| Accumulator {
                asset_name: row.asset_name.clone(),
                account: if group_by_account {
                    row.account.clone()
                } else {
                    String::new()
                },
                campaign: if group_by_campaign {
                    row.campaign.clone()
                } else {
                    String::new()
                },
                cost: 0.0,
                impressions: 0,
                installs: 0.0,
            });
            acc.cost += row.cost;
            acc.impressions = acc.impressions.saturating_add(row.impressions);
            acc.installs += row.installs;
        }

        // stable sort over first-seen order so equal costs stay deterministic
        let mut ordered: Vec<Accumulator> = order
            .iter()
            .filter_map(|key| groups.remove(key))
            .collect();
        ordered.sort_by(|a, b| b.cost.total_cmp(&a.cost));

        let data: Vec<AggregatedReportRow> = ordered
            .into_iter()
            .map(|acc| AggregatedReportRow {
                asset_name: acc.asset_name,
                account: acc.account,
                campaign: acc.campaign,
                cost: round_cents(acc.cost),
                impressions: acc.impressions,
                installs: acc.installs.round_ties_even() as u64,
            })
            .collect();

        let totals = ReportTotals {
            cost: round_cents(data.iter().map(|r| r.cost).sum()),
            impressions: data.iter().map(|r| r.impressions).sum(),
            installs: data.iter().map(|r| r.installs).sum(),
        };

        ReportOutput {
            count: data.len(),
            data,
            totals,
        }
    }
}
