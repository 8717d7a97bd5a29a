//! Stacked-100 chart assembly
//!
//! Turns tagged daily cost points into the top-N percentage-share series
//! the dashboard charts, with ranking over the full input and shares
//! computed among the selected keys only.

use crate::types::{CostPoint, Result, SeriesEntry, SpendError, StackedSeries};
use chrono::NaiveDate;
use std::collections::HashMap;

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| SpendError::Parse(format!("invalid date {text:?}: {e}")))
}

/// Inclusive list of ISO dates from `start_date` through `end_date`.
/// An end before the start yields an empty list, not an error.
pub fn date_range(start_date: &str, end_date: &str) -> Result<Vec<String>> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    let mut dates = Vec::new();
    let mut day = start;
    while day <= end {
        dates.push(day.to_string());
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    Ok(dates)
}

/// Build a stacked-100 series from cost points.
///
/// Points with an empty key or a non-positive value are dropped. Keys are
/// ranked by total value over the FULL input (dates outside the requested
/// range still count toward ranking), ties keeping input order, and the
/// `top_n` highest kept. Per date, each kept key's share is its value over
/// the daily total of the kept keys, as a percentage; a date where the
/// kept keys spent nothing shows 0% all around. Series come out in rank
/// order carrying both percentages and raw values aligned with `dates`.
pub fn build_stacked(dates: &[String], points: &[CostPoint], top_n: usize) -> StackedSeries {
    let kept: Vec<&CostPoint> = points
        .iter()
        .filter(|p| !p.key.is_empty() && p.value > 0.0)
        .collect();
    if kept.is_empty() {
        return StackedSeries::empty(dates.to_vec());
    }

    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, f64> = HashMap::new();
    for point in &kept {
        if !totals.contains_key(&point.key) {
            order.push(point.key.clone());
        }
        *totals.entry(point.key.clone()).or_insert(0.0) += point.value;
    }

    // stable sort so equal totals keep first-seen order
    let mut ranked = order;
    ranked.sort_by(|a, b| totals[b].total_cmp(&totals[a]));
    ranked.truncate(top_n);

    let rank_index: HashMap<&str, usize> = ranked
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect();
    let date_index: HashMap<&str, usize> = dates
        .iter()
        .enumerate()
        .map(|(i, d)| (d.as_str(), i))
        .collect();

    let mut pivot: Vec<Vec<f64>> = vec![vec![0.0; dates.len()]; ranked.len()];
    for point in &kept {
        if let (Some(&ki), Some(&di)) = (
            rank_index.get(point.key.as_str()),
            date_index.get(point.date.as_str()),
        ) {
            pivot[ki][di] += point.value;
        }
    }

    let daily_total: Vec<f64> = (0..dates.len())
        .map(|di| pivot.iter().map(|row| row[di]).sum())
        .collect();

    let series: Vec<SeriesEntry> = ranked
        .into_iter()
        .zip(pivot)
        .map(|(name, data_cost)| {
            let data_pct = data_cost
                .iter()
                .zip(&daily_total)
                .map(|(v, t)| if *t == 0.0 { 0.0 } else { v / t * 100.0 })
                .collect();
            SeriesEntry {
                name,
                data_pct,
                data_cost,
            }
        })
        .collect();

    StackedSeries {
        dates: dates.to_vec(),
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_point(key: &str, date: &str, value: f64) -> CostPoint {
        CostPoint {
            key: key.to_string(),
            date: date.to_string(),
            value,
        }
    }

    fn make_dates(dates: &[&str]) -> Vec<String> {
        dates.iter().map(|d| d.to_string()).collect()
    }

    // ========== date_range ==========

    #[test]
    fn test_date_range_inclusive() {
        let dates = date_range("2024-01-01", "2024-01-03").unwrap();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn test_date_range_single_day() {
        let dates = date_range("2024-06-15", "2024-06-15").unwrap();
        assert_eq!(dates, vec!["2024-06-15"]);
    }

    #[test]
    fn test_date_range_crosses_month() {
        let dates = date_range("2024-01-31", "2024-02-01").unwrap();
        assert_eq!(dates, vec!["2024-01-31", "2024-02-01"]);
    }

    #[test]
    fn test_date_range_end_before_start_is_empty() {
        let dates = date_range("2024-01-10", "2024-01-01").unwrap();
        assert!(dates.is_empty());
    }

    #[test]
    fn test_date_range_invalid_date_is_error() {
        let err = date_range("2024-13-40", "2024-01-01").unwrap_err();
        assert!(matches!(err, SpendError::Parse(_)));
    }

    // ========== build_stacked ==========

    #[test]
    fn test_two_day_shares() {
        let dates = make_dates(&["2024-01-01", "2024-01-02"]);
        let points = vec![
            make_point("A", "2024-01-01", 80.0),
            make_point("B", "2024-01-01", 20.0),
            make_point("A", "2024-01-02", 0.0),
        ];
        let chart = build_stacked(&dates, &points, 2);
        assert_eq!(chart.dates, dates);
        assert_eq!(chart.series.len(), 2);

        let a = &chart.series[0];
        assert_eq!(a.name, "A");
        assert_eq!(a.data_cost, vec![80.0, 0.0]);
        assert!((a.data_pct[0] - 80.0).abs() < 1e-9);
        // zero daily total shows 0%, not NaN
        assert_eq!(a.data_pct[1], 0.0);

        let b = &chart.series[1];
        assert_eq!(b.name, "B");
        assert_eq!(b.data_cost, vec![20.0, 0.0]);
        assert!((b.data_pct[0] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_one_recomputes_share_among_selected() {
        let dates = make_dates(&["2024-01-01", "2024-01-02"]);
        let points = vec![
            make_point("A", "2024-01-01", 80.0),
            make_point("B", "2024-01-01", 20.0),
        ];
        let chart = build_stacked(&dates, &points, 1);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].name, "A");
        // share among the selected keys only: 80/80, not 80/100
        assert!((chart.series[0].data_pct[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_rows_invariant() {
        let dates = make_dates(&["2024-01-01", "2024-01-02"]);
        let chart = build_stacked(&dates, &[], 5);
        assert_eq!(chart.dates, dates);
        assert!(chart.series.is_empty());
    }

    #[test]
    fn test_all_points_filtered_is_empty_series() {
        let dates = make_dates(&["2024-01-01"]);
        let points = vec![
            make_point("", "2024-01-01", 5.0),
            make_point("A", "2024-01-01", 0.0),
            make_point("B", "2024-01-01", -1.0),
        ];
        let chart = build_stacked(&dates, &points, 5);
        assert!(chart.series.is_empty());
    }

    #[test]
    fn test_rank_order_by_total() {
        let dates = make_dates(&["2024-01-01", "2024-01-02"]);
        let points = vec![
            make_point("A", "2024-01-01", 3.0),
            make_point("B", "2024-01-01", 10.0),
            make_point("A", "2024-01-02", 4.0),
        ];
        let chart = build_stacked(&dates, &points, 5);
        assert_eq!(chart.series[0].name, "B");
        assert_eq!(chart.series[1].name, "A");
    }

    #[test]
    fn test_tied_totals_keep_input_order() {
        let dates = make_dates(&["2024-01-01"]);
        let points = vec![
            make_point("Zeta", "2024-01-01", 5.0),
            make_point("Alpha", "2024-01-01", 5.0),
        ];
        let chart = build_stacked(&dates, &points, 2);
        assert_eq!(chart.series[0].name, "Zeta");
        assert_eq!(chart.series[1].name, "Alpha");
    }

    #[test]
    fn test_out_of_range_dates_rank_but_do_not_display() {
        let dates = make_dates(&["2024-01-02"]);
        let points = vec![
            make_point("A", "2024-01-01", 100.0),
            make_point("A", "2024-01-02", 1.0),
            make_point("B", "2024-01-02", 2.0),
        ];
        let chart = build_stacked(&dates, &points, 1);
        // A outranks B on full-input totals even though most of its
        // spend falls outside the displayed range
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].name, "A");
        assert_eq!(chart.series[0].data_cost, vec![1.0]);
        assert!((chart.series[0].data_pct[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_key_same_date_sums() {
        let dates = make_dates(&["2024-01-01"]);
        let points = vec![
            make_point("A", "2024-01-01", 2.0),
            make_point("A", "2024-01-01", 3.0),
        ];
        let chart = build_stacked(&dates, &points, 1);
        assert_eq!(chart.series[0].data_cost, vec![5.0]);
    }

    #[test]
    fn test_top_n_zero_keeps_dates() {
        let dates = make_dates(&["2024-01-01"]);
        let points = vec![make_point("A", "2024-01-01", 5.0)];
        let chart = build_stacked(&dates, &points, 0);
        assert_eq!(chart.dates, dates);
        assert!(chart.series.is_empty());
    }

    #[test]
    fn test_shares_sum_to_hundred() {
        let dates = make_dates(&["2024-01-01"]);
        let points = vec![
            make_point("A", "2024-01-01", 30.0),
            make_point("B", "2024-01-01", 70.0),
        ];
        let chart = build_stacked(&dates, &points, 2);
        let total: f64 = chart.series.iter().map(|s| s.data_pct[0]).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
