//! Performance row sources
//!
//! Each source yields flat performance rows from one backing export; the
//! report and dashboard aggregate across whatever sources are configured.

mod jsonl;

pub use jsonl::JsonlSource;

use crate::types::{PerformanceRow, Result};
use rayon::prelude::*;

/// A provider of performance rows for the report pipeline
pub trait PerformanceSource: Send + Sync {
    /// Source label used in warnings
    fn name(&self) -> &str;

    /// Produce all rows this source knows about
    fn fetch_rows(&self) -> Result<Vec<PerformanceRow>>;
}

/// Collect rows from every source in parallel. A failing source logs a
/// warning and contributes nothing; one bad source never aborts the
/// report.
pub fn collect_rows(sources: &[Box<dyn PerformanceSource>]) -> Vec<PerformanceRow> {
    sources
        .par_iter()
        .flat_map(|source| match source.fetch_rows() {
            Ok(rows) => rows,
            Err(e) => {
                eprintln!(
                    "[spendstack] Warning: source {} failed: {}",
                    source.name(),
                    e
                );
                Vec::new()
            }
        })
        .collect()
}
