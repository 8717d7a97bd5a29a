//! Services for fetching, normalizing, and charting spend data

pub mod chart;
pub mod dashboard;
pub mod fetch;
pub mod normalizer;
pub mod report;

pub use chart::{build_stacked, date_range};
pub use dashboard::{build_dashboard, DashboardRequest, DashboardResponse};
pub use fetch::{CreativeCostQuery, ReportingClient};
pub use normalizer::NameNormalizer;
pub use report::ReportAggregator;
