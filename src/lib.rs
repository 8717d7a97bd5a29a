//! Normalizes creative ad spend exports and reporting API payloads into
//! one row shape, then aggregates them into reports and stacked-100 charts.

pub mod cli;
pub mod parsers;
pub mod services;
pub mod sources;
pub mod types;
