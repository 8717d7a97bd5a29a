//! Type definitions for spendstack

mod error;
mod records;

pub use error::*;
pub use records::*;
