//! Record filtering and aggregation.
//!
//! `filter` decides the fate of each element; `aggregator` folds the
//! decisions into records and totals.

pub mod aggregator;
pub mod filter;

pub use aggregator::*;
