//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the normalized billing row (`Record`)
//! - calendar helpers for the period selector (`YearMonth`, `parse_period_date`)
//! - the period matching mode (`PeriodMatch`)

pub mod types;

pub use types::*;
