//! Input/output helpers.
//!
//! - CSV ingest + normalization (`ingest`)
//! - filtered record exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
