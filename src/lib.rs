//! `dairy-dash` library crate.
//!
//! The binary (`dairy`) is a thin wrapper around this library so that:
//!
//! - ingestion, filtering and aggregation are testable without a terminal
//! - the TUI and the one-shot commands share the same numbers
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod select;
pub mod session;
pub mod tui;
