//! Plain-text charts for the one-shot commands.

pub mod ascii;

pub use ascii::*;
