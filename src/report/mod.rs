//! Reporting utilities: terminal tables and number formatting.

pub mod format;

pub use format::*;
