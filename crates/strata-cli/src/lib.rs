//! Strata CLI - command-line driver for the strata lowering pipeline
//!
//! `strata lower` turns a JSON HighIR expression into target source;
//! `strata import` resolves a standard library import and reports the outcome.

pub mod commands;

// Re-export commonly used types for convenience
pub use commands::{run_import, run_lower, ImportOptions, LowerOptions};
