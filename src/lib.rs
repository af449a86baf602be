//! Vulnera Scan - command-line front end for remote artifact scans
//!
//! The orchestration itself lives in `vulnera-scan-core`; this crate wires it
//! to configuration, logging and the `vulnera-scan` binary.

pub mod cli;

pub use cli::{Cli, CliApp, exit_codes};

// Re-export for convenience
pub use vulnera_scan_core;
