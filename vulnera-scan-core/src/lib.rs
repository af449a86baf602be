//! Vulnera Scan Core - remote artifact scan orchestration
//!
//! Uploads a build artifact to the analysis service, starts a scan of it and
//! tracks the scan until its results can be collected.
//!
//! # Modules
//!
//! - [`domain`]: Scan snapshots, summaries, errors and the [`ScanTransport`] seam
//! - [`application`]: Polling ([`AwaitScan`]), result handles ([`ScanOperation`]) and the [`ArtifactScanner`] entry point
//! - [`infrastructure`]: The reqwest-backed [`HttpScanTransport`]
//! - [`config`]: Layered configuration with TOML and environment variable support
//! - [`logging`]: Structured logging with tracing
//!
//! # Lifecycle
//!
//! ```text
//! scan_artifact ──► create_code_artifact ──► start_scan ──► ScanOperation
//!                                                              │
//!                                              poll get_scan_by_id until terminal
//!                                                              │
//!                                              summary() / sarif() on COMPLETED
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vulnera_scan_core::{ArtifactScanner, HttpScanTransport, ScanConfig};
//!
//! let config = ScanConfig::load()?;
//! let transport = Arc::new(HttpScanTransport::from_config(&config.service)?);
//! let scanner = ArtifactScanner::new(
//!     tokio::runtime::Handle::current(),
//!     transport,
//!     &config.service.organization_id,
//!     &config.service.project_id,
//!     config.polling.interval(),
//! )?;
//!
//! let operation = scanner.scan_artifact("target/app.jar", "nightly").await?;
//! let summary = operation.summary().await?;
//! operation.save_sarif_to_file("results.sarif").await?;
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use application::{ArtifactScanner, AwaitScan, ScanOperation, SharedResult};
pub use config::{ConfigLoadError, ScanConfig};
pub use domain::{
    CodeArtifactId, Scan, ScanError, ScanStatus, ScanSummary, ScanTransport, TransportError,
};
pub use infrastructure::HttpScanTransport;
pub use logging::init_tracing;
