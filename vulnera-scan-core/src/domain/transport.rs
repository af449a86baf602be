//! Scan Transport abstraction
//!
//! The orchestration core only ever talks to the service through this trait,
//! so it never builds HTTP requests itself and tests can script the service.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use super::error::TransportError;
use super::scan::{CodeArtifactId, Scan};
use super::summary::ScanSummary;

/// The remote operations a scan needs
#[async_trait]
pub trait ScanTransport: Send + Sync {
    /// Upload the artifact at `path` and return its identifier
    async fn create_code_artifact(
        &self,
        organization_id: &str,
        project_id: &str,
        path: &Path,
    ) -> Result<CodeArtifactId, TransportError>;

    /// Start a scan of an uploaded artifact; the returned scan is `WAITING`
    async fn start_scan(
        &self,
        organization_id: &str,
        project_id: &str,
        artifact_id: &CodeArtifactId,
        label: &str,
    ) -> Result<Scan, TransportError>;

    /// Fetch the latest snapshot of a scan
    async fn get_scan_by_id(
        &self,
        organization_id: &str,
        project_id: &str,
        scan_id: &str,
    ) -> Result<Scan, TransportError>;

    /// Fetch the summary of a completed scan
    async fn get_scan_summary(
        &self,
        organization_id: &str,
        project_id: &str,
        scan_id: &str,
    ) -> Result<ScanSummary, TransportError>;

    /// Fetch the raw SARIF output of a completed scan
    async fn get_sarif(
        &self,
        organization_id: &str,
        project_id: &str,
        scan_id: &str,
    ) -> Result<Bytes, TransportError>;
}
