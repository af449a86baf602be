//! Upload an artifact and start a remote scan of it

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{error, info, warn};

use super::scan_operation::ScanOperation;
use crate::domain::{ScanError, ScanTransport};

/// Entry point for scanning build artifacts.
///
/// Each call to [`scan_artifact`](Self::scan_artifact) creates exactly one
/// remote artifact and at most one remote scan. Neither step is retried. If
/// starting the scan fails the uploaded artifact is left behind on the
/// service.
pub struct ArtifactScanner {
    scheduler: Handle,
    transport: Arc<dyn ScanTransport>,
    organization_id: String,
    project_id: String,
    poll_interval: Duration,
}

impl ArtifactScanner {
    pub fn new(
        scheduler: Handle,
        transport: Arc<dyn ScanTransport>,
        organization_id: impl Into<String>,
        project_id: impl Into<String>,
        poll_interval: Duration,
    ) -> Result<Self, ScanError> {
        let organization_id = organization_id.into();
        let project_id = project_id.into();

        if organization_id.trim().is_empty() {
            return Err(ScanError::precondition("organization id must not be empty"));
        }
        if project_id.trim().is_empty() {
            return Err(ScanError::precondition("project id must not be empty"));
        }

        Ok(Self {
            scheduler,
            transport,
            organization_id,
            project_id,
            poll_interval,
        })
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Upload `path`, start a scan labelled `label` and return the operation
    /// tracking it. Polling is already running when this returns.
    pub async fn scan_artifact(
        &self,
        path: impl AsRef<Path>,
        label: &str,
    ) -> Result<ScanOperation, ScanError> {
        let path = path.as_ref();
        if label.trim().is_empty() {
            return Err(ScanError::precondition("scan label must not be empty"));
        }

        info!(
            organization_id = %self.organization_id,
            project_id = %self.project_id,
            artifact = %path.display(),
            "Uploading code artifact"
        );

        let artifact_id = self
            .transport
            .create_code_artifact(&self.organization_id, &self.project_id, path)
            .await
            .map_err(|e| {
                error!(artifact = %path.display(), error = %e, "Code artifact upload failed");
                ScanError::from(e)
            })?;

        info!(artifact_id = %artifact_id, label, "Starting scan");

        let scan = self
            .transport
            .start_scan(&self.organization_id, &self.project_id, &artifact_id, label)
            .await
            .map_err(|e| {
                warn!(
                    artifact_id = %artifact_id,
                    error = %e,
                    "Failed to start scan, uploaded artifact is left orphaned"
                );
                ScanError::from(e)
            })?;

        info!(scan_id = %scan.id(), status = %scan.status(), "Scan started");

        Ok(ScanOperation::create(
            self.scheduler.clone(),
            self.transport.clone(),
            scan,
            self.poll_interval,
        ))
    }
}
