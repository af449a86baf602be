//! Poll a remote scan until it reaches a terminal state

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::shared_result::{SharedResult, settle};
use crate::domain::{Scan, ScanError, ScanStatus, ScanTransport};

/// Waits for a single remote scan to finish.
///
/// Polling is an explicit loop inside one task: fetch a snapshot, stop on a
/// terminal state, otherwise sleep for the fixed delay and fetch again. Polls
/// never overlap and transport errors are never retried.
pub struct AwaitScan {
    transport: Arc<dyn ScanTransport>,
    organization_id: String,
    project_id: String,
    scan_id: String,
    delay: Duration,
}

impl AwaitScan {
    pub fn new(
        transport: Arc<dyn ScanTransport>,
        organization_id: impl Into<String>,
        project_id: impl Into<String>,
        scan_id: impl Into<String>,
        delay: Duration,
    ) -> Result<Self, ScanError> {
        let organization_id = organization_id.into();
        let project_id = project_id.into();
        let scan_id = scan_id.into();

        for (field, value) in [
            ("organization id", &organization_id),
            ("project id", &project_id),
            ("scan id", &scan_id),
        ] {
            if value.trim().is_empty() {
                return Err(ScanError::precondition(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }

        Ok(Self {
            transport,
            organization_id,
            project_id,
            scan_id,
            delay,
        })
    }

    /// Await an already validated scan snapshot
    pub fn for_scan(transport: Arc<dyn ScanTransport>, scan: &Scan, delay: Duration) -> Self {
        Self {
            transport,
            organization_id: scan.organization_id().to_string(),
            project_id: scan.project_id().to_string(),
            scan_id: scan.id().to_string(),
            delay,
        }
    }

    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    /// Run the poll loop on `scheduler` and return its shared result.
    ///
    /// Cancelling `cancel` stops the loop before its next transport call and
    /// settles the result with a cancellation error.
    pub fn spawn(self, scheduler: &Handle, cancel: CancellationToken) -> SharedResult<Scan> {
        let task = scheduler.spawn(self.run(cancel.clone()));
        settle(task, cancel)
    }

    /// Poll until the scan is terminal, a poll fails, or `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<Scan, ScanError> {
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(scan_id = %self.scan_id, "Poll skipped, scan wait was cancelled");
                return Err(ScanError::hung_up());
            }

            attempt = next_attempt(attempt);
            let polled = self
                .transport
                .get_scan_by_id(&self.organization_id, &self.project_id, &self.scan_id)
                .await;

            // An in-flight poll may finish after a hangup; its result is dropped
            if cancel.is_cancelled() {
                debug!(
                    scan_id = %self.scan_id,
                    attempt,
                    "Discarding poll result, scan wait was cancelled"
                );
                return Err(ScanError::hung_up());
            }

            let snapshot = polled.map_err(|e| {
                warn!(scan_id = %self.scan_id, attempt, error = %e, "Failed to poll scan status");
                ScanError::from(e)
            })?;

            match snapshot.status() {
                ScanStatus::Completed => {
                    info!(scan_id = %self.scan_id, attempt, "Scan completed");
                    return Ok(snapshot);
                }
                ScanStatus::Failed => {
                    warn!(
                        scan_id = %self.scan_id,
                        error = ?snapshot.error_message(),
                        "Scan failed remotely"
                    );
                    return Err(ScanError::failed(snapshot.error_message()));
                }
                ScanStatus::Cancelled => {
                    warn!(scan_id = %self.scan_id, "Scan was cancelled remotely");
                    return Err(ScanError::cancelled(snapshot.error_message()));
                }
                ScanStatus::Waiting | ScanStatus::Running => {
                    debug!(
                        scan_id = %self.scan_id,
                        attempt,
                        status = %snapshot.status(),
                        delay_ms = self.delay.as_millis() as u64,
                        "Scan still in progress"
                    );
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(scan_id = %self.scan_id, "Scan wait cancelled between polls");
                    return Err(ScanError::hung_up());
                }
                _ = pause(self.delay) => {}
            }
        }
    }
}

/// Attempt counter for logs; stays at the maximum instead of overflowing
fn next_attempt(attempt: u32) -> u32 {
    attempt.saturating_add(1)
}

/// Sleep for `delay`; a zero delay only yields back to the scheduler.
async fn pause(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}
