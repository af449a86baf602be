//! Handle over a started remote scan
//!
//! A [`ScanOperation`] owns the one poll loop driving a scan and the derived
//! results that become available once it completes:
//!
//! ```text
//!                 ┌──────────────► summary()  ── get_scan_summary
//! poll loop ──► completion
//!                 └──────────────► sarif()    ── get_sarif
//! ```
//!
//! Derived results are created lazily on first access and memoized, so
//! repeated calls share one transport call. `hangup()` stops the poll loop and
//! settles everything that has not already succeeded with a cancellation
//! error.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::runtime::Handle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use super::await_scan::AwaitScan;
use super::shared_result::{SharedResult, holding, settle, settled_err};
use crate::domain::{Scan, ScanError, ScanSummary, ScanTransport, TransportError};

/// Handle returned once a scan has been started.
///
/// Cloning is cheap and every clone refers to the same operation. Results
/// returned by the accessors keep the operation alive until they settle; once
/// no handle and no pending result is left the poll loop is stopped.
#[derive(Clone)]
pub struct ScanOperation {
    inner: Arc<OperationInner>,
}

struct OperationInner {
    scheduler: Handle,
    transport: Arc<dyn ScanTransport>,
    scan: Scan,
    cancel: CancellationToken,
    completion: SharedResult<Scan>,
    state: Mutex<OperationState>,
    /// Cancels `cancel` when the last owner goes away
    keep_alive: Arc<DropGuard>,
}

/// Everything `hangup()` and the accessors race on
struct OperationState {
    active: bool,
    summary: Option<SharedResult<ScanSummary>>,
    sarif: Option<SharedResult<Bytes>>,
}

impl ScanOperation {
    /// Start polling `scan` on `scheduler` every `poll_interval`.
    pub fn create(
        scheduler: Handle,
        transport: Arc<dyn ScanTransport>,
        scan: Scan,
        poll_interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let completion = AwaitScan::for_scan(transport.clone(), &scan, poll_interval)
            .spawn(&scheduler, cancel.clone());

        info!(
            scan_id = %scan.id(),
            organization_id = %scan.organization_id(),
            project_id = %scan.project_id(),
            poll_interval_ms = poll_interval.as_millis() as u64,
            "Polling scan status"
        );

        let keep_alive = Arc::new(cancel.clone().drop_guard());

        Self {
            inner: Arc::new(OperationInner {
                scheduler,
                transport,
                scan,
                cancel,
                completion,
                keep_alive,
                state: Mutex::new(OperationState {
                    active: true,
                    summary: None,
                    sarif: None,
                }),
            }),
        }
    }

    /// Identifier of the remote scan
    pub fn id(&self) -> &str {
        self.inner.scan.id()
    }

    /// The snapshot the operation was created from
    pub fn scan(&self) -> &Scan {
        &self.inner.scan
    }

    /// Whether `hangup()` has not been called yet
    pub fn is_active(&self) -> bool {
        self.inner.lock_state().active
    }

    /// Resolves with the terminal `COMPLETED` snapshot
    pub fn completion(&self) -> SharedResult<Scan> {
        self.inner.hold(self.inner.completion.clone())
    }

    /// Resolves with the scan summary once the scan completed
    pub fn summary(&self) -> SharedResult<ScanSummary> {
        let mut state = self.inner.lock_state();
        if let Some(summary) = &state.summary {
            return self.inner.hold(summary.clone());
        }

        let summary = if state.active {
            self.inner
                .spawn_derived("summary", |transport, scan| async move {
                    transport
                        .get_scan_summary(scan.organization_id(), scan.project_id(), scan.id())
                        .await
                })
        } else {
            settled_err(ScanError::hung_up())
        };

        state.summary = Some(summary.clone());
        self.inner.hold(summary)
    }

    /// Resolves with the raw SARIF output once the scan completed
    pub fn sarif(&self) -> SharedResult<Bytes> {
        let mut state = self.inner.lock_state();
        if let Some(sarif) = &state.sarif {
            return self.inner.hold(sarif.clone());
        }

        let sarif = if state.active {
            self.inner
                .spawn_derived("sarif", |transport, scan| async move {
                    transport
                        .get_sarif(scan.organization_id(), scan.project_id(), scan.id())
                        .await
                })
        } else {
            settled_err(ScanError::hung_up())
        };

        state.sarif = Some(sarif.clone());
        self.inner.hold(sarif)
    }

    /// Write the raw SARIF output to `path`.
    ///
    /// Nothing is created on disk when fetching the output fails.
    pub async fn save_sarif_to_file(&self, path: impl AsRef<Path>) -> Result<(), ScanError> {
        let sarif = self.sarif().await?;
        write_atomically(path.as_ref(), &sarif).await?;
        info!(scan_id = %self.id(), path = %path.as_ref().display(), bytes = sarif.len(), "Saved SARIF output");
        Ok(())
    }

    /// Write the scan summary to `path` as pretty-printed JSON.
    ///
    /// Nothing is created on disk when fetching the summary fails.
    pub async fn save_results_to_file(&self, path: impl AsRef<Path>) -> Result<(), ScanError> {
        let summary = self.summary().await?;
        let json = serde_json::to_vec_pretty(&summary)
            .map_err(|e| ScanError::Io(format!("Failed to serialize summary: {}", e)))?;
        write_atomically(path.as_ref(), &json).await?;
        info!(scan_id = %self.id(), path = %path.as_ref().display(), "Saved scan summary");
        Ok(())
    }

    /// Stop polling and fail every result that has not already succeeded.
    ///
    /// Idempotent. No transport call is issued after this returns, except one
    /// that was already in flight, whose result is discarded.
    pub fn hangup(&self) {
        self.inner.hangup();
    }
}

impl std::fmt::Debug for ScanOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanOperation")
            .field("scan", &self.inner.scan)
            .field("active", &self.is_active())
            .finish()
    }
}

impl OperationInner {
    fn lock_state(&self) -> MutexGuard<'_, OperationState> {
        // State stays consistent even if a holder panicked: every write is a
        // single field assignment
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand out `result` so it keeps the operation alive while pending
    fn hold<T>(&self, result: SharedResult<T>) -> SharedResult<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        holding(result, self.keep_alive.clone())
    }

    fn hangup(&self) {
        let mut state = self.lock_state();
        if !state.active {
            return;
        }
        state.active = false;
        self.cancel.cancel();
        info!(scan_id = %self.scan.id(), "Scan operation hung up");
    }

    /// Spawn a fetch that runs once the scan completed successfully
    fn spawn_derived<T, F, Fut>(&self, kind: &'static str, fetch: F) -> SharedResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Arc<dyn ScanTransport>, Scan) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let completion = self.completion.clone();
        let transport = self.transport.clone();
        let cancel = self.cancel.clone();

        let task = self.scheduler.spawn({
            let cancel = cancel.clone();
            async move {
                let scan = completion.await?;
                if cancel.is_cancelled() {
                    return Err(ScanError::hung_up());
                }

                debug!(scan_id = %scan.id(), kind, "Fetching scan result");
                let scan_id = scan.id().to_string();

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ScanError::hung_up()),
                    fetched = fetch(transport, scan) => fetched.map_err(|e| {
                        warn!(scan_id = %scan_id, kind, error = %e, "Failed to fetch scan result");
                        ScanError::from(e)
                    }),
                }
            }
        });

        settle(task, cancel)
    }
}

/// Write `contents` next to `path` and rename into place.
async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), ScanError> {
    let partial = partial_path(path)?;

    if let Err(e) = tokio::fs::write(&partial, contents).await {
        remove_partial(&partial).await;
        return Err(ScanError::Io(format!("{}: {}", path.display(), e)));
    }

    if let Err(e) = tokio::fs::rename(&partial, path).await {
        remove_partial(&partial).await;
        return Err(ScanError::Io(format!("{}: {}", path.display(), e)));
    }

    Ok(())
}

fn partial_path(path: &Path) -> Result<PathBuf, ScanError> {
    let file_name = path.file_name().ok_or_else(|| {
        ScanError::precondition(format!("{} is not a file path", path.display()))
    })?;
    let mut partial = file_name.to_os_string();
    partial.push(".part");
    Ok(path.with_file_name(partial))
}

async fn remove_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %partial.display(), error = %e, "Failed to remove partial results file");
        }
    }
}
