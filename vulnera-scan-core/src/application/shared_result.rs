//! Single-assignment asynchronous results
//!
//! Every result exposed by the orchestration layer is a [`SharedResult`]: it
//! is settled at most once and can be cloned and awaited by any number of
//! readers, all of which observe the same value.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::domain::ScanError;

/// A memoized, cloneable asynchronous result
pub type SharedResult<T> = Shared<BoxFuture<'static, Result<T, ScanError>>>;

/// Wrap a spawned task so it settles exactly once.
///
/// A task that already finished wins over a cancellation that arrives later,
/// so results that completed successfully stay successful after a hangup.
pub(crate) fn settle<T>(
    task: JoinHandle<Result<T, ScanError>>,
    cancel: CancellationToken,
) -> SharedResult<T>
where
    T: Clone + Send + Sync + 'static,
{
    async move {
        tokio::select! {
            biased;
            joined = task => match joined {
                Ok(result) => result,
                Err(err) if err.is_panic() => {
                    error!(error = %err, "Scan task panicked");
                    Err(ScanError::Internal(format!("Scan task panicked: {}", err)))
                }
                Err(err) => Err(ScanError::Cancelled {
                    message: format!("Scan task terminated: {}", err),
                }),
            },
            _ = cancel.cancelled() => Err(ScanError::hung_up()),
        }
    }
    .boxed()
    .shared()
}

/// Keep `guard` alive until `result` settles or the returned future is dropped
pub(crate) fn holding<T, G>(result: SharedResult<T>, guard: G) -> SharedResult<T>
where
    T: Clone + Send + Sync + 'static,
    G: Send + 'static,
{
    async move {
        let settled = result.await;
        drop(guard);
        settled
    }
    .boxed()
    .shared()
}

/// A result that is already settled with an error
pub(crate) fn settled_err<T>(err: ScanError) -> SharedResult<T>
where
    T: Clone + Send + Sync + 'static,
{
    futures::future::ready(Err(err)).boxed().shared()
}
