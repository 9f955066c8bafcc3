use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

/// Runs blocking jobs on Tokio's blocking threads so async request handling
/// is never stalled.
///
/// At most `worker_threads` jobs execute at once and at most `max_pending`
/// more wait for a worker; anything beyond that is rejected immediately with
/// [`OffloadError::Saturated`]. Each job receives a [`CancellationToken`] that
/// fires when the caller stops waiting, either because its future was dropped
/// or because the deadline passed. A job that ignores the token still runs to
/// completion and keeps its worker slot until it returns.
#[derive(Clone)]
pub struct OffloadPool {
    workers: Arc<Semaphore>,
    admission: Arc<Semaphore>,
    capacity: usize,
    timeout: Option<Duration>,
}

impl OffloadPool {
    pub fn new(worker_threads: usize, max_pending: usize, timeout: Option<Duration>) -> Self {
        let worker_threads = worker_threads.max(1);
        let capacity = worker_threads + max_pending;
        Self {
            workers: Arc::new(Semaphore::new(worker_threads)),
            admission: Arc::new(Semaphore::new(capacity)),
            capacity,
            timeout,
        }
    }

    /// Number of further jobs the pool would currently accept.
    pub fn available_slots(&self) -> usize {
        self.admission.available_permits()
    }

    pub async fn run<F, R>(&self, job: F) -> Result<R, OffloadError>
    where
        F: FnOnce(&CancellationToken) -> R + Send + 'static,
        R: Send + 'static,
    {
        let admission = Arc::clone(&self.admission)
            .try_acquire_owned()
            .map_err(|_| OffloadError::Saturated {
                capacity: self.capacity,
            })?;

        let cancel = CancellationToken::new();
        let job_cancel = cancel.clone();
        let cancel_on_drop = cancel.drop_guard();

        let workers = Arc::clone(&self.workers);
        let execution = async move {
            let worker = workers
                .acquire_owned()
                .await
                .map_err(|_| OffloadError::Closed)?;

            let span = tracing::Span::current();
            tokio::task::spawn_blocking(move || {
                let _permits = (admission, worker);
                let _entered = span.enter();
                job(&job_cancel)
            })
            .await
            .map_err(OffloadError::from_join)
        };

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, execution)
                .await
                .unwrap_or(Err(OffloadError::TimedOut(limit))),
            None => execution.await,
        };

        if let Err(OffloadError::TimedOut(limit)) = &result {
            tracing::warn!(
                timeout_secs = limit.as_secs_f64(),
                "Offloaded job exceeded its deadline, cancelling"
            );
            return result;
        }

        cancel_on_drop.disarm();
        result
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OffloadError {
    #[error("worker pool saturated: {capacity} jobs already outstanding")]
    Saturated { capacity: usize },
    #[error("job did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("job panicked: {0}")]
    Panicked(String),
    #[error("worker pool is shut down")]
    Closed,
}

impl OffloadError {
    fn from_join(err: JoinError) -> Self {
        if err.is_panic() {
            Self::Panicked(panic_message(err.into_panic()))
        } else {
            Self::Closed
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
