//! The long-lived dispatch loop.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;
use zimplay_core::Job;

use crate::limiter::{Limiter, SlotPermit};
use crate::queue::JobReceiver;

/// Executes one dispatched job.
///
/// Implementations own `permit` for the duration of the run; the slot is
/// released when it is dropped.
pub trait JobRunner: Send + Sync + 'static {
    fn run(&self, job: Job, permit: SlotPermit) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Concurrency limiter closed unexpectedly")]
    LimiterClosed,
}

/// Drains the submission queue, one limiter slot per job.
pub struct Dispatcher<R> {
    receiver: JobReceiver,
    limiter: Limiter,
    runner: Arc<R>,
    tracker: TaskTracker,
}

impl<R: JobRunner> Dispatcher<R> {
    pub fn new(receiver: JobReceiver, limiter: Limiter, runner: Arc<R>) -> Self {
        Self {
            receiver,
            limiter,
            runner,
            tracker: TaskTracker::new(),
        }
    }

    /// Tracker of the per-job tasks, for waiting on in-flight jobs at
    /// shutdown.
    pub fn tracker(&self) -> TaskTracker {
        self.tracker.clone()
    }

    /// Run until `cancel` fires or the queue is closed.
    ///
    /// A slot is acquired before each dequeue, so a job never sits dequeued
    /// while waiting for capacity.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), DispatchError> {
        tracing::info!(process_limit = self.limiter.capacity(), "Dispatcher started");

        loop {
            let mut permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = self.limiter.acquire() => {
                    permit.map_err(|_| DispatchError::LimiterClosed)?
                }
            };

            let job = tokio::select! {
                _ = cancel.cancelled() => break,
                job = self.receiver.dequeue() => match job {
                    Some(job) => job,
                    None => {
                        tracing::info!("Submission queue closed");
                        break;
                    }
                },
            };

            permit.activate();
            tracing::debug!(
                fingerprint = %job.fingerprint,
                running = self.limiter.running(),
                "Dispatching job"
            );

            let span = tracing::info_span!("job", fingerprint = %job.fingerprint);
            let runner = Arc::clone(&self.runner);
            self.tracker
                .spawn(async move { runner.run(job, permit).await }.instrument(span));
        }

        self.tracker.close();
        tracing::info!(in_flight = self.tracker.len(), "Dispatcher stopped");
        Ok(())
    }
}
