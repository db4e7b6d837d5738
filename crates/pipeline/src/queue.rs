//! Unbounded FIFO submission queue backed by a `tokio::sync::mpsc` channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use zimplay_core::Job;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The dispatcher side has shut down; no job can be accepted.
    #[error("Submission queue is closed")]
    Closed,
}

/// Producer half. Cheap to clone; shared by every request handler.
#[derive(Debug, Clone)]
pub struct SubmissionQueue {
    tx: mpsc::UnboundedSender<Job>,
    depth: Arc<AtomicUsize>,
}

/// Consumer half, owned by the dispatcher.
#[derive(Debug)]
pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<Job>,
    depth: Arc<AtomicUsize>,
}

impl SubmissionQueue {
    /// Create a connected queue/receiver pair.
    pub fn channel() -> (SubmissionQueue, JobReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        (
            SubmissionQueue {
                tx,
                depth: Arc::clone(&depth),
            },
            JobReceiver { rx, depth },
        )
    }

    /// Append a job. Never waits, regardless of how many jobs are pending.
    pub fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        // Count before sending so the receiver never decrements below zero.
        self.depth.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Closed);
        }
        Ok(())
    }

    /// Number of jobs waiting for dispatch.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl JobReceiver {
    /// Wait for the next job in submission order.
    ///
    /// Returns `None` once every [`SubmissionQueue`] handle has been dropped
    /// and the backlog is drained.
    pub async fn dequeue(&mut self) -> Option<Job> {
        let job = self.rx.recv().await?;
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Some(job)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use zimplay_core::Fingerprint;

    use super::*;

    fn job(model: &str) -> Job {
        let fp = Fingerprint::of(model);
        let dir = format!("/results/{fp}");
        Job::new(fp, dir)
    }

    #[tokio::test]
    async fn preserves_submission_order() {
        let (queue, mut rx) = SubmissionQueue::channel();
        for model in ["a", "b", "c"] {
            queue.enqueue(job(model)).unwrap();
        }
        assert_eq!(queue.depth(), 3);

        for model in ["a", "b", "c"] {
            assert_eq!(rx.dequeue().await.unwrap(), job(model));
        }
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn dequeue_ends_when_all_senders_dropped() {
        let (queue, mut rx) = SubmissionQueue::channel();
        queue.enqueue(job("last")).unwrap();
        drop(queue);

        assert!(rx.dequeue().await.is_some());
        assert!(rx.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn enqueue_after_receiver_dropped_fails() {
        let (queue, rx) = SubmissionQueue::channel();
        drop(rx);

        assert!(queue.is_closed());
        assert_matches!(queue.enqueue(job("x")), Err(QueueError::Closed));
        assert_eq!(queue.depth(), 0);
    }
}
