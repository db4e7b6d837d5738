//! Counting admission gate for solver processes.
//!
//! A [`SlotPermit`] is one checked-out slot. Dropping it returns the slot, so
//! every execution path releases exactly once. The dispatcher takes a slot
//! before it knows which job will use it; a permit only counts as a running
//! job once it is [activated](SlotPermit::activate) at hand-off.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity semaphore with usage counters.
#[derive(Debug, Clone)]
pub struct Limiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// One checked-out limiter slot.
#[derive(Debug)]
pub struct SlotPermit {
    // Dropped after `Drop::drop` runs, so `running` is decremented before
    // the semaphore slot becomes available again.
    _permit: OwnedSemaphorePermit,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    active: bool,
}

impl Limiter {
    /// Create a limiter with `capacity` slots. A capacity of zero is raised
    /// to one, since a limiter without slots could never dispatch anything.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait until a slot is free and take it.
    pub async fn acquire(&self) -> Result<SlotPermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        Ok(SlotPermit {
            _permit: permit,
            running: Arc::clone(&self.running),
            peak: Arc::clone(&self.peak),
            active: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs currently holding an activated slot.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Highest number of jobs ever running at once.
    pub fn peak_running(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Slots neither running a job nor reserved by the dispatcher.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl SlotPermit {
    /// Mark the slot as used by a job. Idempotent.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        if self.active {
            self.running.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
