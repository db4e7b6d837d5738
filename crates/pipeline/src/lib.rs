//! Job intake and dispatch.
//!
//! Submissions enter an unbounded [`SubmissionQueue`]; a single
//! [`Dispatcher`] drains it, holding one [`Limiter`] slot per running job and
//! handing each job to a [`JobRunner`] on its own task.

pub mod dispatcher;
pub mod limiter;
pub mod queue;

pub use dispatcher::{DispatchError, Dispatcher, JobRunner};
pub use limiter::{Limiter, SlotPermit};
pub use queue::{JobReceiver, QueueError, SubmissionQueue};
