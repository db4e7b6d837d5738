//! Domain vocabulary for zimplay: fingerprints, jobs, artifact names and
//! the shared error type.

pub mod error;
pub mod fingerprint;
pub mod job;

pub use fingerprint::Fingerprint;
pub use job::{Job, JobState};
