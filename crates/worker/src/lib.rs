//! Solver process supervision.
//!
//! [`ProcessSupervisor`] runs the external solver for one job inside the
//! job's storage directory, funnels its output into the job log and
//! publishes the solution artifact when the run succeeds.

pub mod config;
pub mod invocation;
pub mod supervisor;

pub use config::SolverConfig;
pub use supervisor::{JobOutcome, ProcessSupervisor};
