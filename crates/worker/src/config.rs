use std::path::PathBuf;
use std::time::Duration;

/// How the solver is invoked for every job.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Solver executable, either a path or a name looked up on `PATH`.
    pub executable: PathBuf,
    /// Time limit handed to the solver, in seconds.
    pub time_limit_secs: u64,
    /// Memory limit handed to the solver, in megabytes.
    pub memory_limit_mb: u64,
    /// Wall-clock bound enforced by the supervisor itself. `None` leaves
    /// runaway jobs to the solver's own limits.
    pub wall_timeout: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("scip"),
            time_limit_secs: 180,
            memory_limit_mb: 100,
            wall_timeout: None,
        }
    }
}
