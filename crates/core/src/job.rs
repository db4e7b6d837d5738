//! Job and artifact vocabulary shared by the store, pipeline and worker.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

// ---------------------------------------------------------------------------
// Artifact names
// ---------------------------------------------------------------------------

/// Submitted model text. Written once, never mutated.
pub const MODEL_FILENAME: &str = "model.zpl";

/// Solver solution. Present only after a successful run.
pub const SOLUTION_FILENAME: &str = "solution.sol";

/// Name the solver writes to; renamed to [`SOLUTION_FILENAME`] on success.
pub const SOLUTION_TMP_FILENAME: &str = "solution.sol.tmp";

/// Combined stdout/stderr transcript of the solver process.
pub const LOG_FILENAME: &str = "output.log";

// ---------------------------------------------------------------------------
// Log markers
// ---------------------------------------------------------------------------

/// Prefix of the line appended when the solver exits with a nonzero code.
pub const EXIT_CODE_MARKER: &str = "Terminated with return code";

/// Prefix of the line appended when the solver is killed by a signal.
pub const SIGNAL_MARKER: &str = "Terminated by signal";

/// Prefix of the line appended when the solver could not be started.
pub const SPAWN_FAILURE_MARKER: &str = "Failed to start solver";

/// Prefix of the line appended when the supervisor kills an overdue solver.
pub const DEADLINE_MARKER: &str = "Killed after exceeding wall-clock deadline";

/// Prefix of the line appended when the solver exits cleanly but leaves no
/// solution behind.
pub const NO_SOLUTION_MARKER: &str = "Solver finished without writing a solution";

/// Prefix of the line appended when a still-running solver is killed
/// because the server is shutting down.
pub const SHUTDOWN_MARKER: &str = "Killed at server shutdown";

/// Prefix of the line appended when the supervisor loses track of the
/// solver (log or process handle errors).
pub const SUPERVISION_FAILURE_MARKER: &str = "Supervisor failed";

const FAILURE_MARKERS: [&str; 7] = [
    EXIT_CODE_MARKER,
    SIGNAL_MARKER,
    SPAWN_FAILURE_MARKER,
    DEADLINE_MARKER,
    NO_SOLUTION_MARKER,
    SHUTDOWN_MARKER,
    SUPERVISION_FAILURE_MARKER,
];

/// Whether a log transcript records a terminal failure.
///
/// Markers are always written at the start of a line by the supervisor.
pub fn log_records_failure(log: &str) -> bool {
    log.lines()
        .any(|line| FAILURE_MARKERS.iter().any(|m| line.starts_with(m)))
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One unit of work: a stored model awaiting or undergoing execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub fingerprint: Fingerprint,
    /// Storage directory holding the job's artifacts.
    pub dir: PathBuf,
}

impl Job {
    pub fn new(fingerprint: Fingerprint, dir: impl Into<PathBuf>) -> Self {
        Self {
            fingerprint,
            dir: dir.into(),
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILENAME)
    }

    pub fn solution_path(&self) -> PathBuf {
        self.dir.join(SOLUTION_FILENAME)
    }

    pub fn solution_tmp_path(&self) -> PathBuf {
        self.dir.join(SOLUTION_TMP_FILENAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILENAME)
    }
}

/// Lifecycle state, inferred from which artifacts exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Model stored, execution not started yet.
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    /// Infer the state from the artifacts currently present.
    pub fn infer(solution: Option<&str>, log: Option<&str>) -> Self {
        match (solution, log) {
            (Some(_), _) => JobState::Completed,
            (None, Some(log)) if log_records_failure(log) => JobState::Failed,
            (None, Some(_)) => JobState::Running,
            (None, None) => JobState::Queued,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Running => write!(f, "running"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}
