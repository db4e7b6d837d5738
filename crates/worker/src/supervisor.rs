//! Runs one solver process per job and records how it ended.
//!
//! The outcome of a run is written into the job's log artifact; nothing is
//! reported back to the request that submitted the job. [`JobOutcome`] is
//! returned for operator logging and tests only.

use std::io::{ErrorKind, SeekFrom};
use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use zimplay_core::job::{
    DEADLINE_MARKER, EXIT_CODE_MARKER, NO_SOLUTION_MARKER, SHUTDOWN_MARKER, SIGNAL_MARKER,
    SPAWN_FAILURE_MARKER, SUPERVISION_FAILURE_MARKER,
};
use zimplay_core::Job;
use zimplay_pipeline::{JobRunner, SlotPermit};

use crate::config::SolverConfig;
use crate::invocation::solver_command;

/// How a supervised run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Exit code 0 and the solution artifact was published.
    Completed,
    /// Exit code 0 but the solver wrote no solution.
    NoSolution,
    /// The solver exited with a nonzero code.
    Failed { exit_code: i32 },
    /// The solver was terminated by a signal.
    Signaled,
    /// The solver could not be started.
    SpawnFailed { error: String },
    /// The supervisor killed the solver at its wall-clock deadline.
    TimedOut,
    /// The solver was killed because the server is shutting down.
    Interrupted,
    /// The job directory no longer exists.
    Missing,
    /// The log artifact could not be opened or the child could not be
    /// awaited.
    StorageFailed { error: String },
}

/// Supervises solver processes according to a [`SolverConfig`].
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    config: SolverConfig,
    shutdown: CancellationToken,
}

/// How waiting on a spawned solver ended.
enum Ended {
    Exited(std::io::Result<ExitStatus>),
    Deadline(Duration),
    Shutdown,
}

impl ProcessSupervisor {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that kills every running solver when cancelled. Each killed run
    /// records the shutdown in its log.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Execute `job`, holding `permit` until the solver has exited and all
    /// artifacts are settled.
    pub async fn supervise(&self, job: Job, mut permit: SlotPermit) -> JobOutcome {
        permit.activate();
        let outcome = self.execute(&job).await;

        match &outcome {
            JobOutcome::Completed => {
                tracing::info!(dir = %job.dir.display(), "Solver finished");
            }
            JobOutcome::Missing => {
                tracing::warn!(dir = %job.dir.display(), "Job directory vanished, skipping");
            }
            other => {
                tracing::warn!(dir = %job.dir.display(), outcome = ?other, "Solver run failed");
            }
        }

        // Releasing the slot is the last thing a run does.
        drop(permit);
        outcome
    }

    async fn execute(&self, job: &Job) -> JobOutcome {
        match tokio::fs::metadata(&job.dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return JobOutcome::Missing,
        }

        let log_path = job.log_path();
        let log = match open_log(&log_path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::error!(path = %log_path.display(), error = %e, "Cannot open job log");
                append_line(
                    &log_path,
                    &format!("{SUPERVISION_FAILURE_MARKER}: cannot open log: {e}"),
                )
                .await;
                return JobOutcome::StorageFailed {
                    error: e.to_string(),
                };
            }
        };

        let spawned = solver_command(&self.config, &job.dir, log).and_then(|mut cmd| cmd.spawn());
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(
                    dir = %job.dir.display(),
                    executable = %self.config.executable.display(),
                    error = %e,
                    "Solver failed to start"
                );
                append_line(&log_path, &format!("{SPAWN_FAILURE_MARKER}: {e}")).await;
                return JobOutcome::SpawnFailed {
                    error: e.to_string(),
                };
            }
        };

        tracing::info!(dir = %job.dir.display(), pid = ?child.id(), "Solver started");

        let ended = tokio::select! {
            ended = wait_with_deadline(&mut child, self.config.wall_timeout) => ended,
            () = self.shutdown.cancelled() => Ended::Shutdown,
        };

        match ended {
            Ended::Exited(Ok(status)) => self.settle(job, status).await,
            Ended::Exited(Err(e)) => {
                tracing::error!(error = %e, "Failed to wait for solver");
                kill(&mut child).await;
                append_line(&log_path, &format!("{SUPERVISION_FAILURE_MARKER}: {e}")).await;
                discard_partial_solution(job).await;
                JobOutcome::StorageFailed {
                    error: e.to_string(),
                }
            }
            Ended::Deadline(deadline) => {
                kill(&mut child).await;
                append_line(
                    &log_path,
                    &format!("{DEADLINE_MARKER} of {}s!", deadline.as_secs()),
                )
                .await;
                discard_partial_solution(job).await;
                JobOutcome::TimedOut
            }
            Ended::Shutdown => {
                kill(&mut child).await;
                append_line(&log_path, &format!("{SHUTDOWN_MARKER}!")).await;
                discard_partial_solution(job).await;
                JobOutcome::Interrupted
            }
        }
    }

    /// Turn an exit status into artifacts: publish or discard the solution
    /// and append a failure marker where needed.
    async fn settle(&self, job: &Job, status: ExitStatus) -> JobOutcome {
        let log_path = job.log_path();

        if status.success() {
            return match tokio::fs::rename(job.solution_tmp_path(), job.solution_path()).await {
                Ok(()) => JobOutcome::Completed,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    append_line(&log_path, &format!("{NO_SOLUTION_MARKER}!")).await;
                    JobOutcome::NoSolution
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to publish solution");
                    append_line(&log_path, &format!("{NO_SOLUTION_MARKER}: {e}")).await;
                    JobOutcome::StorageFailed {
                        error: e.to_string(),
                    }
                }
            };
        }

        discard_partial_solution(job).await;

        match status.code() {
            Some(exit_code) => {
                append_line(&log_path, &format!("{EXIT_CODE_MARKER} {exit_code}!")).await;
                JobOutcome::Failed { exit_code }
            }
            None => {
                append_line(&log_path, &signal_line(status)).await;
                JobOutcome::Signaled
            }
        }
    }
}

impl JobRunner for ProcessSupervisor {
    async fn run(&self, job: Job, permit: SlotPermit) {
        self.supervise(job, permit).await;
    }
}

/// Wait for the solver to exit, or until `deadline` passes.
async fn wait_with_deadline(child: &mut Child, deadline: Option<Duration>) -> Ended {
    match deadline {
        Some(deadline) => match tokio::time::timeout(deadline, child.wait()).await {
            Ok(result) => Ended::Exited(result),
            Err(_elapsed) => Ended::Deadline(deadline),
        },
        None => Ended::Exited(child.wait().await),
    }
}

/// Kill the solver (SIGKILL on Unix) and reap it.
async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::error!(error = %e, "Failed to kill solver");
    }
}

#[cfg(unix)]
fn signal_line(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(sig) => format!("{SIGNAL_MARKER} {sig}!"),
        None => format!("{SIGNAL_MARKER}!"),
    }
}

#[cfg(not(unix))]
fn signal_line(_status: ExitStatus) -> String {
    format!("{SIGNAL_MARKER}!")
}

/// Open the job log for appending, creating it if needed. Existing content
/// is never truncated.
async fn open_log(path: &Path) -> std::io::Result<std::fs::File> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    Ok(file.into_std().await)
}

/// Append `line` to the log on a line of its own.
///
/// Failures are only reported to the operator log: the job log is the
/// sole durable record and there is nowhere else to put them.
async fn append_line(path: &Path, line: &str) {
    if let Err(e) = try_append_line(path, line).await {
        tracing::error!(path = %path.display(), error = %e, line, "Cannot append to job log");
    }
}

async fn try_append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .await?;

    let mut text = String::with_capacity(line.len() + 2);
    if file.metadata().await?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).await?;
        file.read_exact(&mut last).await?;
        if last[0] != b'\n' {
            text.push('\n');
        }
    }
    text.push_str(line);
    text.push('\n');

    file.write_all(text.as_bytes()).await?;
    file.flush().await
}

async fn discard_partial_solution(job: &Job) {
    match tokio::fs::remove_file(job.solution_tmp_path()).await {
        Ok(()) => tracing::debug!("Removed partial solution"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(error = %e, "Failed to remove partial solution"),
    }
}
