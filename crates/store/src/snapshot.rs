use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use zimplay_core::{Fingerprint, Job, JobState};

use crate::error::{StoreError, StoreResult};

/// Read-only view of a job's artifacts at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub fingerprint: Fingerprint,
    /// Model text. `None` while a submission is still storing it: the job
    /// directory exists before the model is renamed into place.
    pub model: Option<String>,
    pub solution: Option<String>,
    pub log: Option<String>,
    pub state: JobState,
}

impl JobSnapshot {
    pub(crate) async fn read(job: &Job) -> StoreResult<Self> {
        let Some(model) = read_optional(&job.model_path()).await? else {
            return Ok(Self::being_stored(job));
        };
        let solution = read_optional(&job.solution_path()).await?;
        let log = read_optional(&job.log_path()).await?;
        let state = JobState::infer(solution.as_deref(), log.as_deref());

        Ok(Self {
            fingerprint: job.fingerprint.clone(),
            model: Some(model),
            solution,
            log,
            state,
        })
    }

    /// A job whose model is not written yet has nothing else to show.
    fn being_stored(job: &Job) -> Self {
        Self {
            fingerprint: job.fingerprint.clone(),
            model: None,
            solution: None,
            log: None,
            state: JobState::Queued,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Read an artifact, mapping "does not exist" to `None`.
async fn read_optional(path: &Path) -> StoreResult<Option<String>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
