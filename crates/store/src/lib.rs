//! Content-addressed job store on the local filesystem.
//!
//! Every distinct model lives in `<root>/<fingerprint>/`. Creating that
//! directory is the deduplication boundary: the first submission creates it,
//! every later submission of the same text finds it already present.

mod error;
mod snapshot;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use zimplay_core::job::{Job, MODEL_FILENAME};
use zimplay_core::Fingerprint;

pub use error::{StoreError, StoreResult};
pub use snapshot::JobSnapshot;

/// Temporary name for the model while it is being written.
const MODEL_TMP_FILENAME: &str = "model.zpl.tmp";

/// Filesystem-backed job store rooted at a results directory.
#[derive(Debug, Clone)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage directory for a fingerprint (whether or not it exists).
    pub fn locate(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(fingerprint.as_str())
    }

    /// Handle for executing the job stored under `fingerprint`.
    pub fn job(&self, fingerprint: &Fingerprint) -> Job {
        Job::new(fingerprint.clone(), self.locate(fingerprint))
    }

    /// Whether a submission with this fingerprint was already recorded.
    pub async fn exists(&self, fingerprint: &Fingerprint) -> bool {
        tokio::fs::metadata(self.locate(fingerprint))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Record a new submission unless one already exists.
    ///
    /// Returns `Ok(true)` when this call created the job directory and wrote
    /// the model in full, `Ok(false)` when the directory was already there.
    /// The directory is created exclusively, so of two concurrent calls for
    /// the same fingerprint exactly one observes `true`.
    pub async fn create_if_absent(
        &self,
        fingerprint: &Fingerprint,
        model: &str,
    ) -> StoreResult<bool> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;

        let dir = self.locate(fingerprint);
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(fingerprint = %fingerprint, "Job already recorded");
                return Ok(false);
            }
            Err(e) => return Err(StoreError::io(&dir, e)),
        }

        if let Err(err) = write_model(&dir, model).await {
            // Leave no half-created entry behind, otherwise the fingerprint
            // would be treated as known forever without a model.
            if let Err(cleanup) = tokio::fs::remove_dir_all(&dir).await {
                tracing::error!(
                    fingerprint = %fingerprint,
                    error = %cleanup,
                    "Failed to remove incomplete job directory"
                );
            }
            return Err(err);
        }

        tracing::info!(fingerprint = %fingerprint, "Recorded new job");
        Ok(true)
    }

    /// Read whatever artifacts currently exist for a job.
    ///
    /// Missing solution or log is the normal "still running" state. An
    /// unknown fingerprint yields [`StoreError::NotFound`].
    pub async fn snapshot(&self, fingerprint: &Fingerprint) -> StoreResult<JobSnapshot> {
        if !self.exists(fingerprint).await {
            return Err(StoreError::NotFound(fingerprint.to_string()));
        }
        JobSnapshot::read(&self.job(fingerprint)).await
    }
}

async fn write_model(dir: &Path, model: &str) -> StoreResult<()> {
    let tmp = dir.join(MODEL_TMP_FILENAME);
    let target = dir.join(MODEL_FILENAME);

    tokio::fs::write(&tmp, model.as_bytes())
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, &target)
        .await
        .map_err(|e| StoreError::io(&target, e))
}
