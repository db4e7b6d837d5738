use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use zimplay_core::error::CoreError;
use zimplay_pipeline::QueueError;
use zimplay_store::StoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors of the lower crates and implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `zimplay_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A job store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The submission queue no longer accepts jobs.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A page template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Unknown and malformed result ids are server errors; the
            // NOT_FOUND code separates them from storage failures.
            AppError::Core(CoreError::InvalidFingerprint(id)) => job_not_found(id),
            AppError::Store(StoreError::NotFound(id)) => job_not_found(id),
            AppError::Store(err @ StoreError::Io { .. }) => {
                tracing::error!(error = %err, "Job store error");
                internal()
            }

            AppError::Queue(err) => {
                tracing::error!(error = %err, "Submission queue error");
                internal()
            }

            AppError::Template(err) => {
                tracing::error!(error = %err, "Template rendering error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn job_not_found(id: &str) -> (StatusCode, &'static str, String) {
    tracing::warn!(id, "Result requested for unknown job");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "NOT_FOUND",
        format!("Job {id} not found"),
    )
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
