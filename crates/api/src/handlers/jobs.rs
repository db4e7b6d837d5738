use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Form;
use serde::Deserialize;
use zimplay_core::Fingerprint;

use crate::error::AppResult;
use crate::state::AppState;

/// Body of a solve request.
#[derive(Debug, Deserialize)]
pub struct SolveForm {
    #[serde(default)]
    pub model: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /solve/
///
/// Record the model under its fingerprint and queue it for solving if it was
/// not seen before. Always redirects to the result page, whether the model is
/// new or a resubmission.
pub async fn solve(
    State(state): State<AppState>,
    Form(input): Form<SolveForm>,
) -> AppResult<impl IntoResponse> {
    let fingerprint = Fingerprint::of(&input.model);

    if state.store.create_if_absent(&fingerprint, &input.model).await? {
        state.queue.enqueue(state.store.job(&fingerprint))?;
        tracing::info!(
            fingerprint = %fingerprint,
            queue_depth = state.queue.depth(),
            "Job queued",
        );
    } else {
        tracing::debug!(fingerprint = %fingerprint, "Resubmission, not queued");
    }

    tokio::time::sleep(state.config.redirect_delay()).await;

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, format!("/result/{fingerprint}"))],
    ))
}

/// GET /result/{fingerprint}
///
/// Show whatever artifacts the job has so far. Unknown or malformed
/// identifiers are a server error with code `NOT_FOUND`.
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let fingerprint = Fingerprint::parse(&id)?;
    let snapshot = state.store.snapshot(&fingerprint).await?;
    Ok(state.views.result(&snapshot)?)
}
