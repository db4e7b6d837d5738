use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::Html;
use axum::Form;
use serde::Deserialize;

use crate::error::AppResult;
use crate::state::AppState;

/// Parameters of the submission form page.
#[derive(Debug, Default, Deserialize)]
pub struct InputParams {
    /// Model text to pre-fill the textarea with.
    #[serde(default)]
    pub prefilled: String,
}

/// GET|POST / and /input/
///
/// Render the submission form. `prefilled` is read from the query string on
/// GET and from the form body on POST; a missing or unreadable value leaves
/// the textarea empty.
pub async fn input_page(
    State(state): State<AppState>,
    params: Result<Form<InputParams>, FormRejection>,
) -> AppResult<Html<String>> {
    let params = params.map(|Form(p)| p).unwrap_or_default();
    Ok(state.views.input(&params.prefilled)?)
}
