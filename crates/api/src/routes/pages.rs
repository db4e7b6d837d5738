//! Route definitions for the HTML pages.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{jobs, pages};
use crate::state::AppState;

/// Page routes, mounted at the root.
///
/// ```text
/// GET|POST /                        -> input_page
/// GET|POST /input/                  -> input_page
/// POST     /solve/                  -> solve
/// GET      /result/{fingerprint}    -> result
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::input_page).post(pages::input_page))
        .route("/input/", get(pages::input_page).post(pages::input_page))
        .route("/solve/", post(jobs::solve))
        .route("/result/{fingerprint}", get(jobs::result))
}
