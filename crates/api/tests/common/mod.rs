#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use zimplay_api::config::ServerConfig;
use zimplay_api::router::build_app_router;
use zimplay_api::state::AppState;
use zimplay_core::Job;
use zimplay_pipeline::{Dispatcher, JobRunner, SlotPermit};
use zimplay_worker::{ProcessSupervisor, SolverConfig};

/// Build a test `ServerConfig` storing results under `results_dir`.
///
/// The redirect delay is zero so submissions respond immediately.
pub fn test_config(results_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        results_dir: results_dir.to_path_buf(),
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        redirect_delay_ms: 0,
        max_solver_processes: 2,
        solver: SolverConfig {
            executable: PathBuf::from("/nonexistent/zimplay-solver"),
            ..SolverConfig::default()
        },
    }
}

/// Runner for apps whose dispatcher is never started.
pub struct IdleRunner;

impl JobRunner for IdleRunner {
    async fn run(&self, _job: Job, _permit: SlotPermit) {}
}

/// An application whose dispatcher is held but not running, so every
/// queued job stays in the submission queue where tests can count it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub results: TempDir,
    pub dispatcher: Option<Dispatcher<IdleRunner>>,
}

impl TestApp {
    pub fn new() -> Self {
        let results = tempfile::tempdir().unwrap();
        let config = test_config(results.path());
        let (state, dispatcher) = AppState::with_runner(config.clone(), IdleRunner).unwrap();
        let router = build_app_router(state.clone(), &config);

        Self {
            router,
            state,
            results,
            dispatcher: Some(dispatcher),
        }
    }

    /// A fresh handle on the router, for one `oneshot` call.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Drop the dispatcher side so the submission queue reports closed.
    pub fn close_queue(&mut self) {
        self.dispatcher = None;
    }
}

/// Build an application wired to a real [`ProcessSupervisor`] running
/// `solver`, with the dispatcher spawned on the test runtime.
pub fn spawn_with_solver(results: &Path, solver: PathBuf) -> Router {
    let mut config = test_config(results);
    config.solver.executable = solver;

    let (state, dispatcher) =
        AppState::with_runner(config.clone(), ProcessSupervisor::new(config.solver.clone()))
            .unwrap();
    tokio::spawn(dispatcher.run(tokio_util::sync::CancellationToken::new()));
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST an `application/x-www-form-urlencoded` body built from `fields`.
pub async fn post_form(app: Router, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get("location")
        .expect("redirect must carry a Location header")
        .to_str()
        .unwrap()
}

/// Percent-encode every byte outside the unreserved set.
pub fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
