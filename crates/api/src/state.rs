use std::sync::Arc;

use zimplay_pipeline::{Dispatcher, JobRunner, Limiter, SubmissionQueue};
use zimplay_store::JobStore;

use crate::config::ServerConfig;
use crate::views::Views;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Content-addressed job store under `config.results_dir`.
    pub store: JobStore,
    /// Producer half of the submission queue.
    pub queue: SubmissionQueue,
    /// Solver slot limiter, shared with the dispatcher for `/health`.
    pub limiter: Limiter,
    /// Compiled page templates.
    pub views: Arc<Views>,
}

impl AppState {
    /// Wire the store, queue and limiter together with a dispatcher driving
    /// `runner`. The dispatcher is returned unstarted.
    pub fn with_runner<R: JobRunner>(
        config: ServerConfig,
        runner: R,
    ) -> Result<(Self, Dispatcher<R>), minijinja::Error> {
        let views = Views::new()?;
        let (queue, receiver) = SubmissionQueue::channel();
        let limiter = Limiter::new(config.max_solver_processes);
        let dispatcher = Dispatcher::new(receiver, limiter.clone(), Arc::new(runner));

        let state = Self {
            store: JobStore::new(config.results_dir.clone()),
            queue,
            limiter,
            views: Arc::new(views),
            config: Arc::new(config),
        };
        Ok((state, dispatcher))
    }
}
