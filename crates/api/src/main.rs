use std::future::IntoFuture;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zimplay_api::config::ServerConfig;
use zimplay_api::router::build_app_router;
use zimplay_api::state::AppState;
use zimplay_worker::invocation::resolve_executable;
use zimplay_worker::ProcessSupervisor;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "zimplay_api=debug,zimplay_store=debug,zimplay_pipeline=debug,\
                 zimplay_worker=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        results_dir = %config.results_dir.display(),
        process_limit = config.max_solver_processes,
        "Loaded server configuration"
    );

    // --- Solver ---
    match resolve_executable(&config.solver.executable) {
        Some(path) => tracing::info!(solver = %path.display(), "Solver executable found"),
        None => tracing::warn!(
            solver = %config.solver.executable.display(),
            "Solver executable not found; jobs will fail to start"
        ),
    }

    // --- Pipeline ---
    let supervisor = ProcessSupervisor::new(config.solver.clone());
    let kill_solvers = supervisor.shutdown_token();
    let (state, dispatcher) =
        AppState::with_runner(config.clone(), supervisor).expect("Failed to load page templates");
    let jobs = dispatcher.tracker();
    let cancel = CancellationToken::new();
    let mut dispatcher_handle = tokio::spawn(dispatcher.run(cancel.clone()));

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let listener = config.bind().await.expect("Failed to bind to address");
    let addr = listener.local_addr().expect("Listener has no local address");
    tracing::info!(%addr, "Starting server");

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    tokio::select! {
        result = server => {
            result.expect("Server error");
        }
        result = &mut dispatcher_handle => {
            // Without a dispatcher no submission would ever run.
            tracing::error!(result = ?result, "Dispatcher stopped unexpectedly");
            std::process::exit(1);
        }
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    tracing::info!("Dispatcher stopped");

    let running = jobs.len();
    if running > 0 {
        tracing::info!(running, "Waiting for running solver processes");
    }
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(grace, jobs.wait()).await.is_err() {
        tracing::warn!(
            remaining = jobs.len(),
            "Solver processes still running at shutdown, killing them"
        );
        kill_solvers.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(5), jobs.wait()).await;
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
