use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tokio::net::TcpListener;
use zimplay_worker::SolverConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development and are
/// independent of each other.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address, an IP literal or a hostname (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Root directory of the job store (default: `results`).
    pub results_dir: PathBuf,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for running solvers, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Pause before redirecting a submission to its result page, in
    /// milliseconds (default: `100`). Gives very fast jobs a chance to finish
    /// before the first poll.
    pub redirect_delay_ms: u64,
    /// Maximum number of concurrently running solver processes (default: `4`).
    pub max_solver_processes: usize,
    /// Solver invocation settings.
    pub solver: SolverConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            results_dir: PathBuf::from("results"),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            redirect_delay_ms: 100,
            max_solver_processes: 4,
            solver: SolverConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default   |
    /// |----------------------------|-----------|
    /// | `HOST`                     | `0.0.0.0` |
    /// | `PORT`                     | `8080`    |
    /// | `RESULTS_DIR`              | `results` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`      |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`      |
    /// | `REDIRECT_DELAY_MS`        | `100`     |
    /// | `MAX_SOLVER_PROCESSES`     | `4`       |
    /// | `SOLVER_PATH`              | `scip`    |
    /// | `SOLVER_TIME_LIMIT_SECS`   | `180`     |
    /// | `SOLVER_MEMORY_LIMIT_MB`   | `100`     |
    /// | `SOLVER_WALL_TIMEOUT_SECS` | unset     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let solver_defaults = SolverConfig::default();

        let wall_timeout = parse_opt::<u64>(&lookup, "SOLVER_WALL_TIMEOUT_SECS", "u64")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let solver = SolverConfig {
            executable: lookup("SOLVER_PATH")
                .map(PathBuf::from)
                .unwrap_or(solver_defaults.executable),
            time_limit_secs: parse_or(
                &lookup,
                "SOLVER_TIME_LIMIT_SECS",
                "u64",
                solver_defaults.time_limit_secs,
            )?,
            memory_limit_mb: parse_or(
                &lookup,
                "SOLVER_MEMORY_LIMIT_MB",
                "u64",
                solver_defaults.memory_limit_mb,
            )?,
            wall_timeout,
        };

        let max_solver_processes: usize = parse_or(
            &lookup,
            "MAX_SOLVER_PROCESSES",
            "positive integer",
            defaults.max_solver_processes,
        )?;
        if max_solver_processes == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_SOLVER_PROCESSES",
                expected: "positive integer",
                value: "0".into(),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", "u16", defaults.port)?,
            results_dir: lookup("RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            request_timeout_secs: parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                "u64",
                defaults.request_timeout_secs,
            )?,
            shutdown_timeout_secs: parse_or(
                &lookup,
                "SHUTDOWN_TIMEOUT_SECS",
                "u64",
                defaults.shutdown_timeout_secs,
            )?,
            redirect_delay_ms: parse_or(
                &lookup,
                "REDIRECT_DELAY_MS",
                "u64",
                defaults.redirect_delay_ms,
            )?,
            max_solver_processes,
            solver,
        })
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    /// Bind a listener on `host:port`, resolving `host` if it is a name.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind((self.host.as_str(), self.port)).await
    }
}

fn parse_opt<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                expected,
                value,
            }),
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    Ok(parse_opt(lookup, var, expected)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_solver_processes, 4);
        assert_eq!(config.redirect_delay_ms, 100);
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert_eq!(config.solver.executable, PathBuf::from("scip"));
        assert_eq!(config.solver.time_limit_secs, 180);
        assert_eq!(config.solver.memory_limit_mb, 100);
        assert!(config.solver.wall_timeout.is_none());
    }

    #[test]
    fn overrides_are_independent() {
        let config = from_pairs(&[
            ("PORT", "9000"),
            ("SOLVER_MEMORY_LIMIT_MB", "2048"),
            ("SOLVER_WALL_TIMEOUT_SECS", "600"),
            ("SOLVER_PATH", "/opt/scip/bin/scip"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.solver.memory_limit_mb, 2048);
        assert_eq!(config.solver.time_limit_secs, 180);
        assert_eq!(config.solver.wall_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.solver.executable, PathBuf::from("/opt/scip/bin/scip"));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = from_pairs(&[("REDIRECT_DELAY_MS", "soon")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "REDIRECT_DELAY_MS", .. });
    }

    #[test]
    fn zero_solver_processes_is_rejected() {
        let err = from_pairs(&[("MAX_SOLVER_PROCESSES", "0")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "MAX_SOLVER_PROCESSES", .. });
    }

    #[test]
    fn zero_wall_timeout_means_no_deadline() {
        let config = from_pairs(&[("SOLVER_WALL_TIMEOUT_SECS", "0")]).unwrap();
        assert!(config.solver.wall_timeout.is_none());
    }

    #[tokio::test]
    async fn binds_on_a_hostname() {
        let config = from_pairs(&[("HOST", "localhost"), ("PORT", "0")]).unwrap();
        let listener = config.bind().await.unwrap();

        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }
}
