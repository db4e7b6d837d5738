//! Solver command construction and executable lookup.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use zimplay_core::job::{MODEL_FILENAME, SOLUTION_TMP_FILENAME};

use crate::config::SolverConfig;

/// The SCIP batch script for one run: apply limits, read the model, solve,
/// print statistics, write the solution and quit.
///
/// Paths are relative because the solver runs inside the job directory.
pub fn solver_script(config: &SolverConfig) -> String {
    format!(
        "set limits time {time} \
         set limits memory {mem} \
         read {MODEL_FILENAME} \
         optimize \
         display statistics \
         write solution {SOLUTION_TMP_FILENAME} \
         quit",
        time = config.time_limit_secs,
        mem = config.memory_limit_mb,
    )
}

/// Build the solver command for a job directory.
///
/// Both output streams go to `log`. The child is killed if its handle is
/// dropped, so an aborted supervisor never leaves an orphaned solver.
pub fn solver_command(
    config: &SolverConfig,
    job_dir: &Path,
    log: std::fs::File,
) -> std::io::Result<Command> {
    let stderr = log.try_clone()?;

    let mut cmd = Command::new(&config.executable);
    cmd.arg("-c")
        .arg(solver_script(config))
        .current_dir(job_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);
    Ok(cmd)
}

/// Locate the solver executable the way a shell would.
///
/// Names containing a path separator are checked directly; bare names are
/// searched on `PATH`. Returns `None` if nothing executable is found.
pub fn resolve_executable(executable: &Path) -> Option<PathBuf> {
    if executable.components().count() > 1 {
        return is_executable(executable).then(|| executable.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(executable))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_carries_limits_and_artifact_names() {
        let config = SolverConfig {
            time_limit_secs: 7,
            memory_limit_mb: 256,
            ..SolverConfig::default()
        };
        assert_eq!(
            solver_script(&config),
            "set limits time 7 set limits memory 256 read model.zpl optimize \
             display statistics write solution solution.sol.tmp quit"
        );
    }

    #[cfg(unix)]
    #[test]
    fn resolves_bare_names_on_path() {
        let found = resolve_executable(Path::new("sh")).expect("sh should be on PATH");
        assert!(found.is_absolute() || found.components().count() > 1);
    }

    #[test]
    fn missing_executable_resolves_to_none() {
        assert!(resolve_executable(Path::new("/nonexistent/solver-binary")).is_none());
        assert!(resolve_executable(Path::new("surely-not-a-real-solver-name")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_rejected() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(resolve_executable(f.path()).is_none());
    }
}
