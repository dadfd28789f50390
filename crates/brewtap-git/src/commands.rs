//! Git command execution wrappers.
//!
//! Provides a thin wrapper around `git` subprocess invocation so that the
//! rest of the codebase does not need to deal with `std::process::Command`
//! directly. Every invocation runs with terminal prompts disabled: a missing
//! or rejected credential must fail the command, never block on stdin.

use std::path::Path;
use std::process::{Command, Output};
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when running git commands.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git binary could not be found or spawned.
    #[error("failed to execute git: {0}")]
    SpawnError(#[from] std::io::Error),

    /// The git command exited with a non-zero status.
    #[error("git command failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        /// The exit code, or `None` if the process was killed by a signal.
        code: Option<i32>,
        /// The content of stderr.
        stderr: String,
    },
}

impl GitError {
    /// Rewrite the captured stderr, e.g. to scrub credentials.
    pub fn map_stderr(self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            Self::CommandFailed { code, stderr } => Self::CommandFailed {
                code,
                stderr: f(&stderr),
            },
            other => other,
        }
    }
}

/// A specialized `Result` type for git operations.
pub type Result<T> = std::result::Result<T, GitError>;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Execute a `git` command with the given arguments and working directory.
///
/// Returns the trimmed contents of stdout on success.
///
/// # Errors
///
/// Returns [`GitError::SpawnError`] if `git` cannot be found, or
/// [`GitError::CommandFailed`] if the command exits with a non-zero status.
///
/// # Examples
///
/// ```no_run
/// use brewtap_git::commands::git_command;
/// use std::path::Path;
///
/// let head = git_command(&["rev-parse", "HEAD"], Path::new(".")).unwrap();
/// println!("HEAD is {head}");
/// ```
pub fn git_command(args: &[&str], cwd: &Path) -> Result<String> {
    let output = run(args, cwd)?;

    if !output.status.success() {
        return Err(failure(&output));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(stdout)
}

/// Execute a `git` command used as a predicate.
///
/// Exit code 0 maps to `Ok(true)` and exit code 1 to `Ok(false)`, the
/// convention of `git diff --quiet` and friends. Anything else is an error.
pub fn git_check(args: &[&str], cwd: &Path) -> Result<bool> {
    let output = run(args, cwd)?;
    match output.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(failure(&output)),
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn run(args: &[&str], cwd: &Path) -> Result<Output> {
    debug!(subcommand = args.first().copied().unwrap_or_default(), cwd = %cwd.display(), "running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()?;
    Ok(output)
}

fn failure(output: &Output) -> GitError {
    GitError::CommandFailed {
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_command_disables_terminal_prompt() {
        // A shell alias sees the environment git was started with.
        let env = git_command(&["-c", "alias.envdump=!env", "envdump"], Path::new(".")).unwrap();
        assert!(
            env.lines().any(|line| line == "GIT_TERMINAL_PROMPT=0"),
            "prompt not disabled in: {env}"
        );
    }

    #[test]
    fn test_git_command_failure_keeps_trimmed_stderr() {
        let err = git_command(&["not-a-real-subcommand"], Path::new(".")).unwrap_err();
        match err {
            GitError::CommandFailed { code, stderr } => {
                assert_ne!(code, Some(0));
                assert!(stderr.contains("not-a-real-subcommand"), "{stderr}");
                assert_eq!(stderr, stderr.trim());
            }
            other => panic!("expected CommandFailed, got: {other:?}"),
        }
    }

    #[test]
    fn test_git_command_missing_cwd_is_spawn_error() {
        let err = git_command(&["status"], Path::new("/nonexistent/brewtap/workdir")).unwrap_err();
        assert!(matches!(err, GitError::SpawnError(_)), "{err:?}");
        assert!(err.to_string().starts_with("failed to execute git: "), "{err}");
    }

    #[test]
    fn test_map_stderr_leaves_spawn_error_alone() {
        let err = GitError::SpawnError(std::io::Error::other("no git"))
            .map_stderr(|_| "replaced".to_string());
        assert_eq!(err.to_string(), "failed to execute git: no git");
    }

    #[test]
    fn test_git_check_maps_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        git_command(&["init", "--quiet"], dir.path()).unwrap();
        // Empty index: nothing staged, so `diff --cached --quiet` exits 0.
        assert!(git_check(&["diff", "--cached", "--quiet"], dir.path()).unwrap());

        std::fs::write(dir.path().join("f.txt"), "x").unwrap();
        git_command(&["add", "f.txt"], dir.path()).unwrap();
        assert!(!git_check(&["diff", "--cached", "--quiet"], dir.path()).unwrap());
    }

    #[test]
    fn test_map_stderr_scrubs() {
        let err = GitError::CommandFailed {
            code: Some(128),
            stderr: "fatal: https://tok@host/x".to_string(),
        }
        .map_stderr(|s| s.replace("tok", "***"));
        assert_eq!(
            err.to_string(),
            "git command failed (exit code Some(128)): fatal: https://***@host/x"
        );
    }
}
