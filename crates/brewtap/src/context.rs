//! Runtime context for a run.
//!
//! The [`RuntimeContext`] captures the process environment the binary
//! reacts to (verbosity, GitHub Actions detection, the step output file).
//! It is built once in `main`; library crates never read the environment.

use std::path::PathBuf;

use crate::cli::Cli;

/// Runtime state derived from the CLI and the environment.
#[derive(Debug, Clone, Default)]
pub struct RuntimeContext {
    /// Verbose (debug) logging.
    pub verbose: bool,

    /// Running as a GitHub Actions step (`GITHUB_ACTIONS=true`).
    pub github_actions: bool,

    /// File that step outputs are appended to (`$GITHUB_OUTPUT`).
    pub github_output: Option<PathBuf>,
}

impl RuntimeContext {
    pub fn new(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            verbose: cli.verbose,
            github_actions: env("GITHUB_ACTIONS").is_some_and(|v| v == "true"),
            github_output: env("GITHUB_OUTPUT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Lookup against the real process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
