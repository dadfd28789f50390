//! Errors raised while loading and validating inputs.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required input was absent or blank in every source.
    #[error("input required and not supplied: {0}")]
    Missing(&'static str),

    /// An input that should hold JSON or YAML could not be parsed as either.
    #[error("failed to parse {input} as JSON or YAML: {message}")]
    Parse {
        input: &'static str,
        message: String,
    },

    /// A payload parsed, but not to a mapping.
    #[error("{input} must be an object, got {found}")]
    NotObject {
        input: &'static str,
        found: &'static str,
    },

    /// `tar-files` was an empty mapping.
    #[error("tar-files must contain at least one artifact")]
    EmptyArtifacts,

    /// An artifact URL is not an absolute http(s) URL.
    #[error("artifact '{label}' has an invalid URL '{url}': {reason}")]
    InvalidUrl {
        label: String,
        url: String,
        reason: &'static str,
    },

    /// The target repository is not in `owner/repo` form.
    #[error("invalid formula-target-repository '{0}': expected owner/repo")]
    InvalidRepository(String),

    /// No credential was found in the input or the fallback variables.
    #[error(
        "no credential available: set the github-token input or one of \
         HOMEBREW_TAP_TOKEN, GH_TOKEN, GITHUB_TOKEN"
    )]
    MissingCredential,

    /// `--config` named a file that does not exist.
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// figment failed to read a source or extract the merged inputs.
    #[error("invalid configuration: {0}")]
    Extract(#[from] figment::Error),
}

/// A specialized `Result` type for input resolution.
pub type Result<T> = std::result::Result<T, ConfigError>;
