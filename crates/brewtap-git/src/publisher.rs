//! The publish state machine: clone, write, stage, commit, push.
//!
//! Each publish runs in its own temporary working copy. The first failing
//! step aborts the rest; nothing is rolled back because the working copy is
//! thrown away with the temporary directory.

use std::fmt;
use std::path::PathBuf;

use brewtap_core::{PublishTarget, RenderedDocument};
use thiserror::Error;
use tracing::info;

use crate::commands::GitError;
use crate::repository::{validate_destination, TapRepository};

/// Prefix of the temporary working directory.
const WORKDIR_PREFIX: &str = "homebrew-tap-";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A step of the publish sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Clone,
    Write,
    Stage,
    Commit,
    Push,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clone => "clone",
            Self::Write => "write",
            Self::Stage => "add",
            Self::Commit => "commit",
            Self::Push => "push",
        })
    }
}

/// Errors that can occur while publishing a formula.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The temporary working directory could not be created.
    #[error("failed to create working directory: {0}")]
    Workdir(#[source] std::io::Error),

    /// The destination path is not a safe repository-relative file path.
    #[error("invalid destination path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Writing the formula into the working copy failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A git step failed.
    #[error("git {step} failed: {source}")]
    Git {
        step: PublishStep,
        #[source]
        source: GitError,
    },
}

impl PublishError {
    /// The step that failed, if the failure happened inside the sequence.
    pub fn step(&self) -> Option<PublishStep> {
        match self {
            Self::Git { step, .. } => Some(*step),
            Self::Write { .. } => Some(PublishStep::Write),
            Self::Workdir(_) | Self::InvalidPath { .. } => None,
        }
    }
}

/// A specialized `Result` type for publish operations.
pub type Result<T> = std::result::Result<T, PublishError>;

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// How a successful publish ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new commit was pushed.
    Committed { commit: String },
    /// The file already had this exact content; nothing was pushed.
    Unchanged,
}

/// Drives a [`TapRepository`] through one publish.
#[derive(Debug, Clone)]
pub struct Publisher<R> {
    repo: R,
}

impl<R: TapRepository> Publisher<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Write `content` to `target.path` in `target.repository` and push it.
    ///
    /// The temporary working copy is removed before returning, whatever the
    /// outcome.
    pub fn publish(&self, target: &PublishTarget, content: &RenderedDocument) -> Result<PublishOutcome> {
        let path = validate_destination(&target.path)?;
        let workdir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir()
            .map_err(PublishError::Workdir)?;
        let dir = workdir.path();

        info!("Cloning {} into {}", target.repository, dir.display());
        self.repo.clone_repo(target, dir)?;

        info!("Writing {}", path.display());
        self.repo.write_file(dir, &path, content.as_str())?;

        if !self.repo.stage(dir, &path)? {
            info!("{} is already up to date; nothing to commit", path.display());
            return Ok(PublishOutcome::Unchanged);
        }

        let commit = self.repo.commit(dir, &target.commit_message)?;
        info!(commit = %commit, "Committed \"{}\"", target.commit_message);

        self.repo.push(target, dir)?;
        info!("Pushed {} to {}", commit, target.repository);

        Ok(PublishOutcome::Committed { commit })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
