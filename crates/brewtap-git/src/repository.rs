//! The repository operations a publish needs, and their `git` CLI
//! implementation.

use std::path::{Component, Path, PathBuf};

use brewtap_core::PublishTarget;
use tracing::debug;

use crate::commands::{git_check, git_command, GitError};
use crate::publisher::{PublishError, PublishStep, Result};

/// Commit author name used for formula updates.
pub const BOT_NAME: &str = "github-actions[bot]";

/// Commit author email used for formula updates.
pub const BOT_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

/// Capability boundary for mutating the destination repository.
///
/// Steps are called in order by [`Publisher`](crate::Publisher) against a
/// working directory it owns.
pub trait TapRepository {
    /// Materialize a full working copy of `target` into the empty `workdir`.
    fn clone_repo(&self, target: &PublishTarget, workdir: &Path) -> Result<()>;

    /// Overwrite `path` (relative to `workdir`) with `content`, creating
    /// parent directories as needed.
    fn write_file(&self, workdir: &Path, path: &Path, content: &str) -> Result<()> {
        let full = workdir.join(path);
        let write = || -> std::io::Result<()> {
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full, content)
        };
        write().map_err(|source| PublishError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Stage `path`. Returns `false` when staging leaves nothing to commit.
    fn stage(&self, workdir: &Path, path: &Path) -> Result<bool>;

    /// Commit staged changes with `message` and return the new commit id.
    fn commit(&self, workdir: &Path, message: &str) -> Result<String>;

    /// Push the current branch back to `target`.
    fn push(&self, target: &PublishTarget, workdir: &Path) -> Result<()>;
}

/// Check that a destination path is relative and stays inside the working
/// copy.
pub fn validate_destination(path: &str) -> Result<PathBuf> {
    let invalid = |reason: &str| PublishError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    let candidate = PathBuf::from(path);
    for component in candidate.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("path must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path must be relative to the repository root"));
            }
        }
    }
    if candidate.file_name().is_none() {
        return Err(invalid("path does not name a file"));
    }
    Ok(candidate)
}

// ---------------------------------------------------------------------------
// git CLI implementation
// ---------------------------------------------------------------------------

/// [`TapRepository`] backed by the `git` executable.
///
/// Clone and push authenticate by embedding the credential in the remote
/// URL; git's error output is scrubbed of it before being reported.
#[derive(Debug, Clone)]
pub struct GitCli {
    author_name: String,
    author_email: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            author_name: BOT_NAME.to_string(),
            author_email: BOT_EMAIL.to_string(),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the commit identity.
    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }
}

fn git_err(step: PublishStep, target: Option<&PublishTarget>) -> impl FnOnce(GitError) -> PublishError {
    let credential = target.map(|t| t.credential.clone());
    move |err| {
        let source = match credential {
            Some(cred) => err.map_stderr(|s| cred.redact(s)),
            None => err,
        };
        PublishError::Git { step, source }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl TapRepository for GitCli {
    fn clone_repo(&self, target: &PublishTarget, workdir: &Path) -> Result<()> {
        let url = target.authenticated_url();
        git_command(&["clone", "--quiet", &url, "."], workdir)
            .map_err(git_err(PublishStep::Clone, Some(target)))?;
        debug!(remote = %target.remote_url(), "clone complete");
        Ok(())
    }

    fn stage(&self, workdir: &Path, path: &Path) -> Result<bool> {
        let path = path_arg(path);
        git_command(&["add", "--", &path], workdir).map_err(git_err(PublishStep::Stage, None))?;
        let unchanged = git_check(&["diff", "--cached", "--quiet", "--", &path], workdir)
            .map_err(git_err(PublishStep::Stage, None))?;
        Ok(!unchanged)
    }

    fn commit(&self, workdir: &Path, message: &str) -> Result<String> {
        let to_err = || git_err(PublishStep::Commit, None);
        git_command(&["config", "user.name", &self.author_name], workdir).map_err(to_err())?;
        git_command(&["config", "user.email", &self.author_email], workdir).map_err(to_err())?;
        git_command(&["commit", "--quiet", "--no-gpg-sign", "-m", message], workdir)
            .map_err(to_err())?;
        git_command(&["rev-parse", "HEAD"], workdir).map_err(to_err())
    }

    fn push(&self, target: &PublishTarget, workdir: &Path) -> Result<()> {
        let url = target.authenticated_url();
        git_command(&["push", "--quiet", &url, "HEAD"], workdir)
            .map_err(git_err(PublishStep::Push, Some(target)))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use brewtap_core::Credential;
    use pretty_assertions::assert_eq;

    /// Uses only the default `write_file`.
    struct WriteOnly;

    impl TapRepository for WriteOnly {
        fn clone_repo(&self, _: &PublishTarget, _: &Path) -> Result<()> {
            Ok(())
        }
        fn stage(&self, _: &Path, _: &Path) -> Result<bool> {
            Ok(true)
        }
        fn commit(&self, _: &Path, _: &str) -> Result<String> {
            Ok(String::new())
        }
        fn push(&self, _: &PublishTarget, _: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_file_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let rel = Path::new("Formula/h/hello.rb");
        WriteOnly.write_file(dir.path(), rel, "content").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join(rel)).unwrap(),
            "content"
        );
    }

    #[test]
    fn write_file_fully_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let rel = Path::new("hello.rb");
        std::fs::write(dir.path().join(rel), "a much longer previous formula body\n".repeat(10))
            .unwrap();

        WriteOnly.write_file(dir.path(), rel, "short").unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join(rel)).unwrap(), "short");
    }

    #[test]
    fn validate_destination_accepts_nested_relative_paths() {
        assert_eq!(
            validate_destination("Formula/hello.rb").unwrap(),
            PathBuf::from("Formula/hello.rb")
        );
        assert!(validate_destination("./hello.rb").is_ok());
    }

    #[test]
    fn validate_destination_rejects_escapes() {
        for bad in ["", "  ", "../outside.rb", "Formula/../../x.rb", "/etc/passwd", "."] {
            assert!(
                matches!(validate_destination(bad), Err(PublishError::InvalidPath { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn clone_failure_does_not_leak_credential() {
        let dir = tempfile::tempdir().unwrap();
        let target = PublishTarget::new("acme/tap", "Formula/x.rb", Credential::new("sekrit-token"))
            // Nothing listens here; the URL (with the token) ends up in git's stderr.
            .with_host("http://127.0.0.1:9");
        let err = GitCli::new().clone_repo(&target, dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("git clone failed"), "{message}");
        assert!(!message.contains("sekrit-token"), "{message}");
    }
}
