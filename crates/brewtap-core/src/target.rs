//! Where a rendered formula goes, and the formula itself.

use std::fmt;

/// Commit message used when the caller does not supply one.
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: update Homebrew formula";

/// Git host the destination repository lives on unless configured otherwise.
pub const DEFAULT_GIT_HOST: &str = "https://github.com";

/// Placeholder written wherever a credential would otherwise appear.
const REDACTED: &str = "***";

/// Token used to authenticate clone and push.
///
/// The `Debug` impl never prints the token, so a `Credential` can sit inside
/// structs that get logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building authenticated remotes.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replace every occurrence of the token in `text` with `***`.
    ///
    /// Git echoes remote URLs in its error output, and those URLs carry the
    /// token.
    pub fn redact(&self, text: &str) -> String {
        if self.0.is_empty() {
            return text.to_string();
        }
        text.replace(&self.0, REDACTED)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Destination of a publish: repository, file, commit message and credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    /// Repository in `owner/repo` form (e.g. `acme/homebrew-tap`).
    pub repository: String,

    /// Path of the formula file relative to the repository root.
    pub path: String,

    /// Commit message for the update.
    pub commit_message: String,

    /// Token for clone and push.
    pub credential: Credential,

    /// Base URL of the git host (e.g. `https://github.com`).
    pub host: String,
}

impl PublishTarget {
    /// Creates a target with the default commit message and host.
    pub fn new(
        repository: impl Into<String>,
        path: impl Into<String>,
        credential: Credential,
    ) -> Self {
        Self {
            repository: repository.into(),
            path: path.into(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            credential,
            host: DEFAULT_GIT_HOST.to_string(),
        }
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Remote URL of the repository without credentials.
    pub fn remote_url(&self) -> String {
        format!("{}/{}.git", self.host.trim_end_matches('/'), self.repository)
    }

    /// Remote URL with the credential embedded for HTTP(S) hosts.
    ///
    /// Other schemes (`file://`, ssh) are returned unchanged.
    pub fn authenticated_url(&self) -> String {
        let url = self.remote_url();
        for scheme in ["https://", "http://"] {
            if let Some(rest) = url.strip_prefix(scheme) {
                return format!(
                    "{scheme}x-access-token:{}@{rest}",
                    self.credential.expose()
                );
            }
        }
        url
    }
}

/// The rendered formula text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument(String);

impl RenderedDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RenderedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
