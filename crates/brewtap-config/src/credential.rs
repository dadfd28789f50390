//! The credential fallback chain.

use brewtap_core::Credential;

use crate::error::{ConfigError, Result};

/// Environment variables consulted, in order, when no `github-token` input is
/// given.
pub const CREDENTIAL_ENV_VARS: [&str; 3] = ["HOMEBREW_TAP_TOKEN", "GH_TOKEN", "GITHUB_TOKEN"];

/// Pick the credential: the explicit input first, then each of
/// [`CREDENTIAL_ENV_VARS`]. Blank values are skipped.
pub fn resolve_credential(
    explicit: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Credential> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(Credential::new(token));
    }
    for name in CREDENTIAL_ENV_VARS {
        if let Some(token) = env(name) {
            let token = token.trim();
            if !token.is_empty() {
                tracing::debug!("using credential from {name}");
                return Ok(Credential::new(token));
            }
        }
    }
    Err(ConfigError::MissingCredential)
}
