//! Validation of merged inputs into a [`PublishConfig`].

use std::time::Duration;

use brewtap_core::{ArtifactSet, Metadata, PublishTarget, DEFAULT_GIT_HOST};
use brewtap_formula::TemplateSource;

use crate::credential::resolve_credential;
use crate::error::{ConfigError, Result};
use crate::inputs::RawInputs;
use crate::payload::{parse_artifacts, parse_object, validate_repository};

/// Variable the Actions runner sets to the base URL of the git host.
const SERVER_URL_VAR: &str = "GITHUB_SERVER_URL";

/// Everything one run needs, validated.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub target: PublishTarget,
    pub artifacts: ArtifactSet,
    pub metadata: Metadata,
    pub template: TemplateSource,
    /// Bound on each artifact download; `None` waits indefinitely.
    pub download_timeout: Option<Duration>,
    pub dry_run: bool,
}

/// Treat blank strings the same as absent ones.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    present(value).ok_or(ConfigError::Missing(name))
}

fn required_payload(value: Option<serde_json::Value>, name: &'static str) -> Result<serde_json::Value> {
    match value {
        None | Some(serde_json::Value::Null) => Err(ConfigError::Missing(name)),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Err(ConfigError::Missing(name)),
        Some(v) => Ok(v),
    }
}

/// Validate `raw` into a [`PublishConfig`].
///
/// `env` is consulted for the credential fallback chain and for
/// `GITHUB_SERVER_URL`; it is not read anywhere else.
pub fn resolve(raw: RawInputs, env: impl Fn(&str) -> Option<String>) -> Result<PublishConfig> {
    let repository = validate_repository(&required(
        raw.formula_target_repository,
        "formula-target-repository",
    )?)?;
    let path = required(raw.formula_target_file, "formula-target-file")?;
    let artifacts = parse_artifacts(required_payload(raw.tar_files, "tar-files")?)?;
    let metadata = parse_object("metadata", required_payload(raw.metadata, "metadata")?)?;
    let credential = resolve_credential(raw.github_token.as_deref(), &env)?;

    let host = present(raw.git_host)
        .or_else(|| present(env(SERVER_URL_VAR)))
        .unwrap_or_else(|| DEFAULT_GIT_HOST.to_string());

    let mut target = PublishTarget::new(repository, path, credential).with_host(host);
    if let Some(message) = present(raw.commit_message) {
        target = target.with_commit_message(message);
    }

    // Inline templates keep their whitespace; only blank means "default".
    let template = TemplateSource::from_input(raw.formula_template.as_deref());

    Ok(PublishConfig {
        target,
        artifacts,
        metadata,
        template,
        download_timeout: raw
            .download_timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
        dry_run: raw.dry_run.unwrap_or(false),
    })
}
