//! Parsing and validation of structured inputs: the artifact set, metadata
//! and the repository name.

use brewtap_core::{ArtifactSet, Metadata};
use serde_json::Value;

use crate::error::{ConfigError, Result};

/// Parse an input as a JSON or YAML mapping.
///
/// Text is tried as JSON first, then YAML. A value that is already
/// structured (from a config file) is used as is.
pub fn parse_object(input: &'static str, value: Value) -> Result<Metadata> {
    let value = match value {
        Value::String(text) => parse_text(input, &text)?,
        other => other,
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::NotObject {
            input,
            found: kind(&other),
        }),
    }
}

fn parse_text(input: &'static str, text: &str) -> Result<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str(text).map_err(|yaml_err| ConfigError::Parse {
            input,
            message: format!("{json_err} (as YAML: {yaml_err})"),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build the artifact set from the `tar-files` input.
///
/// Each value must be an absolute `http` or `https` URL, and at least one
/// artifact is required.
pub fn parse_artifacts(value: Value) -> Result<ArtifactSet> {
    let map = parse_object("tar-files", value)?;
    if map.is_empty() {
        return Err(ConfigError::EmptyArtifacts);
    }

    let mut set = ArtifactSet::new();
    for (label, url) in map {
        let url = match url {
            Value::String(url) => url.trim().to_string(),
            other => {
                return Err(ConfigError::InvalidUrl {
                    label,
                    url: other.to_string(),
                    reason: "URL must be a string",
                });
            }
        };
        if let Err(reason) = check_url(&url) {
            return Err(ConfigError::InvalidUrl { label, url, reason });
        }
        set.insert(label, url);
    }
    Ok(set)
}

fn check_url(url: &str) -> std::result::Result<(), &'static str> {
    let (scheme, rest) = url.split_once("://").ok_or("missing scheme")?;
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return Err("only http and https are supported");
    }
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err("missing host");
    }
    if url.chars().any(char::is_whitespace) {
        return Err("URL contains whitespace");
    }
    Ok(())
}

/// Check that `repository` is `owner/repo` and return it without a trailing
/// `.git`, which the remote URL adds itself.
pub fn validate_repository(repository: &str) -> Result<String> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && part != "."
            && part != ".."
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    match repository.split_once('/') {
        Some((owner, repo)) => {
            let repo = repo.strip_suffix(".git").unwrap_or(repo);
            if valid_part(owner) && valid_part(repo) {
                Ok(format!("{owner}/{repo}"))
            } else {
                Err(ConfigError::InvalidRepository(repository.to_string()))
            }
        }
        None => Err(ConfigError::InvalidRepository(repository.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_text() {
        let map = parse_object("metadata", json!(r#"{"className": "Hello", "version": "1.0.0"}"#))
            .unwrap();
        assert_eq!(map["className"], json!("Hello"));
        // Order of the input is kept.
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["className", "version"]);
    }

    #[test]
    fn yaml_text() {
        let map = parse_object("metadata", json!("className: Hello\nversion: 1.0.0\n")).unwrap();
        assert_eq!(map["version"], json!("1.0.0"));
    }

    #[test]
    fn structured_value_passes_through() {
        let map = parse_object("metadata", json!({"a": {"b": [1, 2]}})).unwrap();
        assert_eq!(map["a"], json!({"b": [1, 2]}));
    }

    #[test]
    fn non_object_rejected() {
        for (text, found) in [("[1, 2]", "an array"), ("just words", "a string"), ("42", "a number")] {
            match parse_object("metadata", json!(text)).unwrap_err() {
                ConfigError::NotObject { input, found: got } => {
                    assert_eq!(input, "metadata");
                    assert_eq!(got, found, "for {text:?}");
                }
                other => panic!("unexpected error for {text:?}: {other}"),
            }
        }
    }

    #[test]
    fn unparseable_text() {
        let err = parse_object("tar-files", json!("{ \"macArm\": ")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { input: "tar-files", .. }));
    }

    #[test]
    fn artifacts_keep_order_and_trim() {
        let set = parse_artifacts(json!(
            r#"{"macIntel": " https://example.com/b.tar.gz ", "macArm": "https://example.com/a.tar.gz"}"#
        ))
        .unwrap();
        assert_eq!(set.labels().collect::<Vec<_>>(), vec!["macIntel", "macArm"]);
        assert_eq!(set.get("macIntel"), Some("https://example.com/b.tar.gz"));
    }

    #[test]
    fn empty_artifacts_rejected() {
        assert!(matches!(
            parse_artifacts(json!("{}")).unwrap_err(),
            ConfigError::EmptyArtifacts
        ));
    }

    #[test]
    fn bad_urls_rejected() {
        for url in [
            json!("ftp://example.com/a.tar.gz"),
            json!("example.com/a.tar.gz"),
            json!("https:///a.tar.gz"),
            json!(7),
        ] {
            let err = parse_artifacts(json!({ "macArm": url })).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidUrl { .. }), "accepted {url}");
        }
    }

    #[test]
    fn repository_format() {
        assert!(validate_repository("acme/homebrew-tap").is_ok());
        assert!(validate_repository("a_b/c.d").is_ok());
        for bad in ["acme", "acme/", "/tap", "a/b/c", "acme/tap name", "../tap", "acme/.git"] {
            assert!(validate_repository(bad).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn repository_git_suffix_is_stripped() {
        assert_eq!(validate_repository("acme/tap.git").unwrap(), "acme/tap");
        assert_eq!(validate_repository("acme/homebrew-tap").unwrap(), "acme/homebrew-tap");
        assert_eq!(validate_repository("acme/tap.github.io").unwrap(), "acme/tap.github.io");
    }
}
