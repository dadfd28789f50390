//! Raw inputs and the sources they are merged from.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::providers::{Format, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

/// Prefix GitHub Actions puts on action inputs in the environment.
pub const ACTION_INPUT_PREFIX: &str = "INPUT_";

// ---------------------------------------------------------------------------
// RawInputs
// ---------------------------------------------------------------------------

/// Inputs as supplied, before validation.
///
/// Every field is optional here; [`resolve`](crate::resolve) decides what is
/// required. Keys are the kebab-case input names (`formula-target-file`,
/// `tar-files`, ...). Scalar fields accept any scalar so that values parsed
/// loosely from the environment (`true`, `30`) still land in the right place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawInputs {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub formula_target_repository: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub formula_target_file: Option<String>,

    /// Template path or inline template text.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub formula_template: Option<String>,

    /// JSON/YAML text, or a mapping when given structurally in a config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tar_files: Option<Value>,

    /// JSON/YAML text, or a mapping when given structurally in a config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub git_host: Option<String>,

    /// Per-download timeout in seconds.
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub download_timeout: Option<u64>,

    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u64>, D::Error> {
    use serde::de::Error;

    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a whole number of seconds, got {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a whole number of seconds, got '{s}'"))),
        Some(other) => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<bool>, D::Error> {
    use serde::de::Error;

    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!("expected true or false, got '{s}'"))),
        },
        Some(other) => Err(D::Error::custom(format!("expected true or false, got {other}"))),
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// One layer of input. Later sources override earlier ones.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A YAML (or, by `.toml` extension, TOML) file keyed by input name.
    File(PathBuf),
    /// GitHub Actions inputs: `INPUT_<NAME>` environment variables.
    ActionInputs,
    /// Values given directly, typically CLI flags.
    Overrides(RawInputs),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "config file {}", path.display()),
            Self::ActionInputs => write!(f, "{ACTION_INPUT_PREFIX}* environment"),
            Self::Overrides(_) => f.write_str("command line"),
        }
    }
}

/// Collect `INPUT_<NAME>` variables as `name -> string`, with the name
/// lowercased.
///
/// Values stay strings: a commit message of `1.10` or a token with leading
/// zeros must reach [`RawInputs`] exactly as the runner exported it.
fn action_inputs() -> Map<String, Value> {
    std::env::vars_os()
        .filter_map(|(key, value)| {
            let key = key.to_str()?;
            let prefix = key.get(..ACTION_INPUT_PREFIX.len())?;
            if !prefix.eq_ignore_ascii_case(ACTION_INPUT_PREFIX) {
                return None;
            }
            let name = key[ACTION_INPUT_PREFIX.len()..].to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            let value = value.into_string().ok()?;
            // The runner exports every declared input; blank means unset.
            if value.trim().is_empty() {
                return None;
            }
            Some((name, Value::String(value)))
        })
        .collect()
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Merge `sources` in order into one [`RawInputs`].
///
/// # Errors
///
/// Returns [`ConfigError::ConfigNotFound`] for a missing config file and
/// [`ConfigError::Extract`] when a source cannot be read or a value has the
/// wrong shape.
pub fn load_inputs(sources: &[ConfigSource]) -> Result<RawInputs> {
    let mut figment = Figment::new();
    for source in sources {
        tracing::debug!("reading inputs from {source}");
        figment = match source {
            ConfigSource::File(path) => {
                if !path.is_file() {
                    return Err(ConfigError::ConfigNotFound(path.clone()));
                }
                if is_toml(path) {
                    figment.merge(Toml::file(path))
                } else {
                    figment.merge(Yaml::file(path))
                }
            }
            ConfigSource::ActionInputs => figment.merge(Serialized::defaults(action_inputs())),
            ConfigSource::Overrides(raw) => figment.merge(Serialized::defaults(raw.clone())),
        };
    }
    Ok(figment.extract()?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn action_inputs_from_environment() {
        Jail::expect_with(|jail| {
            jail.set_env("INPUT_FORMULA-TARGET-REPOSITORY", "acme/homebrew-tap");
            jail.set_env("INPUT_FORMULA-TARGET-FILE", "Formula/hello.rb");
            jail.set_env("INPUT_TAR-FILES", r#"{"macArm": "https://example.com/a.tar.gz"}"#);
            jail.set_env("INPUT_DRY-RUN", "true");
            jail.set_env("INPUT_DOWNLOAD-TIMEOUT", "30");

            let raw = load_inputs(&[ConfigSource::ActionInputs]).unwrap();
            assert_eq!(raw.formula_target_repository.as_deref(), Some("acme/homebrew-tap"));
            assert_eq!(raw.formula_target_file.as_deref(), Some("Formula/hello.rb"));
            assert_eq!(
                raw.tar_files,
                Some(json!(r#"{"macArm": "https://example.com/a.tar.gz"}"#))
            );
            assert_eq!(raw.dry_run, Some(true));
            assert_eq!(raw.download_timeout, Some(30));
            Ok(())
        });
    }

    #[test]
    fn action_inputs_stay_verbatim_strings() {
        Jail::expect_with(|jail| {
            jail.set_env("INPUT_COMMIT-MESSAGE", "1.10");
            jail.set_env("INPUT_GITHUB-TOKEN", "0012345");
            jail.set_env("INPUT_FORMULA-TARGET-FILE", "[skip ci] hello.rb");
            jail.set_env("INPUT_GIT-HOST", "true");

            let raw = load_inputs(&[ConfigSource::ActionInputs]).unwrap();
            assert_eq!(raw.commit_message.as_deref(), Some("1.10"));
            assert_eq!(raw.github_token.as_deref(), Some("0012345"));
            assert_eq!(raw.formula_target_file.as_deref(), Some("[skip ci] hello.rb"));
            assert_eq!(raw.git_host.as_deref(), Some("true"));
            Ok(())
        });
    }

    #[test]
    fn action_inputs_keep_json_payload_text() {
        Jail::expect_with(|jail| {
            jail.set_env("INPUT_METADATA", "[1, 2]");
            let raw = load_inputs(&[ConfigSource::ActionInputs]).unwrap();
            assert_eq!(raw.metadata, Some(json!("[1, 2]")));
            Ok(())
        });
    }

    #[test]
    fn blank_action_inputs_are_absent() {
        Jail::expect_with(|jail| {
            // The runner exports every declared input, set or not.
            jail.set_env("INPUT_DRY-RUN", "");
            jail.set_env("INPUT_DOWNLOAD-TIMEOUT", "");
            let raw = load_inputs(&[ConfigSource::ActionInputs]).unwrap();
            assert_eq!(raw.dry_run, None);
            assert_eq!(raw.download_timeout, None);
            Ok(())
        });
    }

    #[test]
    fn blank_action_input_keeps_config_file_value() {
        Jail::expect_with(|jail| {
            jail.create_file("brewtap.yaml", "commit-message: from file\n")?;
            jail.set_env("INPUT_COMMIT-MESSAGE", "");
            let raw = load_inputs(&[
                ConfigSource::File("brewtap.yaml".into()),
                ConfigSource::ActionInputs,
            ])
            .unwrap();
            assert_eq!(raw.commit_message.as_deref(), Some("from file"));
            Ok(())
        });
    }

    #[test]
    fn yaml_file_with_structured_payloads() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "brewtap.yaml",
                r#"
formula-target-repository: acme/homebrew-tap
formula-target-file: Formula/hello.rb
tar-files:
  macArm: https://example.com/mac-arm.tar.gz
metadata:
  className: Hello
  version: 1.0.0
"#,
            )?;
            let raw = load_inputs(&[ConfigSource::File("brewtap.yaml".into())]).unwrap();
            assert_eq!(
                raw.tar_files,
                Some(json!({"macArm": "https://example.com/mac-arm.tar.gz"}))
            );
            assert_eq!(
                raw.metadata,
                Some(json!({"className": "Hello", "version": "1.0.0"}))
            );
            Ok(())
        });
    }

    #[test]
    fn toml_file_by_extension() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "brewtap.toml",
                r#"
formula-target-file = "Formula/hello.rb"
commit-message = "hello 1.0.0"
"#,
            )?;
            let raw = load_inputs(&[ConfigSource::File("brewtap.toml".into())]).unwrap();
            assert_eq!(raw.formula_target_file.as_deref(), Some("Formula/hello.rb"));
            assert_eq!(raw.commit_message.as_deref(), Some("hello 1.0.0"));
            Ok(())
        });
    }

    #[test]
    fn later_sources_override_earlier() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "brewtap.yaml",
                "formula-target-file: from-file.rb\ncommit-message: from file\ngit-host: https://git.example\n",
            )?;
            jail.set_env("INPUT_FORMULA-TARGET-FILE", "from-env.rb");
            jail.set_env("INPUT_COMMIT-MESSAGE", "from env");

            let cli = RawInputs {
                commit_message: Some("from cli".to_string()),
                ..RawInputs::default()
            };
            let raw = load_inputs(&[
                ConfigSource::File("brewtap.yaml".into()),
                ConfigSource::ActionInputs,
                ConfigSource::Overrides(cli),
            ])
            .unwrap();

            assert_eq!(raw.git_host.as_deref(), Some("https://git.example"));
            assert_eq!(raw.formula_target_file.as_deref(), Some("from-env.rb"));
            assert_eq!(raw.commit_message.as_deref(), Some("from cli"));
            Ok(())
        });
    }

    #[test]
    fn missing_config_file() {
        let err = load_inputs(&[ConfigSource::File("/nonexistent/brewtap.yaml".into())]).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound(_)));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("INPUT_DOWNLOAD-TIMEOUT", "soon");
            let err = load_inputs(&[ConfigSource::ActionInputs]).unwrap_err();
            assert!(matches!(err, ConfigError::Extract(_)));
            Ok(())
        });
    }

    #[test]
    fn source_display() {
        assert_eq!(ConfigSource::ActionInputs.to_string(), "INPUT_* environment");
        assert_eq!(
            ConfigSource::File("a/b.yaml".into()).to_string(),
            "config file a/b.yaml"
        );
    }
}
