//! Clap CLI definitions for the `brewtap` command.
//!
//! Every action input has a matching `--<input-name>` flag. Flags are the
//! highest-precedence source; anything not given here falls back to the
//! `INPUT_*` environment and then to the `--config` file.

use std::path::PathBuf;

use brewtap_config::{ConfigSource, RawInputs};
use clap::{Args, Parser};

/// brewtap -- publish a Homebrew formula to a tap.
///
/// Downloads each release tarball, computes its SHA-256, renders the formula
/// from a template and commits it to the tap repository.
#[derive(Parser, Debug)]
#[command(
    name = "brewtap",
    about = "Publish a Homebrew formula for a release to a tap repository",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// YAML or TOML file with default inputs.
    #[arg(long, value_name = "PATH", env = "BREWTAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// One flag per action input.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Tap repository to publish to.
    #[arg(long, value_name = "OWNER/REPO")]
    pub formula_target_repository: Option<String>,

    /// Path of the formula file inside the tap repository.
    #[arg(long, value_name = "PATH")]
    pub formula_target_file: Option<String>,

    /// Template file path or inline template text (default: built-in).
    #[arg(long, value_name = "PATH|TEXT")]
    pub formula_template: Option<String>,

    /// JSON or YAML object mapping artifact labels to tarball URLs.
    #[arg(long, value_name = "JSON|YAML")]
    pub tar_files: Option<String>,

    /// JSON or YAML object passed to the template as `metadata`.
    #[arg(long, value_name = "JSON|YAML")]
    pub metadata: Option<String>,

    /// Commit message (default: "chore: update Homebrew formula").
    #[arg(long, value_name = "MESSAGE")]
    pub commit_message: Option<String>,

    /// Token for clone and push (default: $HOMEBREW_TAP_TOKEN, $GH_TOKEN, $GITHUB_TOKEN).
    #[arg(long, value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// Base URL of the git host (default: $GITHUB_SERVER_URL or https://github.com).
    #[arg(long, value_name = "URL")]
    pub git_host: Option<String>,

    /// Seconds allowed for each artifact download.
    #[arg(long, value_name = "SECS")]
    pub download_timeout: Option<u64>,

    /// Render and print the formula without publishing it.
    #[arg(long)]
    pub dry_run: bool,
}

impl InputArgs {
    /// Flags as the highest-precedence input layer. Unset flags stay unset so
    /// lower layers show through.
    pub fn to_overrides(&self) -> RawInputs {
        RawInputs {
            formula_target_repository: self.formula_target_repository.clone(),
            formula_target_file: self.formula_target_file.clone(),
            formula_template: self.formula_template.clone(),
            tar_files: self.tar_files.clone().map(Into::into),
            metadata: self.metadata.clone().map(Into::into),
            commit_message: self.commit_message.clone(),
            github_token: self.github_token.clone(),
            git_host: self.git_host.clone(),
            download_timeout: self.download_timeout,
            dry_run: self.dry_run.then_some(true),
        }
    }
}

impl Cli {
    /// Input sources, lowest precedence first.
    pub fn sources(&self) -> Vec<ConfigSource> {
        let mut sources = Vec::with_capacity(3);
        if let Some(path) = &self.config {
            sources.push(ConfigSource::File(path.clone()));
        }
        sources.push(ConfigSource::ActionInputs);
        sources.push(ConfigSource::Overrides(self.inputs.to_overrides()));
        sources
    }
}
