//! Where template text comes from, and the built-in formula template.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use crate::types::{RenderError, Result};

/// Built-in formula template.
///
/// Emits one OS/CPU-guarded block per known artifact label (`linuxArm`,
/// `linuxIntel`, `macArm`, `macIntel`), installs the binary plus its shell
/// completions, and checks `--version` in the test block.
pub const DEFAULT_TEMPLATE: &str = r##"class {{ metadata.className }} < Formula
  desc "{{ metadata.description }}"
  homepage "{{ metadata.homepage | default("") }}"
  version "{{ metadata.version }}"
  license "{{ metadata.license }}"

{% if artifacts.linuxArm %}
  if OS.linux? && Hardware::CPU.arm?
    url "{{ artifacts.linuxArm.url }}"
    sha256 "{{ artifacts.linuxArm.sha256 }}"
  end
{% endif %}
{% if artifacts.linuxIntel %}
  if OS.linux? && Hardware::CPU.intel?
    url "{{ artifacts.linuxIntel.url }}"
    sha256 "{{ artifacts.linuxIntel.sha256 }}"
  end
{% endif %}
{% if artifacts.macArm %}
  if OS.mac? && Hardware::CPU.arm?
    url "{{ artifacts.macArm.url }}"
    sha256 "{{ artifacts.macArm.sha256 }}"
  end
{% endif %}
{% if artifacts.macIntel %}
  if OS.mac? && Hardware::CPU.intel?
    url "{{ artifacts.macIntel.url }}"
    sha256 "{{ artifacts.macIntel.sha256 }}"
  end
{% endif %}

  def install
    bin.install "{{ metadata.binaryName }}"
    bash_completion.install "completions/bash/{{ metadata.binaryName }}"
    fish_completion.install "completions/fish/{{ metadata.binaryName }}.fish"
    zsh_completion.install "completions/zsh/_{{ metadata.binaryName }}"
  end

  test do
    system "#{bin}/{{ metadata.binaryName }}", "--version"
  end
end"##;

/// Source of the template text for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// [`DEFAULT_TEMPLATE`].
    Default,
    /// A template file, read once at render time.
    File(PathBuf),
    /// Template text given directly as input.
    Inline(String),
}

impl TemplateSource {
    /// Classify a `formula-template` input value.
    ///
    /// Missing or blank means the built-in template. A value containing a
    /// newline or template markup is inline text; anything else is a path.
    pub fn from_input(value: Option<&str>) -> Self {
        match value {
            None => Self::Default,
            Some(v) if v.trim().is_empty() => Self::Default,
            Some(v) if v.contains('\n') || v.contains("{{") || v.contains("{%") => {
                Self::Inline(v.to_string())
            }
            Some(v) => Self::File(PathBuf::from(v.trim())),
        }
    }

    /// Load the template text.
    pub fn load(&self) -> Result<Cow<'_, str>> {
        match self {
            Self::Default => Ok(Cow::Borrowed(DEFAULT_TEMPLATE)),
            Self::Inline(text) => Ok(Cow::Borrowed(text.as_str())),
            Self::File(path) => std::fs::read_to_string(path)
                .map(|text| {
                    tracing::debug!(path = %path.display(), bytes = text.len(), "template loaded");
                    Cow::Owned(text)
                })
                .map_err(|source| RenderError::Io {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("built-in template"),
            Self::File(path) => write!(f, "template file {}", path.display()),
            Self::Inline(text) => write!(f, "inline template ({} bytes)", text.len()),
        }
    }
}
