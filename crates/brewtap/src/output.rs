//! Output helpers: the dry-run formula, GitHub Actions workflow commands
//! and step outputs.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use brewtap_git::PublishOutcome;

use crate::pipeline::PipelineReport;

/// Print the rendered formula to stdout, newline-terminated.
pub fn print_formula(report: &PipelineReport) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // Ignore broken pipe errors (e.g., piped to `head`)
    let _ = writeln!(handle, "{}", report.formula);
}

/// Escape a message for use as workflow command data.
fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Format an `::error::` workflow command, which marks the step failed in
/// the Actions UI.
pub fn error_command(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

/// Step outputs for a finished run, as `(name, value)` pairs.
pub fn step_outputs(report: &PipelineReport) -> Vec<(&'static str, String)> {
    let mut outputs = vec![("formula-path", report.path.clone())];
    match &report.outcome {
        Some(PublishOutcome::Committed { commit }) => outputs.push(("commit", commit.clone())),
        Some(PublishOutcome::Unchanged) => outputs.push(("unchanged", "true".to_string())),
        None => {}
    }
    outputs
}

/// Append `name=value` lines to the step output file.
pub fn append_outputs(path: &Path, outputs: &[(&str, String)]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (name, value) in outputs {
        writeln!(file, "{name}={value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewtap_core::RenderedDocument;
    use pretty_assertions::assert_eq;

    fn report(outcome: Option<PublishOutcome>) -> PipelineReport {
        PipelineReport {
            path: "Formula/hello.rb".to_string(),
            formula: RenderedDocument::new("class Hello < Formula\nend"),
            outcome,
        }
    }

    #[test]
    fn error_command_escapes_newlines_and_percent() {
        assert_eq!(
            error_command("100% broken\nsecond line\r"),
            "::error::100%25 broken%0Asecond line%0D"
        );
    }

    #[test]
    fn outputs_per_outcome() {
        let committed = report(Some(PublishOutcome::Committed {
            commit: "abc".to_string(),
        }));
        assert_eq!(
            step_outputs(&committed),
            vec![
                ("formula-path", "Formula/hello.rb".to_string()),
                ("commit", "abc".to_string())
            ]
        );
        assert_eq!(
            step_outputs(&report(Some(PublishOutcome::Unchanged)))[1],
            ("unchanged", "true".to_string())
        );
        assert_eq!(step_outputs(&report(None)).len(), 1);
    }

    #[test]
    fn append_keeps_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "earlier=1\n").unwrap();

        append_outputs(&path, &[("commit", "abc".to_string())]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier=1\ncommit=abc\n");
    }
}
