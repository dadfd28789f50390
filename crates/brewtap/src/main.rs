//! `brewtap` -- publish a Homebrew formula to a tap repository.
//!
//! Parses CLI arguments with clap, resolves inputs from the config file,
//! the GitHub Actions environment and flags, then runs the pipeline.

mod cli;
mod context;
mod output;
mod pipeline;

use std::io::IsTerminal;

use anyhow::anyhow;
use brewtap_config::{load_inputs, resolve};
use brewtap_git::GitCli;
use brewtap_hash::HttpFetcher;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use context::{process_env, RuntimeContext};
use pipeline::{Pipeline, PipelineError};

fn main() {
    let cli = Cli::parse();
    let ctx = RuntimeContext::new(&cli, process_env);

    // RUST_LOG takes precedence over -v.
    let default_filter = if ctx.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    // Messages are complete at the top level; sources are already folded in.
    if let Err(e) = run(&cli, &ctx) {
        eprintln!("Error: {e}");
        if ctx.github_actions {
            println!("{}", output::error_command(&e.to_string()));
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli, ctx: &RuntimeContext) -> anyhow::Result<()> {
    let raw = load_inputs(&cli.sources()).map_err(PipelineError::from)?;
    let config = resolve(raw, process_env).map_err(PipelineError::from)?;

    let pipeline = Pipeline::new(HttpFetcher::new(config.download_timeout), GitCli::new());
    let report = pipeline.run(&config)?;

    if config.dry_run {
        output::print_formula(&report);
    }
    if let Some(path) = &ctx.github_output {
        output::append_outputs(path, &output::step_outputs(&report))
            .map_err(|e| anyhow!("failed to write step outputs to {}: {e}", path.display()))?;
    }
    Ok(())
}
