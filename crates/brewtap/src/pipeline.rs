//! The publish pipeline: hash, render, publish.
//!
//! Stages run strictly in order and the first failure stops the run. No
//! formula is rendered unless every artifact hashed, and nothing is published
//! unless rendering succeeded.

use brewtap_config::{ConfigError, PublishConfig};
use brewtap_core::{RenderedDocument, TemplateContext};
use brewtap_formula::{RenderError, Template};
use brewtap_git::{PublishError, PublishOutcome, Publisher, TapRepository};
use brewtap_hash::{ArtifactHasher, Fetch, FetchError};
use thiserror::Error;
use tracing::info;

/// Any failure of a run. Displays as the underlying message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Path of the formula inside the tap repository.
    pub path: String,
    pub formula: RenderedDocument,
    /// `None` for a dry run.
    pub outcome: Option<PublishOutcome>,
}

/// Pipeline stages wired to concrete fetch and repository implementations.
pub struct Pipeline<F, R> {
    hasher: ArtifactHasher<F>,
    publisher: Publisher<R>,
}

impl<F: Fetch, R: TapRepository> Pipeline<F, R> {
    pub fn new(fetcher: F, repo: R) -> Self {
        Self {
            hasher: ArtifactHasher::new(fetcher),
            publisher: Publisher::new(repo),
        }
    }

    /// Run every stage for `config`.
    pub fn run(&self, config: &PublishConfig) -> Result<PipelineReport, PipelineError> {
        let records = self.hasher.hash(&config.artifacts)?;
        let context = TemplateContext::new(config.metadata.clone(), records);

        info!("Rendering formula from {}", config.template);
        let source = config.template.load()?;
        let formula = Template::parse(&source)?.render(&context)?;

        let target = &config.target;
        let outcome = if config.dry_run {
            info!(
                "Dry run: not publishing {} to {}",
                target.path, target.repository
            );
            None
        } else {
            Some(self.publisher.publish(target, &formula)?)
        };

        Ok(PipelineReport {
            path: target.path.clone(),
            formula,
            outcome,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
