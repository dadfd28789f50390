//! Core types for the brewtap formula publisher.
//!
//! Every stage of the publish pipeline speaks in terms of the types defined
//! here: the [`artifact::ArtifactSet`] read from the inputs, the
//! [`artifact::ArtifactRecord`]s produced by hashing, the
//! [`context::TemplateContext`] handed to the renderer, and the
//! [`target::PublishTarget`] consumed by the publisher.

pub mod artifact;
pub mod context;
pub mod digest;
pub mod target;

pub use artifact::{ArtifactRecord, ArtifactRecords, ArtifactSet};
pub use context::{Metadata, TemplateContext};
pub use target::{
    Credential, PublishTarget, RenderedDocument, DEFAULT_COMMIT_MESSAGE, DEFAULT_GIT_HOST,
};
