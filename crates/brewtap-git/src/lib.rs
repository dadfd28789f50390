//! Tap repository publishing for brewtap.
//!
//! Wraps the `git` executable to clone the destination repository into a
//! temporary working copy, replace the formula file, and commit and push the
//! change under the bot identity.

pub mod commands;
pub mod publisher;
pub mod repository;

pub use commands::GitError;
pub use publisher::{PublishError, PublishOutcome, PublishStep, Publisher, Result};
pub use repository::{validate_destination, GitCli, TapRepository, BOT_EMAIL, BOT_NAME};
