//! Input resolution for brewtap.
//!
//! Inputs arrive from an ordered list of [`ConfigSource`]s (config file,
//! GitHub Actions `INPUT_*` variables, CLI flags). They are merged with
//! figment into [`RawInputs`] and then validated once into an immutable
//! [`PublishConfig`]. Nothing downstream reads the environment.

pub mod credential;
pub mod error;
pub mod inputs;
pub mod payload;
pub mod resolve;

pub use credential::{resolve_credential, CREDENTIAL_ENV_VARS};
pub use error::{ConfigError, Result};
pub use inputs::{load_inputs, ConfigSource, RawInputs};
pub use resolve::{resolve, PublishConfig};
