//! Artifact hashing for the brewtap formula publisher.
//!
//! Downloads every artifact in an [`ArtifactSet`](brewtap_core::ArtifactSet)
//! and computes the SHA-256 each formula block pins. Hashing is
//! all-or-nothing: one failed download fails the whole set.

pub mod fetch;
pub mod hasher;

pub use fetch::{Fetch, FetchError, HttpFetcher, Result};
pub use hasher::ArtifactHasher;
