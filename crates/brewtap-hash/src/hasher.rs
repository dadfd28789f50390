//! Hash every artifact in a set.

use brewtap_core::digest::sha256_reader;
use brewtap_core::{ArtifactRecord, ArtifactRecords, ArtifactSet};
use tracing::{debug, info};

use crate::fetch::{Fetch, FetchError, Result};

/// Downloads artifacts through a [`Fetch`] and records their SHA-256.
#[derive(Debug, Clone)]
pub struct ArtifactHasher<F> {
    fetcher: F,
}

impl<F: Fetch> ArtifactHasher<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Hash one URL.
    pub fn hash_url(&self, url: &str) -> Result<String> {
        info!("Downloading {url} to compute sha256...");
        let mut body = self.fetcher.open(url)?;
        let (digest, bytes) = sha256_reader(&mut body).map_err(|source| FetchError::Read {
            url: url.to_string(),
            source,
        })?;
        debug!(url, bytes, sha256 = %digest, "artifact hashed");
        Ok(digest)
    }

    /// Hash every artifact, in set order.
    ///
    /// The returned map has exactly the labels of `artifacts`. The first
    /// failure aborts the run and no partial map is returned.
    pub fn hash(&self, artifacts: &ArtifactSet) -> Result<ArtifactRecords> {
        let mut records = ArtifactRecords::with_capacity(artifacts.len());
        for (label, url) in artifacts.iter() {
            let sha256 = self.hash_url(url)?;
            records.insert(label.to_string(), ArtifactRecord::new(url, sha256));
        }
        Ok(records)
    }
}
