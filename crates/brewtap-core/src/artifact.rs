//! Release artifacts: the label -> URL input set and the hashed records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Mapping from a platform/architecture label (e.g. `macArm`) to the URL of
/// the prebuilt tarball for that platform.
///
/// Labels are unique. Insertion order is kept so that logs and template
/// iteration are reproducible, but nothing depends on it for correctness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactSet(IndexMap<String, String>);

impl ArtifactSet {
    /// Create an empty artifact set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the URL for `label`.
    pub fn insert(&mut self, label: impl Into<String>, url: impl Into<String>) {
        self.0.insert(label.into(), url.into());
    }

    /// Look up the URL for `label`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    /// Iterate `(label, url)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ArtifactSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A downloaded artifact: where it lives and the SHA-256 of its bytes.
///
/// Serialized as `{"url": ..., "sha256": ...}`, which is the shape templates
/// see under `artifacts.<label>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Source URL, copied from the [`ArtifactSet`].
    pub url: String,

    /// Lowercase hex SHA-256 digest of the full artifact content.
    pub sha256: String,
}

impl ArtifactRecord {
    pub fn new(url: impl Into<String>, sha256: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sha256: sha256.into(),
        }
    }
}

/// Hashed artifacts keyed by the same labels as the originating [`ArtifactSet`].
pub type ArtifactRecords = IndexMap<String, ArtifactRecord>;
