//! The data a formula template is rendered against.

use serde_json::{Map, Value};

use crate::artifact::ArtifactRecords;

/// Free-form package attributes (name, version, description, license, ...).
///
/// Passed through to templates untouched; the pipeline only requires it to
/// be an object. Key order follows the input document.
pub type Metadata = Map<String, Value>;

/// Template context: caller metadata plus the hashed artifacts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    pub metadata: Metadata,
    pub artifacts: ArtifactRecords,
}

impl TemplateContext {
    pub fn new(metadata: Metadata, artifacts: ArtifactRecords) -> Self {
        Self {
            metadata,
            artifacts,
        }
    }

    /// Build the root object templates are evaluated against.
    ///
    /// Artifacts are exposed under both `artifacts` and `tarFiles`, matching
    /// the `tar-files` input name.
    pub fn to_value(&self) -> Value {
        let artifacts: Map<String, Value> = self
            .artifacts
            .iter()
            .map(|(label, record)| {
                let mut entry = Map::new();
                entry.insert("url".into(), Value::String(record.url.clone()));
                entry.insert("sha256".into(), Value::String(record.sha256.clone()));
                (label.clone(), Value::Object(entry))
            })
            .collect();

        let mut root = Map::new();
        root.insert("metadata".into(), Value::Object(self.metadata.clone()));
        root.insert("artifacts".into(), Value::Object(artifacts.clone()));
        root.insert("tarFiles".into(), Value::Object(artifacts));
        Value::Object(root)
    }
}
