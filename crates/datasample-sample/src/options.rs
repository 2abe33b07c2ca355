//! Options of the sampling command.

use serde::{Deserialize, Serialize};

use datasample_core::{Result, ValidationError};
use datasample_importer::BatchSize;

const fn default_limit() -> usize {
    1000
}

const fn default_batch_size() -> i64 {
    100
}

const fn default_true() -> bool {
    true
}

/// Options of a [`DataSample`](crate::DataSample) run.
///
/// Missing JSON fields take their defaults: no labels (every model), no
/// excludes, 1000 keys per model, batches of 100, no random order, interactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleOptions {
    /// `app_label` or `app_label.ModelName` labels to sample.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Apps or models to leave out.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Keys per model; 0 samples every record.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Records copied per batch. Checked before any I/O.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Sample keys in random order instead of key order.
    #[serde(default)]
    pub random: bool,
    /// Ask for confirmation before importing.
    #[serde(default = "default_true")]
    pub interactive: bool,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            exclude: Vec::new(),
            limit: default_limit(),
            batch_size: default_batch_size(),
            random: false,
            interactive: true,
        }
    }
}

impl SampleOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Add a label to sample.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Add an app or model to leave out.
    #[must_use]
    pub fn exclude(mut self, label: impl Into<String>) -> Self {
        self.exclude.push(label.into());
        self
    }

    /// Set the keys per model; 0 samples everything.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable random sampling.
    #[must_use]
    pub fn random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }

    /// Enable or disable the confirmation prompt.
    #[must_use]
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// The per-model limit, `None` meaning every key.
    pub fn key_limit(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit)
    }

    /// The validated batch size.
    pub fn validated_batch_size(&self) -> std::result::Result<BatchSize, ValidationError> {
        BatchSize::try_from(self.batch_size)
    }

    pub(crate) fn validate(&self) -> Result<BatchSize> {
        Ok(self.validated_batch_size()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasample_core::ValidationErrorKind;

    #[test]
    fn test_json_defaults() {
        let options = SampleOptions::from_json("{}").unwrap();
        assert_eq!(options, SampleOptions::default());
        assert_eq!(options.limit, 1000);
        assert_eq!(options.batch_size, 100);
        assert!(!options.random);
        assert!(options.interactive);
    }

    #[test]
    fn test_json_overrides() {
        let options = SampleOptions::from_json(
            r#"{"labels": ["shop"], "exclude": ["shop.Order"], "limit": 0, "random": true, "interactive": false}"#,
        )
        .unwrap();
        assert_eq!(options.labels, vec!["shop"]);
        assert_eq!(options.exclude, vec!["shop.Order"]);
        assert_eq!(options.key_limit(), None);
        assert!(options.random);
        assert!(!options.interactive);
    }

    #[test]
    fn test_builder_and_limit() {
        let options = SampleOptions::new().label("auth").exclude("auth.Group").limit(5);
        assert_eq!(options.key_limit(), Some(5));
        assert_eq!(options.labels, vec!["auth"]);
    }

    #[test]
    fn test_batch_size_validation() {
        let err = SampleOptions::new().batch_size(-1).validated_batch_size().unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::BatchSize);
        assert!(SampleOptions::new().batch_size(0).validate().is_err());
        assert_eq!(SampleOptions::new().validate().unwrap().get(), 100);
    }
}
