//! Document Classification
//!
//! A [`Classifier`] wraps one strategy, chosen once at startup:
//!
//! - **Offline** - deterministic filename keyword table, no network access.
//!   Selected when `DEBUG` is set or the configured key is a demo key.
//! - **Online** - a single LLM call with a fixed four-field output schema.
//!
//! Both strategies end with the same step: the source file facts
//! (`filename`, `file_extension`, `mime_type`) are merged into the result
//! metadata, replacing any classifier-produced values under those keys.

pub mod offline;
pub mod online;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{ClassificationResult, NormalizedDocument};
use crate::types::{AppResult, ConfigError};

pub use offline::OfflineClassifier;
pub use online::OnlineClassifier;

/// The closed taxonomy offered to the LLM and listed by `GET /document-types`.
pub const DOCUMENT_TYPES: [&str; 21] = [
    "I-9",
    "W-4",
    "W-2",
    "1099",
    "Driver License",
    "Passport",
    "Social Security Card",
    "Birth Certificate",
    "Marriage Certificate",
    "Divorce Decree",
    "Legal Contract",
    "NDA",
    "Employment Contract",
    "Medical Record",
    "Insurance Card",
    "Pay Stub",
    "Bank Statement",
    "Utility Bill",
    "Rental Agreement",
    "Mortgage Document",
    "Other",
];

#[async_trait]
pub trait ClassificationStrategy: Send + Sync {
    async fn classify(&self, doc: &NormalizedDocument) -> AppResult<ClassificationResult>;

    fn mode(&self) -> &'static str;
}

pub struct Classifier {
    strategy: Box<dyn ClassificationStrategy>,
}

impl Classifier {
    pub fn new(strategy: Box<dyn ClassificationStrategy>) -> Self {
        Self { strategy }
    }

    /// Pick the strategy for this process. Fails when online mode is
    /// required but no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let strategy: Box<dyn ClassificationStrategy> = if config.offline_classification() {
            warn!("Using offline classifier, results are sample responses");
            Box::new(OfflineClassifier::new())
        } else {
            Box::new(OnlineClassifier::new(&config.llm)?)
        };

        info!(mode = strategy.mode(), "Classifier initialised");
        Ok(Self::new(strategy))
    }

    pub fn mode(&self) -> &'static str {
        self.strategy.mode()
    }

    pub async fn classify(&self, doc: &NormalizedDocument) -> AppResult<ClassificationResult> {
        let mut result = self.strategy.classify(doc).await?;
        result.merge_file_info(doc);

        info!(
            filename = %doc.filename,
            document_type = %result.document_type,
            confidence = result.confidence_score,
            mode = self.mode(),
            "Document classified"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        Config::from_lookup(|key| map.get(key).map(|v| v.to_string())).unwrap()
    }

    fn document(filename: &str, extension: &str) -> NormalizedDocument {
        NormalizedDocument {
            filename: filename.to_string(),
            mime_type: "application/pdf".to_string(),
            file_extension: extension.to_string(),
            text_content: "text".to_string(),
            pages: vec!["text".to_string()],
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_taxonomy_has_other_last() {
        assert_eq!(DOCUMENT_TYPES.len(), 21);
        assert_eq!(DOCUMENT_TYPES[20], "Other");
    }

    #[test]
    fn test_missing_key_is_a_startup_error() {
        let err = Classifier::from_config(&config(&[])).err().unwrap();
        assert!(matches!(err, ConfigError::MissingCredential(ref k) if k == "OPENAI_API_KEY"));
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(Classifier::from_config(&config(&[("DEBUG", "true")])).unwrap().mode(), "offline");
        assert_eq!(
            Classifier::from_config(&config(&[("OPENAI_API_KEY", "sk-demo-key")])).unwrap().mode(),
            "offline"
        );
        assert_eq!(
            Classifier::from_config(&config(&[("OPENAI_API_KEY", "sk-real")])).unwrap().mode(),
            "online"
        );
    }

    #[tokio::test]
    async fn test_classify_merges_file_info() {
        let classifier = Classifier::from_config(&config(&[("DEBUG", "1")])).unwrap();
        let result = classifier.classify(&document("employee_w2_form.pdf", ".pdf")).await.unwrap();

        assert_eq!(result.document_type, "W-2");
        assert_eq!(result.metadata["tax_year"], "2023");
        assert_eq!(result.metadata["filename"], "employee_w2_form.pdf");
        assert_eq!(result.metadata["file_extension"], ".pdf");
        assert_eq!(result.metadata["mime_type"], "application/pdf");
    }
}
