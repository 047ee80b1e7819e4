use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;
use crate::config::Config;
use crate::delivery::{supported_platforms, DeliveryRouter, PlatformInfo};
use crate::extraction::Extractor;
use crate::queue::DeliveryQueue;
use crate::types::ConfigError;

/// Free-form key/value facts attached to documents and classifications.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub extractor: Arc<Extractor>,
    pub classifier: Arc<Classifier>,
    pub platforms: Arc<Vec<PlatformInfo>>,
    pub delivery: Arc<DeliveryRouter>,
    pub delivery_queue: DeliveryQueue,
}

impl AppState {
    /// Build every service from the configuration and start the delivery
    /// worker. Must be called from within a tokio runtime.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let platforms = supported_platforms(&config);
        let classifier = Classifier::from_config(&config)?;
        let delivery = Arc::new(DeliveryRouter::from_config(&config, &platforms)?);
        let (delivery_queue, _worker) = DeliveryQueue::start(delivery.clone());

        Ok(Self {
            extractor: Arc::new(Extractor::from_config(&config.ocr)),
            classifier: Arc::new(classifier),
            platforms: Arc::new(platforms),
            delivery,
            delivery_queue,
            config: Arc::new(config),
        })
    }
}

/// An uploaded file as received by the service. The bytes are immutable and
/// shared, so the delivery path always reads the full content.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Uniform extractor output, whatever the source format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub filename: String,
    pub mime_type: String,
    /// Lower-cased, with the leading dot
    pub file_extension: String,
    pub text_content: String,
    pub pages: Vec<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub document_type: String,
    pub confidence_score: f64,
    pub metadata: Metadata,
    pub reasoning: String,
}

impl ClassificationResult {
    /// Stamp the source file facts onto the metadata. System keys overwrite
    /// anything the classifier produced under the same name.
    pub fn merge_file_info(&mut self, doc: &NormalizedDocument) {
        self.metadata.insert("filename".into(), doc.filename.clone().into());
        self.metadata
            .insert("file_extension".into(), doc.file_extension.clone().into());
        self.metadata.insert("mime_type".into(), doc.mime_type.clone().into());
    }
}

/// One element of the `POST /classify` response array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentClassification {
    pub document_id: String,
    pub document_name: String,
    pub document_type: String,
    pub confidence_score: f64,
    pub metadata: Metadata,
}

/// Result of a single push of one document to one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_document_id: Option<String>,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub mock: bool,
}

impl DeliveryOutcome {
    pub fn success(platform: impl Into<String>, platform_document_id: impl Into<String>) -> Self {
        Self {
            success: true,
            platform_document_id: Some(platform_document_id.into()),
            platform: platform.into(),
            error: None,
            mock: false,
        }
    }

    pub fn failure(platform: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            platform_document_id: None,
            platform: platform.into(),
            error: Some(error.into()),
            mock: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub classifier_mode: String,
    pub delivery_mode: String,
}
