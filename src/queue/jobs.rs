// Delivery job definition

use crate::models::{ClassificationResult, UploadedFile};

/// One document to push to one platform, captured when the request is
/// accepted. Owns everything it needs; the HTTP request may be long gone
/// by the time it runs.
#[derive(Debug, Clone)]
pub struct DeliveryJob {
    pub platform: String,
    pub document_id: String,
    pub file: UploadedFile,
    pub classification: ClassificationResult,
    pub callback_url: Option<String>,
}

impl DeliveryJob {
    /// Content type to announce upstream, falling back to a generic binary type.
    pub fn content_type(&self) -> &str {
        if self.file.content_type.is_empty() {
            "application/octet-stream"
        } else {
            &self.file.content_type
        }
    }
}
