// Single multipart POST to `{api_url}/documents`, used for every platform
// without a specialised connector.

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde_json::{json, Value};
use tracing::debug;

use super::{callback, Connector, PlatformInfo};
use crate::models::DeliveryOutcome;
use crate::queue::DeliveryJob;

pub struct GenericConnector {
    client: Client,
}

impl GenericConnector {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn build_form(job: &DeliveryJob) -> Result<multipart::Form, reqwest::Error> {
        let metadata = json!({
            "document_id": job.document_id,
            "filename": job.file.filename,
            "content_type": job.file.content_type,
            "document_type": job.classification.document_type,
            "classification_metadata": job.classification.metadata,
            "confidence_score": job.classification.confidence_score,
        });

        let file_part = multipart::Part::bytes(job.file.bytes.to_vec())
            .file_name(job.file.filename.clone())
            .mime_str(job.content_type())?;
        let metadata_part = multipart::Part::text(metadata.to_string()).mime_str("application/json")?;

        Ok(multipart::Form::new()
            .part("file", file_part)
            .part("metadata", metadata_part))
    }

    async fn upload(&self, job: &DeliveryJob, platform: &PlatformInfo) -> Result<DeliveryOutcome, reqwest::Error> {
        let url = format!("{}/documents", platform.api_url);
        debug!(url = %url, document_id = %job.document_id, "Uploading document");

        let response = self
            .client
            .post(&url)
            .multipart(Self::build_form(job)?)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Ok(DeliveryOutcome::failure(
                &platform.id,
                format!("Upload failed with status {}: {}", status.as_u16(), body),
            ));
        }

        let remote_id = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("id").cloned())
            .map(|id| match id {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .unwrap_or_default();

        callback::notify(&self.client, job, &platform.id, &remote_id);
        Ok(DeliveryOutcome::success(&platform.id, remote_id))
    }
}

#[async_trait]
impl Connector for GenericConnector {
    async fn push_document(&self, job: &DeliveryJob, platform: &PlatformInfo) -> DeliveryOutcome {
        match self.upload(job, platform).await {
            Ok(outcome) => outcome,
            Err(e) => DeliveryOutcome::failure(&platform.id, e.to_string()),
        }
    }
}
