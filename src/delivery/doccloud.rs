//! BU DocCloud connector
//!
//! Client-credentials token, then a JSON metadata record, then the file
//! content as a multipart PUT against the record the metadata call created.
//! A fresh token is requested for every push.

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{callback, Connector, PlatformInfo};
use crate::config::DocCloudConfig;
use crate::models::DeliveryOutcome;
use crate::queue::DeliveryJob;
use crate::types::ConfigError;

pub const CLASSIFIER_VERSION: &str = "1.0.0";

pub struct DocCloudConnector {
    client: Client,
    api_url: String,
    api_key: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRecord<'a> {
    document_id: &'a str,
    file_name: &'a str,
    content_type: &'a str,
    document_type: &'a str,
    metadata_fields: Vec<MetadataField<'a>>,
    confidence_score: f64,
    classifier_version: &'static str,
}

#[derive(Debug, Serialize)]
struct MetadataField<'a> {
    name: &'a str,
    value: &'a Value,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl DocCloudConnector {
    pub fn new(config: &DocCloudConfig, client: Client) -> Result<Self, ConfigError> {
        if let Some(missing) = config.missing_credentials().first() {
            return Err(ConfigError::MissingCredential(missing.to_string()));
        }

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// `None` on any failure; callers report a single fixed error.
    async fn fetch_token(&self) -> Option<String> {
        let url = format!("{}/auth/token", self.api_url);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = match self.client.post(&url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "DocCloud token request failed");
                return None;
            }
        };

        if response.status().as_u16() >= 400 {
            warn!(status = %response.status(), "DocCloud token request rejected");
            return None;
        }

        response.json::<TokenResponse>().await.ok()?.access_token
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .bearer_auth(token)
            .header("X-DocCloud-Client-ID", &self.client_id)
            .header("X-Api-Key", &self.api_key)
    }

    async fn upload(&self, job: &DeliveryJob, platform: &str) -> Result<DeliveryOutcome, reqwest::Error> {
        let Some(token) = self.fetch_token().await else {
            return Ok(DeliveryOutcome::failure(platform, "Failed to obtain authentication token"));
        };

        let record = DocumentRecord {
            document_id: &job.document_id,
            file_name: &job.file.filename,
            content_type: &job.file.content_type,
            document_type: &job.classification.document_type,
            metadata_fields: job
                .classification
                .metadata
                .iter()
                .map(|(name, value)| MetadataField { name, value })
                .collect(),
            confidence_score: job.classification.confidence_score,
            classifier_version: CLASSIFIER_VERSION,
        };

        let response = self
            .authorized(self.client.post(format!("{}/documents", self.api_url)), &token)
            .json(&record)
            .send()
            .await?;

        if response.status().as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Ok(DeliveryOutcome::failure(platform, format!("Metadata creation failed: {}", body)));
        }

        let remote_id = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| match body.get("documentId") {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            });
        let Some(remote_id) = remote_id else {
            return Ok(DeliveryOutcome::failure(platform, "Metadata creation returned no documentId"));
        };
        debug!(document_id = %job.document_id, remote_id = %remote_id, "DocCloud record created");

        let file_part = multipart::Part::bytes(job.file.bytes.to_vec())
            .file_name(job.file.filename.clone())
            .mime_str(job.content_type())?;
        let response = self
            .authorized(
                self.client.put(format!("{}/documents/{}/content", self.api_url, remote_id)),
                &token,
            )
            .multipart(multipart::Form::new().part("file", file_part))
            .send()
            .await?;

        if response.status().as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Ok(DeliveryOutcome::failure(platform, format!("File upload failed: {}", body)));
        }

        info!(document_id = %job.document_id, remote_id = %remote_id, "Document stored in DocCloud");
        callback::notify(&self.client, job, platform, &remote_id);
        Ok(DeliveryOutcome::success(platform, remote_id))
    }
}

#[async_trait]
impl Connector for DocCloudConnector {
    async fn push_document(&self, job: &DeliveryJob, platform: &PlatformInfo) -> DeliveryOutcome {
        match self.upload(job, &platform.id).await {
            Ok(outcome) => outcome,
            Err(e) => DeliveryOutcome::failure(&platform.id, e.to_string()),
        }
    }
}

/// Stands in for [`DocCloudConnector`] when no credentials are configured.
/// Every push fails without touching the network.
pub struct UnconfiguredDocCloud {
    missing: String,
}

impl UnconfiguredDocCloud {
    pub fn new(config: &DocCloudConfig) -> Self {
        Self {
            missing: config.missing_credentials().join(", "),
        }
    }
}

#[async_trait]
impl Connector for UnconfiguredDocCloud {
    async fn push_document(&self, job: &DeliveryJob, platform: &PlatformInfo) -> DeliveryOutcome {
        warn!(document_id = %job.document_id, "DocCloud push refused, credentials not configured");
        DeliveryOutcome::failure(
            &platform.id,
            format!("Missing BU DocCloud credentials: {}", self.missing),
        )
    }
}
