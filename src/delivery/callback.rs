use reqwest::Client;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::queue::DeliveryJob;

#[derive(Debug, Serialize)]
pub struct CallbackPayload {
    pub document_id: String,
    pub platform: String,
    pub status: &'static str,
    pub platform_document_id: String,
    pub classification: String,
}

/// Tell the caller's callback URL that a push succeeded. The POST runs on
/// its own task so a slow receiver never holds up the delivery; the
/// response is ignored and failures are only logged.
pub fn notify(
    client: &Client,
    job: &DeliveryJob,
    platform: &str,
    platform_document_id: &str,
) -> Option<JoinHandle<()>> {
    let url = job.callback_url.clone()?;
    let client = client.clone();
    let payload = CallbackPayload {
        document_id: job.document_id.clone(),
        platform: platform.to_string(),
        status: "success",
        platform_document_id: platform_document_id.to_string(),
        classification: job.classification.document_type.clone(),
    };

    Some(tokio::spawn(async move {
        match client.post(&url).json(&payload).send().await {
            Ok(response) => debug!(
                url = %url,
                status = %response.status(),
                document_id = %payload.document_id,
                "Callback delivered"
            ),
            Err(e) => warn!(url = %url, error = %e, document_id = %payload.document_id, "Callback failed"),
        }
    }))
}
