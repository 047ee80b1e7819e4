//! Document Delivery
//!
//! Routes a classified document to a platform connector. The router is
//! built once at startup in one of two modes:
//!
//! - **Mock** (`DEBUG`): every push succeeds immediately with
//!   `mock-<document_id>` and nothing leaves the process.
//! - **Live**: unknown platforms fail without network access, a registered
//!   specialised connector handles its own platform, and every other
//!   registry entry goes through the generic connector.
//!
//! Dispatch never returns an error; every failure is folded into the
//! [`DeliveryOutcome`].

pub mod callback;
pub mod doccloud;
pub mod generic;
pub mod registry;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::DeliveryOutcome;
use crate::queue::DeliveryJob;
use crate::types::ConfigError;

pub use doccloud::{DocCloudConnector, UnconfiguredDocCloud};
pub use generic::GenericConnector;
pub use registry::{supported_platforms, PlatformInfo, DOCCLOUD_PLATFORM_ID};

/// A platform integration. Implementations report failures in the outcome
/// rather than returning them.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn push_document(&self, job: &DeliveryJob, platform: &PlatformInfo) -> DeliveryOutcome;
}

enum DeliveryStrategy {
    Mock,
    Live {
        platforms: HashMap<String, PlatformInfo>,
        connectors: HashMap<String, Box<dyn Connector>>,
        generic: GenericConnector,
    },
}

pub struct DeliveryRouter {
    strategy: DeliveryStrategy,
}

impl DeliveryRouter {
    pub fn mock() -> Self {
        Self {
            strategy: DeliveryStrategy::Mock,
        }
    }

    pub fn live(
        platforms: &[PlatformInfo],
        connectors: HashMap<String, Box<dyn Connector>>,
        client: Client,
    ) -> Self {
        let platforms = platforms.iter().map(|p| (p.id.clone(), p.clone())).collect();
        Self {
            strategy: DeliveryStrategy::Live {
                platforms,
                connectors,
                generic: GenericConnector::new(client),
            },
        }
    }

    /// Mock under `DEBUG`, otherwise live with every specialised connector
    /// whose credentials are configured.
    pub fn from_config(config: &Config, platforms: &[PlatformInfo]) -> Result<Self, ConfigError> {
        if config.debug {
            warn!("Delivery running in mock mode, no documents will leave the service");
            return Ok(Self::mock());
        }

        let client = Client::new();
        let mut connectors: HashMap<String, Box<dyn Connector>> = HashMap::new();

        let missing = config.doccloud.missing_credentials();
        match missing.len() {
            0 => {
                let connector = DocCloudConnector::new(&config.doccloud, client.clone())?;
                connectors.insert(DOCCLOUD_PLATFORM_ID.to_string(), Box::new(connector));
            }
            3 => {
                warn!(
                    platform = DOCCLOUD_PLATFORM_ID,
                    "No DocCloud credentials configured, pushes to this platform will fail"
                );
                connectors.insert(
                    DOCCLOUD_PLATFORM_ID.to_string(),
                    Box::new(UnconfiguredDocCloud::new(&config.doccloud)),
                );
            }
            _ => {
                return Err(ConfigError::PartialCredentials {
                    platform: DOCCLOUD_PLATFORM_ID.to_string(),
                    missing: missing.join(", "),
                })
            }
        }

        let router = Self::live(platforms, connectors, client);
        info!(mode = router.mode(), "Delivery router initialised");
        Ok(router)
    }

    pub fn mode(&self) -> &'static str {
        match self.strategy {
            DeliveryStrategy::Mock => "mock",
            DeliveryStrategy::Live { .. } => "live",
        }
    }

    pub async fn dispatch(&self, job: &DeliveryJob) -> DeliveryOutcome {
        match &self.strategy {
            DeliveryStrategy::Mock => {
                debug!(platform = %job.platform, document_id = %job.document_id, "Mock delivery");
                let mut outcome =
                    DeliveryOutcome::success(&job.platform, format!("mock-{}", job.document_id));
                outcome.mock = true;
                outcome
            }
            DeliveryStrategy::Live {
                platforms,
                connectors,
                generic,
            } => {
                let Some(platform) = platforms.get(&job.platform) else {
                    return DeliveryOutcome::failure(
                        &job.platform,
                        format!("Unsupported platform: {}", job.platform),
                    );
                };

                match connectors.get(&job.platform) {
                    Some(connector) => connector.push_document(job, platform).await,
                    None => generic.push_document(job, platform).await,
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ClassificationResult, Metadata, UploadedFile};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub(crate) fn job(platform: &str, callback_url: Option<String>) -> DeliveryJob {
        let mut metadata = Metadata::new();
        metadata.insert("tax_year".into(), "2023".into());
        DeliveryJob {
            platform: platform.to_string(),
            document_id: "doc-1".to_string(),
            file: UploadedFile::new("w2.pdf", "application/pdf", &b"%PDF-1.5 fake"[..]),
            classification: ClassificationResult {
                document_type: "W-2".to_string(),
                confidence_score: 0.95,
                metadata,
                reasoning: String::new(),
            },
            callback_url,
        }
    }

    pub(crate) fn platform(id: &str, api_url: &str) -> PlatformInfo {
        PlatformInfo {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            api_url: api_url.to_string(),
        }
    }

    /// Callbacks are spawned, so give the hook a moment to be hit.
    pub(crate) async fn wait_for_hit(mock: &mockito::Mock) {
        for _ in 0..200 {
            if mock.matched_async().await {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    struct CountingConnector(Arc<AtomicUsize>);

    #[async_trait]
    impl Connector for CountingConnector {
        async fn push_document(&self, job: &DeliveryJob, platform: &PlatformInfo) -> DeliveryOutcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            DeliveryOutcome::success(&platform.id, format!("special-{}", job.document_id))
        }
    }

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        Config::from_lookup(|key| map.get(key).map(|v| v.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_mock_delivery() {
        let router = DeliveryRouter::mock();
        let outcome = router.dispatch(&job("anything-at-all", None)).await;

        assert!(outcome.success);
        assert!(outcome.mock);
        assert_eq!(outcome.platform, "anything-at-all");
        assert_eq!(outcome.platform_document_id.as_deref(), Some("mock-doc-1"));
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let router = DeliveryRouter::live(&[platform("box", "http://127.0.0.1:9")], HashMap::new(), Client::new());
        let outcome = router.dispatch(&job("ftp", None)).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Unsupported platform: ftp"));
    }

    #[tokio::test]
    async fn test_specialised_connector_takes_precedence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut connectors: HashMap<String, Box<dyn Connector>> = HashMap::new();
        connectors.insert("bu_doccloud".to_string(), Box::new(CountingConnector(calls.clone())));

        let mut server = mockito::Server::new_async().await;
        let generic_upload = server
            .mock("POST", "/documents")
            .with_status(200)
            .with_body(r#"{"id": "g-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let platforms = [platform("bu_doccloud", &server.url()), platform("box", &server.url())];
        let router = DeliveryRouter::live(&platforms, connectors, Client::new());

        let special = router.dispatch(&job("bu_doccloud", None)).await;
        let fallback = router.dispatch(&job("box", None)).await;

        assert_eq!(special.platform_document_id.as_deref(), Some("special-doc-1"));
        assert_eq!(fallback.platform_document_id.as_deref(), Some("g-1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        generic_upload.assert_async().await;
    }

    #[test]
    fn test_mode_selection() {
        let debug = config(&[("DEBUG", "true")]);
        let router = DeliveryRouter::from_config(&debug, &supported_platforms(&debug)).unwrap();
        assert_eq!(router.mode(), "mock");

        let live = config(&[]);
        let router = DeliveryRouter::from_config(&live, &supported_platforms(&live)).unwrap();
        assert_eq!(router.mode(), "live");
    }

    #[tokio::test]
    async fn test_doccloud_without_credentials_never_uses_generic() {
        let mut server = mockito::Server::new_async().await;
        let generic_upload = server.mock("POST", "/documents").expect(0).create_async().await;

        let url = server.url();
        let live = config(&[("BU_DOCCLOUD_API_URL", url.as_str())]);
        let router = DeliveryRouter::from_config(&live, &supported_platforms(&live)).unwrap();
        let outcome = router.dispatch(&job("bu_doccloud", None)).await;

        assert!(!outcome.success);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .starts_with("Missing BU DocCloud credentials: BU_DOCCLOUD_API_KEY"));
        generic_upload.assert_async().await;
    }

    #[test]
    fn test_partial_doccloud_credentials_are_fatal() {
        let partial = config(&[("BU_DOCCLOUD_API_KEY", "key")]);
        let err = DeliveryRouter::from_config(&partial, &supported_platforms(&partial)).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::PartialCredentials { ref missing, .. }
                if missing == "BU_DOCCLOUD_CLIENT_ID, BU_DOCCLOUD_CLIENT_SECRET"
        ));
    }
}
