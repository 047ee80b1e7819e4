// Delivery worker

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::delivery::DeliveryRouter;
use crate::models::DeliveryOutcome;
use crate::queue::jobs::DeliveryJob;

pub struct Worker {
    router: Arc<DeliveryRouter>,
    outcomes: Option<mpsc::UnboundedSender<DeliveryOutcome>>,
}

impl Worker {
    pub fn new(router: Arc<DeliveryRouter>) -> Self {
        Self {
            router,
            outcomes: None,
        }
    }

    /// Forward every outcome to `sink` in addition to logging it.
    pub fn with_outcome_sink(mut self, sink: mpsc::UnboundedSender<DeliveryOutcome>) -> Self {
        self.outcomes = Some(sink);
        self
    }

    /// Drain the queue until every sender is dropped. Each job runs on its
    /// own task, so a slow platform never holds up the others.
    pub async fn run(self, mut jobs: mpsc::UnboundedReceiver<DeliveryJob>) {
        info!(mode = self.router.mode(), "Delivery worker started");

        while let Some(job) = jobs.recv().await {
            let router = self.router.clone();
            let sink = self.outcomes.clone();
            tokio::spawn(async move {
                let outcome = process_job(&router, job).await;
                if let Some(sink) = sink {
                    let _ = sink.send(outcome);
                }
            });
        }

        info!("Delivery queue closed, worker stopping");
    }
}

pub async fn process_job(router: &DeliveryRouter, job: DeliveryJob) -> DeliveryOutcome {
    let outcome = router.dispatch(&job).await;

    if outcome.success {
        info!(
            document_id = %job.document_id,
            platform = %outcome.platform,
            platform_document_id = outcome.platform_document_id.as_deref().unwrap_or_default(),
            mock = outcome.mock,
            "Document delivered"
        );
    } else {
        warn!(
            document_id = %job.document_id,
            platform = %outcome.platform,
            error = outcome.error.as_deref().unwrap_or_default(),
            "Document delivery failed"
        );
    }

    outcome
}
