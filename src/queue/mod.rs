//! Background delivery queue
//!
//! Submitting a job never waits for the delivery itself. A single worker
//! receives jobs and spawns one task per job; jobs run concurrently and in
//! no particular order. Outcomes are logged, never reported to the client.

pub mod jobs;
pub mod workers;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::delivery::DeliveryRouter;
use crate::models::DeliveryOutcome;

pub use jobs::DeliveryJob;
pub use workers::Worker;

#[derive(Clone)]
pub struct DeliveryQueue {
    sender: mpsc::UnboundedSender<DeliveryJob>,
}

impl DeliveryQueue {
    /// Create the queue and spawn its worker on the current runtime.
    pub fn start(router: Arc<DeliveryRouter>) -> (Self, JoinHandle<()>) {
        Self::start_worker(Worker::new(router))
    }

    /// Like [`DeliveryQueue::start`], also forwarding each outcome to the
    /// returned receiver.
    pub fn start_with_outcomes(
        router: Arc<DeliveryRouter>,
    ) -> (Self, JoinHandle<()>, mpsc::UnboundedReceiver<DeliveryOutcome>) {
        let (sink, outcomes) = mpsc::unbounded_channel();
        let (queue, handle) = Self::start_worker(Worker::new(router).with_outcome_sink(sink));
        (queue, handle, outcomes)
    }

    fn start_worker(worker: Worker) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(worker.run(receiver));
        (Self { sender }, handle)
    }

    pub fn submit(&self, job: DeliveryJob) {
        let document_id = job.document_id.clone();
        match self.sender.send(job) {
            Ok(()) => debug!(document_id = %document_id, "Delivery job queued"),
            Err(_) => error!(document_id = %document_id, "Delivery worker is gone, job dropped"),
        }
    }
}
