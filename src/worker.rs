//! Bounded pipeline worker pool.
//!
//! Webhook handlers submit payloads and return immediately; a single
//! worker task drains the queue so the browser session is reused
//! sequentially, never in parallel. Every finished run is published on a
//! broadcast channel that tests (and future alerting) can subscribe to.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

use crate::model::OrderPayload;
use crate::pipeline::{OrderPipeline, PipelineReport};

/// Result type for job submission.
pub type Result<T> = std::result::Result<T, SubmitError>;

/// Errors that can occur while scheduling a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("pipeline job queue is full")]
    QueueFull,

    #[error("pipeline worker has shut down")]
    WorkerGone,
}

/// Handle to the running worker pool.
#[derive(Clone)]
pub struct JobPool {
    jobs: mpsc::Sender<OrderPayload>,
    reports: broadcast::Sender<PipelineReport>,
}

impl JobPool {
    /// Spawn the worker task and return the submission handle.
    pub fn spawn(pipeline: Arc<OrderPipeline>, capacity: usize) -> Self {
        let (jobs, mut job_rx) = mpsc::channel::<OrderPayload>(capacity.max(1));
        let (reports, _) = broadcast::channel(capacity.max(16));

        let report_tx = reports.clone();
        tokio::spawn(async move {
            info!(capacity, "pipeline worker started");
            while let Some(payload) = job_rx.recv().await {
                let report = pipeline.process(payload).await;
                // No subscribers is the normal production case.
                let _ = report_tx.send(report);
            }
            error!("pipeline job channel closed, worker exiting");
        });

        Self { jobs, reports }
    }

    /// Schedule one pipeline run without waiting for it.
    pub fn submit(&self, payload: OrderPayload) -> Result<()> {
        self.jobs.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SubmitError::WorkerGone,
        })
    }

    /// Observe completion reports. Each subscriber sees every report
    /// published after it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineReport> {
        self.reports.subscribe()
    }
}
