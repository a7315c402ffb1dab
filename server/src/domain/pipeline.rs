//! Relay pipeline host
//!
//! Consumes decoded batches from the receive queue and drives each one
//! through enrichment, duplication, and the sink as an independent
//! invocation. Invocations run concurrently up to `max_in_flight`; each one
//! owns its batch exclusively, so the stages need no locking.
//!
//! Every invocation completes exactly once: with the transformed batch
//! delivered to the sink, or with a logged failure (stage error, stage
//! timeout, or delivery failure) that drops the batch. No partial output is
//! ever forwarded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::core::config::PipelineConfig;
use crate::domain::duplicate::ViewDuplication;
use crate::domain::enrich::MetadataEnrichment;
use crate::domain::error::StageError;
use crate::domain::forward::BatchSink;
use crate::wire::WriteRequest;

pub struct RelayPipeline {
    enrichment: MetadataEnrichment,
    duplication: ViewDuplication,
    sink: Arc<dyn BatchSink>,
    stage_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl RelayPipeline {
    pub fn new(
        enrichment: MetadataEnrichment,
        duplication: ViewDuplication,
        sink: Arc<dyn BatchSink>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            enrichment,
            duplication,
            sink,
            stage_timeout: config.stage_timeout,
            permits: Arc::new(Semaphore::new(config.max_in_flight)),
        }
    }

    /// Start the pipeline task, consuming from the receive queue until the
    /// queue closes or shutdown is signalled. In-flight invocations are
    /// drained before the task exits.
    pub fn start(
        self,
        mut batches: mpsc::Receiver<WriteRequest>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let pipeline = Arc::new(self);
            let mut invocations = JoinSet::new();
            let mut shutdown_requested = false;

            loop {
                if shutdown_requested {
                    // Drain remaining queued batches before shutdown
                    match tokio::time::timeout(Duration::from_millis(100), batches.recv()).await {
                        Ok(Some(batch)) => {
                            Arc::clone(&pipeline)
                                .spawn_invocation(&mut invocations, batch)
                                .await;
                            continue;
                        }
                        _ => break,
                    }
                }

                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("RelayPipeline received shutdown, draining...");
                            shutdown_requested = true;
                        }
                    }
                    message = batches.recv() => {
                        match message {
                            Some(batch) => {
                                Arc::clone(&pipeline)
                                    .spawn_invocation(&mut invocations, batch)
                                    .await;
                            }
                            None => break,
                        }
                    }
                }
            }

            while invocations.join_next().await.is_some() {}
            tracing::debug!("RelayPipeline shutdown complete");
        })
    }

    async fn spawn_invocation(self: Arc<Self>, invocations: &mut JoinSet<()>, batch: WriteRequest) {
        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            // The semaphore is never closed while the pipeline runs.
            return;
        };
        invocations.spawn(async move {
            let _permit = permit;
            self.process(batch).await;
        });
    }

    /// One invocation: both stages, then delivery. Resolves exactly once.
    async fn process(&self, batch: WriteRequest) {
        let series_in = batch.timeseries.len();
        match self.run_stages(batch).await {
            Ok(transformed) => match self.sink.deliver(&transformed).await {
                Ok(()) => {
                    tracing::debug!(
                        series_in,
                        series_out = transformed.timeseries.len(),
                        "batch relayed"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, series_in, "delivery failed, dropping batch");
                }
            },
            Err(e) => {
                tracing::error!(error = %e, series_in, "stage failed, dropping batch");
            }
        }
    }

    async fn run_stages(&self, batch: WriteRequest) -> Result<WriteRequest, StageError> {
        let batch = self.staged(self.enrichment.apply(batch)).await?;
        let batch = self.staged(self.duplication.apply(batch)).await?;
        Ok(batch)
    }

    /// Apply the host deadline to one stage invocation.
    async fn staged<F>(&self, stage: F) -> Result<WriteRequest, StageError>
    where
        F: std::future::Future<Output = Result<WriteRequest, StageError>>,
    {
        match tokio::time::timeout(self.stage_timeout, stage).await {
            Ok(result) => result,
            Err(_) => Err(StageError::Timeout(self.stage_timeout)),
        }
    }
}
