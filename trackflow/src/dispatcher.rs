//! Batch dispatcher: validation, background execution, stage sequencing.

use crate::adapter::ServiceAdapter;
use crate::core::{BatchAck, BatchRequest, BatchRun};
use crate::errors::Result;
use crate::executor::StageExecutor;
use crate::gate::AdmissionGate;
use crate::registry::ServiceRegistry;
use crate::reporter::ResultReporter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates the ordered stage sequence for submitted batches.
///
/// Submission is synchronous only up to validation: once every stage in
/// the fixed order has a usable config, the batch runs on a background
/// task and the submitter gets an immediate acknowledgment. Stages run
/// strictly sequentially; within a stage, items run concurrently up to
/// the stage's admission limit. Item failures are data in the stage's
/// results, never batch termination — a batch has no failed state.
pub struct BatchDispatcher {
    registry: Arc<ServiceRegistry>,
    stage_order: Vec<String>,
    gates: HashMap<String, Arc<AdmissionGate>>,
    executor: StageExecutor,
    reporter: Arc<dyn ResultReporter>,
}

impl BatchDispatcher {
    /// Creates a dispatcher over the given registry and fixed stage order.
    ///
    /// One admission gate is built per configured stage, sized by that
    /// stage's concurrency limit. Gates are never shared across stages.
    #[must_use]
    pub fn new(
        registry: Arc<ServiceRegistry>,
        stage_order: Vec<String>,
        adapter: Arc<dyn ServiceAdapter>,
        reporter: Arc<dyn ResultReporter>,
    ) -> Self {
        let gates = stage_order
            .iter()
            .filter_map(|stage| {
                registry.get(stage).map(|config| {
                    (stage.clone(), Arc::new(AdmissionGate::new(config.concurrency)))
                })
            })
            .collect();

        Self {
            registry,
            stage_order,
            gates,
            executor: StageExecutor::new(adapter),
            reporter,
        }
    }

    /// Returns the fixed stage order this dispatcher runs.
    #[must_use]
    pub fn stage_order(&self) -> &[String] {
        &self.stage_order
    }

    /// Returns the admission gate for a stage, if one was configured.
    #[must_use]
    pub fn gate(&self, stage: &str) -> Option<&Arc<AdmissionGate>> {
        self.gates.get(stage)
    }

    /// Submits a batch for background processing.
    ///
    /// Validates that every stage in the order has a usable config and
    /// rejects the whole batch synchronously if any does not — no
    /// background task is started and no outbound request is made. On
    /// success the batch runs asynchronously; the returned ack is the
    /// submitter's only synchronous signal, and the callback target is
    /// the only channel for results.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::TrackflowError::Validation`] naming the
    /// first unusable stage.
    pub fn submit(self: &Arc<Self>, batch: BatchRequest) -> Result<BatchAck> {
        self.registry.validate(&self.stage_order)?;

        let run = BatchRun::new();
        info!(
            batch_id = %run.batch_id,
            items = batch.len(),
            stages = self.stage_order.len(),
            "Batch accepted"
        );

        let ack = BatchAck::accepted(batch.len());
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(run, batch).await;
        });

        Ok(ack)
    }

    /// Runs every stage over the whole batch, reporting after each
    /// barrier. Stage i+1 never starts before stage i's report is sent.
    async fn run(&self, run: BatchRun, batch: BatchRequest) {
        for stage in &self.stage_order {
            let Some(config) = self.registry.get(stage) else {
                // Unreachable after submit-time validation.
                warn!(batch_id = %run.batch_id, stage = %stage, "Stage lost its config; skipping");
                continue;
            };
            let Some(gate) = self.gates.get(stage) else {
                warn!(batch_id = %run.batch_id, stage = %stage, "Stage has no admission gate; skipping");
                continue;
            };

            let results = self
                .executor
                .run_stage(stage, config, gate, &batch.items)
                .await;
            self.reporter
                .report(&batch.callback_url, stage, &results)
                .await;
        }

        let duration_ms = (chrono::Utc::now() - run.accepted_at).num_milliseconds();
        info!(batch_id = %run.batch_id, duration_ms = duration_ms, "Batch complete");
    }
}

impl std::fmt::Debug for BatchDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDispatcher")
            .field("stage_order", &self.stage_order)
            .finish_non_exhaustive()
    }
}
