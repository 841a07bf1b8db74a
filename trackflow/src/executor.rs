//! Stage executor: barrier fan-out of one batch across one stage.

use crate::adapter::ServiceAdapter;
use crate::core::{StageResult, WorkItem};
use crate::gate::AdmissionGate;
use crate::registry::StageConfig;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Fans a whole batch out through the service adapter for a single stage
/// and waits for every item to finish.
///
/// The return is a synchronization barrier: no caller can start the next
/// stage, or report this one, until every item's call has completed.
#[derive(Clone)]
pub struct StageExecutor {
    adapter: Arc<dyn ServiceAdapter>,
}

impl StageExecutor {
    /// Creates an executor dispatching through the given adapter.
    #[must_use]
    pub fn new(adapter: Arc<dyn ServiceAdapter>) -> Self {
        Self { adapter }
    }

    /// Runs every item through `stage`, each call independently gated.
    ///
    /// Completion order within the stage is unspecified, but the returned
    /// results always match the input order of `items`, so reported
    /// payloads are deterministic.
    pub async fn run_stage(
        &self,
        stage: &str,
        config: &StageConfig,
        gate: &AdmissionGate,
        items: &[WorkItem],
    ) -> Vec<StageResult> {
        let start = Instant::now();
        debug!(stage = %stage, items = items.len(), limit = gate.limit(), "Stage fan-out started");

        let calls = items
            .iter()
            .map(|item| self.adapter.process(stage, config, gate, item));
        let results = join_all(calls).await;

        let failures = results.iter().filter(|r| !r.is_success()).count();
        debug!(
            stage = %stage,
            items = items.len(),
            failures = failures,
            duration_ms = start.elapsed().as_millis() as u64,
            "Stage fan-out completed"
        );

        results
    }
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor").finish_non_exhaustive()
    }
}
