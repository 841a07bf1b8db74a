//! Scripted test doubles for the adapter and reporter seams.

use crate::adapter::ServiceAdapter;
use crate::core::{StageResult, WorkItem};
use crate::gate::AdmissionGate;
use crate::registry::StageConfig;
use crate::reporter::ResultReporter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One adapter invocation, stamped with a shared sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Stage the call belonged to.
    pub stage: String,
    /// Work item id.
    pub item: String,
    /// Position on the shared clock at call start.
    pub seq: usize,
}

/// A service adapter with scripted per-(stage, item) outcomes.
///
/// Records every call, tracks its own concurrency high-water mark, and
/// can simulate service latency. Unscripted calls succeed with a small
/// payload. Pass the same clock to a [`CollectingReporter`] to assert
/// cross-component ordering.
pub struct ScriptedAdapter {
    failures: Mutex<HashMap<(String, String), String>>,
    payloads: Mutex<HashMap<(String, String), serde_json::Value>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Option<Duration>,
    clock: Arc<AtomicUsize>,
    concurrent: AtomicUsize,
    peak_concurrency: AtomicUsize,
}

impl ScriptedAdapter {
    /// Creates an adapter where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            failures: Mutex::new(HashMap::new()),
            payloads: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            latency: None,
            clock: Arc::new(AtomicUsize::new(0)),
            concurrent: AtomicUsize::new(0),
            peak_concurrency: AtomicUsize::new(0),
        }
    }

    /// Simulates service latency on every call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Shares a sequence clock with other doubles.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<AtomicUsize>) -> Self {
        self.clock = clock;
        self
    }

    /// Scripts a failure for one (stage, item) pair.
    pub fn fail_item(&self, stage: &str, item: &str, error: &str) {
        self.failures
            .lock()
            .insert((stage.to_string(), item.to_string()), error.to_string());
    }

    /// Scripts a success payload for one (stage, item) pair.
    pub fn set_payload(&self, stage: &str, item: &str, data: serde_json::Value) {
        self.payloads
            .lock()
            .insert((stage.to_string(), item.to_string()), data);
    }

    /// Returns the total number of calls across all stages.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns all recorded calls in call-start order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the recorded calls for one stage.
    #[must_use]
    pub fn calls_for_stage(&self, stage: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.stage == stage)
            .cloned()
            .collect()
    }

    /// Returns the highest concurrency this adapter observed.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak_concurrency.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedAdapter")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ServiceAdapter for ScriptedAdapter {
    async fn process(
        &self,
        stage: &str,
        _config: &StageConfig,
        gate: &AdmissionGate,
        item: &WorkItem,
    ) -> StageResult {
        let _permit = gate.acquire().await;

        let seq = self.clock.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(RecordedCall {
            stage: stage.to_string(),
            item: item.id.clone(),
            seq,
        });

        let current = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_concurrency.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.concurrent.fetch_sub(1, Ordering::SeqCst);

        let key = (stage.to_string(), item.id.clone());
        if let Some(error) = self.failures.lock().get(&key) {
            return StageResult::failed(&item.id, stage, error.clone());
        }
        if let Some(data) = self.payloads.lock().get(&key) {
            return StageResult::ok(&item.id, stage, data.clone());
        }
        StageResult::ok(&item.id, stage, serde_json::json!({"processed": true}))
    }
}

/// One delivery captured by a [`CollectingReporter`].
#[derive(Debug, Clone)]
pub struct StageReportRecord {
    /// Stage the delivery was tagged with.
    pub stage: String,
    /// The full result set delivered.
    pub results: Vec<StageResult>,
    /// Position on the shared clock at delivery.
    pub seq: usize,
}

/// A result reporter that collects deliveries instead of sending them.
pub struct CollectingReporter {
    reports: Mutex<Vec<StageReportRecord>>,
    clock: Arc<AtomicUsize>,
}

impl CollectingReporter {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            clock: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shares a sequence clock with other doubles.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<AtomicUsize>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns all captured deliveries in order.
    #[must_use]
    pub fn reports(&self) -> Vec<StageReportRecord> {
        self.reports.lock().clone()
    }

    /// Returns the number of captured deliveries.
    #[must_use]
    pub fn report_count(&self) -> usize {
        self.reports.lock().len()
    }

    /// Waits until `n` deliveries have been captured.
    ///
    /// # Panics
    ///
    /// Panics if the deadline passes first; this is test support.
    pub async fn wait_for_reports(&self, n: usize, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.report_count() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {n} reports, saw {} before timeout",
                self.report_count()
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Default for CollectingReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CollectingReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectingReporter")
            .field("reports", &self.report_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ResultReporter for CollectingReporter {
    async fn report(&self, _callback_url: &str, stage: &str, results: &[StageResult]) {
        let seq = self.clock.fetch_add(1, Ordering::SeqCst);
        self.reports.lock().push(StageReportRecord {
            stage: stage.to_string(),
            results: results.to_vec(),
            seq,
        });
    }
}
