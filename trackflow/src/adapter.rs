//! Service adapters: one request/response exchange per work item.
//!
//! The adapter is the failure-isolation primitive of the dispatcher:
//! every failure mode of the outbound call is converted into a failed
//! [`StageResult`], never an error raised to the executor, so one item
//! can never abort its stage or its batch.

use crate::core::{StageResult, WorkItem};
use crate::gate::AdmissionGate;
use crate::registry::StageConfig;
use async_trait::async_trait;
use tracing::debug;

/// Performs one bounded request against one stage's external service for
/// one work item.
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    /// Runs `item` through the stage's service and returns its result.
    ///
    /// Implementations must acquire `gate` before starting the exchange
    /// and hold the permit for its whole duration; this is the
    /// backpressure enforcement point.
    async fn process(
        &self,
        stage: &str,
        config: &StageConfig,
        gate: &AdmissionGate,
        item: &WorkItem,
    ) -> StageResult;
}

/// HTTP service adapter backed by reqwest.
///
/// POSTs `{ id, locator }` with a bearer credential and a per-request
/// timeout, and decodes the 2xx JSON body verbatim into the result
/// payload.
#[derive(Debug, Clone, Default)]
pub struct HttpServiceAdapter {
    client: reqwest::Client,
}

impl HttpServiceAdapter {
    /// Creates an adapter with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adapter reusing an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceAdapter for HttpServiceAdapter {
    async fn process(
        &self,
        stage: &str,
        config: &StageConfig,
        gate: &AdmissionGate,
        item: &WorkItem,
    ) -> StageResult {
        let _permit = gate.acquire().await;

        debug!(stage = %stage, item = %item.id, endpoint = %config.endpoint, "Dispatching service call");

        let response = self
            .client
            .post(&config.endpoint)
            .bearer_auth(&config.credential)
            .timeout(config.timeout())
            .json(item)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return StageResult::failed(
                    &item.id,
                    stage,
                    format!("request timed out after {}s", config.timeout_seconds),
                );
            }
            Err(err) => {
                return StageResult::failed(&item.id, stage, format!("request failed: {err}"));
            }
        };

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return StageResult::failed(&item.id, stage, format!("Service error: {body}"));
        }

        match response.json::<serde_json::Value>().await {
            Ok(data) => StageResult::ok(&item.id, stage, data),
            Err(err) => {
                StageResult::failed(&item.id, stage, format!("malformed response body: {err}"))
            }
        }
    }
}
