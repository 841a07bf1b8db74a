//! Result reporters: best-effort delivery of per-stage results.

use crate::core::StageResult;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// One callback delivery: a stage's full result set tagged with the
/// stage name.
#[derive(Debug, Serialize)]
struct StageReport<'a> {
    stage: &'a str,
    results: &'a [StageResult],
}

/// Delivers a completed stage's results to the batch's callback target.
///
/// Delivery is best-effort by contract: a failed delivery is logged and
/// otherwise ignored. It never rolls back the stage, retries, or stops
/// the next stage.
#[async_trait]
pub trait ResultReporter: Send + Sync {
    /// Delivers `results` for `stage` to `callback_url`.
    async fn report(&self, callback_url: &str, stage: &str, results: &[StageResult]);
}

/// HTTP reporter POSTing `{ stage, results }` to the callback URL.
#[derive(Debug, Clone, Default)]
pub struct HttpResultReporter {
    client: reqwest::Client,
}

/// Callback deliveries are bounded like any other network call.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

impl HttpResultReporter {
    /// Creates a reporter with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reporter reusing an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResultReporter for HttpResultReporter {
    async fn report(&self, callback_url: &str, stage: &str, results: &[StageResult]) {
        let report = StageReport { stage, results };

        let response = self
            .client
            .post(callback_url)
            .timeout(DELIVERY_TIMEOUT)
            .json(&report)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                debug!(stage = %stage, results = results.len(), "Stage results delivered");
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(stage = %stage, status = %status, body = %body, "Callback error");
            }
            Err(err) => {
                warn!(stage = %stage, error = %err, "Callback delivery failed");
            }
        }
    }
}
