//! Service registry: the static stage-name → service-config mapping.
//!
//! Built once at process start and passed by reference into the
//! dispatcher. Read-only at dispatch time; no lookup goes through ambient
//! global state.

use crate::errors::BatchValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for one stage's external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Endpoint URL the service adapter POSTs each work item to.
    pub endpoint: String,
    /// Bearer credential sent with every request.
    pub credential: String,
    /// Maximum concurrent in-flight requests to this service.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_concurrency() -> usize {
    1
}

fn default_timeout() -> u64 {
    60
}

impl StageConfig {
    /// Creates a config with the default concurrency and timeout.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential: credential.into(),
            concurrency: default_concurrency(),
            timeout_seconds: default_timeout(),
        }
    }

    /// Sets the concurrency ceiling. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Gets the per-request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Returns true if endpoint and credential are both non-empty.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.credential.trim().is_empty()
    }
}

/// Read-only mapping from stage name to service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceRegistry {
    stages: HashMap<String, StageConfig>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stage configuration.
    #[must_use]
    pub fn with_stage(mut self, name: impl Into<String>, config: StageConfig) -> Self {
        self.stages.insert(name.into(), config);
        self
    }

    /// Looks up the configuration for a stage.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&StageConfig> {
        self.stages.get(stage)
    }

    /// Returns the number of configured stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if no stages are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Validates that every stage in `stage_order` has a usable config.
    ///
    /// This is the fail-fast gate for batch submission: a batch whose
    /// pipeline references a stage with a missing or empty endpoint or
    /// credential is rejected before any work starts.
    ///
    /// # Errors
    ///
    /// Returns [`BatchValidationError`] naming the first unusable stage.
    pub fn validate(&self, stage_order: &[String]) -> std::result::Result<(), BatchValidationError> {
        for stage in stage_order {
            match self.stages.get(stage) {
                Some(config) if config.is_usable() => {}
                _ => return Err(BatchValidationError::service_not_configured(stage)),
            }
        }
        Ok(())
    }

    /// Builds the registry from environment variables.
    ///
    /// Reads `ANALYZER_URL`/`ANALYZER_TOKEN`, `TRANSCRIBER_URL`/
    /// `TRANSCRIBER_TOKEN` and `GENERATOR_URL`/`GENERATOR_TOKEN`. Missing
    /// variables yield empty strings so that submission-time validation,
    /// not construction, rejects the unusable stage. The transcriber is
    /// GPU-bound and gets the lowest ceiling; the generator is API-bound
    /// and gets the highest.
    #[must_use]
    pub fn from_env() -> Self {
        let env = |key: &str| std::env::var(key).unwrap_or_default();

        Self::new()
            .with_stage(
                "analyzer",
                StageConfig::new(env("ANALYZER_URL"), env("ANALYZER_TOKEN")).with_concurrency(3),
            )
            .with_stage(
                "transcriber",
                StageConfig::new(env("TRANSCRIBER_URL"), env("TRANSCRIBER_TOKEN"))
                    .with_concurrency(2),
            )
            .with_stage(
                "generator",
                StageConfig::new(env("GENERATOR_URL"), env("GENERATOR_TOKEN")).with_concurrency(5),
            )
    }
}

/// The fixed process-wide pipeline order.
#[must_use]
pub fn default_stage_order() -> Vec<String> {
    vec![
        "analyzer".to_string(),
        "transcriber".to_string(),
        "generator".to_string(),
    ]
}
