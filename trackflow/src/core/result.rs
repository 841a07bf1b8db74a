//! Stage result type with factory methods.

use serde::{Deserialize, Serialize};

/// The outcome of one service call for one work item in one stage.
///
/// `StageResult` is immutable once created. Exactly one of `data` and
/// `error` is populated; the factory methods enforce this. Failures are
/// carried as data, never as errors raised through the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// The work item identifier this result belongs to.
    pub id: String,

    /// The stage that produced this result.
    pub stage: String,

    /// Whether the service call succeeded.
    pub success: bool,

    /// Decoded response payload (for successful calls).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Human-readable failure cause (for failed calls).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResult {
    /// Creates a successful result carrying the service's response payload.
    #[must_use]
    pub fn ok(id: impl Into<String>, stage: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            stage: stage.into(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Creates a failed result carrying the failure cause.
    #[must_use]
    pub fn failed(id: impl Into<String>, stage: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage: stage.into(),
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Returns true if the service call succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }
}
