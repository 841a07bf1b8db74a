//! Error types for the trackflow dispatcher.
//!
//! The taxonomy is deliberately small: configuration problems reject a
//! batch synchronously at submission, per-item service failures are
//! carried as data inside [`crate::core::StageResult`], and callback
//! delivery failures are logged and ignored. There is no batch-level
//! failure state.

use thiserror::Error;

/// The main error type for trackflow operations.
#[derive(Debug, Error)]
pub enum TrackflowError {
    /// Batch validation rejected the submission.
    #[error("{0}")]
    Validation(#[from] BatchValidationError),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error raised when a batch references a stage that is not usable.
///
/// Raised synchronously by submission, before any background work or
/// outbound request; a rejected batch has zero side effects.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BatchValidationError {
    /// The error message.
    pub message: String,
    /// The stages that failed validation.
    pub stages: Vec<String>,
}

impl BatchValidationError {
    /// Creates a new batch validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Creates the error for a stage with a missing or unusable config.
    #[must_use]
    pub fn service_not_configured(stage: impl Into<String>) -> Self {
        let stage = stage.into();
        Self {
            message: format!("{stage} service not configured"),
            stages: vec![stage],
        }
    }
}

/// Convenience alias for results with [`TrackflowError`].
pub type Result<T> = std::result::Result<T, TrackflowError>;
