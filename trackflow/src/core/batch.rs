//! Batch submission envelope and run identity.

use super::WorkItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A submitted unit of work: the items to process and where to deliver
/// per-stage results.
///
/// The stage order is fixed process-wide and is not part of the request.
/// A batch lives only in process memory for the duration of its run and
/// is discarded after the final stage's results are reported; the
/// callback target is the caller's only channel for progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// The work items, in submission order.
    pub items: Vec<WorkItem>,
    /// Callback URL receiving one result delivery per completed stage.
    pub callback_url: String,
}

impl BatchRequest {
    /// Creates a new batch request.
    #[must_use]
    pub fn new(items: Vec<WorkItem>, callback_url: impl Into<String>) -> Self {
        Self {
            items,
            callback_url: callback_url.into(),
        }
    }

    /// Returns the number of items in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the batch has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Acknowledgment returned synchronously once a batch is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAck {
    /// Human-readable acceptance message.
    pub message: String,
    /// Number of items accepted.
    pub batch_size: usize,
}

impl BatchAck {
    /// Creates an acknowledgment for a batch of the given size.
    #[must_use]
    pub fn accepted(batch_size: usize) -> Self {
        Self {
            message: format!("Processing {batch_size} tracks"),
            batch_size,
        }
    }
}

/// Identity of one in-flight batch run, used for log correlation only.
///
/// Never exposed to callers; the batch has no queryable record.
#[derive(Debug, Clone)]
pub struct BatchRun {
    /// Unique id assigned at acceptance.
    pub batch_id: Uuid,
    /// When the batch was accepted.
    pub accepted_at: DateTime<Utc>,
}

impl BatchRun {
    /// Creates a fresh run identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            accepted_at: Utc::now(),
        }
    }
}

impl Default for BatchRun {
    fn default() -> Self {
        Self::new()
    }
}
