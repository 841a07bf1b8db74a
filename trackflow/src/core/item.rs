//! Work item type.

use serde::{Deserialize, Serialize};

/// One unit of batch input: an audio track to be routed through every
/// pipeline stage.
///
/// A `WorkItem` is immutable once its batch starts. Every stage receives
/// the original locator; no stage ever sees another stage's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Opaque identifier for the track.
    pub id: String,
    /// Locator (URL) from which any stage can fetch the underlying audio.
    pub locator: String,
}

impl WorkItem {
    /// Creates a new work item.
    #[must_use]
    pub fn new(id: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locator: locator.into(),
        }
    }
}
