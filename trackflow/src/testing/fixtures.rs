//! Test fixtures.

use crate::core::WorkItem;
use crate::registry::{ServiceRegistry, StageConfig};

/// Creates `n` work items with sequential ids and locators.
#[must_use]
pub fn work_items(n: usize) -> Vec<WorkItem> {
    (0..n)
        .map(|i| {
            WorkItem::new(
                format!("track-{i}"),
                format!("https://cdn.example.com/track-{i}.wav"),
            )
        })
        .collect()
}

/// Creates a registry of usable stages with the given concurrency limits.
#[must_use]
pub fn registry_with(stages: &[(&str, usize)]) -> ServiceRegistry {
    stages.iter().fold(
        ServiceRegistry::new(),
        |registry, (name, concurrency)| {
            registry.with_stage(
                *name,
                StageConfig::new(format!("https://{name}.example.com/run"), "test-token")
                    .with_concurrency(*concurrency),
            )
        },
    )
}
