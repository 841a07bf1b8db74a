//! Testing support: scripted doubles and fixtures.
//!
//! These utilities back the crate's own tests and are exported for
//! downstream users who need to exercise dispatch flows without real
//! services.

mod fixtures;
mod mocks;

pub use fixtures::{registry_with, work_items};
pub use mocks::{CollectingReporter, RecordedCall, ScriptedAdapter, StageReportRecord};
