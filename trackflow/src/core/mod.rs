//! Core data types for batch dispatch.
//!
//! These are the wire-facing types: work items submitted by the caller,
//! per-stage results produced by service calls, and the batch envelope
//! that ties them together.

mod batch;
mod item;
mod result;

pub use batch::{BatchAck, BatchRequest, BatchRun};
pub use item::WorkItem;
pub use result::StageResult;
