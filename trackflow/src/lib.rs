//! # Trackflow
//!
//! A staged batch dispatcher for audio track processing.
//!
//! Trackflow routes a batch of work items through an ordered pipeline of
//! independent external services with support for:
//!
//! - **Stage-barrier execution**: every item finishes a stage before any
//!   item starts the next
//! - **Bounded fan-out**: one admission gate per stage, sized to that
//!   service's real concurrency ceiling
//! - **Failure isolation**: per-item service failures become result data,
//!   never batch termination
//! - **Best-effort reporting**: one callback delivery per completed stage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trackflow::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ServiceRegistry::from_env());
//! let dispatcher = Arc::new(BatchDispatcher::new(
//!     registry,
//!     default_stage_order(),
//!     Arc::new(HttpServiceAdapter::new()),
//!     Arc::new(HttpResultReporter::new()),
//! ));
//!
//! let ack = dispatcher.submit(batch)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod adapter;
pub mod core;
pub mod dispatcher;
pub mod errors;
pub mod executor;
pub mod gate;
pub mod registry;
pub mod reporter;
pub mod testing;

#[cfg(test)]
mod integration_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapter::{HttpServiceAdapter, ServiceAdapter};
    pub use crate::core::{BatchAck, BatchRequest, StageResult, WorkItem};
    pub use crate::dispatcher::BatchDispatcher;
    pub use crate::errors::{BatchValidationError, TrackflowError};
    pub use crate::executor::StageExecutor;
    pub use crate::gate::{AdmissionGate, AdmissionPermit};
    pub use crate::registry::{default_stage_order, ServiceRegistry, StageConfig};
    pub use crate::reporter::{HttpResultReporter, ResultReporter};
}
