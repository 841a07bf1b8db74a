//! trackflow-server library interface.
//!
//! Exposes the application state and router so integration tests can
//! drive the HTTP surface without binding a socket.

pub mod api;

use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use trackflow::dispatcher::BatchDispatcher;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The batch dispatcher, constructed once at startup.
    pub dispatcher: Arc<BatchDispatcher>,
    /// Service startup timestamp for uptime reporting.
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Creates the state around a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Arc<BatchDispatcher>) -> Self {
        Self {
            dispatcher,
            startup_time: Utc::now(),
        }
    }
}

/// Builds the application router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/batch", post(api::submit_batch))
        .route("/health", get(api::health))
        .with_state(state)
}
