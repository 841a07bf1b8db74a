//! Batch submission and health API handlers.

use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use trackflow::core::{BatchAck, BatchRequest};

/// Error body for rejected submissions.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Human-readable rejection cause.
    pub detail: String,
}

/// POST /batch
///
/// Validates the fixed stage pipeline and accepts the batch for
/// background processing. Returns `202 Accepted` with the batch size;
/// results are only ever delivered to the batch's callback URL. Returns
/// `500` with a detail message when a pipeline stage is not configured.
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<(StatusCode, Json<BatchAck>), (StatusCode, Json<ErrorDetail>)> {
    match state.dispatcher.submit(request) {
        Ok(ack) => Ok((StatusCode::ACCEPTED, Json(ack))),
        Err(err) => {
            tracing::error!(error = %err, "Batch submission rejected");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorDetail {
                    detail: err.to_string(),
                }),
            ))
        }
    }
}

/// GET /health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the process is serving.
    pub status: &'static str,
    /// Seconds since process start.
    pub uptime_seconds: i64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: (Utc::now() - state.startup_time).num_seconds(),
    })
}
