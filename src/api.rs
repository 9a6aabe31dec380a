//! HTTP API endpoints for the quiz front end.
//!
//! The front end pulls rounds in batches, checks answers locally and reports
//! each result back so the session counters stay on the server.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::progress::ProgressSnapshot;
use crate::queue::{QueueError, Round};
use crate::state::AppState;

/// Rounds handed out when the request does not say
const DEFAULT_ROUND_COUNT: usize = 10;
const MAX_ROUND_COUNT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RoundsQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RoundsResponse {
    pub rounds: Vec<Round>,
}

/// Body of a 503 when the queue could not supply enough rounds
#[derive(Debug, Serialize)]
pub struct SupplyErrorResponse {
    pub error: String,
    pub requested: usize,
    pub available: usize,
    /// Rounds that were taken from the queue anyway
    pub rounds: Vec<Round>,
}

#[derive(Debug, Serialize)]
pub struct QueueStatus {
    pub source: String,
    pub buffered: usize,
    pub known_breeds: usize,
    pub min_buffer: usize,
    pub max_buffer: usize,
}

#[derive(Debug, Deserialize)]
pub struct RecordAnswer {
    pub won: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/rounds", get(next_rounds))
        .route("/api/reset", post(reset_queue))
        .route("/api/status", get(queue_status))
        .route(
            "/api/progress",
            get(get_progress).post(record_answer).delete(reset_progress),
        )
        .with_state(state)
}

/// Take the next batch of rounds.
///
/// GET /api/rounds?count=10
pub async fn next_rounds(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoundsQuery>,
) -> Response {
    let count = query.count.unwrap_or(DEFAULT_ROUND_COUNT);
    if count > MAX_ROUND_COUNT {
        return (
            StatusCode::BAD_REQUEST,
            format!("count must be at most {}", MAX_ROUND_COUNT),
        )
            .into_response();
    }

    match state.queue.next_rounds(count).await {
        Ok(rounds) => Json(RoundsResponse { rounds }).into_response(),
        Err(QueueError::InsufficientSupply {
            requested,
            available,
            partial,
        }) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SupplyErrorResponse {
                error: "Not enough rounds available, try again later".to_string(),
                requested,
                available,
                rounds: partial,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to hand out rounds: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Clear and refill the round queue.
///
/// POST /api/reset
pub async fn reset_queue(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    state.queue.reset().await;
    Json(status_of(&state).await)
}

/// GET /api/status
pub async fn queue_status(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    Json(status_of(&state).await)
}

/// GET /api/progress
pub async fn get_progress(State(state): State<Arc<AppState>>) -> Json<ProgressSnapshot> {
    Json(state.progress().await)
}

/// POST /api/progress with `{"won": true}`
pub async fn record_answer(
    State(state): State<Arc<AppState>>,
    Json(answer): Json<RecordAnswer>,
) -> Json<ProgressSnapshot> {
    Json(state.record_answer(answer.won).await)
}

/// DELETE /api/progress
pub async fn reset_progress(State(state): State<Arc<AppState>>) -> Json<ProgressSnapshot> {
    Json(state.reset_progress().await)
}

async fn status_of(state: &AppState) -> QueueStatus {
    let config = state.queue.config();
    QueueStatus {
        source: state.queue.source_name().to_string(),
        buffered: state.queue.buffered().await,
        known_breeds: state.queue.label_pool().await.len(),
        min_buffer: config.min_buffer,
        max_buffer: config.max_buffer,
    }
}
