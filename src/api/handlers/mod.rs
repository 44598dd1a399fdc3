use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::error::SessionError;
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Map a session error to a response.
///
/// Client mistakes are returned verbatim. Storage failures are logged in
/// full and reported to the client as a generic 503 so the caller can retry.
fn session_error(e: SessionError) -> (StatusCode, String) {
    let status = match &e {
        SessionError::StorageUnavailable(_) => {
            tracing::error!("Storage error: {}", e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "Storage unavailable".to_string(),
            );
        }
        SessionError::SessionNotFound { .. } | SessionError::UnknownAttitude(_) => {
            StatusCode::NOT_FOUND
        }
        SessionError::InvalidAction(_)
        | SessionError::ImageNotInCorpus { .. }
        | SessionError::InvalidUser(_) => StatusCode::BAD_REQUEST,
        SessionError::NothingToUndo => StatusCode::CONFLICT,
    };

    tracing::warn!("Rejected request: {}", e);
    (status, e.to_string())
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user: String,
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Catalog
// ============================================================

pub async fn list_attitudes(State(sessions): State<AppState>) -> Json<Vec<Attitude>> {
    Json(sessions.list_attitudes())
}

pub async fn get_attitude(
    State(sessions): State<AppState>,
    Path(attitude): Path<String>,
) -> Result<Json<Attitude>, (StatusCode, String)> {
    sessions
        .get_attitude(&attitude)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Attitude not found".to_string()))
}

// ============================================================
// Sessions
// ============================================================

pub async fn next_image(
    State(sessions): State<AppState>,
    Path(attitude): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<NextImageResponse>, (StatusCode, String)> {
    let next = sessions
        .next_image(&query.user, &attitude)
        .map_err(session_error)?;
    Ok(Json(NextImageResponse::new(attitude, next)))
}

pub async fn session_status(
    State(sessions): State<AppState>,
    Path(attitude): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<SessionSummary>, (StatusCode, String)> {
    sessions
        .session_status(&query.user, &attitude)
        .map(Json)
        .map_err(session_error)
}

pub async fn record_feedback(
    State(sessions): State<AppState>,
    Json(input): Json<FeedbackInput>,
) -> Result<Json<FeedbackAck>, (StatusCode, String)> {
    let action: FeedbackAction = input.action.parse().map_err(session_error)?;

    sessions
        .record_feedback(&input.user, &input.attitude, &input.image_name, action)
        .map(Json)
        .map_err(session_error)
}
