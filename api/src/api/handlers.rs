use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chronolog::{SessionController, SessionSnapshot};
use std::sync::Arc;

use super::types::*;
use crate::error::ApiError;

pub type AppState = Arc<SessionController>;

pub async fn health_handler() -> &'static str {
    "OK"
}

pub async fn get_session_handler(State(session): State<AppState>) -> Json<SessionSnapshot> {
    Json(session.snapshot().await)
}

pub async fn connect_handler(
    State(session): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    session.connect().await?;
    Ok(Json(session.snapshot().await))
}

pub async fn switch_network_handler(
    State(session): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    session.switch_network().await?;
    Ok(Json(session.snapshot().await))
}

pub async fn get_logs_handler(State(session): State<AppState>) -> Json<LogsResponse> {
    let records = session.records().await;
    let now = session.now();
    Json(LogsResponse {
        now,
        count: records.len(),
        logs: records.views(now),
    })
}

pub async fn refresh_logs_handler(
    State(session): State<AppState>,
) -> Result<Json<LogsResponse>, ApiError> {
    let records = session.fetch_records().await?;
    let now = session.now();
    Ok(Json(LogsResponse {
        now,
        count: records.len(),
        logs: records.views(now),
    }))
}

pub async fn create_moment_handler(
    State(session): State<AppState>,
    payload: Result<Json<CreateMomentRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(req) = payload?;
    let receipt = session.submit_moment(&req.content).await?;
    let explorer_url = session
        .config()
        .tx_explorer_url(&receipt.transaction_hash.to_string());
    Ok(Json(SubmitResponse::from_receipt(receipt, explorer_url)))
}

pub async fn create_capsule_handler(
    State(session): State<AppState>,
    payload: Result<Json<CreateCapsuleRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(req) = payload?;
    let receipt = session.submit_capsule(&req.content, &req.unlock_at).await?;
    let explorer_url = session
        .config()
        .tx_explorer_url(&receipt.transaction_hash.to_string());
    Ok(Json(SubmitResponse::from_receipt(receipt, explorer_url)))
}

pub async fn dismiss_notices_handler(State(session): State<AppState>) -> StatusCode {
    session.dismiss_notices().await;
    StatusCode::NO_CONTENT
}
