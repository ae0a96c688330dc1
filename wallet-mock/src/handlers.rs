/// Axum HTTP handlers for the JSON-RPC endpoint and admin controls

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::chain::MockChain;
use crate::types::*;

/// Shared application state
pub type AppState = Arc<Mutex<MockChain>>;

/// Custom error type for admin handlers
pub enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, message).into_response()
    }
}

/// POST /
/// EIP-1193 methods over JSON-RPC 2.0; failures travel in the envelope
pub async fn json_rpc(
    State(chain): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    log::debug!("→ {} {}", req.method, req.params);

    let outcome = chain.lock().await.dispatch(&req.method, &req.params);

    match outcome {
        Ok(result) => Json(JsonRpcResponse::success(req.id, result)),
        Err(error) => {
            log::debug!("← {} error {}: {}", req.method, error.code, error.message);
            Json(JsonRpcResponse::failure(req.id, error))
        }
    }
}

// ============================================================================
// ADMIN ENDPOINTS (not part of EIP-1193)
// ============================================================================

/// GET /admin/state
pub async fn get_state(State(chain): State<AppState>) -> Json<WalletStateResponse> {
    Json(chain.lock().await.state())
}

/// POST /admin/accounts
/// Replace the account list; pollers see it as `accountsChanged`
pub async fn set_accounts(
    State(chain): State<AppState>,
    Json(req): Json<SetAccountsRequest>,
) -> Json<WalletStateResponse> {
    let mut chain = chain.lock().await;
    chain.set_accounts(req.accounts);
    Json(chain.state())
}

/// POST /admin/reject
/// Make the "user" decline the next calls of a method
pub async fn reject_next(
    State(chain): State<AppState>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<WalletStateResponse>, ApiError> {
    if req.method.trim().is_empty() {
        return Err(ApiError::BadRequest("method must not be empty".to_string()));
    }

    let mut chain = chain.lock().await;
    chain.reject_next(req.method.trim(), req.count);
    log::info!("🙅 Next {} call(s) to {} will be rejected", req.count, req.method);
    Ok(Json(chain.state()))
}

/// POST /admin/chain
/// Switch chains from the wallet side; pollers see it as `chainChanged`
pub async fn set_chain(
    State(chain): State<AppState>,
    Json(req): Json<SetChainRequest>,
) -> Json<WalletStateResponse> {
    let mut chain = chain.lock().await;
    chain.set_chain(req.chain_id);
    Json(chain.state())
}

/// POST /admin/revert
/// Make the next contract transaction(s) revert
pub async fn revert_next(
    State(chain): State<AppState>,
    Json(req): Json<RevertRequest>,
) -> Json<WalletStateResponse> {
    let mut chain = chain.lock().await;
    chain.revert_next(req.count.unwrap_or(1));
    Json(chain.state())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
