/// Axum HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;

pub fn create_router(state: AppState) -> Router {
    // Allow dApp frontends and tests from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // EIP-1193 over JSON-RPC
        .route("/", post(json_rpc))

        // Admin endpoints
        .route("/admin/state", get(get_state))
        .route("/admin/accounts", post(set_accounts))
        .route("/admin/reject", post(reject_next))
        .route("/admin/chain", post(set_chain))
        .route("/admin/revert", post(revert_next))

        // Shared state
        .with_state(state)

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(state: AppState, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 Wallet mock listening on http://{}", addr);
    log::info!("🔧 Admin endpoints: /admin/accounts, /admin/reject, /admin/chain, /admin/revert");

    axum::serve(listener, app).await?;

    Ok(())
}
