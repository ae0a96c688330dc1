use chronolog::{ChronoLogConfig, JsonRpcWalletProvider, SessionController};
use chronolog_api::start_server;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger (set RUST_LOG=debug for verbose output, RUST_LOG=info for normal)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Use BIND_ADDRESS=127.0.0.1:3000 for local development
    let addr = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let config = ChronoLogConfig::from_env();
    let provider = Arc::new(JsonRpcWalletProvider::new(&config.provider_url));
    provider.spawn_watcher(config.poll_interval);

    log::info!("👛 Wallet bridge: {}", provider.url());

    let session = Arc::new(SessionController::new(provider.clone(), config));
    let events = session.attach_events();
    let connection = session.initialize().await;
    if connection.wallet_present {
        log::info!("👛 Wallet bridge reachable, chain {:?}", connection.chain_id);
    } else {
        log::warn!("⚠️  No wallet bridge reachable yet; connect will retry discovery");
    }

    log::info!("Starting ChronoLog session server on {}", addr);
    start_server(&addr, session).await?;

    events.detach();
    provider.stop_watcher();
    log::info!("👋 Session server stopped");
    Ok(())
}
