/// Wallet Mock Server Library
///
/// An in-memory EIP-1193 wallet with a deployed ChronoLog contract, served
/// over JSON-RPC. Used as a local wallet bridge for development and by the
/// JSON-RPC provider integration tests.

pub mod chain;
pub mod handlers;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use chain::{MockChain, CONTRACT_ADDRESS, CONTRACT_CHAIN_ID, MAINNET_CHAIN_ID};
pub use handlers::AppState;
pub use server::{create_router, run_server};
pub use types::*;

use std::sync::Arc;
use tokio::sync::Mutex;

/// Wrap a chain into router state
pub fn shared(chain: MockChain) -> AppState {
    Arc::new(Mutex::new(chain))
}
