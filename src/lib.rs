//! ChronoLog: wallet session controller for on-chain journaling
//!
//! This crate drives a wallet connection against the ChronoLog contract on
//! Arbitrum Sepolia. Users write two kinds of records: Moments, which unlock
//! immediately, and Capsules, which stay hidden until a chosen time.
//!
//! # Architecture
//!
//! - **Session Controller**: connection state, contract handle, record cache, pending transaction
//! - **Wallet Provider**: EIP-1193 capability behind a trait, with a JSON-RPC implementation
//! - **Contract bindings**: `createLog` / `getAllLogs` via `alloy-sol-types`
//!
//! Capsule locking is presentation only. `getAllLogs` returns every record's
//! content in full; [`Record::visible_content`] merely withholds it while
//! `unlock_at` is in the future.
//!
//! # Example
//!
//! ```ignore
//! use chronolog::{ChronoLogConfig, JsonRpcWalletProvider, SessionController};
//! use std::sync::Arc;
//!
//! let config = ChronoLogConfig::from_env();
//! let provider = Arc::new(JsonRpcWalletProvider::new(&config.provider_url));
//! provider.spawn_watcher(config.poll_interval);
//!
//! let session = Arc::new(SessionController::new(provider, config));
//! let _events = session.attach_events();
//! session.initialize().await;
//! session.connect().await?;
//!
//! session.submit_moment("hello").await?;
//! session.submit_capsule("secret", "2030-01-01T00:00").await?;
//! ```

// Public modules
pub mod abi;
pub mod clock;
pub mod config;
pub mod contract;
pub mod error;
pub mod notice;
pub mod provider;
pub mod record;
pub mod rpc;
pub mod session;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ChainDescriptor, ChronoLogConfig, NativeCurrency, CONTRACT_ADDRESS, TARGET_CHAIN_ID};
pub use contract::{ChronoLogContract, HandleMode};
pub use error::ChronoLogError;
pub use notice::{Notice, NoticeKind};
pub use provider::{ProviderError, ProviderEvent, TransactionReceipt, WalletProvider};
pub use record::{Record, RecordList, RecordView, LOCKED_PLACEHOLDER};
pub use rpc::JsonRpcWalletProvider;
pub use session::{
    parse_unlock_input, ConnectionState, EventSubscription, PendingTx, SessionController,
    SessionSnapshot, TxPhase, CAPSULE_MAX_CHARS, MOMENT_MAX_CHARS,
};

// Re-export commonly used primitive types
pub use alloy_primitives::{Address, Bytes, B256};

// Common result type
pub type Result<T> = std::result::Result<T, ChronoLogError>;
