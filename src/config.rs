//! ChronoLog configuration from environment variables
//!
//! The target chain and contract are fixed (Arbitrum Sepolia); the
//! environment only moves endpoints and timings around for local development.
use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::provider::to_hex_quantity;

/// Deployed ChronoLog contract on Arbitrum Sepolia
pub const CONTRACT_ADDRESS: Address = address!("1A46b403A29c8cBDA564E1f4B9c6332b8873532f");

/// Arbitrum Sepolia chain id
pub const TARGET_CHAIN_ID: u64 = 421614;

/// Default wallet bridge endpoint (Frame-style local JSON-RPC provider)
pub const DEFAULT_PROVIDER_URL: &str = "http://127.0.0.1:1248";

/// Notices disappear after this long
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(6);

/// Native currency metadata for `wallet_addEthereumChain`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// EIP-3085 chain descriptor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    /// `0x`-prefixed hex chain id
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl ChainDescriptor {
    pub fn arbitrum_sepolia() -> Self {
        Self {
            chain_id: to_hex_quantity(TARGET_CHAIN_ID),
            chain_name: "Arbitrum Sepolia".to_string(),
            native_currency: NativeCurrency {
                name: "Sepolia Ether".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://sepolia-rollup.arbitrum.io/rpc".to_string()],
            block_explorer_urls: vec!["https://sepolia.arbiscan.io".to_string()],
        }
    }

    /// First explorer URL without a trailing slash
    pub fn explorer_base(&self) -> Option<&str> {
        self.block_explorer_urls
            .first()
            .map(|url| url.trim_end_matches('/'))
    }
}

#[derive(Clone, Debug)]
pub struct ChronoLogConfig {
    /// JSON-RPC endpoint of the wallet bridge
    pub provider_url: String,
    /// ChronoLog contract address
    pub contract_address: Address,
    /// Target chain id
    pub chain_id: u64,
    /// Descriptor sent when the wallet does not know the target chain
    pub chain: ChainDescriptor,
    /// Interval between receipt polls and account/chain watcher polls
    pub poll_interval: Duration,
    /// Lifetime of a notice
    pub notice_ttl: Duration,
}

impl ChronoLogConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `CHRONOLOG_PROVIDER_URL`: wallet bridge endpoint (default `http://127.0.0.1:1248`)
    /// - `CHRONOLOG_CONTRACT_ADDRESS`: override the contract (local mocks)
    /// - `CHRONOLOG_POLL_INTERVAL_MS`: receipt/watcher poll interval (default 2000)
    /// - `CHRONOLOG_NOTICE_TTL_SECS`: notice lifetime (default 6)
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Local wallet mock
    /// CHRONOLOG_PROVIDER_URL=http://localhost:8545 CHRONOLOG_POLL_INTERVAL_MS=200 cargo run -p chronolog-api
    /// ```
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let provider_url = env::var("CHRONOLOG_PROVIDER_URL").unwrap_or_else(|_| {
            log::info!("🔌 Wallet provider: {} (default)", DEFAULT_PROVIDER_URL);
            DEFAULT_PROVIDER_URL.to_string()
        });

        let contract_address = match env::var("CHRONOLOG_CONTRACT_ADDRESS") {
            Ok(raw) => match raw.parse::<Address>() {
                Ok(addr) => {
                    log::info!("📜 Contract override: {}", addr);
                    addr
                }
                Err(e) => {
                    log::warn!("⚠️  Invalid CHRONOLOG_CONTRACT_ADDRESS '{}': {}", raw, e);
                    defaults.contract_address
                }
            },
            Err(_) => defaults.contract_address,
        };

        let poll_interval = env_u64("CHRONOLOG_POLL_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);
        let notice_ttl = env_u64("CHRONOLOG_NOTICE_TTL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.notice_ttl);

        log::info!("🌐 Target chain: {} ({})", defaults.chain.chain_name, defaults.chain_id);

        Self {
            provider_url,
            contract_address,
            poll_interval,
            notice_ttl,
            ..defaults
        }
    }

    pub fn chain_id_hex(&self) -> String {
        to_hex_quantity(self.chain_id)
    }

    /// Explorer page for the contract
    pub fn contract_explorer_url(&self) -> Option<String> {
        self.chain
            .explorer_base()
            .map(|base| format!("{}/address/{}", base, self.contract_address))
    }

    /// Explorer page for a transaction hash
    pub fn tx_explorer_url(&self, hash: &str) -> Option<String> {
        self.chain
            .explorer_base()
            .map(|base| format!("{}/tx/{}", base, hash))
    }
}

impl Default for ChronoLogConfig {
    /// Default configuration (Arbitrum Sepolia, local wallet bridge)
    fn default() -> Self {
        Self {
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            contract_address: CONTRACT_ADDRESS,
            chain_id: TARGET_CHAIN_ID,
            chain: ChainDescriptor::arbitrum_sepolia(),
            poll_interval: Duration::from_secs(2),
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("⚠️  Ignoring {}='{}': {}", key, raw, e);
            None
        }
    }
}
