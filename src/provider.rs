//! Wallet provider capability
//!
//! The session controller never reaches for an ambient wallet object. It is
//! handed a [`WalletProvider`] at construction and subscribes to its event
//! stream once. [`crate::rpc::JsonRpcWalletProvider`] is the production
//! implementation; tests script their own.

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use tokio::sync::broadcast;

use crate::config::ChainDescriptor;

/// EIP-3326 code for a chain the wallet does not know about
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Failure reported by the wallet provider
///
/// Mirrors the `{ code, message }` shape of EIP-1193 errors. `short_message`
/// carries a terser human-readable summary when the provider supplies one
/// (typically `error.data.message` on JSON-RPC errors).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
    pub short_message: Option<String>,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            short_message: None,
        }
    }

    /// Error without a provider code (transport failures, decoding problems)
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            short_message: None,
        }
    }

    pub fn with_short_message(mut self, short: impl Into<String>) -> Self {
        self.short_message = Some(short.into());
        self
    }

    /// Wallet does not know the requested chain and needs an add-chain request
    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(UNRECOGNIZED_CHAIN_CODE) || self.message.contains("Unrecognized chain")
    }

    /// Best available human-readable text: short message first
    pub fn user_message(&self) -> String {
        match &self.short_message {
            Some(short) if !short.is_empty() => short.clone(),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl StdError for ProviderError {}

/// Notification pushed by the wallet outside of any user-initiated call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// New authorised account list; empty means the wallet disconnected
    AccountsChanged(Vec<Address>),
    /// New chain id as a `0x`-prefixed hex quantity
    ChainChanged(String),
}

/// Minimal view of a mined transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    /// 1 = success, 0 = reverted
    pub status: u64,
    pub block_number: Option<u64>,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

/// Capability interface over an EIP-1193 wallet
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a wallet is present and answering
    async fn is_available(&self) -> bool;

    /// Prompt the user for account access (`eth_requestAccounts`)
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Accounts already authorised, without prompting (`eth_accounts`)
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Chain the wallet is currently pointed at
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// `wallet_switchEthereumChain`
    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError>;

    /// `wallet_addEthereumChain`
    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError>;

    /// Read-only contract call (`eth_call`)
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError>;

    /// Sign and broadcast a transaction from `from` (`eth_sendTransaction`)
    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<B256, ProviderError>;

    /// Receipt for a transaction, `None` while it is still pending
    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError>;

    /// Subscribe to account/chain notifications
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Parse a `0x`-prefixed hex quantity such as a chain id
pub fn parse_hex_quantity(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Format a number as a `0x`-prefixed lowercase hex quantity
pub fn to_hex_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x66eee"), Some(421614));
        assert_eq!(parse_hex_quantity("0X66EEE"), Some(421614));
        assert_eq!(parse_hex_quantity("66eee"), None);
        assert_eq!(parse_hex_quantity("0x"), None);
        assert_eq!(to_hex_quantity(421614), "0x66eee");
    }

    #[test]
    fn test_unrecognized_chain_detection() {
        assert!(ProviderError::new(4902, "unknown").is_unrecognized_chain());
        assert!(ProviderError::transport("Unrecognized chain ID \"0x66eee\"").is_unrecognized_chain());
        assert!(!ProviderError::new(4001, "User rejected").is_unrecognized_chain());
    }

    #[test]
    fn test_user_message_prefers_short() {
        let err = ProviderError::new(-32603, "Internal JSON-RPC error.")
            .with_short_message("insufficient funds");
        assert_eq!(err.user_message(), "insufficient funds");
        assert_eq!(
            ProviderError::new(-32603, "Internal JSON-RPC error.").user_message(),
            "Internal JSON-RPC error."
        );
    }
}
