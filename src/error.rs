//! Error types for ChronoLog session operations
//!
//! Every failure the session controller can surface to a user maps to one
//! variant here. The `Display` text is what ends up in the error notice.

use std::error::Error as StdError;
use std::fmt;

use crate::provider::ProviderError;

/// Core error type for ChronoLog operations
///
/// Covers wallet discovery, user rejections, input validation, network
/// mismatches and remote call failures when talking to the wallet provider.
#[derive(Clone, Debug, PartialEq)]
pub enum ChronoLogError {
    /// No wallet provider could be reached
    WalletUnavailable,

    /// The wallet returned an empty account list on connect
    NoAccounts,

    /// Account access was refused or failed
    ConnectFailed(String),

    /// A write was attempted without a signer
    NotConnected,

    /// Content was empty after trimming
    EmptyContent,

    /// Content is longer than the form allows
    ContentTooLong { limit: usize },

    /// Unlock time is not a finite, non-negative number
    InvalidUnlockTime,

    /// Capsule form submitted without a date/time
    MissingUnlockTime,

    /// Capsule date/time could not be parsed; carries the rejected input
    InvalidUnlockTimeFormat(String),

    /// Capsule unlock time is not strictly in the future
    UnlockTimeNotInFuture,

    /// Signer is on a different chain than the target
    WrongNetwork {
        chain_name: String,
        expected: u64,
        actual: u64,
    },

    /// A submission is still awaiting confirmation
    SubmissionPending,

    /// Chain switch request failed
    SwitchChainFailed(String),

    /// Add-chain request failed
    AddChainFailed { chain_name: String, reason: String },

    /// No contract handle has been built yet
    ContractNotInitialized,

    /// Write attempted through a read-only contract handle
    ReadOnlyHandle,

    /// Reading the record list failed
    FetchFailed(String),

    /// Sending or confirming a transaction failed
    TransactionFailed(String),

    /// Transaction was mined with a non-success status
    TransactionReverted(String),

    /// Contract return data could not be decoded
    InvalidResponse(String),

    /// Raw provider failure not covered by a more specific variant
    Provider(ProviderError),
}

impl fmt::Display for ChronoLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WalletUnavailable => write!(f, "No injected wallet found."),
            Self::NoAccounts => write!(f, "No accounts returned from wallet."),
            Self::ConnectFailed(msg) => write!(f, "Failed to connect wallet: {}", msg),
            Self::NotConnected => write!(
                f,
                "Please connect your wallet with a signer before creating logs."
            ),
            Self::EmptyContent => write!(f, "Content cannot be empty."),
            Self::ContentTooLong { limit } => {
                write!(f, "Content exceeds {} characters.", limit)
            }
            Self::InvalidUnlockTime => write!(f, "Invalid unlock time."),
            Self::MissingUnlockTime => write!(f, "Please choose a future unlock date/time."),
            Self::InvalidUnlockTimeFormat(_) => write!(f, "Invalid unlock time format."),
            Self::UnlockTimeNotInFuture => {
                write!(f, "Unlock time must be in the future for a Capsule.")
            }
            Self::WrongNetwork {
                chain_name,
                expected,
                actual,
            } => write!(
                f,
                "Please switch your wallet to {} (chainId {}). Current chainId: {}",
                chain_name, expected, actual
            ),
            Self::SubmissionPending => write!(f, "A transaction is already pending."),
            Self::SwitchChainFailed(msg) => write!(f, "Failed to switch chain: {}", msg),
            Self::AddChainFailed { chain_name, reason } => {
                write!(f, "Failed to add {} to wallet: {}", chain_name, reason)
            }
            Self::ContractNotInitialized => write!(f, "Contract not initialized"),
            Self::ReadOnlyHandle => write!(f, "Contract handle is read-only"),
            Self::FetchFailed(msg) => write!(f, "Failed to load logs: {}", msg),
            Self::TransactionFailed(msg) => write!(f, "Failed to create log: {}", msg),
            Self::TransactionReverted(hash) => {
                write!(f, "Transaction failed or was reverted. ({})", hash)
            }
            Self::InvalidResponse(msg) => write!(f, "Invalid response from contract: {}", msg),
            Self::Provider(err) => write!(f, "Wallet provider error: {}", err),
        }
    }
}

impl StdError for ChronoLogError {}

impl From<ProviderError> for ChronoLogError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

// Helper functions for common error scenarios
impl ChronoLogError {
    /// Create a fetch failed error, preferring the provider's short message
    pub fn fetch_failed(err: &ChronoLogError) -> Self {
        Self::FetchFailed(err.cause_message())
    }

    /// Create a transaction failed error, preferring the provider's short message
    pub fn transaction_failed(err: &ChronoLogError) -> Self {
        Self::TransactionFailed(err.cause_message())
    }

    /// Text used when this error is the cause of a wrapping error
    pub fn cause_message(&self) -> String {
        match self {
            Self::Provider(provider_err) => provider_err.user_message(),
            other => other.to_string(),
        }
    }

    /// True for errors raised before any provider call was made
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyContent
                | Self::ContentTooLong { .. }
                | Self::InvalidUnlockTime
                | Self::MissingUnlockTime
                | Self::InvalidUnlockTimeFormat(_)
                | Self::UnlockTimeNotInFuture
        )
    }
}
