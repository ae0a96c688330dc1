//! Handle to the ChronoLog contract
//!
//! A [`ChronoLogContract`] is a cheap value: the contract address plus the
//! mode it was built in. The session controller rebuilds it whenever the
//! signer changes, so a read-write handle always names the current account.

use alloy_primitives::{Address, B256};
use serde::Serialize;
use std::time::Duration;

use crate::abi::{self, Log};
use crate::error::ChronoLogError;
use crate::provider::{TransactionReceipt, WalletProvider};

/// Whether the handle may send transactions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HandleMode {
    ReadOnly,
    ReadWrite { signer: Address },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChronoLogContract {
    pub address: Address,
    #[serde(flatten)]
    pub mode: HandleMode,
}

impl ChronoLogContract {
    pub fn read_only(address: Address) -> Self {
        Self {
            address,
            mode: HandleMode::ReadOnly,
        }
    }

    pub fn read_write(address: Address, signer: Address) -> Self {
        Self {
            address,
            mode: HandleMode::ReadWrite { signer },
        }
    }

    pub fn signer(&self) -> Option<Address> {
        match self.mode {
            HandleMode::ReadWrite { signer } => Some(signer),
            HandleMode::ReadOnly => None,
        }
    }

    /// Call `getAllLogs()` through the provider
    pub async fn get_all_logs(
        &self,
        provider: &dyn WalletProvider,
    ) -> Result<Vec<Log>, ChronoLogError> {
        let data = provider
            .call(self.address, abi::encode_get_all_logs())
            .await?;
        abi::decode_get_all_logs(&data)
    }

    /// Send `createLog(content, unlockTime)` and return the transaction hash
    pub async fn create_log(
        &self,
        provider: &dyn WalletProvider,
        content: &str,
        unlock_time: u64,
    ) -> Result<B256, ChronoLogError> {
        let signer = self.signer().ok_or(ChronoLogError::ReadOnlyHandle)?;
        let calldata = abi::encode_create_log(content, unlock_time);
        log::debug!(
            "createLog from {} ({} bytes calldata, unlock {})",
            signer,
            calldata.len(),
            unlock_time
        );
        let hash = provider
            .send_transaction(signer, self.address, calldata)
            .await?;
        Ok(hash)
    }
}

/// Number of still-pending polls between progress log lines
const PENDING_LOG_EVERY: u64 = 30;

/// Wait for a transaction to be mined (one confirmation)
///
/// Polls the receipt every `interval` until it appears. A broadcast
/// transaction cannot be recalled, so there is no attempt ceiling; only a
/// provider error ends the wait early.
pub async fn wait_for_receipt(
    provider: &dyn WalletProvider,
    hash: B256,
    interval: Duration,
) -> Result<TransactionReceipt, ChronoLogError> {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        if let Some(receipt) = provider.transaction_receipt(hash).await? {
            log::debug!(
                "Receipt for {} after {} attempt(s): status {}",
                hash,
                attempt,
                receipt.status
            );
            return Ok(receipt);
        }

        if attempt % PENDING_LOG_EVERY == 0 {
            log::info!("⏳ {} still pending after {} polls", hash, attempt);
        }
        tokio::time::sleep(interval).await;
    }
}
