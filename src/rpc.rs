//! JSON-RPC wallet provider
//!
//! Talks EIP-1193 over HTTP to a wallet bridge (Frame, a local signer, or
//! the `wallet-mock` server). HTTP cannot push, so account and chain
//! notifications come from a watcher task that polls `eth_accounts` and
//! `eth_chainId` and broadcasts whatever changed.

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ChainDescriptor;
use crate::provider::{
    parse_hex_quantity, ProviderError, ProviderEvent, TransactionReceipt, WalletProvider,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<RpcErrorObject> for ProviderError {
    fn from(obj: RpcErrorObject) -> Self {
        let short = match &obj.data {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(map)) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => None,
        };
        ProviderError {
            code: Some(obj.code),
            message: obj.message,
            short_message: short,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
}

/// Shared HTTP transport; cloned into the watcher task
#[derive(Clone)]
struct RpcTransport {
    url: String,
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl RpcTransport {
    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        log::trace!("→ {} #{}", method, id);

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::transport(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        let envelope: RpcResponse = response.json().await.map_err(|e| {
            ProviderError::transport(format!("{} returned HTTP {} with bad body: {}", method, status, e))
        })?;

        if let Some(err) = envelope.error {
            log::debug!("← {} #{} error {}: {}", method, id, err.code, err.message);
            return Err(err.into());
        }

        let result = envelope.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| ProviderError::transport(format!("{} result: {}", method, e)))
    }
}

pub struct JsonRpcWalletProvider {
    transport: RpcTransport,
    events: broadcast::Sender<ProviderEvent>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl JsonRpcWalletProvider {
    pub fn new(url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport: RpcTransport {
                url: url.into(),
                http: reqwest::Client::new(),
                next_id: Arc::new(AtomicU64::new(1)),
            },
            events,
            watcher: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.transport.url
    }

    /// Start polling for account/chain changes; replaces any running watcher
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_watcher(&self, interval: Duration) {
        let transport = self.transport.clone();
        let events = self.events.clone();
        let handle = tokio::spawn(watch_wallet(transport, events, interval));

        if let Ok(mut slot) = self.watcher.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    pub fn stop_watcher(&self) {
        if let Ok(mut slot) = self.watcher.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for JsonRpcWalletProvider {
    fn drop(&mut self) {
        self.stop_watcher();
    }
}

async fn watch_wallet(
    transport: RpcTransport,
    events: broadcast::Sender<ProviderEvent>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_accounts: Option<Vec<Address>> = None;
    let mut last_chain: Option<String> = None;

    loop {
        ticker.tick().await;

        match transport
            .request::<Vec<Address>>("eth_accounts", json!([]))
            .await
        {
            Ok(accounts) => {
                if last_accounts.as_ref() != Some(&accounts) {
                    // first observation only seeds the baseline
                    if last_accounts.is_some() {
                        log::info!("👛 Accounts changed: {} account(s)", accounts.len());
                        let _ = events.send(ProviderEvent::AccountsChanged(accounts.clone()));
                    }
                    last_accounts = Some(accounts);
                }
            }
            Err(e) => log::debug!("Watcher eth_accounts failed: {}", e),
        }

        match transport.request::<String>("eth_chainId", json!([])).await {
            Ok(chain) => {
                let chain = chain.to_lowercase();
                if last_chain.as_ref() != Some(&chain) {
                    if last_chain.is_some() {
                        log::info!("⛓️  Chain changed: {}", chain);
                        let _ = events.send(ProviderEvent::ChainChanged(chain.clone()));
                    }
                    last_chain = Some(chain);
                }
            }
            Err(e) => log::debug!("Watcher eth_chainId failed: {}", e),
        }
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWalletProvider {
    async fn is_available(&self) -> bool {
        match self.chain_id().await {
            Ok(_) => true,
            Err(e) => {
                log::debug!("Wallet provider at {} unavailable: {}", self.transport.url, e);
                false
            }
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.transport
            .request("eth_requestAccounts", json!([]))
            .await
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.transport.request("eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let raw: String = self.transport.request("eth_chainId", json!([])).await?;
        parse_hex_quantity(&raw)
            .ok_or_else(|| ProviderError::transport(format!("invalid chain id '{}'", raw)))
    }

    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError> {
        let _: Value = self
            .transport
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id_hex }]),
            )
            .await?;
        Ok(())
    }

    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError> {
        let _: Value = self
            .transport
            .request("wallet_addEthereumChain", json!([descriptor]))
            .await?;
        Ok(())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        self.transport
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<B256, ProviderError> {
        self.transport
            .request(
                "eth_sendTransaction",
                json!([{ "from": from, "to": to, "data": data }]),
            )
            .await
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        let raw: Option<RawReceipt> = self
            .transport
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;

        Ok(raw.map(|r| TransactionReceipt {
            transaction_hash: r.transaction_hash,
            status: r
                .status
                .as_deref()
                .and_then(parse_hex_quantity)
                .unwrap_or(0),
            block_number: r.block_number.as_deref().and_then(parse_hex_quantity),
        }))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_object_short_message_from_data() {
        let obj: RpcErrorObject = serde_json::from_value(json!({
            "code": -32603,
            "message": "Internal JSON-RPC error.",
            "data": { "code": 3, "message": "execution reverted" }
        }))
        .unwrap();
        let err = ProviderError::from(obj);
        assert_eq!(err.code, Some(-32603));
        assert_eq!(err.user_message(), "execution reverted");
    }

    #[test]
    fn test_error_object_without_data() {
        let obj: RpcErrorObject = serde_json::from_value(json!({
            "code": 4902,
            "message": "Unrecognized chain ID \"0x66eee\"."
        }))
        .unwrap();
        let err = ProviderError::from(obj);
        assert!(err.is_unrecognized_chain());
        assert_eq!(err.short_message, None);
    }

    #[test]
    fn test_receipt_parsing() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "status": "0x1",
            "blockNumber": "0x10"
        }))
        .unwrap();
        assert_eq!(raw.status.as_deref().and_then(parse_hex_quantity), Some(1));
        assert_eq!(raw.block_number.as_deref().and_then(parse_hex_quantity), Some(16));
    }
}
