//! Common test utilities for ChronoLog session tests
//!
//! This module provides shared test infrastructure including:
//! - A scripted in-memory wallet provider with call counters
//! - An in-memory ChronoLog contract behind `eth_call` / `eth_sendTransaction`
//! - Controller construction with a manual clock and fast polling

#![allow(dead_code)]

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use chronolog::abi::{createLogCall, getAllLogsCall, Log};
use chronolog::{
    ChainDescriptor, ChronoLogConfig, ManualClock, ProviderError, ProviderEvent, SessionController,
    TransactionReceipt, WalletProvider, TARGET_CHAIN_ID,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

pub const START_TIME: i64 = 1_760_000_000;

pub fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

pub fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

pub fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

pub fn test_config() -> ChronoLogConfig {
    ChronoLogConfig {
        poll_interval: Duration::from_millis(10),
        ..ChronoLogConfig::default()
    }
}

pub fn raw_log(id: u64, author: Address, content: &str, timestamp: u64, unlock: u64) -> Log {
    Log {
        id: U256::from(id),
        author,
        content: content.to_string(),
        timestamp: U256::from(timestamp),
        unlockTime: U256::from(unlock),
    }
}

/// Scripted `eth_call` answer: wait, then return these logs
pub struct ScriptedCall {
    pub delay: Duration,
    pub logs: Vec<Log>,
}

#[derive(Default)]
pub struct MockState {
    pub available: bool,
    pub accounts: Vec<Address>,
    /// Whether `eth_accounts` reveals accounts without a prompt
    pub authorized: bool,
    pub chain_id: u64,
    pub known_chains: HashSet<u64>,

    pub request_accounts_error: Option<ProviderError>,
    pub switch_error: Option<ProviderError>,
    pub add_chain_error: Option<ProviderError>,
    pub call_error: Option<ProviderError>,
    pub send_error: Option<ProviderError>,
    pub receipt_error: Option<ProviderError>,
    pub revert_next: bool,
    /// Receipt polls answered with "still pending" before the receipt shows up
    pub pending_polls: u32,

    pub logs: Vec<Log>,
    pub call_script: VecDeque<ScriptedCall>,
    pub receipts: HashMap<B256, TransactionReceipt>,

    pub request_accounts_calls: u32,
    pub switch_calls: Vec<String>,
    pub add_chain_calls: Vec<ChainDescriptor>,
    pub call_calls: u32,
    pub send_calls: u32,
}

/// In-memory wallet + chain + ChronoLog contract
pub struct MockWalletProvider {
    pub state: Mutex<MockState>,
    clock: ManualClock,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWalletProvider {
    /// Wallet present on the target chain with `alice` available but not yet authorised
    pub fn new(clock: ManualClock) -> Self {
        let (events, _) = broadcast::channel(16);
        let state = MockState {
            available: true,
            accounts: vec![alice()],
            chain_id: TARGET_CHAIN_ID,
            known_chains: [TARGET_CHAIN_ID, 1].into_iter().collect(),
            ..MockState::default()
        };
        Self {
            state: Mutex::new(state),
            clock,
            events,
        }
    }

    pub fn absent(clock: ManualClock) -> Self {
        let mock = Self::new(clock);
        mock.state.lock().unwrap().available = false;
        mock
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn emit(&self, event: ProviderEvent) {
        self.events.send(event).expect("no subscribers");
    }

    /// Like `emit`, but reports a missing listener instead of panicking
    pub fn emit_checked(&self, event: ProviderEvent) -> Result<usize, ProviderEvent> {
        self.events.send(event).map_err(|e| e.0)
    }

    pub fn send_calls(&self) -> u32 {
        self.with(|s| s.send_calls)
    }
}

fn encode_logs(logs: Vec<Log>) -> Bytes {
    (logs,).abi_encode_params().into()
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn is_available(&self) -> bool {
        self.with(|s| s.available)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.with(|s| {
            s.request_accounts_calls += 1;
            if !s.available {
                return Err(ProviderError::transport("connection refused"));
            }
            if let Some(err) = s.request_accounts_error.clone() {
                return Err(err);
            }
            s.authorized = true;
            Ok(s.accounts.clone())
        })
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.with(|s| {
            if s.authorized {
                Ok(s.accounts.clone())
            } else {
                Ok(Vec::new())
            }
        })
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.with(|s| {
            if s.available {
                Ok(s.chain_id)
            } else {
                Err(ProviderError::transport("connection refused"))
            }
        })
    }

    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError> {
        self.with(|s| {
            s.switch_calls.push(chain_id_hex.to_string());
            if let Some(err) = s.switch_error.clone() {
                return Err(err);
            }
            let target = chronolog::provider::parse_hex_quantity(chain_id_hex)
                .ok_or_else(|| ProviderError::new(-32602, "bad chain id"))?;
            if !s.known_chains.contains(&target) {
                return Err(ProviderError::new(
                    4902,
                    format!("Unrecognized chain ID \"{}\".", chain_id_hex),
                ));
            }
            s.chain_id = target;
            Ok(())
        })
    }

    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError> {
        self.with(|s| {
            s.add_chain_calls.push(descriptor.clone());
            if let Some(err) = s.add_chain_error.clone() {
                return Err(err);
            }
            let id = chronolog::provider::parse_hex_quantity(&descriptor.chain_id)
                .ok_or_else(|| ProviderError::new(-32602, "bad chain id"))?;
            // MetaMask switches to a freshly added chain
            s.known_chains.insert(id);
            s.chain_id = id;
            Ok(())
        })
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        let scripted = self.with(|s| {
            s.call_calls += 1;
            if let Some(err) = s.call_error.clone() {
                return Err(err);
            }
            if data[..4] != getAllLogsCall::SELECTOR[..] {
                return Err(ProviderError::new(-32000, "execution reverted"));
            }
            Ok(s.call_script.pop_front())
        })?;

        match scripted {
            Some(ScriptedCall { delay, logs }) => {
                tokio::time::sleep(delay).await;
                Ok(encode_logs(logs))
            }
            None => Ok(encode_logs(self.with(|s| s.logs.clone()))),
        }
    }

    async fn send_transaction(
        &self,
        from: Address,
        _to: Address,
        data: Bytes,
    ) -> Result<B256, ProviderError> {
        let now = u64::try_from(chronolog::Clock::now(&self.clock)).unwrap_or(0);
        self.with(|s| {
            s.send_calls += 1;
            if let Some(err) = s.send_error.clone() {
                return Err(err);
            }
            let call = createLogCall::abi_decode(&data, true)
                .map_err(|e| ProviderError::new(-32602, e.to_string()))?;

            let id = s.logs.len() as u64 + 1;
            let hash = keccak256(id.to_be_bytes());
            let status = if std::mem::take(&mut s.revert_next) {
                0
            } else {
                s.logs.push(Log {
                    id: U256::from(id),
                    author: from,
                    content: call._content,
                    timestamp: U256::from(now),
                    unlockTime: call._unlockTime,
                });
                1
            };
            s.receipts.insert(
                hash,
                TransactionReceipt {
                    transaction_hash: hash,
                    status,
                    block_number: Some(id),
                },
            );
            Ok(hash)
        })
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.with(|s| {
            if let Some(err) = s.receipt_error.clone() {
                return Err(err);
            }
            if s.pending_polls > 0 {
                s.pending_polls -= 1;
                return Ok(None);
            }
            Ok(s.receipts.get(&hash).cloned())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

pub struct TestSession {
    pub clock: ManualClock,
    pub mock: Arc<MockWalletProvider>,
    pub controller: Arc<SessionController>,
}

impl TestSession {
    pub fn new() -> Self {
        Self::from_mock(MockWalletProvider::new)
    }

    pub fn from_mock(build: impl FnOnce(ManualClock) -> MockWalletProvider) -> Self {
        init_logger();
        let clock = ManualClock::new(START_TIME);
        let mock = Arc::new(build(clock.clone()));
        let controller = Arc::new(SessionController::with_clock(
            mock.clone(),
            test_config(),
            Arc::new(clock.clone()),
        ));
        Self {
            clock,
            mock,
            controller,
        }
    }

    /// Session with `alice` connected on the target chain
    pub async fn connected() -> Self {
        let session = Self::new();
        session
            .controller
            .connect()
            .await
            .expect("connect should succeed");
        session
    }
}
