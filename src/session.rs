//! Session controller
//!
//! Owns everything a ChronoLog session knows: the wallet connection, the
//! contract handle built from it, the last fetched record list, the pending
//! transaction and the notices shown to the user. Operations surface their
//! errors both as a returned `Err` and as an error notice.
//!
//! State sits behind a single `RwLock` that is never held across a provider
//! call, so concurrent operations interleave freely and the last write wins.
//! The one exception is submission: at most one `createLog` may be in flight
//! per controller.

use alloy_primitives::{Address, B256};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::clock::{Clock, SystemClock};
use crate::config::ChronoLogConfig;
use crate::contract::{wait_for_receipt, ChronoLogContract};
use crate::error::ChronoLogError;
use crate::notice::{Notice, NoticeBoard};
use crate::provider::{parse_hex_quantity, ProviderEvent, TransactionReceipt, WalletProvider};
use crate::record::{short_addr, RecordList};

/// Longest Moment the form accepts
pub const MOMENT_MAX_CHARS: usize = 1024;

/// Longest Capsule the form accepts
pub const CAPSULE_MAX_CHARS: usize = 4096;

const NO_WALLET_NOTICE: &str =
    "No injected wallet detected. Install MetaMask or another Web3 wallet to interact with ChronoLog.";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub wallet_present: bool,
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub has_signer: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxPhase {
    #[default]
    Idle,
    Submitted,
    Confirmed,
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PendingTx {
    pub hash: Option<B256>,
    pub phase: TxPhase,
}

/// Point-in-time view of the session for rendering
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub contract: Option<ChronoLogContract>,
    pub pending: PendingTx,
    pub notices: Vec<Notice>,
    pub target_chain_id: u64,
    pub on_correct_network: bool,
    pub contract_explorer_url: Option<String>,
    pub tx_explorer_url: Option<String>,
    pub record_count: usize,
    pub refreshing: bool,
    pub submitting: bool,
}

struct SessionState {
    connection: ConnectionState,
    contract: Option<ChronoLogContract>,
    records: RecordList,
    pending: PendingTx,
    notices: NoticeBoard,
}

pub struct SessionController {
    provider: Arc<dyn WalletProvider>,
    config: ChronoLogConfig,
    clock: Arc<dyn Clock>,
    state: RwLock<SessionState>,
    submitting: AtomicBool,
    fetches_in_flight: AtomicUsize,
}

/// Clears the submission flag when a submission ends, however it ends
struct SubmissionGuard<'a>(&'a AtomicBool);

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct FetchGuard<'a>(&'a AtomicUsize);

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Live subscription to provider notifications; unsubscribes on drop
pub struct EventSubscription {
    handle: JoinHandle<()>,
}

impl EventSubscription {
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl SessionController {
    pub fn new(provider: Arc<dyn WalletProvider>, config: ChronoLogConfig) -> Self {
        Self::with_clock(provider, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        provider: Arc<dyn WalletProvider>,
        config: ChronoLogConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let notices = NoticeBoard::new(config.notice_ttl);
        Self {
            provider,
            config,
            clock,
            state: RwLock::new(SessionState {
                connection: ConnectionState::default(),
                contract: None,
                records: RecordList::default(),
                pending: PendingTx::default(),
                notices,
            }),
            submitting: AtomicBool::new(false),
            fetches_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &ChronoLogConfig {
        &self.config
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    // ============================================================================
    // Startup and notifications
    // ============================================================================

    /// Discover the wallet and build the initial contract handle
    ///
    /// An absent wallet is not an error: the session stays usable for
    /// nothing but a later `connect`, and a notice explains why.
    pub async fn initialize(&self) -> ConnectionState {
        if !self.provider.is_available().await {
            let mut state = self.state.write().await;
            state.connection.wallet_present = false;
            state.notices.info(NO_WALLET_NOTICE, self.now());
            return state.connection.clone();
        }

        let (chain_id, accounts) =
            futures::future::join(self.provider.chain_id(), self.provider.accounts()).await;

        let chain_id = match chain_id {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Could not read chain id during init: {}", e);
                None
            }
        };
        let accounts = match accounts {
            Ok(accounts) => accounts,
            Err(e) => {
                log::debug!("No pre-authorised accounts: {}", e);
                Vec::new()
            }
        };

        let connection = {
            let mut state = self.state.write().await;
            state.connection.wallet_present = true;
            state.connection.chain_id = chain_id;
            match accounts.first() {
                Some(account) => {
                    state.connection.account = Some(*account);
                    state.connection.has_signer = true;
                    state.contract = Some(ChronoLogContract::read_write(
                        self.config.contract_address,
                        *account,
                    ));
                }
                None => {
                    state.contract = Some(ChronoLogContract::read_only(self.config.contract_address));
                }
            }
            state.connection.clone()
        };

        log::info!(
            "Session initialised: account={:?} chain={:?}",
            connection.account,
            connection.chain_id
        );
        self.refresh_after_handle_change().await;
        connection
    }

    /// Subscribe to provider notifications for the lifetime of the returned value
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach_events(self: &Arc<Self>) -> EventSubscription {
        let mut events = self.provider.subscribe();
        let controller: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(controller) = controller.upgrade() else {
                            break;
                        };
                        controller.handle_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Dropped {} wallet notification(s)", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            log::debug!("Wallet notification listener stopped");
        });

        EventSubscription { handle }
    }

    pub async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => self.on_accounts_changed(accounts).await,
            ProviderEvent::ChainChanged(chain_id_hex) => self.on_chain_changed(&chain_id_hex).await,
        }
    }

    /// Wallet switched or revoked accounts
    ///
    /// An empty list is a disconnect: the signer goes away and the handle
    /// drops back to read-only.
    pub async fn on_accounts_changed(&self, accounts: Vec<Address>) {
        let rebuilt = {
            let mut state = self.state.write().await;
            match accounts.first() {
                None => {
                    log::info!("Wallet disconnected");
                    state.connection.account = None;
                    state.connection.has_signer = false;
                    if state.contract.as_ref().and_then(|c| c.signer()).is_some() {
                        state.contract =
                            Some(ChronoLogContract::read_only(self.config.contract_address));
                    }
                    false
                }
                Some(account) => {
                    log::info!("Active account is now {}", account);
                    state.connection.wallet_present = true;
                    state.connection.account = Some(*account);
                    state.connection.has_signer = true;
                    state.contract = Some(ChronoLogContract::read_write(
                        self.config.contract_address,
                        *account,
                    ));
                    true
                }
            }
        };

        if rebuilt {
            self.refresh_after_handle_change().await;
        }
    }

    /// Wallet moved to another chain; the handle's signer is left alone
    pub async fn on_chain_changed(&self, chain_id_hex: &str) {
        let chain_id = match self.provider.chain_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Re-reading chain id failed ({}), using notification value", e);
                parse_hex_quantity(chain_id_hex)
            }
        };

        let mut state = self.state.write().await;
        state.connection.chain_id = chain_id;
        log::info!("Chain changed to {:?}", chain_id);
    }

    // ============================================================================
    // Wallet operations
    // ============================================================================

    /// Ask the wallet for account access and build a read-write handle
    pub async fn connect(&self) -> Result<Address, ChronoLogError> {
        self.state.write().await.notices.clear();

        match self.try_connect().await {
            Ok(account) => {
                {
                    let mut state = self.state.write().await;
                    let now = self.now();
                    state.notices.success(
                        format!("Wallet connected: {}", short_addr(&account.to_string())),
                        now,
                    );
                }
                self.refresh_after_handle_change().await;
                Ok(account)
            }
            Err(err) => Err(self.surface(err).await),
        }
    }

    async fn try_connect(&self) -> Result<Address, ChronoLogError> {
        if !self.provider.is_available().await {
            return Err(ChronoLogError::WalletUnavailable);
        }

        let accounts = self
            .provider
            .request_accounts()
            .await
            .map_err(|e| ChronoLogError::ConnectFailed(e.user_message()))?;
        let account = *accounts.first().ok_or(ChronoLogError::NoAccounts)?;

        let chain_id = self
            .provider
            .chain_id()
            .await
            .map_err(|e| ChronoLogError::ConnectFailed(e.user_message()))?;

        let mut state = self.state.write().await;
        state.connection = ConnectionState {
            wallet_present: true,
            account: Some(account),
            chain_id: Some(chain_id),
            has_signer: true,
        };
        state.contract = Some(ChronoLogContract::read_write(
            self.config.contract_address,
            account,
        ));

        log::info!("🔗 Connected {} on chain {}", account, chain_id);
        Ok(account)
    }

    /// Ask the wallet to move to the target chain, adding it if unknown
    pub async fn switch_network(&self) -> Result<u64, ChronoLogError> {
        self.state.write().await.notices.clear_error();

        match self.try_switch_network().await {
            Ok(chain_id) => {
                let mut state = self.state.write().await;
                state.connection.chain_id = Some(chain_id);
                let now = self.now();
                state
                    .notices
                    .success(format!("Switched to {}.", self.config.chain.chain_name), now);
                Ok(chain_id)
            }
            Err(err) => Err(self.surface(err).await),
        }
    }

    async fn try_switch_network(&self) -> Result<u64, ChronoLogError> {
        let target = self.config.chain_id_hex();

        if let Err(switch_err) = self.provider.switch_chain(&target).await {
            if !switch_err.is_unrecognized_chain() {
                return Err(ChronoLogError::SwitchChainFailed(switch_err.user_message()));
            }

            log::info!(
                "Wallet does not know chain {}, requesting wallet_addEthereumChain",
                target
            );
            self.provider
                .add_chain(&self.config.chain)
                .await
                .map_err(|add_err| ChronoLogError::AddChainFailed {
                    chain_name: self.config.chain.chain_name.clone(),
                    reason: add_err.user_message(),
                })?;
        }

        Ok(self.provider.chain_id().await?)
    }

    // ============================================================================
    // Records
    // ============================================================================

    /// Read every record from the contract and replace the cached list
    ///
    /// The previous list survives a failed fetch. Concurrent fetches are not
    /// serialised; whichever completes last is what stays cached.
    pub async fn fetch_records(&self) -> Result<RecordList, ChronoLogError> {
        self.fetches_in_flight.fetch_add(1, Ordering::AcqRel);
        let _guard = FetchGuard(&self.fetches_in_flight);

        let contract = {
            let mut state = self.state.write().await;
            state.notices.clear_error();
            state.contract.clone()
        };

        let Some(contract) = contract else {
            let err = ChronoLogError::fetch_failed(&ChronoLogError::ContractNotInitialized);
            return Err(self.surface(err).await);
        };

        match contract.get_all_logs(self.provider.as_ref()).await {
            Ok(logs) => {
                let list = RecordList::from_logs(logs);
                log::debug!("Fetched {} log(s)", list.len());
                self.state.write().await.records = list.clone();
                Ok(list)
            }
            Err(e) => {
                let err = ChronoLogError::fetch_failed(&e);
                Err(self.surface(err).await)
            }
        }
    }

    // A new handle means a new view of the contract; failures are already
    // surfaced as notices.
    async fn refresh_after_handle_change(&self) {
        if let Err(e) = self.fetch_records().await {
            log::debug!("Refresh after handle change failed: {}", e);
        }
    }

    // ============================================================================
    // Submission
    // ============================================================================

    /// Send `createLog(content, unlock_at)` and wait for one confirmation
    ///
    /// Preconditions are checked in order (signer, content, unlock time,
    /// network) and the first failure aborts before anything is sent. On a
    /// successful receipt the record list is refreshed.
    pub async fn submit(
        &self,
        content: &str,
        unlock_at: f64,
    ) -> Result<TransactionReceipt, ChronoLogError> {
        self.submit_with_limit(content, unlock_at, None).await
    }

    /// Immediate record: unlocks at the moment it is written
    pub async fn submit_moment(&self, content: &str) -> Result<TransactionReceipt, ChronoLogError> {
        let now = self.now();
        self.submit_with_limit(content, now as f64, Some(MOMENT_MAX_CHARS))
            .await
    }

    /// Future-unlocking record from a local `YYYY-MM-DDTHH:MM[:SS]` input
    pub async fn submit_capsule(
        &self,
        content: &str,
        unlock_input: &str,
    ) -> Result<TransactionReceipt, ChronoLogError> {
        let unlock_at = match parse_unlock_input(unlock_input) {
            Ok(ts) => ts,
            Err(err) => return Err(self.surface(err).await),
        };
        if unlock_at <= self.now() {
            return Err(self.surface(ChronoLogError::UnlockTimeNotInFuture).await);
        }

        self.submit_with_limit(content, unlock_at as f64, Some(CAPSULE_MAX_CHARS))
            .await
    }

    async fn submit_with_limit(
        &self,
        content: &str,
        unlock_at: f64,
        limit: Option<usize>,
    ) -> Result<TransactionReceipt, ChronoLogError> {
        let signer = {
            let mut state = self.state.write().await;
            state.notices.clear();
            state
                .connection
                .account
                .filter(|_| state.connection.has_signer)
        };

        let prepared = validate_submission(signer, content, unlock_at, limit);
        let (signer, content, unlock_time) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => return Err(self.surface(err).await),
        };

        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(self.surface(ChronoLogError::SubmissionPending).await);
        }
        let _guard = SubmissionGuard(&self.submitting);

        match self.provider.chain_id().await {
            Ok(chain_id) if chain_id == self.config.chain_id => {}
            Ok(chain_id) => {
                let err = ChronoLogError::WrongNetwork {
                    chain_name: self.config.chain.chain_name.clone(),
                    expected: self.config.chain_id,
                    actual: chain_id,
                };
                return Err(self.surface(err).await);
            }
            Err(e) => {
                let err = ChronoLogError::transaction_failed(&ChronoLogError::Provider(e));
                return Err(self.surface(err).await);
            }
        }

        let contract = ChronoLogContract::read_write(self.config.contract_address, signer);
        let hash = match contract
            .create_log(self.provider.as_ref(), content, unlock_time)
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                self.set_pending(None, TxPhase::Failed).await;
                return Err(self.surface(ChronoLogError::transaction_failed(&e)).await);
            }
        };

        {
            let mut state = self.state.write().await;
            state.pending = PendingTx {
                hash: Some(hash),
                phase: TxPhase::Submitted,
            };
            let now = self.now();
            state.notices.info(
                format!(
                    "Transaction submitted: {} — waiting for confirmation...",
                    short_addr(&hash.to_string())
                ),
                now,
            );
        }
        log::info!("📨 createLog submitted: {}", hash);

        let receipt = match wait_for_receipt(
            self.provider.as_ref(),
            hash,
            self.config.poll_interval,
        )
        .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                self.set_pending(Some(hash), TxPhase::Failed).await;
                return Err(self.surface(ChronoLogError::transaction_failed(&e)).await);
            }
        };

        if !receipt.is_success() {
            self.set_pending(Some(hash), TxPhase::Failed).await;
            let err = ChronoLogError::TransactionReverted(hash.to_string());
            return Err(self.surface(err).await);
        }

        {
            let mut state = self.state.write().await;
            state.pending.phase = TxPhase::Confirmed;
            let now = self.now();
            state.notices.success("Transaction confirmed ✅", now);
        }
        log::info!("✅ createLog confirmed: {}", hash);

        if let Err(e) = self.fetch_records().await {
            log::warn!("Refresh after confirmation failed: {}", e);
        }
        Ok(receipt)
    }

    async fn set_pending(&self, hash: Option<B256>, phase: TxPhase) {
        self.state.write().await.pending = PendingTx { hash, phase };
    }

    // ============================================================================
    // Notices and views
    // ============================================================================

    /// Post `err` as an error notice and hand it back for returning
    async fn surface(&self, err: ChronoLogError) -> ChronoLogError {
        let now = self.now();
        self.state.write().await.notices.error(err.to_string(), now);
        err
    }

    pub async fn dismiss_notices(&self) {
        self.state.write().await.notices.clear();
    }

    pub async fn notices(&self) -> Vec<Notice> {
        let now = self.now();
        self.state.read().await.notices.current(now)
    }

    pub async fn connection(&self) -> ConnectionState {
        self.state.read().await.connection.clone()
    }

    pub async fn contract(&self) -> Option<ChronoLogContract> {
        self.state.read().await.contract.clone()
    }

    pub async fn records(&self) -> RecordList {
        self.state.read().await.records.clone()
    }

    pub async fn pending(&self) -> PendingTx {
        self.state.read().await.pending.clone()
    }

    pub async fn on_correct_network(&self) -> bool {
        self.state.read().await.connection.chain_id == Some(self.config.chain_id)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn is_refreshing(&self) -> bool {
        self.fetches_in_flight.load(Ordering::Acquire) > 0
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let now = self.now();
        let state = self.state.read().await;
        SessionSnapshot {
            connection: state.connection.clone(),
            contract: state.contract.clone(),
            pending: state.pending.clone(),
            notices: state.notices.current(now),
            target_chain_id: self.config.chain_id,
            on_correct_network: state.connection.chain_id == Some(self.config.chain_id),
            contract_explorer_url: self.config.contract_explorer_url(),
            tx_explorer_url: state
                .pending
                .hash
                .and_then(|h| self.config.tx_explorer_url(&h.to_string())),
            record_count: state.records.len(),
            refreshing: self.is_refreshing(),
            submitting: self.is_submitting(),
        }
    }
}

/// Local-only precondition checks: signer, content, unlock time
///
/// Returns the signer, trimmed content and floored unlock time.
fn validate_submission(
    signer: Option<Address>,
    content: &str,
    unlock_at: f64,
    limit: Option<usize>,
) -> Result<(Address, &str, u64), ChronoLogError> {
    let signer = signer.ok_or(ChronoLogError::NotConnected)?;

    let content = content.trim();
    if content.is_empty() {
        return Err(ChronoLogError::EmptyContent);
    }
    if let Some(limit) = limit {
        if content.chars().count() > limit {
            return Err(ChronoLogError::ContentTooLong { limit });
        }
    }

    if !unlock_at.is_finite() || unlock_at < 0.0 {
        return Err(ChronoLogError::InvalidUnlockTime);
    }

    Ok((signer, content, unlock_at.floor() as u64))
}

/// Parse a date/time form value into unix seconds
///
/// Accepts `datetime-local` values (`YYYY-MM-DDTHH:MM` with optional
/// seconds, interpreted in local time) and RFC 3339 timestamps.
pub fn parse_unlock_input(input: &str) -> Result<i64, ChronoLogError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ChronoLogError::MissingUnlockTime);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.timestamp());
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.timestamp())
                .ok_or_else(|| ChronoLogError::InvalidUnlockTimeFormat(input.to_string()));
        }
    }

    Err(ChronoLogError::InvalidUnlockTimeFormat(input.to_string()))
}
