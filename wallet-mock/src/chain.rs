/// In-memory wallet + chain with a deployed ChronoLog contract
///
/// Answers the EIP-1193 methods a dApp session uses. The contract only
/// exists on its home chain; calls made while the wallet sits on another
/// chain see an empty account, just like a real network would.
use alloy_primitives::{address, keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};

use crate::types::{RpcError, WalletStateResponse};

/// Where the ChronoLog contract lives
pub const CONTRACT_ADDRESS: Address = address!("1A46b403A29c8cBDA564E1f4B9c6332b8873532f");

/// Arbitrum Sepolia
pub const CONTRACT_CHAIN_ID: u64 = 421614;

/// Ethereum mainnet, known to every wallet
pub const MAINNET_CHAIN_ID: u64 = 1;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Log {
        uint256 id;
        address author;
        string content;
        uint256 timestamp;
        uint256 unlockTime;
    }

    function createLog(string _content, uint256 _unlockTime) external;

    function getAllLogs() external view returns (Log[] memory);
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwitchChainParam {
    chain_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddChainParam {
    chain_id: String,
    chain_name: String,
    #[serde(default)]
    rpc_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionParam {
    #[serde(default)]
    from: Option<Address>,
    to: Address,
    #[serde(default, alias = "input")]
    data: Bytes,
}

#[derive(Debug, Clone)]
struct StoredReceipt {
    from: Address,
    to: Address,
    status: bool,
    block_number: u64,
}

pub struct MockChain {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    contract: Address,
    logs: Vec<Log>,
    receipts: HashMap<B256, StoredReceipt>,
    block_number: u64,
    nonce: u64,
    last_transaction: Option<B256>,
    /// Remaining user rejections per method
    rejections: HashMap<String, u32>,
    /// Remaining transactions that will revert
    reverts: u32,
}

impl MockChain {
    /// Wallet holding `accounts`, currently on `chain_id`
    ///
    /// Mainnet and the starting chain are known; the contract's home chain
    /// must be added first if the wallet starts elsewhere.
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
        Self {
            accounts,
            authorized: false,
            chain_id,
            known_chains: [MAINNET_CHAIN_ID, chain_id].into_iter().collect(),
            contract: CONTRACT_ADDRESS,
            logs: Vec::new(),
            receipts: HashMap::new(),
            block_number: 0,
            nonce: 0,
            last_transaction: None,
            rejections: HashMap::new(),
            reverts: 0,
        }
    }

    pub fn with_contract(mut self, contract: Address) -> Self {
        self.contract = contract;
        self
    }

    /// Route one JSON-RPC call
    pub fn dispatch(&mut self, method: &str, params: &Value) -> Result<Value, RpcError> {
        match method {
            "eth_requestAccounts" => self.request_accounts(),
            "eth_accounts" => Ok(json!(self.visible_accounts())),
            "eth_chainId" => Ok(json!(to_quantity(self.chain_id))),
            "net_version" => Ok(json!(self.chain_id.to_string())),
            "eth_blockNumber" => Ok(json!(to_quantity(self.block_number))),
            "wallet_switchEthereumChain" => self.switch_chain(first_param(params)?),
            "wallet_addEthereumChain" => self.add_chain(first_param(params)?),
            "eth_call" => self.call(first_param(params)?),
            "eth_sendTransaction" => self.send_transaction(first_param(params)?),
            "eth_getTransactionReceipt" => Ok(self.receipt(first_param(params)?)),
            other => Err(RpcError::method_not_found(other)),
        }
    }

    // ============================================================================
    // Wallet methods
    // ============================================================================

    fn request_accounts(&mut self) -> Result<Value, RpcError> {
        if self.take_rejection("eth_requestAccounts") {
            return Err(RpcError::user_rejected("User rejected the request."));
        }
        self.authorized = true;
        log::info!("👛 Authorised {} account(s)", self.accounts.len());
        Ok(json!(self.accounts))
    }

    fn visible_accounts(&self) -> Vec<Address> {
        if self.authorized {
            self.accounts.clone()
        } else {
            Vec::new()
        }
    }

    fn switch_chain(&mut self, param: SwitchChainParam) -> Result<Value, RpcError> {
        let target = parse_quantity(&param.chain_id)
            .ok_or_else(|| RpcError::invalid_params(format!("chainId '{}'", param.chain_id)))?;

        if !self.known_chains.contains(&target) {
            return Err(RpcError::unrecognized_chain(&param.chain_id));
        }
        if self.take_rejection("wallet_switchEthereumChain") {
            return Err(RpcError::user_rejected("User rejected the request."));
        }

        self.chain_id = target;
        log::info!("⛓️  Switched to chain {}", target);
        Ok(Value::Null)
    }

    fn add_chain(&mut self, param: AddChainParam) -> Result<Value, RpcError> {
        let id = parse_quantity(&param.chain_id)
            .ok_or_else(|| RpcError::invalid_params(format!("chainId '{}'", param.chain_id)))?;
        if param.rpc_urls.is_empty() {
            return Err(RpcError::invalid_params("rpcUrls must not be empty"));
        }
        if self.take_rejection("wallet_addEthereumChain") {
            return Err(RpcError::user_rejected("User rejected the request."));
        }

        // wallets switch to a chain right after adding it
        self.known_chains.insert(id);
        self.chain_id = id;
        log::info!("➕ Added chain {} ({}) and switched to it", param.chain_name, id);
        Ok(Value::Null)
    }

    // ============================================================================
    // Contract
    // ============================================================================

    fn contract_deployed_at(&self, to: Address) -> bool {
        to == self.contract && self.chain_id == CONTRACT_CHAIN_ID
    }

    fn call(&self, param: TransactionParam) -> Result<Value, RpcError> {
        if !self.contract_deployed_at(param.to) {
            return Ok(json!(Bytes::new()));
        }

        if param.data.len() < 4 || param.data[..4] != getAllLogsCall::SELECTOR[..] {
            return Err(RpcError::execution_reverted("execution reverted"));
        }

        let encoded: Bytes = (self.logs.clone(),).abi_encode_params().into();
        Ok(json!(encoded))
    }

    fn send_transaction(&mut self, param: TransactionParam) -> Result<Value, RpcError> {
        let from = param.from.ok_or_else(|| RpcError::invalid_params("missing 'from'"))?;
        if !self.authorized || !self.accounts.contains(&from) {
            return Err(RpcError::unauthorized());
        }
        if self.take_rejection("eth_sendTransaction") {
            return Err(RpcError::user_rejected("User denied transaction signature."));
        }

        let mut status = true;
        if self.contract_deployed_at(param.to) {
            let call = createLogCall::abi_decode(&param.data, true).map_err(|e| {
                RpcError::execution_reverted(&format!("execution reverted: {}", e))
            })?;

            if self.reverts > 0 {
                self.reverts -= 1;
                status = false;
            } else {
                let id = self.logs.len() as u64 + 1;
                self.logs.push(Log {
                    id: U256::from(id),
                    author: from,
                    content: call._content,
                    timestamp: U256::from(block_timestamp()),
                    unlockTime: call._unlockTime,
                });
                log::info!("📝 createLog #{} by {}", id, from);
            }
        }

        self.nonce += 1;
        self.block_number += 1;
        let hash = keccak256((from, U256::from(self.nonce)).abi_encode());
        self.receipts.insert(
            hash,
            StoredReceipt {
                from,
                to: param.to,
                status,
                block_number: self.block_number,
            },
        );
        self.last_transaction = Some(hash);
        Ok(json!(hash))
    }

    fn receipt(&self, hash: B256) -> Value {
        match self.receipts.get(&hash) {
            Some(receipt) => json!({
                "transactionHash": hash,
                "from": receipt.from,
                "to": receipt.to,
                "status": if receipt.status { "0x1" } else { "0x0" },
                "blockNumber": to_quantity(receipt.block_number),
            }),
            None => Value::Null,
        }
    }

    // ============================================================================
    // Admin controls
    // ============================================================================

    /// Replace the wallet's account list (as if the user switched accounts)
    pub fn set_accounts(&mut self, accounts: Vec<Address>) {
        log::info!("👛 Accounts set to {:?}", accounts);
        self.accounts = accounts;
    }

    /// Decline the next `count` calls of `method`
    pub fn reject_next(&mut self, method: &str, count: u32) {
        *self.rejections.entry(method.to_string()).or_insert(0) += count;
    }

    /// Move the wallet to another chain from the wallet UI
    pub fn set_chain(&mut self, chain_id: u64) {
        self.known_chains.insert(chain_id);
        self.chain_id = chain_id;
    }

    /// Make the next `count` contract transactions revert
    pub fn revert_next(&mut self, count: u32) {
        self.reverts += count;
    }

    pub fn state(&self) -> WalletStateResponse {
        WalletStateResponse {
            accounts: self.accounts.clone(),
            authorized: self.authorized,
            chain_id: self.chain_id,
            known_chains: self.known_chains.iter().copied().collect(),
            contract: self.contract,
            log_count: self.logs.len(),
            block_number: self.block_number,
            last_transaction: self.last_transaction,
        }
    }

    fn take_rejection(&mut self, method: &str) -> bool {
        match self.rejections.get_mut(method) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                log::info!("🙅 Rejecting {}", method);
                true
            }
            _ => false,
        }
    }
}

fn first_param<T: DeserializeOwned>(params: &Value) -> Result<T, RpcError> {
    let first = params
        .get(0)
        .cloned()
        .ok_or_else(|| RpcError::invalid_params("expected a non-empty params array"))?;
    serde_json::from_value(first).map_err(|e| RpcError::invalid_params(e.to_string()))
}

fn block_timestamp() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

pub fn to_quantity(value: u64) -> String {
    format!("{:#x}", value)
}

pub fn parse_quantity(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn on_contract_chain() -> MockChain {
        MockChain::new(vec![alice()], CONTRACT_CHAIN_ID)
    }

    fn create_log_tx(from: Address, content: &str, unlock: u64) -> Value {
        let data: Bytes = createLogCall {
            _content: content.to_string(),
            _unlockTime: U256::from(unlock),
        }
        .abi_encode()
        .into();
        json!([{ "from": from, "to": CONTRACT_ADDRESS, "data": data }])
    }

    #[test]
    fn test_accounts_hidden_until_requested() {
        let mut chain = on_contract_chain();
        assert_eq!(chain.dispatch("eth_accounts", &json!([])).unwrap(), json!([]));

        chain.dispatch("eth_requestAccounts", &json!([])).unwrap();
        assert_eq!(
            chain.dispatch("eth_accounts", &json!([])).unwrap(),
            json!([alice()])
        );
    }

    #[test]
    fn test_rejection_is_consumed() {
        let mut chain = on_contract_chain();
        chain.reject_next("eth_requestAccounts", 1);

        let err = chain.dispatch("eth_requestAccounts", &json!([])).unwrap_err();
        assert_eq!(err.code, 4001);
        assert!(chain.dispatch("eth_requestAccounts", &json!([])).is_ok());
    }

    #[test]
    fn test_unknown_chain_needs_add() {
        let mut chain = MockChain::new(vec![alice()], MAINNET_CHAIN_ID);

        let err = chain
            .dispatch("wallet_switchEthereumChain", &json!([{ "chainId": "0x66eee" }]))
            .unwrap_err();
        assert_eq!(err.code, 4902);

        chain
            .dispatch(
                "wallet_addEthereumChain",
                &json!([{
                    "chainId": "0x66eee",
                    "chainName": "Arbitrum Sepolia",
                    "rpcUrls": ["https://sepolia-rollup.arbitrum.io/rpc"]
                }]),
            )
            .unwrap();
        assert_eq!(
            chain.dispatch("eth_chainId", &json!([])).unwrap(),
            json!("0x66eee")
        );
    }

    #[test]
    fn test_create_log_then_read_back() {
        let mut chain = on_contract_chain();
        chain.dispatch("eth_requestAccounts", &json!([])).unwrap();

        let hash = chain
            .dispatch("eth_sendTransaction", &create_log_tx(alice(), "hello", 42))
            .unwrap();
        let receipt = chain
            .dispatch("eth_getTransactionReceipt", &json!([hash]))
            .unwrap();
        assert_eq!(receipt["status"], "0x1");

        let data: Bytes = getAllLogsCall {}.abi_encode().into();
        let result = chain
            .dispatch("eth_call", &json!([{ "to": CONTRACT_ADDRESS, "data": data }, "latest"]))
            .unwrap();
        let raw: Bytes = serde_json::from_value(result).unwrap();
        let logs = getAllLogsCall::abi_decode_returns(&raw, true).unwrap()._0;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].author, alice());
        assert_eq!(logs[0].content, "hello");
        assert_eq!(logs[0].unlockTime, U256::from(42));
    }

    #[test]
    fn test_unauthorised_sender() {
        let mut chain = on_contract_chain();
        let err = chain
            .dispatch("eth_sendTransaction", &create_log_tx(alice(), "hello", 0))
            .unwrap_err();
        assert_eq!(err.code, 4100);
    }

    #[test]
    fn test_reverted_transaction_stores_nothing() {
        let mut chain = on_contract_chain();
        chain.dispatch("eth_requestAccounts", &json!([])).unwrap();
        chain.revert_next(1);

        let hash = chain
            .dispatch("eth_sendTransaction", &create_log_tx(alice(), "doomed", 0))
            .unwrap();
        let receipt = chain
            .dispatch("eth_getTransactionReceipt", &json!([hash]))
            .unwrap();
        assert_eq!(receipt["status"], "0x0");
        assert_eq!(chain.state().log_count, 0);
    }

    #[test]
    fn test_contract_absent_on_other_chain() {
        let mut chain = on_contract_chain();
        chain.set_chain(MAINNET_CHAIN_ID);
        let data: Bytes = getAllLogsCall {}.abi_encode().into();
        let result = chain
            .dispatch("eth_call", &json!([{ "to": CONTRACT_ADDRESS, "data": data }]))
            .unwrap();
        assert_eq!(result, json!("0x"));
    }

    #[test]
    fn test_quantity_helpers() {
        assert_eq!(to_quantity(421614), "0x66eee");
        assert_eq!(parse_quantity("0x66eee"), Some(421614));
        assert_eq!(parse_quantity("421614"), None);
    }
}
