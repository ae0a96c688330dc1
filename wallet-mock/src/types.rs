/// JSON-RPC envelope and admin request/response types
///
/// The envelope follows JSON-RPC 2.0; error codes follow EIP-1193/EIP-1474
/// so clients see the same failures a browser wallet would report.
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// User declined the request in the wallet UI
pub const USER_REJECTED: i64 = 4001;

/// Account not authorised for this origin
pub const UNAUTHORIZED: i64 = 4100;

/// Chain not added to the wallet
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

pub const INVALID_PARAMS: i64 = -32602;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const EXECUTION_ERROR: i64 = -32000;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn user_rejected(message: &str) -> Self {
        Self::new(USER_REJECTED, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            UNAUTHORIZED,
            "The requested account and/or method has not been authorized by the user.",
        )
    }

    pub fn unrecognized_chain(chain_id_hex: &str) -> Self {
        Self::new(
            UNRECOGNIZED_CHAIN,
            format!(
                "Unrecognized chain ID \"{}\". Try adding the chain using wallet_addEthereumChain first.",
                chain_id_hex
            ),
        )
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {}", detail.into()))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method {} not supported", method))
    }

    /// Revert wrapped the way MetaMask does: generic message, reason in `data`
    pub fn execution_reverted(reason: &str) -> Self {
        Self {
            code: -32603,
            message: "Internal JSON-RPC error.".to_string(),
            data: Some(json!({ "code": EXECUTION_ERROR, "message": reason })),
        }
    }
}

// ============================================================================
// ADMIN ENDPOINTS (simulate what a user does inside the wallet)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetAccountsRequest {
    pub accounts: Vec<Address>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// JSON-RPC method whose next calls the "user" declines
    pub method: String,
    #[serde(default = "default_reject_count")]
    pub count: u32,
}

fn default_reject_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SetChainRequest {
    pub chain_id: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevertRequest {
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletStateResponse {
    pub accounts: Vec<Address>,
    pub authorized: bool,
    pub chain_id: u64,
    pub known_chains: Vec<u64>,
    pub contract: Address,
    pub log_count: usize,
    pub block_number: u64,
    pub last_transaction: Option<B256>,
}
