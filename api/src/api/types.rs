use chronolog::{RecordView, TransactionReceipt, B256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateMomentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCapsuleRequest {
    pub content: String,
    /// `YYYY-MM-DDTHH:MM[:SS]` in server-local time, or RFC 3339
    #[serde(default)]
    pub unlock_at: String,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    /// Unix seconds the lock states were evaluated at
    pub now: i64,
    pub count: usize,
    pub logs: Vec<RecordView>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub transaction_hash: B256,
    pub status: String,
    pub block_number: Option<u64>,
    pub explorer_url: Option<String>,
}

impl SubmitResponse {
    pub fn from_receipt(receipt: TransactionReceipt, explorer_url: Option<String>) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            status: if receipt.is_success() {
                "confirmed".to_string()
            } else {
                "failed".to_string()
            },
            block_number: receipt.block_number,
            explorer_url,
        }
    }
}
