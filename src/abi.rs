//! ChronoLog contract ABI
//!
//! Only the two functions the session controller touches are bound.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::error::ChronoLogError;

sol! {
    /// On-chain log entry as returned by `getAllLogs`
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

/// Calldata for `createLog(content, unlockTime)`
pub fn encode_create_log(content: &str, unlock_time: u64) -> Bytes {
    createLogCall {
        _content: content.to_string(),
        _unlockTime: U256::from(unlock_time),
    }
    .abi_encode()
    .into()
}

/// Calldata for `getAllLogs()`
pub fn encode_get_all_logs() -> Bytes {
    getAllLogsCall {}.abi_encode().into()
}

/// Decode the return data of `getAllLogs()`
pub fn decode_get_all_logs(data: &[u8]) -> Result<Vec<Log>, ChronoLogError> {
    getAllLogsCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(|e| ChronoLogError::InvalidResponse(format!("getAllLogs: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use alloy_sol_types::SolValue;

    #[test]
    fn test_selectors_match_contract() {
        assert_eq!(createLogCall::SIGNATURE, "createLog(string,uint256)");
        assert_eq!(getAllLogsCall::SIGNATURE, "getAllLogs()");
        assert_eq!(&encode_get_all_logs()[..], &getAllLogsCall::SELECTOR[..]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_get_all_logs(&[0xde, 0xad]).unwrap_err();
        assert!(matches!(err, ChronoLogError::InvalidResponse(_)));
    }

    #[test]
    fn test_decode_log_array() {
        let logs = vec![Log {
            id: U256::from(7u64),
            author: Address::repeat_byte(0x11),
            content: "hello".to_string(),
            timestamp: U256::from(1_700_000_000u64),
            unlockTime: U256::from(1_700_000_000u64),
        }];
        let encoded = (logs.clone(),).abi_encode_params();
        let decoded = decode_get_all_logs(&encoded).unwrap();
        assert_eq!(decoded, logs);
    }
}
