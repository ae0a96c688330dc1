//! Records read back from the ChronoLog contract
//!
//! Raw `Log` tuples are mapped once into [`Record`]s and frozen into a
//! [`RecordList`] snapshot. Lock state is never stored: it is derived from
//! `unlock_at` and the caller's notion of "now" every time it is asked for.

use alloy_primitives::{Address, U256};
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::sync::Arc;

use crate::abi::Log;

/// Placeholder shown instead of the content of a locked Capsule
pub const LOCKED_PLACEHOLDER: &str = "[Locked content — unlocks later]";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Contract-assigned id; `None` when the contract reported zero
    pub id: Option<u64>,
    pub author: Address,
    pub content: String,
    /// Block timestamp at creation (unix seconds)
    pub created_at: Option<u64>,
    /// Unix seconds after which the content may be shown
    pub unlock_at: Option<u64>,
}

impl Record {
    /// Whether the record is still locked at `now`
    ///
    /// Records without an unlock time are never locked.
    pub fn is_locked(&self, now: i64) -> bool {
        match self.unlock_at {
            Some(unlock_at) => i128::from(unlock_at) > i128::from(now),
            None => false,
        }
    }

    /// "Capsule" while locked, "Moment" otherwise
    pub fn kind_label(&self, now: i64) -> &'static str {
        if self.is_locked(now) {
            "Capsule"
        } else {
            "Moment"
        }
    }

    /// Content as it may be displayed at `now`
    ///
    /// Locking is cosmetic: the contract hands out every record's content
    /// in full, this only decides what gets rendered.
    pub fn visible_content(&self, now: i64) -> &str {
        if self.is_locked(now) {
            LOCKED_PLACEHOLDER
        } else {
            &self.content
        }
    }

    pub fn view(&self, now: i64) -> RecordView {
        let locked = self.is_locked(now);
        RecordView {
            id: self.id,
            kind: self.kind_label(now),
            author: self.author,
            author_short: short_addr(&self.author.to_string()),
            content: self.visible_content(now).to_string(),
            created_at: self.created_at,
            created_at_display: format_timestamp(self.created_at),
            unlock_at: self.unlock_at,
            locked,
            lock_status: if locked {
                format!("Locked until {}", format_timestamp(self.unlock_at))
            } else {
                "Unlocked".to_string()
            },
        }
    }
}

impl From<Log> for Record {
    fn from(log: Log) -> Self {
        Self {
            id: nonzero(log.id),
            author: log.author,
            content: log.content,
            created_at: nonzero(log.timestamp),
            unlock_at: nonzero(log.unlockTime),
        }
    }
}

fn nonzero(value: U256) -> Option<u64> {
    if value.is_zero() {
        None
    } else {
        Some(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

/// Render-ready projection of a [`Record`] at a given instant
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub id: Option<u64>,
    pub kind: &'static str,
    pub author: Address,
    pub author_short: String,
    pub content: String,
    pub created_at: Option<u64>,
    pub created_at_display: String,
    pub unlock_at: Option<u64>,
    pub locked: bool,
    pub lock_status: String,
}

/// Immutable, id-descending snapshot of the contract's records
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordList {
    records: Arc<[Record]>,
}

impl Default for RecordList {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
        }
    }
}

impl RecordList {
    /// Map raw contract tuples and sort by id descending
    ///
    /// Missing ids sort as zero; the sort is stable so ties keep contract order.
    pub fn from_logs(logs: Vec<Log>) -> Self {
        let mut records: Vec<Record> = logs.into_iter().map(Record::from).collect();
        records.sort_by(|a, b| b.id.unwrap_or(0).cmp(&a.id.unwrap_or(0)));
        Self {
            records: records.into(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn views(&self, now: i64) -> Vec<RecordView> {
        self.records.iter().map(|r| r.view(now)).collect()
    }
}

/// `0x1234…abcd` form of an address or hash
pub fn short_addr(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 10 {
        return value.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Local date/time string for a unix timestamp, `-` when absent
///
/// Values above 1e12 are taken to already be milliseconds.
pub fn format_timestamp(ts: Option<u64>) -> String {
    let Some(ts) = ts.filter(|t| *t != 0) else {
        return "-".to_string();
    };
    let millis = if ts > 1_000_000_000_000 {
        ts
    } else {
        ts.saturating_mul(1000)
    };
    let Ok(millis) = i64::try_from(millis) else {
        return "-".to_string();
    };
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(id: u64, unlock: u64) -> Log {
        Log {
            id: U256::from(id),
            author: Address::repeat_byte(0xab),
            content: format!("entry {}", id),
            timestamp: U256::from(1_700_000_000u64),
            unlockTime: U256::from(unlock),
        }
    }

    #[test]
    fn test_sorted_by_id_descending() {
        let list = RecordList::from_logs(vec![log(1, 0), log(3, 0), log(2, 0)]);
        let ids: Vec<_> = list.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(3), Some(2), Some(1)]);
    }

    #[test]
    fn test_zero_fields_become_absent_and_sort_last() {
        let list = RecordList::from_logs(vec![log(0, 0), log(5, 10)]);
        assert_eq!(list.records()[0].id, Some(5));
        let zero = &list.records()[1];
        assert_eq!(zero.id, None);
        assert_eq!(zero.unlock_at, None);
        assert!(!zero.is_locked(0));
    }

    #[test]
    fn test_oversized_values_saturate() {
        let mut raw = log(1, 0);
        raw.unlockTime = U256::MAX;
        let record = Record::from(raw);
        assert_eq!(record.unlock_at, Some(u64::MAX));
        assert!(record.is_locked(i64::MAX));
    }

    #[test]
    fn test_lock_flips_with_time() {
        let record = Record::from(log(1, 1_000));
        assert!(record.is_locked(999));
        assert_eq!(record.visible_content(999), LOCKED_PLACEHOLDER);
        assert_eq!(record.kind_label(999), "Capsule");
        assert!(!record.is_locked(1_000));
        assert_eq!(record.visible_content(1_000), "entry 1");
        assert_eq!(record.kind_label(1_000), "Moment");
    }

    #[test]
    fn test_short_addr() {
        assert_eq!(
            short_addr("0x1A46b403A29c8cBDA564E1f4B9c6332b8873532f"),
            "0x1A46…532f"
        );
        assert_eq!(short_addr(""), "");
        assert_eq!(short_addr("0xabc"), "0xabc");
    }

    #[test]
    fn test_format_timestamp_absent() {
        assert_eq!(format_timestamp(None), "-");
        assert_eq!(format_timestamp(Some(0)), "-");
        assert_ne!(format_timestamp(Some(1_700_000_000)), "-");
        // seconds and milliseconds render the same instant
        assert_eq!(
            format_timestamp(Some(1_700_000_000)),
            format_timestamp(Some(1_700_000_000_000 + 1))
        );
    }
}
