//! Transient user notices
//!
//! At most one informational and one error notice are live at a time, as
//! the session only ever shows the latest of each. Both expire together
//! after the configured TTL or when dismissed.

use serde::Serialize;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// Unix seconds at which the notice disappears
    pub expires_at: i64,
}

#[derive(Clone, Debug)]
pub struct NoticeBoard {
    ttl_secs: i64,
    notice: Option<Notice>,
    error: Option<Notice>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            notice: None,
            error: None,
        }
    }

    pub fn info(&mut self, message: impl Into<String>, now: i64) {
        self.notice = Some(self.make(NoticeKind::Info, message.into(), now));
        self.refresh_expiry(now);
    }

    pub fn success(&mut self, message: impl Into<String>, now: i64) {
        self.notice = Some(self.make(NoticeKind::Success, message.into(), now));
        self.refresh_expiry(now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: i64) {
        let message = message.into();
        log::warn!("{}", message);
        self.error = Some(self.make(NoticeKind::Error, message, now));
        self.refresh_expiry(now);
    }

    /// Drop both notices
    pub fn clear(&mut self) {
        self.notice = None;
        self.error = None;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Live notices at `now`, informational first
    pub fn current(&self, now: i64) -> Vec<Notice> {
        [&self.notice, &self.error]
            .into_iter()
            .flatten()
            .filter(|n| n.expires_at > now)
            .cloned()
            .collect()
    }

    fn make(&self, kind: NoticeKind, message: String, now: i64) -> Notice {
        Notice {
            kind,
            message,
            expires_at: now.saturating_add(self.ttl_secs),
        }
    }

    // Any new notice restarts the shared timer.
    fn refresh_expiry(&mut self, now: i64) {
        let expires_at = now.saturating_add(self.ttl_secs);
        for slot in [&mut self.notice, &mut self.error].into_iter().flatten() {
            slot.expires_at = expires_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_expire_together() {
        let mut board = NoticeBoard::new(Duration::from_secs(6));
        board.info("first", 100);
        board.error("boom", 103);
        assert_eq!(board.current(108).len(), 2);
        assert!(board.current(109).is_empty());
    }

    #[test]
    fn test_latest_notice_replaces_previous() {
        let mut board = NoticeBoard::new(Duration::from_secs(6));
        board.info("submitted", 0);
        board.success("confirmed", 1);
        let current = board.current(2);
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].kind, NoticeKind::Success);
        assert_eq!(current[0].message, "confirmed");
    }

    #[test]
    fn test_clear() {
        let mut board = NoticeBoard::new(Duration::from_secs(6));
        board.error("bad", 0);
        board.clear();
        assert!(board.current(1).is_empty());
    }
}
