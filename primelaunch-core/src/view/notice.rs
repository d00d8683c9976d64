//! Transient status notices.

use std::time::Duration;

use tokio::time::Instant;

/// Holds at most one notice that expires after a fixed lifetime.
#[derive(Clone, Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    current: Option<(String, Instant)>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::MINT_NOTICE_SECS))
    }
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    /// Replace the current notice.
    pub fn post(&mut self, message: impl Into<String>) {
        self.current = Some((message.into(), Instant::now() + self.ttl));
    }

    /// Message still on display, if any.
    pub fn active(&self) -> Option<&str> {
        match &self.current {
            Some((message, expires)) if Instant::now() < *expires => Some(message),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
