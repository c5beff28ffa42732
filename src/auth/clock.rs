// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local-vs-server clock offset.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use tracing::debug;

/// Estimated server clock minus local clock, in seconds.
///
/// Read by every HMAC signing operation and written after responses that
/// carry a `Date` header. Last write wins. Reads never block.
#[derive(Debug, Default)]
pub struct ClockSkew {
    offset_secs: AtomicI64,
}

impl ClockSkew {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset_secs(&self) -> i64 {
        self.offset_secs.load(Ordering::Acquire)
    }

    pub fn set_offset_secs(&self, offset: i64) {
        self.offset_secs.store(offset, Ordering::Release);
    }

    /// Record the offset implied by a server timestamp observed now.
    pub fn observe_server_time(&self, server_time: DateTime<Utc>) -> i64 {
        let offset = (server_time.timestamp_millis() - Utc::now().timestamp_millis()) / 1000;
        self.set_offset_secs(offset);
        offset
    }

    /// Update from an HTTP `Date` header (`Tue, 15 Nov 1994 08:12:31 GMT`).
    ///
    /// Unparsable values leave the offset unchanged and return `None`.
    pub fn observe_date_header(&self, value: &str) -> Option<i64> {
        match DateTime::parse_from_rfc2822(value.trim()) {
            Ok(date) => Some(self.observe_server_time(date.with_timezone(&Utc))),
            Err(e) => {
                debug!(error = %e, "Ignoring unparsable Date header");
                None
            }
        }
    }

    /// Server-adjusted Unix time in seconds.
    pub fn now_secs(&self) -> i64 {
        Utc::now().timestamp() + self.offset_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn starts_at_zero() {
        assert_eq!(ClockSkew::new().offset_secs(), 0);
    }

    #[test]
    fn server_ahead_gives_positive_offset() {
        let clock = ClockSkew::new();
        let offset = clock.observe_server_time(Utc::now() + Duration::seconds(300));
        assert!((299..=300).contains(&offset), "offset {offset}");
        let skewed = clock.now_secs() - Utc::now().timestamp();
        assert!((299..=300).contains(&skewed));
    }

    #[test]
    fn date_header_is_parsed() {
        let clock = ClockSkew::new();
        let header = (Utc::now() - Duration::seconds(120))
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        let offset = clock.observe_date_header(&header).unwrap();
        assert!((-121..=-119).contains(&offset), "offset {offset}");
    }

    #[test]
    fn bad_date_header_keeps_previous_offset() {
        let clock = ClockSkew::new();
        clock.set_offset_secs(42);
        assert!(clock.observe_date_header("yesterday-ish").is_none());
        assert_eq!(clock.offset_secs(), 42);
    }
}
