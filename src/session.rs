//! Session established by the handshake.
//!
//! A session is immutable except for its heartbeat clock, which only
//! [`Session::needs_heartbeat`] advances.

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Heartbeats fire this long before the ping interval elapses, so they land
/// inside the server's timeout window.
pub const HEARTBEAT_MARGIN: Duration = Duration::from_secs(5);

/// Server-assigned identity and timing parameters.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    ping_interval: Duration,
    ping_timeout: Duration,
    upgrades: HashSet<String>,
    last_heartbeat_at: Instant,
}

impl Session {
    /// Create a session whose heartbeat clock starts now.
    pub fn new<I, S>(id: impl Into<String>, ping_interval: Duration, ping_timeout: Duration, upgrades: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            ping_interval,
            ping_timeout,
            upgrades: upgrades.into_iter().map(Into::into).collect(),
            last_heartbeat_at: Instant::now(),
        }
    }

    /// Restart the heartbeat clock at `at`.
    pub fn with_heartbeat_at(mut self, at: Instant) -> Self {
        self.last_heartbeat_at = at;
        self
    }

    /// Session id (`sid`).
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Interval between heartbeats. Zero disables heartbeating.
    #[inline]
    pub fn ping_interval(&self) -> Duration {
        self.ping_interval
    }

    /// Time the server waits for a heartbeat before dropping the session.
    #[inline]
    pub fn ping_timeout(&self) -> Duration {
        self.ping_timeout
    }

    /// Transports the server allows upgrading to.
    #[inline]
    pub fn upgrades(&self) -> &HashSet<String> {
        &self.upgrades
    }

    /// Whether the server advertises `transport` as an upgrade.
    pub fn supports(&self, transport: &str) -> bool {
        self.upgrades.contains(transport)
    }

    /// When the last heartbeat was recorded.
    #[inline]
    pub fn last_heartbeat_at(&self) -> Instant {
        self.last_heartbeat_at
    }

    /// Check whether a heartbeat is due at `now`, and if so record it.
    ///
    /// Returns true at most once per interval: a true result moves the
    /// heartbeat clock to `now`.
    pub fn needs_heartbeat(&mut self, now: Instant) -> bool {
        if self.ping_interval.is_zero() {
            return false;
        }

        let due = self.last_heartbeat_at + self.ping_interval.saturating_sub(HEARTBEAT_MARGIN);
        if now > due {
            self.last_heartbeat_at = now;
            return true;
        }

        false
    }
}
