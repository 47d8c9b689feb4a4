//! Connection health with hysteresis.
//!
//! One dropped status poll must not flip the externally visible
//! "connected" signal; only more than `max_tolerated` consecutive failures
//! (or an exhausted action budget) do.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionMonitor {
    connected: bool,
    consecutive_errors: u8,
    max_tolerated: u8,
}

impl ConnectionMonitor {
    pub const fn new(max_tolerated: u8) -> Self {
        Self {
            connected: false,
            consecutive_errors: 0,
            max_tolerated,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn consecutive_errors(&self) -> u8 {
        self.consecutive_errors
    }

    /// A status fetch succeeded.  Returns `Some(true)` on the
    /// disconnected → connected edge.
    pub fn record_success(&mut self) -> Option<bool> {
        self.consecutive_errors = 0;
        self.set(true)
    }

    /// A status fetch failed.  Returns `Some(false)` on the
    /// connected → disconnected edge, and `true` in the second field once
    /// the threshold is exceeded (even if already disconnected).
    pub fn record_failure(&mut self) -> (Option<bool>, bool) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        if self.consecutive_errors > self.max_tolerated {
            (self.set(false), true)
        } else {
            (None, false)
        }
    }

    /// Declare the link lost immediately.
    pub fn mark_disconnected(&mut self) -> Option<bool> {
        self.set(false)
    }

    fn set(&mut self, connected: bool) -> Option<bool> {
        (core::mem::replace(&mut self.connected, connected) != connected).then_some(connected)
    }
}
