//! Pairing-mode window.
//!
//! `Idle → Active → Idle` on success or timeout.  While active and the
//! transport reports not-paired, the service spends its tick slot on one
//! pairing handshake.  Re-enabling while active restarts the deadline.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairingSession {
    active: bool,
    deadline_ms: u64,
}

impl PairingSession {
    pub const fn new() -> Self {
        Self {
            active: false,
            deadline_ms: 0,
        }
    }

    /// Open (or extend) the window.  Returns `true` on the Idle → Active
    /// transition.
    pub fn enable(&mut self, now_ms: u64, timeout_ms: u64) -> bool {
        let was_active = self.active;
        self.active = true;
        self.deadline_ms = now_ms + timeout_ms;
        !was_active
    }

    /// Close the window.  Returns `true` if it was open.
    pub fn disable(&mut self) -> bool {
        core::mem::replace(&mut self.active, false)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.active && now_ms > self.deadline_ms
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.active.then_some(self.deadline_ms)
    }
}
