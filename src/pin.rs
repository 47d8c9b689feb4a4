//! Security PIN settings and the validation retry loop.
//!
//! A PIN saved locally is not proof the lock accepts it.  After every PIN
//! change (and after pairing) the service runs a bounded verification
//! loop: one `verify_pin` call per due attempt, a short delay between
//! attempts, `Valid` on the first success, `Invalid` once the budget is
//! spent.

use serde::{Deserialize, Serialize};

use crate::config::MAX_SECURITY_PIN;
use crate::error::SettingsError;
use crate::lock::PinState;

// ───────────────────────────────────────────────────────────────
// Persisted record
// ───────────────────────────────────────────────────────────────

/// Fixed-size settings record, written on every PIN-state transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSettings {
    /// Runtime override; 0 means "use the configured PIN".
    pub security_pin: u32,
    pub pin_state: PinState,
}

impl PinSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.security_pin > MAX_SECURITY_PIN {
            return Err(SettingsError::InvalidPin);
        }
        Ok(())
    }

    /// The PIN actually handed to the lock library.
    pub fn effective_pin(&self, configured: u32) -> u32 {
        if self.security_pin != 0 {
            self.security_pin
        } else {
            configured
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Validation loop
// ───────────────────────────────────────────────────────────────

/// Outcome of one recorded verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinVerdict {
    Valid,
    /// Rejected, another attempt is scheduled.
    Retry,
    Invalid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinValidator {
    pending: bool,
    attempts_remaining: u8,
    next_attempt_at: u64,
}

impl PinValidator {
    pub const fn new() -> Self {
        Self {
            pending: false,
            attempts_remaining: 0,
            next_attempt_at: 0,
        }
    }

    /// Begin (or restart) validation with a fresh budget.  The first
    /// attempt is due immediately.
    pub fn start(&mut self, now_ms: u64, attempts: u8) {
        self.pending = attempts > 0;
        self.attempts_remaining = attempts;
        self.next_attempt_at = now_ms;
    }

    /// Stop without a verdict (PIN cleared, unpaired, bad-PIN notify).
    pub fn cancel(&mut self) {
        self.pending = false;
        self.attempts_remaining = 0;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.pending && now_ms >= self.next_attempt_at
    }

    pub fn attempts_remaining(&self) -> u8 {
        self.attempts_remaining
    }

    /// Record the result of one `verify_pin` call.
    pub fn record(&mut self, accepted: bool, now_ms: u64, retry_delay_ms: u32) -> PinVerdict {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if accepted {
            self.cancel();
            PinVerdict::Valid
        } else if self.attempts_remaining == 0 {
            self.cancel();
            PinVerdict::Invalid
        } else {
            self.next_attempt_at = now_ms + u64::from(retry_delay_ms);
            PinVerdict::Retry
        }
    }
}
