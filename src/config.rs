//! Bridge configuration parameters
//!
//! All tunable parameters for the lock orchestrator.  Values come from the
//! firmware build configuration; only the security PIN override and its
//! validation state are persisted at runtime (see [`crate::pin`]).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Highest PIN the lock accepts.
pub const MAX_SECURITY_PIN: u32 = 999_999;

/// Core bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    // --- Identity ---
    /// Name announced to the lock during pairing
    pub device_name: heapless::String<32>,
    /// Authorization id requested during pairing
    pub device_id: u32,

    // --- Timing ---
    /// Orchestrator tick interval (milliseconds)
    pub tick_interval_ms: u32,
    /// Cooldown after administrative fetches (milliseconds)
    pub cooldown_ms: u32,
    /// Cooldown after a successful physical action (milliseconds)
    pub cooldown_extended_ms: u32,
    /// Periodic status poll on top of lock notifications (seconds)
    pub status_poll_interval_secs: u16,

    // --- Retry budgets ---
    /// Attempts per lock action before giving up
    pub max_action_attempts: u8,
    /// Consecutive status failures tolerated before reporting disconnected
    pub max_tolerated_update_errors: u8,
    /// PIN verification attempts before declaring the PIN invalid
    pub pin_validation_attempts: u8,
    /// Delay between PIN verification attempts (milliseconds)
    pub pin_retry_delay_ms: u32,

    // --- Pairing ---
    /// How long pairing mode stays on without success (seconds)
    pub pairing_mode_timeout_secs: u16,

    // --- Security ---
    /// Security PIN from the build config; 0 = none.  A runtime override
    /// persisted in NVS takes precedence.
    pub security_pin: u32,

    // --- Event log ---
    /// Whether log records are fetched and forwarded at all
    pub event_log_enabled: bool,
    /// Most-recent log entries fetched per refresh
    pub event_log_fetch_count: u8,
    /// Authorization entries fetched per refresh
    pub auth_fetch_count: u8,
}

impl Default for LockConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        let _ = device_name.push_str("LockBridge");
        Self {
            // Identity
            device_name,
            device_id: 2_020_002,

            // Timing
            tick_interval_ms: 500,
            cooldown_ms: 1_000,
            cooldown_extended_ms: 3_000,
            status_poll_interval_secs: 60,

            // Retry budgets
            max_action_attempts: 5,
            max_tolerated_update_errors: 5,
            pin_validation_attempts: 4,
            pin_retry_delay_ms: 100,

            // Pairing
            pairing_mode_timeout_secs: 300, // 5 min

            // Security
            security_pin: 0,

            // Event log
            event_log_enabled: true,
            event_log_fetch_count: 3,
            auth_fetch_count: 10,
        }
    }
}

impl LockConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError::ValidationFailed("device_name must not be empty"));
        }
        if !(100..=5_000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "tick_interval_ms must be 100–5000",
            ));
        }
        if !(100..=10_000).contains(&self.cooldown_ms) {
            return Err(ConfigError::ValidationFailed("cooldown_ms must be 100–10000"));
        }
        if !(self.cooldown_ms..=30_000).contains(&self.cooldown_extended_ms) {
            return Err(ConfigError::ValidationFailed(
                "cooldown_extended_ms must be cooldown_ms–30000",
            ));
        }
        if !(10..=3_600).contains(&self.status_poll_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "status_poll_interval_secs must be 10–3600",
            ));
        }
        if !(1..=10).contains(&self.max_action_attempts) {
            return Err(ConfigError::ValidationFailed(
                "max_action_attempts must be 1–10",
            ));
        }
        if !(1..=10).contains(&self.pin_validation_attempts) {
            return Err(ConfigError::ValidationFailed(
                "pin_validation_attempts must be 1–10",
            ));
        }
        if !(10..=5_000).contains(&self.pin_retry_delay_ms) {
            return Err(ConfigError::ValidationFailed(
                "pin_retry_delay_ms must be 10–5000",
            ));
        }
        if !(1..=50).contains(&self.max_tolerated_update_errors) {
            return Err(ConfigError::ValidationFailed(
                "max_tolerated_update_errors must be 1–50",
            ));
        }
        if !(10..=3_600).contains(&self.pairing_mode_timeout_secs) {
            return Err(ConfigError::ValidationFailed(
                "pairing_mode_timeout_secs must be 10–3600",
            ));
        }
        if self.security_pin > MAX_SECURITY_PIN {
            return Err(ConfigError::ValidationFailed(
                "security_pin must be 0–999999",
            ));
        }
        if !(1..=crate::eventlog::MAX_FETCH).contains(&self.event_log_fetch_count) {
            return Err(ConfigError::ValidationFailed(
                "event_log_fetch_count must be 1–10",
            ));
        }
        if !(1..=crate::eventlog::MAX_AUTH_ENTRIES as u8).contains(&self.auth_fetch_count) {
            return Err(ConfigError::ValidationFailed(
                "auth_fetch_count must be 1–10",
            ));
        }
        Ok(())
    }

    pub fn status_poll_interval_ms(&self) -> u64 {
        u64::from(self.status_poll_interval_secs) * 1_000
    }

    /// Pairing-mode timeout in milliseconds.
    pub fn pairing_timeout_ms(&self) -> u64 {
        u64::from(self.pairing_mode_timeout_secs) * 1_000
    }
}
