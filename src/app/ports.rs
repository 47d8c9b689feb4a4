//! Port traits: the hexagonal boundary between the orchestrator and the
//! outside world.
//!
//! ```text
//!   LockTransport ──▶ ┌─────────────┐ ──▶ EventSink
//!                     │ LockService │
//!   SettingsPort  ◀──▶└─────────────┘
//! ```
//!
//! Driven adapters (BLE library shim, NVS, log/observer sinks) implement
//! these traits.  The [`LockService`](super::service::LockService)
//! consumes them via generics, so the domain core never touches the radio
//! or flash directly.

use crate::error::{CmdResult, SettingsError};
use crate::lock::{AdvancedSettings, AuthEntry, KeyTurnerState, KeypadEntry, LockAction, LockSettings, RawLogEntry};
use crate::pin::PinSettings;
use crate::settings::SettingChange;

// ───────────────────────────────────────────────────────────────
// Lock transport (driven adapter: domain ↔ BLE lock library)
// ───────────────────────────────────────────────────────────────

/// One BLE transaction per call.  Implementations block until the lock
/// answers or the library gives up; the caller guarantees that no two
/// calls overlap.
pub trait LockTransport {
    /// Pairing credentials are present.  Not a transaction.
    fn is_paired(&self) -> bool;

    /// One pairing handshake attempt.
    fn pair(&mut self, device_name: &str, device_id: u32) -> CmdResult<()>;

    /// Forget the stored pairing credentials.
    fn unpair(&mut self);

    /// Hand the security PIN to the library for subsequent PIN-protected
    /// commands.  Not a transaction.
    fn set_security_pin(&mut self, pin: u32);

    fn request_status(&mut self) -> CmdResult<KeyTurnerState>;
    fn request_config(&mut self) -> CmdResult<LockSettings>;
    fn request_advanced_config(&mut self) -> CmdResult<AdvancedSettings>;

    /// Up to `count` authorization entries.
    fn retrieve_auth_entries(&mut self, count: u8) -> CmdResult<Vec<AuthEntry>>;

    /// The `count` most recent log records, in whatever order the lock
    /// returns them.
    fn retrieve_log_entries(&mut self, count: u8) -> CmdResult<Vec<RawLogEntry>>;

    fn execute_action(&mut self, action: LockAction) -> CmdResult<()>;

    /// Check the PIN previously passed to [`set_security_pin`](Self::set_security_pin).
    fn verify_pin(&mut self) -> CmdResult<()>;

    fn retrieve_keypad_entries(&mut self) -> CmdResult<Vec<KeypadEntry>>;
    fn add_keypad_entry(&mut self, name: &str, code: u32) -> CmdResult<()>;
    fn update_keypad_entry(&mut self, entry: &KeypadEntry) -> CmdResult<()>;
    fn delete_keypad_entry(&mut self, code_id: u16) -> CmdResult<()>;

    /// Write a single lock setting.
    fn apply_setting(&mut self, change: &SettingChange) -> CmdResult<()>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → UI / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`LockEvent`](super::events::LockEvent)s
/// through this port, synchronously, at the point the change happens.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::LockEvent);
}

/// Fan-out to two sinks (e.g. serial log plus registered observers).
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::LockEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

impl<E: EventSink + ?Sized> EventSink for &mut E {
    fn emit(&mut self, event: &super::events::LockEvent) {
        (**self).emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Settings port (driven adapter: domain ↔ persistent storage)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the PIN settings record.
///
/// Written on every PIN-state transition, read once at startup.
pub trait SettingsPort {
    /// Returns [`SettingsError::NotFound`] on first boot.
    fn load(&self) -> Result<PinSettings, SettingsError>;

    /// Validate and persist.  Rejects a PIN above 999999.
    fn save(&mut self, settings: &PinSettings) -> Result<(), SettingsError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`LockConfig::validate`](crate::config::LockConfig::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
