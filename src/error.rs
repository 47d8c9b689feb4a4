//! Unified error types for the lock bridge firmware.
//!
//! Transport results collapse into [`CmdError`]; every other fallible
//! subsystem has its own small enum that converts into the top-level
//! [`Error`].  All variants are `Copy` so they can be logged and stored in
//! the service without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A BLE transaction with the lock failed.
    Command(CmdError),
    /// A keypad administration request was refused.
    Keypad(KeypadError),
    /// Settings persistence failed.
    Settings(SettingsError),
    /// A lock setting write was refused.
    SettingWrite(SettingWriteError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Keypad(e) => write!(f, "keypad: {e}"),
            Self::Settings(e) => write!(f, "settings: {e}"),
            Self::SettingWrite(e) => write!(f, "setting write: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport command errors
// ---------------------------------------------------------------------------

/// Failure half of the tri-state transport result.
///
/// `Ok(_)` is success; the lock library's remaining outcomes map onto
/// these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdError {
    /// The lock answered but refused or failed the command (raw code).
    Failed(u8),
    /// No BLE connection could be established in time.
    NotConnected,
    /// The radio stack reported a disconnect it cannot recover from.
    Fatal,
}

impl CmdError {
    /// `true` when the next tick may simply retry.
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, Self::Fatal)
    }
}

impl fmt::Display for CmdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(code) => write!(f, "lock returned error 0x{code:02x}"),
            Self::NotConnected => write!(f, "lock not connected"),
            Self::Fatal => write!(f, "fatal BLE disconnect"),
        }
    }
}

impl From<CmdError> for Error {
    fn from(e: CmdError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Keypad administration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadError {
    /// The bridge is not paired with a lock.
    NotPaired,
    /// The lock has no keypad paired.
    NoKeypad,
    /// The security PIN has not been confirmed by the lock.
    PinNotValid,
    /// Another transaction is still cooling down.
    Busy,
    /// Name must be 1-20 characters.
    InvalidName,
    /// Code must be 6 digits, no zero, not starting with "12".
    InvalidCode,
    /// Id is not among the entries last listed from the lock.
    UnknownId,
    /// The transport call itself failed.
    Command(CmdError),
}

impl fmt::Display for KeypadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPaired => write!(f, "not paired with lock"),
            Self::NoKeypad => write!(f, "no keypad paired"),
            Self::PinNotValid => write!(f, "security PIN not validated"),
            Self::Busy => write!(f, "transport busy, retry later"),
            Self::InvalidName => write!(f, "name must be 1-20 characters"),
            Self::InvalidCode => write!(f, "code must be 6 digits without 0, not starting with 12"),
            Self::UnknownId => write!(f, "unknown keypad entry id"),
            Self::Command(e) => write!(f, "{e}"),
        }
    }
}

impl From<CmdError> for KeypadError {
    fn from(e: CmdError) -> Self {
        Self::Command(e)
    }
}

impl From<KeypadError> for Error {
    fn from(e: KeypadError) -> Self {
        Self::Keypad(e)
    }
}

// ---------------------------------------------------------------------------
// Lock setting write errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingWriteError {
    NotPaired,
    /// Another transaction is still cooling down.
    Busy,
    /// Value outside what the lock accepts.
    OutOfRange,
    Command(CmdError),
}

impl fmt::Display for SettingWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPaired => write!(f, "not paired with lock"),
            Self::Busy => write!(f, "transport busy, retry later"),
            Self::OutOfRange => write!(f, "value out of range"),
            Self::Command(e) => write!(f, "{e}"),
        }
    }
}

impl From<CmdError> for SettingWriteError {
    fn from(e: CmdError) -> Self {
        Self::Command(e)
    }
}

impl From<SettingWriteError> for Error {
    fn from(e: SettingWriteError) -> Self {
        Self::SettingWrite(e)
    }
}

// ---------------------------------------------------------------------------
// Settings persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// No record stored yet (first boot).
    NotFound,
    /// Stored record failed to deserialize.
    Corrupted,
    /// PIN is outside 0..=999999.
    InvalidPin,
    /// Backend I/O failure.
    Io,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "settings not found"),
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::InvalidPin => write!(f, "PIN must be 0-999999"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<SettingsError> for Error {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Transport `Result` alias.
pub type CmdResult<T> = core::result::Result<T, CmdError>;
