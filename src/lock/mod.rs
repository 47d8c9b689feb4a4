//! Lock domain model.
//!
//! Raw protocol codes as the lock reports them, the published state the
//! home-automation layer sees, and the records returned by status, config
//! and log queries.  The BLE library hands us raw bytes; everything past
//! the transport adapter works with these types.

pub mod model;
pub mod names;

use serde::{Deserialize, Serialize};

pub use model::{
    AdvancedSettings, AuthEntry, KeyTurnerState, KeypadEntry, LockSettings, RawLogEntry,
};
pub use names::Named;

// ---------------------------------------------------------------------------
// Lock state
// ---------------------------------------------------------------------------

/// Motor state as reported by the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LockState {
    Uncalibrated = 0x00,
    Locked = 0x01,
    Unlocking = 0x02,
    Unlocked = 0x03,
    Locking = 0x04,
    Unlatched = 0x05,
    UnlockedLockNGo = 0x06,
    Unlatching = 0x07,
    Calibration = 0xFC,
    BootRun = 0xFD,
    MotorBlocked = 0xFE,
    Undefined = 0xFF,
}

impl LockState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Uncalibrated,
            0x01 => Self::Locked,
            0x02 => Self::Unlocking,
            0x03 => Self::Unlocked,
            0x04 => Self::Locking,
            0x05 => Self::Unlatched,
            0x06 => Self::UnlockedLockNGo,
            0x07 => Self::Unlatching,
            0xFC => Self::Calibration,
            0xFD => Self::BootRun,
            0xFE => Self::MotorBlocked,
            _ => Self::Undefined,
        }
    }

    /// The motor is still moving; the final state is not known yet.
    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Locking | Self::Unlocking | Self::Unlatching)
    }

    /// Collapse into the state published to the home-automation layer.
    pub fn published(self) -> PublishedLockState {
        match self {
            Self::Locked => PublishedLockState::Locked,
            Self::Unlocked | Self::Unlatched => PublishedLockState::Unlocked,
            Self::MotorBlocked => PublishedLockState::Jammed,
            Self::Locking => PublishedLockState::Locking,
            Self::Unlocking | Self::Unlatching => PublishedLockState::Unlocking,
            _ => PublishedLockState::Unknown,
        }
    }
}

impl Named for LockState {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::Uncalibrated, "uncalibrated"),
        (Self::Locked, "locked"),
        (Self::Unlocking, "unlocking"),
        (Self::Unlocked, "unlocked"),
        (Self::Locking, "locking"),
        (Self::Unlatched, "unlatched"),
        (Self::UnlockedLockNGo, "unlockedLnga"),
        (Self::Unlatching, "unlatching"),
        (Self::Calibration, "calibration"),
        (Self::BootRun, "bootRun"),
        (Self::MotorBlocked, "motorBlocked"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

/// Lock state as exposed to the surrounding framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PublishedLockState {
    #[default]
    Unknown,
    Locked,
    Unlocked,
    Jammed,
    Locking,
    Unlocking,
}

impl Named for PublishedLockState {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::Unknown, "NONE"),
        (Self::Locked, "LOCKED"),
        (Self::Unlocked, "UNLOCKED"),
        (Self::Jammed, "JAMMED"),
        (Self::Locking, "LOCKING"),
        (Self::Unlocking, "UNLOCKING"),
    ];
    const UNKNOWN: Self = Self::Unknown;
}

// ---------------------------------------------------------------------------
// Lock actions
// ---------------------------------------------------------------------------

/// Physical action the lock can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LockAction {
    Unlock = 0x01,
    Lock = 0x02,
    Unlatch = 0x03,
    LockNGo = 0x04,
    LockNGoUnlatch = 0x05,
    FullLock = 0x06,
    Undefined = 0xFF,
}

impl LockAction {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x01 => Self::Unlock,
            0x02 => Self::Lock,
            0x03 => Self::Unlatch,
            0x04 => Self::LockNGo,
            0x05 => Self::LockNGoUnlatch,
            0x06 => Self::FullLock,
            _ => Self::Undefined,
        }
    }

    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// State published optimistically while the action is in flight.
    pub fn transitional_state(self) -> PublishedLockState {
        match self {
            Self::Lock | Self::FullLock => PublishedLockState::Locking,
            Self::Unlock | Self::Unlatch | Self::LockNGo | Self::LockNGoUnlatch => {
                PublishedLockState::Unlocking
            }
            Self::Undefined => PublishedLockState::Unknown,
        }
    }
}

impl Named for LockAction {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::Unlock, "Unlock"),
        (Self::Lock, "Lock"),
        (Self::Unlatch, "Unlatch"),
        (Self::LockNGo, "LockNgo"),
        (Self::LockNGoUnlatch, "LockNgoUnlatch"),
        (Self::FullLock, "FullLock"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

// ---------------------------------------------------------------------------
// Log metadata
// ---------------------------------------------------------------------------

/// What caused a lock action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Trigger {
    System = 0x00,
    Manual = 0x01,
    Button = 0x02,
    Automatic = 0x03,
    AutoLock = 0x06,
    Undefined = 0xFF,
}

impl Trigger {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::System,
            0x01 => Self::Manual,
            0x02 => Self::Button,
            0x03 => Self::Automatic,
            0x06 => Self::AutoLock,
            _ => Self::Undefined,
        }
    }
}

impl Named for Trigger {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::System, "system"),
        (Self::Manual, "manual"),
        (Self::Button, "button"),
        (Self::Automatic, "automatic"),
        (Self::AutoLock, "autoLock"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

/// Outcome of a lock action as recorded by the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompletionStatus {
    Success = 0x00,
    MotorBlocked = 0x01,
    Canceled = 0x02,
    TooRecent = 0x03,
    Busy = 0x04,
    LowMotorVoltage = 0x05,
    ClutchFailure = 0x06,
    MotorPowerFailure = 0x07,
    IncompleteFailure = 0x08,
    OtherError = 0xFE,
    Unknown = 0xFF,
}

impl CompletionStatus {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Success,
            0x01 => Self::MotorBlocked,
            0x02 => Self::Canceled,
            0x03 => Self::TooRecent,
            0x04 => Self::Busy,
            0x05 => Self::LowMotorVoltage,
            0x06 => Self::ClutchFailure,
            0x07 => Self::MotorPowerFailure,
            0x08 => Self::IncompleteFailure,
            0xFE => Self::OtherError,
            _ => Self::Unknown,
        }
    }
}

impl Named for CompletionStatus {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::Success, "success"),
        (Self::MotorBlocked, "motorBlocked"),
        (Self::Canceled, "canceled"),
        (Self::TooRecent, "tooRecent"),
        (Self::Busy, "busy"),
        (Self::LowMotorVoltage, "lowMotorVoltage"),
        (Self::ClutchFailure, "clutchFailure"),
        (Self::MotorPowerFailure, "motorPowerFailure"),
        (Self::IncompleteFailure, "incomplete"),
        (Self::OtherError, "otherError"),
    ];
    const UNKNOWN: Self = Self::Unknown;
    const UNKNOWN_NAME: &'static str = "unknown";
}

/// Category of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LoggingType {
    LoggingEnabled = 0x01,
    LockAction = 0x02,
    Calibration = 0x03,
    InitializationRun = 0x04,
    KeypadAction = 0x05,
    DoorSensor = 0x06,
    DoorSensorLoggingEnabled = 0x07,
    Undefined = 0xFF,
}

impl LoggingType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x01 => Self::LoggingEnabled,
            0x02 => Self::LockAction,
            0x03 => Self::Calibration,
            0x04 => Self::InitializationRun,
            0x05 => Self::KeypadAction,
            0x06 => Self::DoorSensor,
            0x07 => Self::DoorSensorLoggingEnabled,
            _ => Self::Undefined,
        }
    }
}

impl Named for LoggingType {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::LoggingEnabled, "LoggingEnabled"),
        (Self::LockAction, "LockAction"),
        (Self::Calibration, "Calibration"),
        (Self::InitializationRun, "InitializationRun"),
        (Self::KeypadAction, "KeypadAction"),
        (Self::DoorSensor, "DoorSensor"),
        (Self::DoorSensorLoggingEnabled, "DoorSensorLoggingEnabled"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

// ---------------------------------------------------------------------------
// Door sensor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DoorSensorState {
    #[default]
    Unavailable = 0x00,
    Deactivated = 0x01,
    DoorClosed = 0x02,
    DoorOpened = 0x03,
    DoorStateUnknown = 0x04,
    Calibrating = 0x05,
    Uncalibrated = 0x10,
    Removed = 0xF0,
    Undefined = 0xFF,
}

impl DoorSensorState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Unavailable,
            0x01 => Self::Deactivated,
            0x02 => Self::DoorClosed,
            0x03 => Self::DoorOpened,
            0x04 => Self::DoorStateUnknown,
            0x05 => Self::Calibrating,
            0x10 => Self::Uncalibrated,
            0xF0 => Self::Removed,
            _ => Self::Undefined,
        }
    }

    /// Binary-sensor view: anything but a confirmed closed door is "open".
    pub fn is_open(self) -> bool {
        self != Self::DoorClosed
    }
}

impl Named for DoorSensorState {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::Unavailable, "unavailable"),
        (Self::Deactivated, "deactivated"),
        (Self::DoorClosed, "closed"),
        (Self::DoorOpened, "opened"),
        (Self::DoorStateUnknown, "unknown"),
        (Self::Calibrating, "calibrating"),
        (Self::Uncalibrated, "uncalibrated"),
        (Self::Removed, "removed"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

// ---------------------------------------------------------------------------
// Configuration enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ButtonPressAction {
    #[default]
    NoAction = 0,
    Intelligent = 1,
    Unlock = 2,
    Lock = 3,
    Unlatch = 4,
    LockNGo = 5,
    ShowStatus = 6,
    Undefined = 0xFF,
}

impl ButtonPressAction {
    /// Unknown raw values read back from the lock fall back to `NoAction`,
    /// the lock's own default.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Intelligent,
            2 => Self::Unlock,
            3 => Self::Lock,
            4 => Self::Unlatch,
            5 => Self::LockNGo,
            6 => Self::ShowStatus,
            _ => Self::NoAction,
        }
    }
}

impl Named for ButtonPressAction {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::NoAction, "No action"),
        (Self::Intelligent, "Intelligent"),
        (Self::Unlock, "Unlock"),
        (Self::Lock, "Lock"),
        (Self::Unlatch, "Open door"),
        (Self::LockNGo, "Lock 'n' Go"),
        (Self::ShowStatus, "Show state"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

/// Action bound to a key-fob button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FobAction {
    #[default]
    NoAction = 0,
    Unlock = 1,
    Lock = 2,
    LockNGo = 3,
    Intelligent = 4,
    Undefined = 99,
}

impl FobAction {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::NoAction,
            1 => Self::Unlock,
            2 => Self::Lock,
            3 => Self::LockNGo,
            4 => Self::Intelligent,
            _ => Self::Undefined,
        }
    }
}

impl Named for FobAction {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::NoAction, "No action"),
        (Self::Unlock, "Unlock"),
        (Self::Lock, "Lock"),
        (Self::LockNGo, "Lock 'n' Go"),
        (Self::Intelligent, "Intelligent"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BatteryType {
    Alkali = 0x00,
    Accumulators = 0x01,
    Lithium = 0x02,
    Undefined = 0xFF,
}

impl BatteryType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Alkali,
            0x01 => Self::Accumulators,
            0x02 => Self::Lithium,
            _ => Self::Undefined,
        }
    }
}

impl Named for BatteryType {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::Alkali, "Alkali"),
        (Self::Accumulators, "Accumulators"),
        (Self::Lithium, "Lithium"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotorSpeed {
    #[default]
    Standard = 0x00,
    Insane = 0x01,
    Gentle = 0x02,
    Undefined = 0xFF,
}

impl MotorSpeed {
    /// Standard is the lock's documented default for unknown raw values.
    /// Name lookups never fall back to it.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x01 => Self::Insane,
            0x02 => Self::Gentle,
            _ => Self::Standard,
        }
    }
}

impl Named for MotorSpeed {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::Standard, "Standard"),
        (Self::Insane, "Insane"),
        (Self::Gentle, "Gentle"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AdvertisingMode {
    Automatic = 0x00,
    Normal = 0x01,
    Slow = 0x02,
    Slowest = 0x03,
    Undefined = 0xFF,
}

impl AdvertisingMode {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Automatic,
            0x01 => Self::Normal,
            0x02 => Self::Slow,
            0x03 => Self::Slowest,
            _ => Self::Undefined,
        }
    }
}

impl Named for AdvertisingMode {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::Automatic, "Automatic"),
        (Self::Normal, "Normal"),
        (Self::Slow, "Slow"),
        (Self::Slowest, "Slowest"),
    ];
    const UNKNOWN: Self = Self::Undefined;
}

// ---------------------------------------------------------------------------
// Security PIN state
// ---------------------------------------------------------------------------

/// Whether the configured security PIN is known to be accepted by the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PinState {
    #[default]
    NotSet = 0,
    Set = 1,
    Valid = 2,
    Invalid = 3,
}

impl Named for PinState {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Self::NotSet, "Not set"),
        (Self::Set, "Validation pending"),
        (Self::Valid, "Valid"),
        (Self::Invalid, "Invalid"),
    ];
    const UNKNOWN: Self = Self::NotSet;
    const UNKNOWN_NAME: &'static str = "Unknown";
}
