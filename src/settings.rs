//! Typed lock setting writes.
//!
//! Each [`SettingChange`] is one BLE write.  A change is range-checked
//! before it reaches the transport; enum values that resolved to their
//! unknown sentinel (e.g. from an unrecognised select option) are
//! rejected instead of being written.

use crate::error::SettingWriteError;
use crate::lock::{AdvertisingMode, BatteryType, ButtonPressAction, FobAction, MotorSpeed};
use crate::scheduler::Refresh;

/// Highest LED brightness level the lock accepts.
pub const MAX_LED_BRIGHTNESS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    // ── Basic config ──────────────────────────────────────────
    PairingEnabled(bool),
    ButtonEnabled(bool),
    LedEnabled(bool),
    LedBrightness(u8),
    AutoUnlatch(bool),
    SingleLock(bool),
    /// Fob button 1-3.
    FobAction { button: u8, action: FobAction },
    AdvertisingMode(AdvertisingMode),

    // ── Advanced config ───────────────────────────────────────
    SingleButtonPressAction(ButtonPressAction),
    DoubleButtonPressAction(ButtonPressAction),
    BatteryType(BatteryType),
    DetachedCylinder(bool),
    AutoLockEnabled(bool),
    AutoUnlockDisabled(bool),
    ImmediateAutoLock(bool),
    AutoUpdate(bool),
    NightMode(bool),
    NightModeAutoLock(bool),
    NightModeAutoUnlockDisabled(bool),
    NightModeImmediateLockOnStart(bool),
    MotorSpeed(MotorSpeed),
}

impl SettingChange {
    pub fn validate(&self) -> Result<(), SettingWriteError> {
        let ok = match *self {
            Self::LedBrightness(level) => level <= MAX_LED_BRIGHTNESS,
            Self::FobAction { button, action } => {
                (1..=3).contains(&button) && action != FobAction::Undefined
            }
            Self::AdvertisingMode(mode) => mode != AdvertisingMode::Undefined,
            Self::BatteryType(t) => t != BatteryType::Undefined,
            Self::SingleButtonPressAction(a) | Self::DoubleButtonPressAction(a) => {
                a != ButtonPressAction::Undefined
            }
            Self::MotorSpeed(speed) => speed != MotorSpeed::Undefined,
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(SettingWriteError::OutOfRange)
        }
    }

    /// Which data category goes stale once the write succeeds.
    pub fn refreshes(&self) -> Refresh {
        match self {
            Self::PairingEnabled(_)
            | Self::ButtonEnabled(_)
            | Self::LedEnabled(_)
            | Self::LedBrightness(_)
            | Self::AutoUnlatch(_)
            | Self::SingleLock(_)
            | Self::FobAction { .. }
            | Self::AdvertisingMode(_) => Refresh::Config,
            _ => Refresh::AdvancedConfig,
        }
    }
}
