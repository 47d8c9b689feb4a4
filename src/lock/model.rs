//! Records returned by lock queries.
//!
//! These are already decoded by the transport adapter: enum fields hold
//! typed values, strings are fixed-capacity `heapless` strings so the
//! records can be copied around without touching the heap.

use serde::{Deserialize, Serialize};

use super::{
    AdvertisingMode, BatteryType, ButtonPressAction, CompletionStatus, DoorSensorState, FobAction,
    LockAction, LockState, MotorSpeed, Trigger,
};

/// Maximum length of an authorization / log actor name on the lock.
pub const MAX_NAME_LEN: usize = 32;

/// Maximum length of a keypad entry name.
pub const MAX_KEYPAD_NAME_LEN: usize = 20;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Status snapshot ("key turner state") of the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTurnerState {
    pub lock_state: LockState,
    pub trigger: Trigger,
    pub battery_critical: bool,
    pub battery_charging: bool,
    /// Remaining battery, 0-100 %.
    pub battery_percent: u8,
    pub door_sensor_state: DoorSensorState,
    pub night_mode_active: bool,
    /// Incremented by the lock whenever its configuration changes.
    pub config_update_count: u8,
    pub last_lock_action: LockAction,
    pub last_lock_action_completion: CompletionStatus,
}

impl KeyTurnerState {
    /// Decode the packed battery byte: bit 0 critical, bit 1 charging,
    /// bits 2-7 the charge level in 2 % steps.
    pub fn decode_battery(raw: u8) -> (bool, bool, u8) {
        let critical = raw & 0b0000_0001 != 0;
        let charging = raw & 0b0000_0010 != 0;
        let percent = ((raw >> 2) * 2).min(100);
        (critical, charging, percent)
    }
}

impl Default for KeyTurnerState {
    fn default() -> Self {
        Self {
            lock_state: LockState::Undefined,
            trigger: Trigger::Undefined,
            battery_critical: false,
            battery_charging: false,
            battery_percent: 0,
            door_sensor_state: DoorSensorState::Unavailable,
            night_mode_active: false,
            config_update_count: 0,
            last_lock_action: LockAction::Undefined,
            last_lock_action_completion: CompletionStatus::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Basic lock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockSettings {
    pub name: heapless::String<MAX_NAME_LEN>,
    pub auto_unlatch: bool,
    pub pairing_enabled: bool,
    pub button_enabled: bool,
    pub led_enabled: bool,
    /// 0 (off) to 5.
    pub led_brightness: u8,
    pub single_lock: bool,
    pub has_fob: bool,
    pub fob_action_1: FobAction,
    pub fob_action_2: FobAction,
    pub fob_action_3: FobAction,
    pub has_keypad: bool,
    pub advertising_mode: Option<AdvertisingMode>,
    pub firmware_version: [u8; 3],
}

/// Advanced lock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedSettings {
    pub single_button_press_action: ButtonPressAction,
    pub double_button_press_action: ButtonPressAction,
    pub battery_type: BatteryType,
    pub detached_cylinder: bool,
    pub lock_n_go_timeout_secs: u8,
    pub auto_lock_enabled: bool,
    pub auto_lock_timeout_secs: u16,
    pub auto_unlock_disabled: bool,
    pub immediate_auto_lock_enabled: bool,
    pub auto_update_enabled: bool,
    pub night_mode_enabled: bool,
    pub night_mode_auto_lock_enabled: bool,
    pub night_mode_auto_unlock_disabled: bool,
    pub night_mode_immediate_lock_on_start: bool,
    pub motor_speed: MotorSpeed,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            single_button_press_action: ButtonPressAction::Intelligent,
            double_button_press_action: ButtonPressAction::LockNGo,
            battery_type: BatteryType::Alkali,
            detached_cylinder: false,
            lock_n_go_timeout_secs: 20,
            auto_lock_enabled: false,
            auto_lock_timeout_secs: 300,
            auto_unlock_disabled: false,
            immediate_auto_lock_enabled: false,
            auto_update_enabled: true,
            night_mode_enabled: false,
            night_mode_auto_lock_enabled: false,
            night_mode_auto_unlock_disabled: false,
            night_mode_immediate_lock_on_start: false,
            motor_speed: MotorSpeed::Standard,
        }
    }
}

// ---------------------------------------------------------------------------
// Authorizations and logs
// ---------------------------------------------------------------------------

/// One authorization (app, bridge, fob, keypad) known to the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEntry {
    pub auth_id: u32,
    pub name: heapless::String<MAX_NAME_LEN>,
    pub enabled: bool,
}

/// Wall-clock time stamp recorded by the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Log record exactly as retrieved from the lock's ring buffer.
///
/// `data` is interpreted according to `logging_type`; see
/// [`crate::eventlog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogEntry {
    /// Lock-assigned, monotonically increasing record index.
    pub index: u32,
    pub auth_id: u32,
    /// Actor name stored with the record; may be empty.
    pub name: heapless::String<MAX_NAME_LEN>,
    pub timestamp: LogTimestamp,
    pub logging_type: u8,
    pub data: [u8; 5],
}

// ---------------------------------------------------------------------------
// Keypad
// ---------------------------------------------------------------------------

/// Keypad code entry as listed by the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypadEntry {
    pub code_id: u16,
    pub name: heapless::String<MAX_KEYPAD_NAME_LEN>,
    pub enabled: bool,
    pub code: u32,
}
