//! BLE lock transport adapter.
//!
//! Implements [`LockTransport`] on top of the lock's BLE client library
//! (a C component linked into the ESP-IDF image).  The library owns
//! the GATT connection, encryption and retries; every call here is one
//! blocking request/response exchange.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspLockTransport`] binds the library
//!   through `extern "C"`.
//! - **all targets**: the C record layouts and their decoding, so the
//!   conversions are tested on the host.
//!
//! ## Result codes
//!
//! | Return | Meaning                          | Mapped to               |
//! |--------|----------------------------------|-------------------------|
//! | `0`    | success                          | `Ok`                    |
//! | `> 0`  | lock returned error code         | `CmdError::Failed(code)`|
//! | `-1`   | no connection to the lock        | `CmdError::NotConnected`|
//! | `< -1` | radio stack unrecoverable        | `CmdError::Fatal`       |

use core::ffi::c_char;

use crate::error::{CmdError, CmdResult};
use crate::lock::model::{LogTimestamp, MAX_KEYPAD_NAME_LEN, MAX_NAME_LEN};
use crate::lock::{
    AdvancedSettings, AdvertisingMode, AuthEntry, BatteryType, ButtonPressAction, CompletionStatus,
    DoorSensorState, FobAction, KeyTurnerState, KeypadEntry, LockAction, LockSettings, LockState,
    MotorSpeed, RawLogEntry, Trigger,
};
use crate::notify::TransportEvent;
use crate::settings::SettingChange;

// ───────────────────────────────────────────────────────────────
// Result and event codes
// ───────────────────────────────────────────────────────────────

const RESULT_NOT_CONNECTED: i32 = -1;

/// Translate a library return value.
pub fn check(ret: i32) -> CmdResult<()> {
    match ret {
        0 => Ok(()),
        RESULT_NOT_CONNECTED => Err(CmdError::NotConnected),
        r if r < 0 => Err(CmdError::Fatal),
        r => Err(CmdError::Failed(r.min(i32::from(u8::MAX)) as u8)),
    }
}

const EVENT_STATUS_UPDATED: u8 = 1;
const EVENT_BAD_PIN: u8 = 2;
const EVENT_FATAL: u8 = 3;

/// Decode the event code passed to the library's notify handler.
pub fn decode_event(code: u8) -> Option<TransportEvent> {
    match code {
        EVENT_STATUS_UPDATED => Some(TransportEvent::KeyTurnerStatusUpdated),
        EVENT_BAD_PIN => Some(TransportEvent::BadPin),
        EVENT_FATAL => Some(TransportEvent::FatalDisconnect),
        _ => None,
    }
}

/// `(setting id, value)` as understood by the library's setter.
pub fn setting_code(change: &SettingChange) -> (u8, u8) {
    use SettingChange as S;
    match *change {
        S::PairingEnabled(v) => (0x01, u8::from(v)),
        S::ButtonEnabled(v) => (0x02, u8::from(v)),
        S::LedEnabled(v) => (0x03, u8::from(v)),
        S::LedBrightness(v) => (0x04, v),
        S::AutoUnlatch(v) => (0x05, u8::from(v)),
        S::SingleLock(v) => (0x06, u8::from(v)),
        S::FobAction { button, action } => (0x06u8.wrapping_add(button), action as u8),
        S::AdvertisingMode(m) => (0x0A, m as u8),
        S::SingleButtonPressAction(a) => (0x20, a as u8),
        S::DoubleButtonPressAction(a) => (0x21, a as u8),
        S::BatteryType(t) => (0x22, t as u8),
        S::DetachedCylinder(v) => (0x23, u8::from(v)),
        S::AutoLockEnabled(v) => (0x24, u8::from(v)),
        S::AutoUnlockDisabled(v) => (0x25, u8::from(v)),
        S::ImmediateAutoLock(v) => (0x26, u8::from(v)),
        S::AutoUpdate(v) => (0x27, u8::from(v)),
        S::NightMode(v) => (0x28, u8::from(v)),
        S::NightModeAutoLock(v) => (0x29, u8::from(v)),
        S::NightModeAutoUnlockDisabled(v) => (0x2A, u8::from(v)),
        S::NightModeImmediateLockOnStart(v) => (0x2B, u8::from(v)),
        S::MotorSpeed(s) => (0x2C, s as u8),
    }
}

// ───────────────────────────────────────────────────────────────
// C strings
// ───────────────────────────────────────────────────────────────

/// Read a NUL-terminated name, dropping whatever does not fit or is not
/// valid UTF-8.
pub fn name_from_c<const N: usize>(raw: &[c_char]) -> heapless::String<N> {
    let bytes: Vec<u8> = raw.iter().map(|c| *c as u8).take_while(|b| *b != 0).collect();
    let text = String::from_utf8_lossy(&bytes);
    let mut out = heapless::String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// NUL-terminated copy of `s`, truncated to `N - 1` bytes.
pub fn name_to_c<const N: usize>(s: &str) -> [c_char; N] {
    let mut buf = [0 as c_char; N];
    for (dst, src) in buf.iter_mut().zip(s.bytes().take(N - 1)) {
        *dst = src as c_char;
    }
    buf
}

// ───────────────────────────────────────────────────────────────
// C record layouts
// ───────────────────────────────────────────────────────────────

pub mod raw {
    use core::ffi::c_char;

    use crate::lock::model::{MAX_KEYPAD_NAME_LEN, MAX_NAME_LEN};

    #[repr(C)]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Status {
        pub lock_state: u8,
        pub trigger: u8,
        /// Packed: bit 0 critical, bit 1 charging, bits 2-7 level / 2.
        pub battery: u8,
        pub door_sensor_state: u8,
        pub night_mode_active: u8,
        pub config_update_count: u8,
        pub last_lock_action: u8,
        pub last_lock_action_completion: u8,
    }

    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    pub struct Config {
        pub name: [c_char; MAX_NAME_LEN + 1],
        pub auto_unlatch: u8,
        pub pairing_enabled: u8,
        pub button_enabled: u8,
        pub led_enabled: u8,
        pub led_brightness: u8,
        pub single_lock: u8,
        pub has_fob: u8,
        pub fob_action: [u8; 3],
        pub has_keypad: u8,
        /// `0xFF` when the lock firmware does not report it.
        pub advertising_mode: u8,
        pub firmware_version: [u8; 3],
    }

    #[repr(C)]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Advanced {
        pub single_button_press_action: u8,
        pub double_button_press_action: u8,
        pub battery_type: u8,
        pub detached_cylinder: u8,
        pub lock_n_go_timeout_secs: u8,
        pub auto_lock_enabled: u8,
        pub auto_lock_timeout_secs: u16,
        pub auto_unlock_disabled: u8,
        pub immediate_auto_lock_enabled: u8,
        pub auto_update_enabled: u8,
        pub night_mode_enabled: u8,
        pub night_mode_auto_lock_enabled: u8,
        pub night_mode_auto_unlock_disabled: u8,
        pub night_mode_immediate_lock_on_start: u8,
        pub motor_speed: u8,
    }

    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    pub struct Auth {
        pub auth_id: u32,
        pub name: [c_char; MAX_NAME_LEN + 1],
        pub enabled: u8,
    }

    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    pub struct Log {
        pub index: u32,
        pub auth_id: u32,
        pub name: [c_char; MAX_NAME_LEN + 1],
        pub year: u16,
        pub month: u8,
        pub day: u8,
        pub hour: u8,
        pub minute: u8,
        pub second: u8,
        pub logging_type: u8,
        pub data: [u8; 5],
    }

    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    pub struct Keypad {
        pub code_id: u16,
        pub name: [c_char; MAX_KEYPAD_NAME_LEN + 1],
        pub enabled: u8,
        pub code: u32,
    }
}

// ── Decoding ──────────────────────────────────────────────────

impl From<&raw::Status> for KeyTurnerState {
    fn from(r: &raw::Status) -> Self {
        let (battery_critical, battery_charging, battery_percent) =
            KeyTurnerState::decode_battery(r.battery);
        Self {
            lock_state: LockState::from_raw(r.lock_state),
            trigger: Trigger::from_raw(r.trigger),
            battery_critical,
            battery_charging,
            battery_percent,
            door_sensor_state: DoorSensorState::from_raw(r.door_sensor_state),
            night_mode_active: r.night_mode_active != 0,
            config_update_count: r.config_update_count,
            last_lock_action: LockAction::from_raw(r.last_lock_action),
            last_lock_action_completion: CompletionStatus::from_raw(r.last_lock_action_completion),
        }
    }
}

impl From<&raw::Config> for LockSettings {
    fn from(r: &raw::Config) -> Self {
        Self {
            name: name_from_c::<MAX_NAME_LEN>(&r.name),
            auto_unlatch: r.auto_unlatch != 0,
            pairing_enabled: r.pairing_enabled != 0,
            button_enabled: r.button_enabled != 0,
            led_enabled: r.led_enabled != 0,
            led_brightness: r.led_brightness,
            single_lock: r.single_lock != 0,
            has_fob: r.has_fob != 0,
            fob_action_1: FobAction::from_raw(r.fob_action[0]),
            fob_action_2: FobAction::from_raw(r.fob_action[1]),
            fob_action_3: FobAction::from_raw(r.fob_action[2]),
            has_keypad: r.has_keypad != 0,
            advertising_mode: (r.advertising_mode != 0xFF)
                .then(|| AdvertisingMode::from_raw(r.advertising_mode)),
            firmware_version: r.firmware_version,
        }
    }
}

impl From<&raw::Advanced> for AdvancedSettings {
    fn from(r: &raw::Advanced) -> Self {
        Self {
            single_button_press_action: ButtonPressAction::from_raw(r.single_button_press_action),
            double_button_press_action: ButtonPressAction::from_raw(r.double_button_press_action),
            battery_type: BatteryType::from_raw(r.battery_type),
            detached_cylinder: r.detached_cylinder != 0,
            lock_n_go_timeout_secs: r.lock_n_go_timeout_secs,
            auto_lock_enabled: r.auto_lock_enabled != 0,
            auto_lock_timeout_secs: r.auto_lock_timeout_secs,
            auto_unlock_disabled: r.auto_unlock_disabled != 0,
            immediate_auto_lock_enabled: r.immediate_auto_lock_enabled != 0,
            auto_update_enabled: r.auto_update_enabled != 0,
            night_mode_enabled: r.night_mode_enabled != 0,
            night_mode_auto_lock_enabled: r.night_mode_auto_lock_enabled != 0,
            night_mode_auto_unlock_disabled: r.night_mode_auto_unlock_disabled != 0,
            night_mode_immediate_lock_on_start: r.night_mode_immediate_lock_on_start != 0,
            motor_speed: MotorSpeed::from_raw(r.motor_speed),
        }
    }
}

impl From<&raw::Auth> for AuthEntry {
    fn from(r: &raw::Auth) -> Self {
        Self {
            auth_id: r.auth_id,
            name: name_from_c::<MAX_NAME_LEN>(&r.name),
            enabled: r.enabled != 0,
        }
    }
}

impl From<&raw::Log> for RawLogEntry {
    fn from(r: &raw::Log) -> Self {
        Self {
            index: r.index,
            auth_id: r.auth_id,
            name: name_from_c::<MAX_NAME_LEN>(&r.name),
            timestamp: LogTimestamp {
                year: r.year,
                month: r.month,
                day: r.day,
                hour: r.hour,
                minute: r.minute,
                second: r.second,
            },
            logging_type: r.logging_type,
            data: r.data,
        }
    }
}

impl From<&raw::Keypad> for KeypadEntry {
    fn from(r: &raw::Keypad) -> Self {
        Self {
            code_id: r.code_id,
            name: name_from_c::<MAX_KEYPAD_NAME_LEN>(&r.name),
            enabled: r.enabled != 0,
            code: r.code,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF binding
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod ffi {
    use super::raw;
    use core::ffi::c_char;

    unsafe extern "C" {
        pub fn lb_init(on_event: extern "C" fn(u8)) -> i32;
        pub fn lb_is_paired() -> bool;
        pub fn lb_pair(device_name: *const c_char, device_id: u32) -> i32;
        pub fn lb_unpair();
        pub fn lb_set_security_pin(pin: u32);
        pub fn lb_request_status(out: *mut raw::Status) -> i32;
        pub fn lb_request_config(out: *mut raw::Config) -> i32;
        pub fn lb_request_advanced_config(out: *mut raw::Advanced) -> i32;
        pub fn lb_retrieve_auth_entries(count: u8, out: *mut raw::Auth, cap: usize, len: *mut usize) -> i32;
        pub fn lb_retrieve_log_entries(count: u8, out: *mut raw::Log, cap: usize, len: *mut usize) -> i32;
        pub fn lb_execute_action(action: u8) -> i32;
        pub fn lb_verify_pin() -> i32;
        pub fn lb_retrieve_keypad_entries(out: *mut raw::Keypad, cap: usize, len: *mut usize) -> i32;
        pub fn lb_add_keypad_entry(name: *const c_char, code: u32) -> i32;
        pub fn lb_update_keypad_entry(code_id: u16, name: *const c_char, code: u32, enabled: bool) -> i32;
        pub fn lb_delete_keypad_entry(code_id: u16) -> i32;
        pub fn lb_apply_setting(id: u8, value: u8) -> i32;
    }
}

#[cfg(target_os = "espidf")]
pub use device::EspLockTransport;

#[cfg(target_os = "espidf")]
mod device {
    use std::sync::OnceLock;

    use log::{info, warn};

    use super::{check, decode_event, ffi, name_to_c, raw, setting_code};
    use crate::app::ports::LockTransport;
    use crate::error::{CmdError, CmdResult};
    use crate::eventlog::{MAX_AUTH_ENTRIES, MAX_FETCH};
    use crate::lock::model::{MAX_KEYPAD_NAME_LEN, MAX_NAME_LEN};
    use crate::lock::{
        AdvancedSettings, AuthEntry, KeyTurnerState, KeypadEntry, LockAction, LockSettings,
        RawLogEntry,
    };
    use crate::notify::Notifications;
    use crate::settings::SettingChange;

    /// Upper bound on keypad codes returned by one listing.
    const MAX_KEYPAD_ENTRIES: usize = 100;

    static NOTIFY_TARGET: OnceLock<&'static Notifications> = OnceLock::new();

    /// Runs on the radio task.
    extern "C" fn on_lock_event(code: u8) {
        if let (Some(target), Some(event)) = (NOTIFY_TARGET.get(), decode_event(code)) {
            target.notify(event);
        }
    }

    /// Fill a caller-allocated array through one library call.
    fn fetch_list<R: Copy, T>(
        cap: usize,
        empty: R,
        call: impl FnOnce(*mut R, usize, *mut usize) -> i32,
        convert: impl Fn(&R) -> T,
    ) -> CmdResult<Vec<T>> {
        let mut buf = vec![empty; cap];
        let mut len = 0usize;
        check(call(buf.as_mut_ptr(), cap, &mut len))?;
        Ok(buf[..len.min(cap)].iter().map(convert).collect())
    }

    pub struct EspLockTransport {
        _private: (),
    }

    impl EspLockTransport {
        /// Start the library and route its notifications into `notifications`.
        pub fn new(notifications: &'static Notifications) -> anyhow::Result<Self> {
            if NOTIFY_TARGET.set(notifications).is_err() {
                anyhow::bail!("lock transport already initialised");
            }
            // SAFETY: called once; the handler is a plain function with static lifetime.
            let ret = unsafe { ffi::lb_init(on_lock_event) };
            if let Err(e) = check(ret) {
                anyhow::bail!("lock library init failed: {}", e);
            }
            info!("EspLockTransport: lock library initialised");
            Ok(Self { _private: () })
        }
    }

    impl LockTransport for EspLockTransport {
        fn is_paired(&self) -> bool {
            unsafe { ffi::lb_is_paired() }
        }

        fn pair(&mut self, device_name: &str, device_id: u32) -> CmdResult<()> {
            let name = name_to_c::<{ MAX_NAME_LEN + 1 }>(device_name);
            check(unsafe { ffi::lb_pair(name.as_ptr(), device_id) })
        }

        fn unpair(&mut self) {
            unsafe { ffi::lb_unpair() };
        }

        fn set_security_pin(&mut self, pin: u32) {
            unsafe { ffi::lb_set_security_pin(pin) };
        }

        fn request_status(&mut self) -> CmdResult<KeyTurnerState> {
            let mut out = raw::Status::default();
            check(unsafe { ffi::lb_request_status(&mut out) })?;
            Ok(KeyTurnerState::from(&out))
        }

        fn request_config(&mut self) -> CmdResult<LockSettings> {
            let mut out = raw::Config {
                name: [0; MAX_NAME_LEN + 1],
                auto_unlatch: 0,
                pairing_enabled: 0,
                button_enabled: 0,
                led_enabled: 0,
                led_brightness: 0,
                single_lock: 0,
                has_fob: 0,
                fob_action: [0; 3],
                has_keypad: 0,
                advertising_mode: 0xFF,
                firmware_version: [0; 3],
            };
            check(unsafe { ffi::lb_request_config(&mut out) })?;
            Ok(LockSettings::from(&out))
        }

        fn request_advanced_config(&mut self) -> CmdResult<AdvancedSettings> {
            let mut out = raw::Advanced::default();
            check(unsafe { ffi::lb_request_advanced_config(&mut out) })?;
            Ok(AdvancedSettings::from(&out))
        }

        fn retrieve_auth_entries(&mut self, count: u8) -> CmdResult<Vec<AuthEntry>> {
            let empty = raw::Auth {
                auth_id: 0,
                name: [0; MAX_NAME_LEN + 1],
                enabled: 0,
            };
            fetch_list(
                MAX_AUTH_ENTRIES,
                empty,
                |out, cap, len| unsafe { ffi::lb_retrieve_auth_entries(count, out, cap, len) },
                AuthEntry::from,
            )
        }

        fn retrieve_log_entries(&mut self, count: u8) -> CmdResult<Vec<RawLogEntry>> {
            let empty = raw::Log {
                index: 0,
                auth_id: 0,
                name: [0; MAX_NAME_LEN + 1],
                year: 0,
                month: 0,
                day: 0,
                hour: 0,
                minute: 0,
                second: 0,
                logging_type: 0,
                data: [0; 5],
            };
            fetch_list(
                usize::from(MAX_FETCH),
                empty,
                |out, cap, len| unsafe { ffi::lb_retrieve_log_entries(count, out, cap, len) },
                RawLogEntry::from,
            )
        }

        fn execute_action(&mut self, action: LockAction) -> CmdResult<()> {
            check(unsafe { ffi::lb_execute_action(action.raw()) })
        }

        fn verify_pin(&mut self) -> CmdResult<()> {
            check(unsafe { ffi::lb_verify_pin() })
        }

        fn retrieve_keypad_entries(&mut self) -> CmdResult<Vec<KeypadEntry>> {
            let empty = raw::Keypad {
                code_id: 0,
                name: [0; MAX_KEYPAD_NAME_LEN + 1],
                enabled: 0,
                code: 0,
            };
            fetch_list(
                MAX_KEYPAD_ENTRIES,
                empty,
                |out, cap, len| unsafe { ffi::lb_retrieve_keypad_entries(out, cap, len) },
                KeypadEntry::from,
            )
        }

        fn add_keypad_entry(&mut self, name: &str, code: u32) -> CmdResult<()> {
            let name = name_to_c::<{ MAX_KEYPAD_NAME_LEN + 1 }>(name);
            check(unsafe { ffi::lb_add_keypad_entry(name.as_ptr(), code) })
        }

        fn update_keypad_entry(&mut self, entry: &KeypadEntry) -> CmdResult<()> {
            let name = name_to_c::<{ MAX_KEYPAD_NAME_LEN + 1 }>(&entry.name);
            check(unsafe {
                ffi::lb_update_keypad_entry(entry.code_id, name.as_ptr(), entry.code, entry.enabled)
            })
        }

        fn delete_keypad_entry(&mut self, code_id: u16) -> CmdResult<()> {
            check(unsafe { ffi::lb_delete_keypad_entry(code_id) })
        }

        fn apply_setting(&mut self, change: &SettingChange) -> CmdResult<()> {
            let (id, value) = setting_code(change);
            let result = check(unsafe { ffi::lb_apply_setting(id, value) });
            if let Err(CmdError::Failed(code)) = result {
                warn!("Setting 0x{:02X} rejected by lock (0x{:02X})", id, code);
            }
            result
        }
    }
}
