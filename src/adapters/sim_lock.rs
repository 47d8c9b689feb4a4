//! Simulated lock for host builds.
//!
//! A behavioural model of the lock behind [`LockTransport`]: pairing,
//! motor state, battery and door sensor, a security PIN, authorizations,
//! a growing log ring and keypad codes.  Every command completes
//! instantly.  Tests drive the "physical" side (button presses, door,
//! radio range) through the `press_*` / `set_*` helpers.

use log::debug;

use crate::app::ports::LockTransport;
use crate::error::{CmdError, CmdResult};
use crate::lock::model::{LogTimestamp, MAX_NAME_LEN};
use crate::lock::{
    AdvancedSettings, AuthEntry, CompletionStatus, DoorSensorState, KeyTurnerState, KeypadEntry,
    LockAction, LockSettings, LockState, LoggingType, RawLogEntry, Trigger,
};
use crate::settings::SettingChange;

/// Error code the lock returns for a wrong security PIN.
pub const ERROR_BAD_PIN: u8 = 0x21;
/// Error code for an unknown keypad id.
pub const ERROR_BAD_PARAMETER: u8 = 0x22;

/// Auth id the simulator assigns to the bridge on pairing.
pub const BRIDGE_AUTH_ID: u32 = 1;

/// Number of log records the simulated ring keeps.
const LOG_CAPACITY: usize = 64;

pub struct SimulatedLock {
    paired: bool,
    /// Lock is in its own pairing mode (button held).
    accepting_pairing: bool,
    reachable: bool,

    lock_pin: u32,
    client_pin: u32,

    state: KeyTurnerState,
    config: LockSettings,
    advanced: AdvancedSettings,

    auths: Vec<AuthEntry>,
    log: Vec<RawLogEntry>,
    next_index: u32,
    keypad: Vec<KeypadEntry>,
    next_code_id: u16,

    transactions: u32,
}

impl SimulatedLock {
    /// Unpaired lock with security PIN `lock_pin`, currently locked.
    pub fn new(lock_pin: u32) -> Self {
        let mut config = LockSettings::default();
        let _ = config.name.push_str("Simulated Lock");
        config.pairing_enabled = true;
        config.button_enabled = true;
        config.led_enabled = true;
        config.led_brightness = 3;
        config.has_keypad = true;

        let state = KeyTurnerState {
            lock_state: LockState::Locked,
            trigger: Trigger::System,
            battery_percent: 90,
            door_sensor_state: DoorSensorState::DoorClosed,
            last_lock_action: LockAction::Lock,
            last_lock_action_completion: CompletionStatus::Success,
            ..KeyTurnerState::default()
        };

        let mut sim = Self {
            paired: false,
            accepting_pairing: true,
            reachable: true,
            lock_pin,
            client_pin: 0,
            state,
            config,
            advanced: AdvancedSettings::default(),
            auths: Vec::new(),
            log: Vec::new(),
            next_index: 1,
            keypad: Vec::new(),
            next_code_id: 1,
            transactions: 0,
        };
        sim.add_auth(0, "Manual");
        sim
    }

    /// Already paired with the bridge (credentials survived a reboot).
    pub fn paired(lock_pin: u32) -> Self {
        let mut sim = Self::new(lock_pin);
        sim.paired = true;
        sim.add_auth(BRIDGE_AUTH_ID, "LockBridge");
        sim
    }

    // ── Physical side ─────────────────────────────────────────

    /// Someone operates the lock by hand (or with an app) as `auth_id`.
    pub fn press_action(&mut self, action: LockAction, auth_id: u32) {
        self.apply_action(action, auth_id, Trigger::Manual);
    }

    pub fn set_door(&mut self, door: DoorSensorState) {
        self.state.door_sensor_state = door;
    }

    pub fn set_lock_state(&mut self, state: LockState) {
        self.state.lock_state = state;
    }

    pub fn set_battery(&mut self, percent: u8, critical: bool) {
        self.state.battery_percent = percent.min(100);
        self.state.battery_critical = critical;
    }

    /// Out of radio range: every transaction answers `NotConnected`.
    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
    }

    pub fn set_accepting_pairing(&mut self, accepting: bool) {
        self.accepting_pairing = accepting;
    }

    pub fn add_auth(&mut self, auth_id: u32, name: &str) {
        let mut n = heapless::String::<MAX_NAME_LEN>::new();
        let _ = n.push_str(name);
        self.auths.push(AuthEntry {
            auth_id,
            name: n,
            enabled: true,
        });
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn lock_state(&self) -> LockState {
        self.state.lock_state
    }

    pub fn transactions(&self) -> u32 {
        self.transactions
    }

    pub fn keypad_codes(&self) -> &[KeypadEntry] {
        &self.keypad
    }

    pub fn settings(&self) -> &LockSettings {
        &self.config
    }

    pub fn advanced_settings(&self) -> &AdvancedSettings {
        &self.advanced
    }

    // ── Internal ──────────────────────────────────────────────

    fn transaction(&mut self) -> CmdResult<()> {
        self.transactions += 1;
        if !self.reachable || !self.paired {
            return Err(CmdError::NotConnected);
        }
        Ok(())
    }

    fn pin_protected(&mut self) -> CmdResult<()> {
        self.transaction()?;
        if self.client_pin != self.lock_pin {
            return Err(CmdError::Failed(ERROR_BAD_PIN));
        }
        Ok(())
    }

    fn apply_action(&mut self, action: LockAction, auth_id: u32, trigger: Trigger) {
        self.state.lock_state = match action {
            LockAction::Lock | LockAction::FullLock => LockState::Locked,
            LockAction::Unlatch => LockState::Unlatched,
            LockAction::LockNGo | LockAction::LockNGoUnlatch => LockState::UnlockedLockNGo,
            LockAction::Unlock | LockAction::Undefined => LockState::Unlocked,
        };
        self.state.trigger = trigger;
        self.state.last_lock_action = action;
        self.state.last_lock_action_completion = CompletionStatus::Success;
        self.append_log(
            auth_id,
            LoggingType::LockAction,
            [action.raw(), trigger as u8, 0, CompletionStatus::Success as u8, 0],
        );
    }

    fn append_log(&mut self, auth_id: u32, kind: LoggingType, data: [u8; 5]) {
        let index = self.next_index;
        self.next_index += 1;
        let name = self
            .auths
            .iter()
            .find(|a| a.auth_id == auth_id)
            .map(|a| a.name.clone())
            .unwrap_or_default();
        self.log.push(RawLogEntry {
            index,
            auth_id,
            name,
            timestamp: LogTimestamp {
                year: 2024,
                month: 1,
                day: 1,
                hour: 12,
                minute: (index / 60 % 60) as u8,
                second: (index % 60) as u8,
            },
            logging_type: kind as u8,
            data,
        });
        if self.log.len() > LOG_CAPACITY {
            self.log.remove(0);
        }
    }

    fn bump_config(&mut self) {
        self.state.config_update_count = self.state.config_update_count.wrapping_add(1);
    }
}

impl LockTransport for SimulatedLock {
    fn is_paired(&self) -> bool {
        self.paired
    }

    fn pair(&mut self, device_name: &str, device_id: u32) -> CmdResult<()> {
        self.transactions += 1;
        if !self.reachable || !self.accepting_pairing {
            return Err(CmdError::NotConnected);
        }
        debug!("SimulatedLock: paired with {} ({})", device_name, device_id);
        self.paired = true;
        self.auths.retain(|a| a.auth_id != BRIDGE_AUTH_ID);
        self.add_auth(BRIDGE_AUTH_ID, device_name);
        Ok(())
    }

    fn unpair(&mut self) {
        self.paired = false;
    }

    fn set_security_pin(&mut self, pin: u32) {
        self.client_pin = pin;
    }

    fn request_status(&mut self) -> CmdResult<KeyTurnerState> {
        self.transaction()?;
        Ok(self.state)
    }

    fn request_config(&mut self) -> CmdResult<LockSettings> {
        self.transaction()?;
        Ok(self.config.clone())
    }

    fn request_advanced_config(&mut self) -> CmdResult<AdvancedSettings> {
        self.transaction()?;
        Ok(self.advanced)
    }

    fn retrieve_auth_entries(&mut self, count: u8) -> CmdResult<Vec<AuthEntry>> {
        self.pin_protected()?;
        Ok(self.auths.iter().take(usize::from(count)).cloned().collect())
    }

    fn retrieve_log_entries(&mut self, count: u8) -> CmdResult<Vec<RawLogEntry>> {
        self.pin_protected()?;
        // Newest first, like the real ring buffer.
        Ok(self.log.iter().rev().take(usize::from(count)).cloned().collect())
    }

    fn execute_action(&mut self, action: LockAction) -> CmdResult<()> {
        self.transaction()?;
        self.apply_action(action, BRIDGE_AUTH_ID, Trigger::System);
        Ok(())
    }

    fn verify_pin(&mut self) -> CmdResult<()> {
        self.pin_protected()
    }

    fn retrieve_keypad_entries(&mut self) -> CmdResult<Vec<KeypadEntry>> {
        self.pin_protected()?;
        Ok(self.keypad.clone())
    }

    fn add_keypad_entry(&mut self, name: &str, code: u32) -> CmdResult<()> {
        self.pin_protected()?;
        let mut n = heapless::String::new();
        n.push_str(name)
            .map_err(|()| CmdError::Failed(ERROR_BAD_PARAMETER))?;
        self.keypad.push(KeypadEntry {
            code_id: self.next_code_id,
            name: n,
            enabled: true,
            code,
        });
        self.next_code_id += 1;
        Ok(())
    }

    fn update_keypad_entry(&mut self, entry: &KeypadEntry) -> CmdResult<()> {
        self.pin_protected()?;
        let slot = self
            .keypad
            .iter_mut()
            .find(|e| e.code_id == entry.code_id)
            .ok_or(CmdError::Failed(ERROR_BAD_PARAMETER))?;
        *slot = entry.clone();
        Ok(())
    }

    fn delete_keypad_entry(&mut self, code_id: u16) -> CmdResult<()> {
        self.pin_protected()?;
        let before = self.keypad.len();
        self.keypad.retain(|e| e.code_id != code_id);
        if self.keypad.len() == before {
            return Err(CmdError::Failed(ERROR_BAD_PARAMETER));
        }
        Ok(())
    }

    fn apply_setting(&mut self, change: &SettingChange) -> CmdResult<()> {
        self.pin_protected()?;
        use SettingChange as S;
        match *change {
            S::PairingEnabled(v) => self.config.pairing_enabled = v,
            S::ButtonEnabled(v) => self.config.button_enabled = v,
            S::LedEnabled(v) => self.config.led_enabled = v,
            S::LedBrightness(v) => self.config.led_brightness = v,
            S::AutoUnlatch(v) => self.config.auto_unlatch = v,
            S::SingleLock(v) => self.config.single_lock = v,
            S::FobAction { button, action } => match button {
                1 => self.config.fob_action_1 = action,
                2 => self.config.fob_action_2 = action,
                _ => self.config.fob_action_3 = action,
            },
            S::AdvertisingMode(m) => self.config.advertising_mode = Some(m),
            S::SingleButtonPressAction(a) => self.advanced.single_button_press_action = a,
            S::DoubleButtonPressAction(a) => self.advanced.double_button_press_action = a,
            S::BatteryType(t) => self.advanced.battery_type = t,
            S::DetachedCylinder(v) => self.advanced.detached_cylinder = v,
            S::AutoLockEnabled(v) => self.advanced.auto_lock_enabled = v,
            S::AutoUnlockDisabled(v) => self.advanced.auto_unlock_disabled = v,
            S::ImmediateAutoLock(v) => self.advanced.immediate_auto_lock_enabled = v,
            S::AutoUpdate(v) => self.advanced.auto_update_enabled = v,
            S::NightMode(v) => self.advanced.night_mode_enabled = v,
            S::NightModeAutoLock(v) => self.advanced.night_mode_auto_lock_enabled = v,
            S::NightModeAutoUnlockDisabled(v) => self.advanced.night_mode_auto_unlock_disabled = v,
            S::NightModeImmediateLockOnStart(v) => {
                self.advanced.night_mode_immediate_lock_on_start = v;
            }
            S::MotorSpeed(s) => self.advanced.motor_speed = s,
        }
        self.bump_config();
        Ok(())
    }
}
