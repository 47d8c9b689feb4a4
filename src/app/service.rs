//! Lock service, the hexagonal core.
//!
//! [`LockService`] owns every piece of orchestrator state: refresh flags,
//! cooldown gate, pending action, PIN validation loop, pairing window,
//! connection health and the log watermark.  It runs cooperatively: the
//! main loop calls [`tick`](LockService::tick) at a fixed cadence and each
//! tick issues at most one BLE transaction.  Other contexts reach the
//! service only through the [`Inbox`].
//!
//! ```text
//!  Inbox ──▶ ┌───────────────────────────────┐ ──▶ EventSink
//!            │          LockService          │
//!            │  gate · flags · action · PIN  │
//!            │  pairing · log watermark      │
//!            └──────┬─────────────────┬──────┘
//!                   ▼                 ▼
//!             LockTransport      SettingsPort
//! ```

use log::{debug, error, info, warn};

use crate::action::{ActionRequest, ActionSlot};
use crate::config::{LockConfig, MAX_SECURITY_PIN};
use crate::connection::ConnectionMonitor;
use crate::error::{CmdError, KeypadError, SettingWriteError, SettingsError};
use crate::eventlog::{self, Actor, AuthCache, LogCursor, MAX_AUTH_ENTRIES};
use crate::keypad::{self, KeypadDirectory};
use crate::lock::{
    AdvancedSettings, KeyTurnerState, KeypadEntry, LockAction, LockSettings, Named, PinState,
    PublishedLockState,
};
use crate::pairing::PairingSession;
use crate::pin::{PinSettings, PinValidator, PinVerdict};
use crate::scheduler::{select_job, CooldownGate, Job, Refresh, RefreshFlags};
use crate::settings::SettingChange;

use super::commands::LockCommand;
use super::events::LockEvent;
use super::mailbox::Inbox;
use super::ports::{EventSink, LockTransport, SettingsPort};

// ───────────────────────────────────────────────────────────────
// LockService
// ───────────────────────────────────────────────────────────────

pub struct LockService<'a> {
    config: LockConfig,
    inbox: &'a Inbox,

    gate: CooldownGate,
    flags: RefreshFlags,
    action: ActionSlot,

    pin: PinValidator,
    pin_settings: PinSettings,
    pairing: PairingSession,
    connection: ConnectionMonitor,

    cursor: LogCursor,
    auth: AuthCache,
    keypad: KeypadDirectory,
    last_actor: Option<Actor>,

    lock_state: PublishedLockState,
    status: Option<KeyTurnerState>,
    lock_settings: Option<LockSettings>,
    advanced_settings: Option<AdvancedSettings>,
    paired: bool,

    restart_required: bool,
    restart_announced: bool,
    tick_count: u64,
}

impl<'a> LockService<'a> {
    /// Construct the service and load the persisted PIN record.
    ///
    /// Does **not** talk to the lock; call [`start`](Self::start) next.
    pub fn new(config: LockConfig, inbox: &'a Inbox, settings: &impl SettingsPort) -> Self {
        let pin_settings = match settings.load() {
            Ok(s) => {
                info!("PIN settings loaded (state: {})", s.pin_state.name());
                s
            }
            Err(SettingsError::NotFound) => {
                info!("No stored PIN settings, using defaults");
                PinSettings::default()
            }
            Err(e) => {
                warn!("PIN settings load failed ({}), using defaults", e);
                PinSettings::default()
            }
        };
        let max_errors = config.max_tolerated_update_errors;
        Self {
            config,
            inbox,
            gate: CooldownGate::new(),
            flags: RefreshFlags::default(),
            action: ActionSlot::new(),
            pin: PinValidator::new(),
            pin_settings,
            pairing: PairingSession::new(),
            connection: ConnectionMonitor::new(max_errors),
            cursor: LogCursor::new(),
            auth: AuthCache::default(),
            keypad: KeypadDirectory::default(),
            last_actor: None,
            lock_state: PublishedLockState::Unknown,
            status: None,
            lock_settings: None,
            advanced_settings: None,
            paired: false,
            restart_required: false,
            restart_announced: false,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Hand the PIN to the library, take the initial paired state and
    /// schedule the first full sync.
    pub fn start(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) {
        self.paired = transport.is_paired();
        let pin = self.effective_pin();
        if pin != 0 {
            transport.set_security_pin(pin);
        }

        let state = match (pin, self.pin_settings.pin_state) {
            (0, _) => PinState::NotSet,
            (_, PinState::NotSet | PinState::Set) => PinState::Set,
            (_, s) => s,
        };
        if state != self.pin_settings.pin_state {
            self.pin_settings.pin_state = state;
            self.persist_pin(settings);
        }
        if self.paired {
            self.flags = RefreshFlags::all();
            if state == PinState::Set {
                self.pin.start(now_ms, self.config.pin_validation_attempts);
            }
        }

        info!(
            "LockService started (paired: {}, PIN: {})",
            self.paired,
            state.name()
        );
        sink.emit(&LockEvent::Started {
            paired: self.paired,
        });
        sink.emit(&LockEvent::LockStateChanged(self.lock_state));
        sink.emit(&LockEvent::PinStateChanged(state));
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one scheduler step.
    ///
    /// Drains the inbox, handles pairing-window expiry, then, if the
    /// cooldown gate is clear, performs at most one transaction.
    /// Returns the work performed, if any.
    pub fn tick(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) -> Option<Job> {
        self.tick_count += 1;

        self.drain_inbox(now_ms, transport, sink, settings);
        self.sync_paired(now_ms, transport, sink, settings);
        self.expire_pairing(now_ms, sink);

        let job = if self.restart_required || self.gate.is_gated(now_ms) {
            None
        } else if !self.paired {
            if self.pairing.is_active() {
                self.attempt_pairing(now_ms, transport, sink, settings);
                Some(Job::Pairing)
            } else {
                None
            }
        } else {
            let job = select_job(self.action.is_pending(), self.pin.is_due(now_ms), &self.flags);
            match job {
                Some(Job::Action) => self.run_action(now_ms, transport, sink),
                Some(Job::PinValidation) => {
                    self.run_pin_validation(now_ms, transport, sink, settings);
                }
                Some(Job::Refresh(r)) => self.run_refresh(r, now_ms, transport, sink),
                Some(Job::Pairing) | None => {}
            }
            job
        };

        self.announce_restart(sink);
        job
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply a command immediately (same context as [`tick`](Self::tick)).
    /// Commands from other contexts go through the [`Inbox`].
    pub fn handle_command(
        &mut self,
        cmd: LockCommand,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) {
        match cmd {
            LockCommand::Action(LockAction::Undefined) => {
                warn!("Ignoring undefined lock action");
            }
            LockCommand::Action(action) => {
                if !transport.is_paired() {
                    error!("Lock action {} requested while not paired", action.name());
                    return;
                }
                info!("Lock action requested: {}", action.name());
                self.action.submit(action, self.config.max_action_attempts);
            }
            LockCommand::SetPairingMode(true) => {
                let timeout = self.config.pairing_timeout_ms();
                if self.pairing.enable(now_ms, timeout) {
                    info!("Pairing mode on ({} s)", self.config.pairing_mode_timeout_secs);
                    sink.emit(&LockEvent::PairingModeOn);
                } else {
                    info!("Pairing mode timeout restarted");
                }
            }
            LockCommand::SetPairingMode(false) => {
                if self.pairing.disable() {
                    info!("Pairing mode off");
                    sink.emit(&LockEvent::PairingModeOff);
                }
            }
            LockCommand::SetSecurityPin(pin) => {
                self.set_security_pin(pin, now_ms, transport, sink, settings);
            }
            LockCommand::Unpair => self.unpair(transport, sink, settings),
        }
    }

    fn set_security_pin(
        &mut self,
        pin: u32,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) {
        if pin > MAX_SECURITY_PIN {
            warn!("Rejected security PIN: must be 0-{}", MAX_SECURITY_PIN);
            return;
        }
        self.pin_settings.security_pin = pin;
        let effective = self.effective_pin();
        transport.set_security_pin(effective);

        if effective == 0 {
            self.pin.cancel();
            self.set_pin_state(PinState::NotSet, sink);
        } else {
            self.set_pin_state(PinState::Set, sink);
            if self.paired {
                self.pin.start(now_ms, self.config.pin_validation_attempts);
            }
        }
        self.persist_pin(settings);
    }

    fn unpair(
        &mut self,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) {
        warn!("Unpairing from lock");
        transport.unpair();
        self.action.cancel();
        self.pin.cancel();
        self.flags = RefreshFlags::default();
        self.status = None;

        if self.effective_pin() == 0 && self.set_pin_state(PinState::NotSet, sink) {
            self.persist_pin(settings);
        }
        if self.pairing.disable() {
            sink.emit(&LockEvent::PairingModeOff);
        }
        if self.paired {
            self.paired = false;
            sink.emit(&LockEvent::PairedChanged(false));
        }
        self.publish_lock_state(PublishedLockState::Unknown, sink);
        if let Some(c) = self.connection.mark_disconnected() {
            sink.emit(&LockEvent::ConnectionChanged(c));
        }
    }

    // ── Inbox ─────────────────────────────────────────────────

    fn drain_inbox(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) {
        let inbox = self.inbox;

        let pending = inbox.notifications.take();
        if pending.fatal {
            self.note_failure(CmdError::Fatal);
        }
        if pending.bad_pin {
            warn!("Lock rejected the security PIN");
            self.pin.cancel();
            if self.set_pin_state(PinState::Invalid, sink) {
                self.persist_pin(settings);
            }
        }
        if pending.status_updated {
            debug!("Lock reported a status change");
            self.flags.mark(Refresh::Status);
            if self.config.event_log_enabled {
                self.flags.mark(Refresh::EventLog);
            }
        }

        self.flags.absorb(inbox.refresh.take());

        if let Some(pin) = inbox.commands.take_pin() {
            self.handle_command(LockCommand::SetSecurityPin(pin), now_ms, transport, sink, settings);
        }
        while let Some(cmd) = inbox.commands.take_control() {
            self.handle_command(cmd, now_ms, transport, sink, settings);
        }
        if let Some(action) = inbox.commands.take_action() {
            self.handle_command(LockCommand::Action(action), now_ms, transport, sink, settings);
        }
    }

    // ── Pairing ───────────────────────────────────────────────

    /// Follow the library's view of the bond.  A bond that completed
    /// outside [`attempt_pairing`](Self::attempt_pairing) (a pair call
    /// that reported failure late, a bond restored by the library) takes
    /// the same path as a successful attempt.
    fn sync_paired(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) {
        let paired = transport.is_paired();
        if paired == self.paired {
            return;
        }
        if paired {
            info!("Lock pairing detected");
            self.on_paired(now_ms, transport, sink, settings);
        } else {
            warn!("Lock pairing lost");
            self.paired = false;
            sink.emit(&LockEvent::PairedChanged(false));
            self.action.cancel();
            self.publish_lock_state(PublishedLockState::Unknown, sink);
            if let Some(c) = self.connection.mark_disconnected() {
                sink.emit(&LockEvent::ConnectionChanged(c));
            }
        }
    }

    fn expire_pairing(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        if self.pairing.is_expired(now_ms) {
            self.pairing.disable();
            info!("Pairing mode timed out");
            sink.emit(&LockEvent::PairingModeOff);
        }
    }

    fn attempt_pairing(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) {
        match transport.pair(&self.config.device_name, self.config.device_id) {
            Ok(()) => {
                info!("Paired with lock");
                self.on_paired(now_ms, transport, sink, settings);
            }
            Err(e) => {
                debug!("Pairing attempt failed: {}", e);
                self.note_failure(e);
            }
        }
        self.gate.arm(now_ms, self.config.cooldown_ms);
    }

    /// Not-paired to paired edge: close the pairing window, push the PIN
    /// and schedule validation plus a full sync.
    fn on_paired(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) {
        sink.emit(&LockEvent::Paired);
        if self.pairing.disable() {
            sink.emit(&LockEvent::PairingModeOff);
        }
        self.paired = true;
        sink.emit(&LockEvent::PairedChanged(true));
        self.flags = RefreshFlags::all();

        let pin = self.effective_pin();
        if pin != 0 {
            transport.set_security_pin(pin);
            self.set_pin_state(PinState::Set, sink);
            self.persist_pin(settings);
            self.pin.start(now_ms, self.config.pin_validation_attempts);
        }
    }

    // ── Lock action ───────────────────────────────────────────

    fn run_action(&mut self, now_ms: u64, transport: &mut impl LockTransport, sink: &mut impl EventSink) {
        let Some(attempt) = self.action.begin_attempt() else {
            return;
        };
        let action = attempt.action;
        self.publish_lock_state(action.transitional_state(), sink);

        match transport.execute_action(action) {
            Ok(()) => {
                info!("Lock action {} succeeded", action.name());
                if let Some(settled) = self.action.complete(attempt) {
                    self.publish_lock_state(settled, sink);
                } else {
                    info!("Lock action {} was superseded, newer request continues", action.name());
                }
                self.flags.mark(Refresh::Status);
                self.gate.arm(now_ms, self.config.cooldown_extended_ms);
            }
            Err(e) => {
                let left = self.action.attempts_remaining();
                warn!("Lock action {} failed: {} ({} attempts left)", action.name(), e, left);
                self.note_failure(e);
                if left == 0 {
                    error!("Lock action {} abandoned", action.name());
                    self.publish_lock_state(PublishedLockState::Unknown, sink);
                    if let Some(c) = self.connection.mark_disconnected() {
                        sink.emit(&LockEvent::ConnectionChanged(c));
                    }
                }
                self.gate.arm(now_ms, self.config.cooldown_ms);
            }
        }
    }

    // ── PIN validation ────────────────────────────────────────

    fn run_pin_validation(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
        settings: &mut impl SettingsPort,
    ) {
        let accepted = match transport.verify_pin() {
            Ok(()) => true,
            Err(e) => {
                debug!("PIN verification failed: {}", e);
                self.note_failure(e);
                false
            }
        };
        match self.pin.record(accepted, now_ms, self.config.pin_retry_delay_ms) {
            PinVerdict::Valid => {
                info!("Security PIN accepted by lock");
                self.set_pin_state(PinState::Valid, sink);
                self.persist_pin(settings);
                self.flags.mark(Refresh::AuthData);
                if self.config.event_log_enabled {
                    self.flags.mark(Refresh::EventLog);
                }
            }
            PinVerdict::Retry => {
                debug!("PIN verification retry ({} left)", self.pin.attempts_remaining());
            }
            PinVerdict::Invalid => {
                warn!("Security PIN rejected by lock");
                self.set_pin_state(PinState::Invalid, sink);
                self.persist_pin(settings);
            }
        }
        self.gate.arm(now_ms, self.config.pin_retry_delay_ms);
    }

    // ── Refreshes ─────────────────────────────────────────────

    fn run_refresh(
        &mut self,
        r: Refresh,
        now_ms: u64,
        transport: &mut impl LockTransport,
        sink: &mut impl EventSink,
    ) {
        self.flags.clear(r);
        match r {
            Refresh::Status => self.refresh_status(transport, sink),
            Refresh::Config => self.refresh_config(transport, sink),
            Refresh::AdvancedConfig => self.refresh_advanced_config(transport, sink),
            Refresh::AuthData | Refresh::EventLog => {
                if self.pin_settings.pin_state != PinState::Valid {
                    debug!("Skipping {:?} refresh: security PIN not validated", r);
                    return;
                }
                if r == Refresh::AuthData {
                    self.refresh_auth_data(transport);
                } else if self.config.event_log_enabled {
                    self.refresh_event_log(transport, sink);
                } else {
                    return;
                }
            }
        }
        self.gate.arm(now_ms, self.config.cooldown_ms);
    }

    fn refresh_status(&mut self, transport: &mut impl LockTransport, sink: &mut impl EventSink) {
        let st = match transport.request_status() {
            Ok(st) => st,
            Err(e) => {
                warn!("Status refresh failed: {}", e);
                self.note_failure(e);
                self.flags.mark(Refresh::Status);
                let (edge, exceeded) = self.connection.record_failure();
                if exceeded {
                    self.publish_lock_state(PublishedLockState::Unknown, sink);
                }
                if let Some(c) = edge {
                    error!(
                        "Lock unreachable after {} status failures",
                        self.connection.consecutive_errors()
                    );
                    sink.emit(&LockEvent::ConnectionChanged(c));
                }
                return;
            }
        };

        if let Some(c) = self.connection.record_success() {
            info!("Lock connected");
            sink.emit(&LockEvent::ConnectionChanged(c));
        }
        let prev = self.status.replace(st);
        self.publish_lock_state(st.lock_state.published(), sink);

        let battery = (st.battery_critical, st.battery_charging, st.battery_percent);
        if prev.map(|p| (p.battery_critical, p.battery_charging, p.battery_percent)) != Some(battery) {
            sink.emit(&LockEvent::Battery {
                critical: st.battery_critical,
                charging: st.battery_charging,
                percent: st.battery_percent,
            });
        }
        if prev.map(|p| p.door_sensor_state) != Some(st.door_sensor_state) {
            sink.emit(&LockEvent::DoorSensor(st.door_sensor_state));
        }

        if st.lock_state.is_transitional() {
            self.flags.mark(Refresh::Status);
        }
        if let Some(p) = prev {
            if p.config_update_count != st.config_update_count {
                debug!("Lock config changed, refreshing");
                self.flags.mark(Refresh::Config);
                self.flags.mark(Refresh::AdvancedConfig);
            }
            if self.config.event_log_enabled
                && (p.last_lock_action != st.last_lock_action || p.lock_state != st.lock_state)
            {
                self.flags.mark(Refresh::EventLog);
            }
        }
    }

    fn refresh_config(&mut self, transport: &mut impl LockTransport, sink: &mut impl EventSink) {
        match transport.request_config() {
            Ok(cfg) => {
                debug!("Config refreshed (keypad: {})", cfg.has_keypad);
                sink.emit(&LockEvent::ConfigUpdated(cfg.clone()));
                self.lock_settings = Some(cfg);
            }
            Err(e) => {
                warn!("Config refresh failed: {}", e);
                self.note_failure(e);
                self.flags.mark(Refresh::Config);
            }
        }
    }

    fn refresh_advanced_config(&mut self, transport: &mut impl LockTransport, sink: &mut impl EventSink) {
        match transport.request_advanced_config() {
            Ok(adv) => {
                debug!("Advanced config refreshed");
                sink.emit(&LockEvent::AdvancedConfigUpdated(adv));
                self.advanced_settings = Some(adv);
            }
            Err(e) => {
                warn!("Advanced config refresh failed: {}", e);
                self.note_failure(e);
                self.flags.mark(Refresh::AdvancedConfig);
            }
        }
    }

    fn refresh_auth_data(&mut self, transport: &mut impl LockTransport) {
        let count = self.config.auth_fetch_count.min(MAX_AUTH_ENTRIES as u8);
        match transport.retrieve_auth_entries(count) {
            Ok(entries) => {
                self.auth.replace(entries);
                debug!("Auth cache refreshed ({} entries)", self.auth.len());
            }
            Err(e) => {
                warn!("Auth data refresh failed: {}", e);
                self.note_failure(e);
                self.flags.mark(Refresh::AuthData);
            }
        }
    }

    fn refresh_event_log(&mut self, transport: &mut impl LockTransport, sink: &mut impl EventSink) {
        let count = self.config.event_log_fetch_count.min(eventlog::MAX_FETCH);
        let entries = match transport.retrieve_log_entries(count) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Event log refresh failed: {}", e);
                self.note_failure(e);
                self.flags.mark(Refresh::EventLog);
                return;
            }
        };

        let batch = eventlog::process(entries, &mut self.cursor, &self.auth);
        for ev in &batch.events {
            debug!("Log entry {} forwarded", ev.index);
            sink.emit(&LockEvent::LogEntry(ev.clone()));
        }
        if let Some(actor) = batch.last_actor {
            if self.last_actor.as_ref() != Some(&actor) {
                sink.emit(&LockEvent::LastActor(actor.clone()));
                self.last_actor = Some(actor);
            }
        }
    }

    // ── Keypad administration ─────────────────────────────────

    fn keypad_ready(&self, now_ms: u64) -> Result<(), KeypadError> {
        if !self.paired {
            return Err(KeypadError::NotPaired);
        }
        if !self.lock_settings.as_ref().is_some_and(|s| s.has_keypad) {
            return Err(KeypadError::NoKeypad);
        }
        if self.pin_settings.pin_state != PinState::Valid {
            return Err(KeypadError::PinNotValid);
        }
        if self.gate.is_gated(now_ms) {
            return Err(KeypadError::Busy);
        }
        Ok(())
    }

    fn finish_admin<T>(&mut self, now_ms: u64, what: &str, result: Result<T, CmdError>) -> Result<T, CmdError> {
        self.gate.arm(now_ms, self.config.cooldown_ms);
        if let Err(e) = &result {
            warn!("{} failed: {}", what, e);
            self.note_failure(*e);
        }
        result
    }

    /// List keypad codes and remember their ids for later updates.
    pub fn list_keypad_entries(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
    ) -> Result<Vec<KeypadEntry>, KeypadError> {
        self.keypad_ready(now_ms)?;
        let result = transport.retrieve_keypad_entries();
        let entries = self.finish_admin(now_ms, "Keypad listing", result)?;
        self.keypad.replace(&entries);
        info!("Keypad listing: {} entries", entries.len());
        Ok(entries)
    }

    pub fn add_keypad_entry(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        name: &str,
        code: u32,
    ) -> Result<(), KeypadError> {
        self.keypad_ready(now_ms)?;
        let name = keypad::validate_name(name)?;
        let code = keypad::validate_code(code)?;
        let result = transport.add_keypad_entry(&name, code);
        self.finish_admin(now_ms, "Keypad add", result)?;
        info!("Keypad entry '{}' added", name);
        Ok(())
    }

    pub fn update_keypad_entry(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        code_id: u16,
        name: &str,
        code: u32,
        enabled: bool,
    ) -> Result<(), KeypadError> {
        self.keypad_ready(now_ms)?;
        self.keypad.check(code_id)?;
        let entry = KeypadEntry {
            code_id,
            name: keypad::validate_name(name)?,
            enabled,
            code: keypad::validate_code(code)?,
        };
        let result = transport.update_keypad_entry(&entry);
        self.finish_admin(now_ms, "Keypad update", result)?;
        info!("Keypad entry {} updated", code_id);
        Ok(())
    }

    pub fn delete_keypad_entry(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        code_id: u16,
    ) -> Result<(), KeypadError> {
        self.keypad_ready(now_ms)?;
        self.keypad.check(code_id)?;
        let result = transport.delete_keypad_entry(code_id);
        self.finish_admin(now_ms, "Keypad delete", result)?;
        self.keypad.remove(code_id);
        info!("Keypad entry {} deleted", code_id);
        Ok(())
    }

    // ── Setting writes ────────────────────────────────────────

    /// Write one lock setting; on success the affected config category
    /// is refreshed on a later tick.
    pub fn apply_setting(
        &mut self,
        now_ms: u64,
        transport: &mut impl LockTransport,
        change: SettingChange,
    ) -> Result<(), SettingWriteError> {
        change.validate()?;
        if !self.paired {
            return Err(SettingWriteError::NotPaired);
        }
        if self.gate.is_gated(now_ms) {
            return Err(SettingWriteError::Busy);
        }
        let result = transport.apply_setting(&change);
        self.finish_admin(now_ms, "Setting write", result)?;
        debug!("Setting written: {:?}", change);
        self.flags.mark(change.refreshes());
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn lock_state(&self) -> PublishedLockState {
        self.lock_state
    }

    pub fn pin_state(&self) -> PinState {
        self.pin_settings.pin_state
    }

    pub fn pin_settings(&self) -> PinSettings {
        self.pin_settings
    }

    pub fn is_paired(&self) -> bool {
        self.paired
    }

    pub fn is_connected(&self) -> bool {
        self.paired && self.connection.is_connected()
    }

    pub fn is_pairing_mode(&self) -> bool {
        self.pairing.is_active()
    }

    /// `None` until the first status was received.
    pub fn is_door_open(&self) -> Option<bool> {
        self.status.map(|s| s.door_sensor_state.is_open())
    }

    pub fn status(&self) -> Option<&KeyTurnerState> {
        self.status.as_ref()
    }

    pub fn lock_settings(&self) -> Option<&LockSettings> {
        self.lock_settings.as_ref()
    }

    pub fn advanced_settings(&self) -> Option<&AdvancedSettings> {
        self.advanced_settings.as_ref()
    }

    pub fn last_actor(&self) -> Option<&Actor> {
        self.last_actor.as_ref()
    }

    pub fn last_rolling_log_id(&self) -> u32 {
        self.cursor.last_rolling_log_id()
    }

    pub fn pending_action(&self) -> Option<ActionRequest> {
        self.action.current().filter(|r| r.attempts_remaining > 0)
    }

    pub fn flags(&self) -> RefreshFlags {
        self.flags
    }

    /// Mark a category stale from the service's own context.
    pub fn request_refresh(&mut self, r: Refresh) {
        self.flags.mark(r);
    }

    pub fn is_gated(&self, now_ms: u64) -> bool {
        self.gate.is_gated(now_ms)
    }

    /// A fatal transport error occurred; the device must restart.
    pub fn restart_required(&self) -> bool {
        self.restart_required
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn effective_pin(&self) -> u32 {
        self.pin_settings.effective_pin(self.config.security_pin)
    }

    fn publish_lock_state(&mut self, state: PublishedLockState, sink: &mut impl EventSink) {
        if state != self.lock_state {
            self.lock_state = state;
            sink.emit(&LockEvent::LockStateChanged(state));
        }
    }

    /// Returns `true` if the state changed.
    fn set_pin_state(&mut self, state: PinState, sink: &mut impl EventSink) -> bool {
        if state == self.pin_settings.pin_state {
            return false;
        }
        info!("PIN state: {} -> {}", self.pin_settings.pin_state.name(), state.name());
        self.pin_settings.pin_state = state;
        sink.emit(&LockEvent::PinStateChanged(state));
        true
    }

    fn persist_pin(&self, settings: &mut impl SettingsPort) {
        if let Err(e) = settings.save(&self.pin_settings) {
            warn!("PIN settings save failed: {}", e);
        }
    }

    fn note_failure(&mut self, e: CmdError) {
        if !e.is_recoverable() && !self.restart_required {
            error!("Fatal BLE error, restart required");
            self.restart_required = true;
        }
    }

    fn announce_restart(&mut self, sink: &mut impl EventSink) {
        if self.restart_required && !self.restart_announced {
            self.restart_announced = true;
            sink.emit(&LockEvent::RestartRequired);
        }
    }
}
