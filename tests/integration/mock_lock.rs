//! Scripted lock transport and recording adapters for integration tests.
//!
//! Records every transport call so tests can assert on the exact
//! transaction history; per-operation result queues script failures.

use std::collections::VecDeque;

use lockbridge::app::events::LockEvent;
use lockbridge::app::mailbox::Inbox;
use lockbridge::app::ports::{EventSink, LockTransport, SettingsPort};
use lockbridge::app::service::LockService;
use lockbridge::config::LockConfig;
use lockbridge::error::{CmdError, CmdResult, SettingsError};
use lockbridge::lock::model::LogTimestamp;
use lockbridge::lock::{
    AdvancedSettings, AuthEntry, KeyTurnerState, KeypadEntry, LockAction, LockSettings, LockState,
    LoggingType, RawLogEntry,
};
use lockbridge::pin::PinSettings;
use lockbridge::scheduler::Job;
use lockbridge::settings::SettingChange;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Pair,
    Unpair,
    SetPin(u32),
    Status,
    Config,
    AdvancedConfig,
    AuthEntries(u8),
    LogEntries(u8),
    Action(LockAction),
    VerifyPin,
    KeypadList,
    KeypadAdd(String, u32),
    KeypadUpdate(u16),
    KeypadDelete(u16),
    Setting(SettingChange),
}

impl Call {
    /// Calls that occupy the radio (everything but local library state).
    pub fn is_transaction(&self) -> bool {
        !matches!(self, Self::Unpair | Self::SetPin(_))
    }
}

// ── MockLock ──────────────────────────────────────────────────

pub struct MockLock {
    pub calls: Vec<Call>,
    pub paired: bool,
    pub pair_results: VecDeque<CmdResult<()>>,
    pub status: KeyTurnerState,
    pub status_results: VecDeque<CmdResult<()>>,
    pub config: LockSettings,
    pub advanced: AdvancedSettings,
    pub auth: Vec<AuthEntry>,
    pub log: Vec<RawLogEntry>,
    pub log_results: VecDeque<CmdResult<()>>,
    pub action_results: VecDeque<CmdResult<()>>,
    pub verify_results: VecDeque<CmdResult<()>>,
    pub keypad: Vec<KeypadEntry>,
    pub admin_results: VecDeque<CmdResult<()>>,
}

#[allow(dead_code)]
impl MockLock {
    pub fn paired() -> Self {
        let mut config = LockSettings::default();
        config.has_keypad = true;
        Self {
            calls: Vec::new(),
            paired: true,
            pair_results: VecDeque::new(),
            status: KeyTurnerState {
                lock_state: LockState::Locked,
                battery_percent: 80,
                ..KeyTurnerState::default()
            },
            status_results: VecDeque::new(),
            config,
            advanced: AdvancedSettings::default(),
            auth: Vec::new(),
            log: Vec::new(),
            log_results: VecDeque::new(),
            action_results: VecDeque::new(),
            verify_results: VecDeque::new(),
            keypad: Vec::new(),
            admin_results: VecDeque::new(),
        }
    }

    pub fn unpaired() -> Self {
        Self {
            paired: false,
            ..Self::paired()
        }
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn transactions(&self) -> usize {
        self.calls.iter().filter(|c| c.is_transaction()).count()
    }

    pub fn action_calls(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Action(_))).count()
    }

    /// Fail the next `n` action attempts.
    pub fn fail_actions(&mut self, n: usize, err: CmdError) {
        self.action_results.extend(std::iter::repeat_n(Err(err), n));
    }

    pub fn fail_verify(&mut self, n: usize) {
        self.verify_results
            .extend(std::iter::repeat_n(Err(CmdError::Failed(0x21)), n));
    }

    pub fn fail_status(&mut self, n: usize) {
        self.status_results
            .extend(std::iter::repeat_n(Err(CmdError::NotConnected), n));
    }

    pub fn push_log(&mut self, index: u32, auth_id: u32, kind: LoggingType, data: [u8; 5]) {
        self.log.push(RawLogEntry {
            index,
            auth_id,
            name: heapless::String::new(),
            timestamp: LogTimestamp::default(),
            logging_type: kind as u8,
            data,
        });
    }

    pub fn add_auth(&mut self, auth_id: u32, name: &str) {
        let mut n = heapless::String::new();
        n.push_str(name).unwrap();
        self.auth.push(AuthEntry {
            auth_id,
            name: n,
            enabled: true,
        });
    }

    fn next(queue: &mut VecDeque<CmdResult<()>>) -> CmdResult<()> {
        queue.pop_front().unwrap_or(Ok(()))
    }
}

impl LockTransport for MockLock {
    fn is_paired(&self) -> bool {
        self.paired
    }

    fn pair(&mut self, _device_name: &str, _device_id: u32) -> CmdResult<()> {
        self.calls.push(Call::Pair);
        Self::next(&mut self.pair_results)?;
        self.paired = true;
        Ok(())
    }

    fn unpair(&mut self) {
        self.calls.push(Call::Unpair);
        self.paired = false;
    }

    fn set_security_pin(&mut self, pin: u32) {
        self.calls.push(Call::SetPin(pin));
    }

    fn request_status(&mut self) -> CmdResult<KeyTurnerState> {
        self.calls.push(Call::Status);
        Self::next(&mut self.status_results)?;
        Ok(self.status)
    }

    fn request_config(&mut self) -> CmdResult<LockSettings> {
        self.calls.push(Call::Config);
        Ok(self.config.clone())
    }

    fn request_advanced_config(&mut self) -> CmdResult<AdvancedSettings> {
        self.calls.push(Call::AdvancedConfig);
        Ok(self.advanced)
    }

    fn retrieve_auth_entries(&mut self, count: u8) -> CmdResult<Vec<AuthEntry>> {
        self.calls.push(Call::AuthEntries(count));
        Ok(self.auth.clone())
    }

    fn retrieve_log_entries(&mut self, count: u8) -> CmdResult<Vec<RawLogEntry>> {
        self.calls.push(Call::LogEntries(count));
        Self::next(&mut self.log_results)?;
        Ok(self.log.clone())
    }

    fn execute_action(&mut self, action: LockAction) -> CmdResult<()> {
        self.calls.push(Call::Action(action));
        Self::next(&mut self.action_results)
    }

    fn verify_pin(&mut self) -> CmdResult<()> {
        self.calls.push(Call::VerifyPin);
        Self::next(&mut self.verify_results)
    }

    fn retrieve_keypad_entries(&mut self) -> CmdResult<Vec<KeypadEntry>> {
        self.calls.push(Call::KeypadList);
        Self::next(&mut self.admin_results)?;
        Ok(self.keypad.clone())
    }

    fn add_keypad_entry(&mut self, name: &str, code: u32) -> CmdResult<()> {
        self.calls.push(Call::KeypadAdd(name.to_string(), code));
        Self::next(&mut self.admin_results)
    }

    fn update_keypad_entry(&mut self, entry: &KeypadEntry) -> CmdResult<()> {
        self.calls.push(Call::KeypadUpdate(entry.code_id));
        Self::next(&mut self.admin_results)
    }

    fn delete_keypad_entry(&mut self, code_id: u16) -> CmdResult<()> {
        self.calls.push(Call::KeypadDelete(code_id));
        Self::next(&mut self.admin_results)
    }

    fn apply_setting(&mut self, change: &SettingChange) -> CmdResult<()> {
        self.calls.push(Call::Setting(*change));
        Self::next(&mut self.admin_results)
    }
}

// ── Recording sink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<LockEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, event: &LockEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn contains(&self, event: &LockEvent) -> bool {
        self.events.contains(event)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &LockEvent) {
        self.events.push(event.clone());
    }
}

// ── In-memory settings ────────────────────────────────────────

#[derive(Default)]
pub struct MemSettings {
    pub stored: Option<PinSettings>,
    pub saves: usize,
}

impl SettingsPort for MemSettings {
    fn load(&self) -> Result<PinSettings, SettingsError> {
        self.stored.ok_or(SettingsError::NotFound)
    }

    fn save(&mut self, settings: &PinSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.stored = Some(*settings);
        self.saves += 1;
        Ok(())
    }
}

// ── Harness ───────────────────────────────────────────────────

/// Service plus its adapters, driven on a virtual clock.
pub struct Harness {
    pub inbox: &'static Inbox,
    pub svc: LockService<'static>,
    pub lock: MockLock,
    pub sink: RecordingSink,
    pub store: MemSettings,
    pub now: u64,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(config: LockConfig, lock: MockLock) -> Self {
        Self::with_store(config, lock, MemSettings::default())
    }

    pub fn with_store(config: LockConfig, mut lock: MockLock, mut store: MemSettings) -> Self {
        let inbox: &'static Inbox = Box::leak(Box::new(Inbox::new()));
        let mut sink = RecordingSink::default();
        let mut svc = LockService::new(config, inbox, &store);
        svc.start(0, &mut lock, &mut sink, &mut store);
        Self {
            inbox,
            svc,
            lock,
            sink,
            store,
            now: 0,
        }
    }

    /// Tick at the current time.
    pub fn tick(&mut self) -> Option<Job> {
        self.svc
            .tick(self.now, &mut self.lock, &mut self.sink, &mut self.store)
    }

    /// Advance the clock by `ms`, then tick.
    pub fn step(&mut self, ms: u64) -> Option<Job> {
        self.now += ms;
        self.tick()
    }

    /// Tick every `step_ms` for `duration_ms`, collecting the work done.
    pub fn run(&mut self, step_ms: u64, duration_ms: u64) -> Vec<Job> {
        let end = self.now + duration_ms;
        let mut jobs = Vec::new();
        while self.now < end {
            if let Some(job) = self.step(step_ms) {
                jobs.push(job);
            }
        }
        jobs
    }

    /// Tick once a second until nothing is left to do.
    pub fn settle(&mut self) -> Vec<Job> {
        let mut jobs = Vec::new();
        if let Some(job) = self.tick() {
            jobs.push(job);
        }
        for _ in 0..100 {
            if !self.svc.flags().any() && self.svc.pending_action().is_none() && !self.svc.is_gated(self.now) {
                break;
            }
            if let Some(job) = self.step(1_000) {
                jobs.push(job);
            }
        }
        jobs
    }
}
