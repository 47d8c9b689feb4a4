//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every [`LockEvent`] to the ESP-IDF
//! logger (UART / USB-CDC in production).  Log records go out as the same
//! JSON document the home-automation side receives.

use log::{info, warn};

use crate::app::events::LockEvent;
use crate::app::ports::EventSink;
use crate::lock::Named;

/// Adapter that logs every [`LockEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LockEvent) {
        match event {
            LockEvent::Started { paired } => info!("START | paired={}", paired),
            LockEvent::LockStateChanged(s) => info!("LOCK  | {}", s.name()),
            LockEvent::ConnectionChanged(c) => info!("LINK  | connected={}", c),
            LockEvent::PairedChanged(p) => info!("PAIR  | paired={}", p),
            LockEvent::PairingModeOn => info!("PAIR  | pairing mode on"),
            LockEvent::PairingModeOff => info!("PAIR  | pairing mode off"),
            LockEvent::Paired => info!("PAIR  | paired with lock"),
            LockEvent::PinStateChanged(s) => info!("PIN   | {}", s.name()),
            LockEvent::Battery {
                critical,
                charging,
                percent,
            } => info!(
                "BATT  | {}% critical={} charging={}",
                percent, critical, charging
            ),
            LockEvent::DoorSensor(d) => info!("DOOR  | {}", d.name()),
            LockEvent::ConfigUpdated(c) => info!(
                "CFG   | name={} keypad={} led={} button={}",
                c.name, c.has_keypad, c.led_enabled, c.button_enabled
            ),
            LockEvent::AdvancedConfigUpdated(a) => info!(
                "CFG   | advanced: auto_lock={} night_mode={} motor={}",
                a.auto_lock_enabled,
                a.night_mode_enabled,
                a.motor_speed.name()
            ),
            LockEvent::LogEntry(e) => match e.to_json() {
                Ok(json) => info!("EVENT | {}", json),
                Err(err) => warn!("EVENT | {} (encode failed: {})", e.index, err),
            },
            LockEvent::LastActor(a) => info!("ACTOR | {} ({})", a.name, a.auth_id),
            LockEvent::RestartRequired => warn!("FATAL | restart required"),
        }
    }
}
