//! Outbound lock events.
//!
//! The [`LockService`](super::service::LockService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, update UI entities,
//! invoke registered automation callbacks.

use crate::eventlog::{Actor, LogEvent};
use crate::lock::{AdvancedSettings, DoorSensorState, LockSettings, PinState, PublishedLockState};

/// Structured events emitted by the service.
#[derive(Debug, Clone, PartialEq)]
pub enum LockEvent {
    /// The service has started (carries the initial paired state).
    Started { paired: bool },

    /// Published lock state changed (including optimistic transitions).
    LockStateChanged(PublishedLockState),

    /// The lock link became healthy or was declared lost.
    ConnectionChanged(bool),

    /// Pairing credentials appeared or were removed.
    PairedChanged(bool),

    PairingModeOn,
    PairingModeOff,

    /// A pairing handshake succeeded.
    Paired,

    PinStateChanged(PinState),

    Battery {
        critical: bool,
        charging: bool,
        percent: u8,
    },

    DoorSensor(DoorSensorState),

    ConfigUpdated(LockSettings),
    AdvancedConfigUpdated(AdvancedSettings),

    /// A new (never forwarded before) lock log record.
    LogEntry(LogEvent),

    /// The most recent lock/keypad actor changed.
    LastActor(Actor),

    /// The radio stack is unrecoverable; the device must restart.
    RestartRequired,
}
