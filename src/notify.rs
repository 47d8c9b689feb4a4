//! Unsolicited notifications from the BLE library.
//!
//! The library invokes its event handler on the radio task whenever the
//! lock reports something out-of-band.  The handler only sets bits here;
//! the service turns them into flag changes on its next tick.

use core::sync::atomic::{AtomicU8, Ordering};

/// Events the lock library can raise on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// The lock's status changed (someone turned the key, auto-lock, ...).
    KeyTurnerStatusUpdated,
    /// A PIN-protected command was rejected.
    BadPin,
    /// The radio stack hit an error it cannot recover from.
    FatalDisconnect,
}

impl TransportEvent {
    const fn bit(self) -> u8 {
        match self {
            Self::KeyTurnerStatusUpdated => 1 << 0,
            Self::BadPin => 1 << 1,
            Self::FatalDisconnect => 1 << 2,
        }
    }
}

/// What arrived since the last [`Notifications::take`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    pub status_updated: bool,
    pub bad_pin: bool,
    pub fatal: bool,
}

impl Pending {
    pub fn is_empty(&self) -> bool {
        !(self.status_updated || self.bad_pin || self.fatal)
    }
}

/// Lock-free latch written from the radio task.
pub struct Notifications {
    bits: AtomicU8,
}

impl Notifications {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    /// Called from the library's event handler.
    pub fn notify(&self, event: TransportEvent) {
        self.bits.fetch_or(event.bit(), Ordering::Release);
    }

    /// Take and reset everything pending.
    pub fn take(&self) -> Pending {
        let bits = self.bits.swap(0, Ordering::Acquire);
        Pending {
            status_updated: bits & TransportEvent::KeyTurnerStatusUpdated.bit() != 0,
            bad_pin: bits & TransportEvent::BadPin.bit() != 0,
            fatal: bits & TransportEvent::FatalDisconnect.bit() != 0,
        }
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}
