//! Inbound commands to the lock service.
//!
//! These represent requests from the outside world (UI entities,
//! automations, services) that the
//! [`LockService`](super::service::LockService) interprets on its next
//! tick.  Keypad administration and settings writes are not commands:
//! they return a result and are called directly on the service.

use crate::lock::LockAction;

/// End state requested by a lock/unlock call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTarget {
    Locked,
    Unlocked,
}

/// A user or automation intent, before translation into a [`LockAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockIntent {
    pub target: LockTarget,
    /// Pull the latch after unlocking.
    pub open_latch: bool,
    /// Unlock, then relock automatically after the lock-'n'-go timeout.
    pub lock_n_go: bool,
}

impl LockIntent {
    pub const fn lock() -> Self {
        Self {
            target: LockTarget::Locked,
            open_latch: false,
            lock_n_go: false,
        }
    }

    pub const fn unlock() -> Self {
        Self {
            target: LockTarget::Unlocked,
            open_latch: false,
            lock_n_go: false,
        }
    }

    pub const fn open_latch() -> Self {
        Self {
            target: LockTarget::Unlocked,
            open_latch: true,
            lock_n_go: false,
        }
    }

    pub const fn lock_n_go(open_latch: bool) -> Self {
        Self {
            target: LockTarget::Unlocked,
            open_latch,
            lock_n_go: true,
        }
    }

    /// The single action that realises this intent.
    ///
    /// Modifiers only apply to unlocking; a lock request is always a
    /// plain [`LockAction::Lock`].
    pub const fn action(self) -> LockAction {
        match self.target {
            LockTarget::Locked => LockAction::Lock,
            LockTarget::Unlocked => match (self.open_latch, self.lock_n_go) {
                (true, true) => LockAction::LockNGoUnlatch,
                (true, false) => LockAction::Unlatch,
                (false, true) => LockAction::LockNGo,
                (false, false) => LockAction::Unlock,
            },
        }
    }
}

/// Commands that external adapters can send into the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCommand {
    /// Replace any pending action with this one (last writer wins).
    Action(LockAction),

    /// Open or close the pairing window.
    SetPairingMode(bool),

    /// Override the configured security PIN; 0 falls back to the
    /// configured value.
    SetSecurityPin(u32),

    /// Forget the lock.
    Unpair,
}

impl From<LockIntent> for LockCommand {
    fn from(intent: LockIntent) -> Self {
        Self::Action(intent.action())
    }
}
