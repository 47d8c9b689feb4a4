//! Cross-context inbox for the lock service.
//!
//! UI handlers, automation services and the BLE notify callback may run
//! on other tasks than the main loop.  None of them touch service state
//! directly; they post here and the service drains the inbox at the start
//! of every tick.  Every member is `const`-constructible so the whole
//! [`Inbox`] can live in a `static`.
//!
//! ```text
//! ┌──────────────┐  latest action  ┌──────────────┐
//! │ UI / service │───(Signal)─────▶│              │
//! │  handlers    │  latest PIN     │  Main loop   │
//! │              │───(Signal)─────▶│  LockService │
//! │              │  control cmds   │   .tick()    │
//! │              │───(Channel)────▶│              │
//! └──────────────┘                 └──────────────┘
//!        ▲  BLE notify ─▶ Notifications / RefreshRequests (atomics)
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::warn;

use crate::lock::LockAction;
use crate::notify::Notifications;
use crate::scheduler::RefreshRequests;

use super::commands::{LockCommand, LockIntent};

/// Channel depth for control commands (pairing mode, unpair).
const CONTROL_DEPTH: usize = 4;

/// Host-thread commands.
///
/// The pending action and the PIN are single-slot signals: a newer value
/// overwrites an older one that was not yet consumed, and a reader never
/// observes a half-written request.
pub struct CommandMailbox {
    action: Signal<CriticalSectionRawMutex, LockAction>,
    pin: Signal<CriticalSectionRawMutex, u32>,
    control: Channel<CriticalSectionRawMutex, LockCommand, CONTROL_DEPTH>,
}

impl CommandMailbox {
    pub const fn new() -> Self {
        Self {
            action: Signal::new(),
            pin: Signal::new(),
            control: Channel::new(),
        }
    }

    /// Post a lock/unlock intent.  Last writer wins.
    pub fn post_intent(&self, intent: LockIntent) {
        self.action.signal(intent.action());
    }

    /// Post a raw action (e.g. full lock).  Last writer wins.
    pub fn post_action(&self, action: LockAction) {
        self.action.signal(action);
    }

    pub fn open_latch(&self) {
        self.post_intent(LockIntent::open_latch());
    }

    pub fn lock_n_go(&self, open_latch: bool) {
        self.post_intent(LockIntent::lock_n_go(open_latch));
    }

    /// Post a new security PIN override.  Last writer wins.
    pub fn post_security_pin(&self, pin: u32) {
        self.pin.signal(pin);
    }

    /// Route any command to its slot.  Returns `false` when the control
    /// channel is full and the command was dropped.
    pub fn post(&self, cmd: LockCommand) -> bool {
        match cmd {
            LockCommand::Action(action) => {
                self.post_action(action);
                true
            }
            LockCommand::SetSecurityPin(pin) => {
                self.post_security_pin(pin);
                true
            }
            other => {
                let sent = self.control.try_send(other).is_ok();
                if !sent {
                    warn!("Mailbox: control channel full, dropped {:?}", other);
                }
                sent
            }
        }
    }

    pub(crate) fn take_action(&self) -> Option<LockAction> {
        self.action.try_take()
    }

    pub(crate) fn take_pin(&self) -> Option<u32> {
        self.pin.try_take()
    }

    pub(crate) fn take_control(&self) -> Option<LockCommand> {
        self.control.try_receive().ok()
    }
}

impl Default for CommandMailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the service drains at the start of a tick.
pub struct Inbox {
    pub commands: CommandMailbox,
    pub refresh: RefreshRequests,
    pub notifications: Notifications,
}

impl Inbox {
    pub const fn new() -> Self {
        Self {
            commands: CommandMailbox::new(),
            refresh: RefreshRequests::new(),
            notifications: Notifications::new(),
        }
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}
