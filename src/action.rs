//! Pending lock action and its retry budget.
//!
//! There is at most one pending [`ActionRequest`].  A new request replaces
//! the old one outright and gets its own full budget; each executed
//! attempt consumes one unit.  A success only clears the slot if the
//! request it executed is still the current one.

use crate::lock::{LockAction, PublishedLockState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: LockAction,
    pub attempts_remaining: u8,
}

/// Handle for one executed attempt, used to detect supersession.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub action: LockAction,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSlot {
    request: Option<ActionRequest>,
    generation: u32,
}

impl ActionSlot {
    pub const fn new() -> Self {
        Self {
            request: None,
            generation: 0,
        }
    }

    /// Replace whatever is pending.
    pub fn submit(&mut self, action: LockAction, attempts: u8) {
        if let Some(prev) = self.request.filter(|r| r.attempts_remaining > 0) {
            log::info!(
                "Action {:?} superseded by {:?} ({} attempts unused)",
                prev.action,
                action,
                prev.attempts_remaining
            );
        }
        self.generation = self.generation.wrapping_add(1);
        self.request = Some(ActionRequest {
            action,
            attempts_remaining: attempts,
        });
    }

    pub fn current(&self) -> Option<ActionRequest> {
        self.request
    }

    pub fn is_pending(&self) -> bool {
        self.attempts_remaining() > 0
    }

    pub fn attempts_remaining(&self) -> u8 {
        self.request.map_or(0, |r| r.attempts_remaining)
    }

    /// Consume one attempt of the pending request.
    pub fn begin_attempt(&mut self) -> Option<Attempt> {
        let req = self.request.as_mut().filter(|r| r.attempts_remaining > 0)?;
        req.attempts_remaining -= 1;
        Some(Attempt {
            action: req.action,
            generation: self.generation,
        })
    }

    /// The attempt succeeded.  Returns the state to publish, or `None` if
    /// a newer request took over in the meantime (that one keeps running
    /// and owns the published state).
    pub fn complete(&mut self, attempt: Attempt) -> Option<PublishedLockState> {
        if attempt.generation != self.generation {
            return None;
        }
        if let Some(req) = self.request.as_mut() {
            req.attempts_remaining = 0;
        }
        Some(settled_state(attempt.action))
    }

    /// Drop any pending request.
    pub fn cancel(&mut self) {
        self.request = None;
    }
}

impl Default for ActionSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// State the lock is expected to settle in once `action` has completed.
pub fn settled_state(action: LockAction) -> PublishedLockState {
    match action {
        LockAction::Lock | LockAction::FullLock => PublishedLockState::Locked,
        LockAction::Unlock
        | LockAction::Unlatch
        | LockAction::LockNGo
        | LockAction::LockNGoUnlatch => PublishedLockState::Unlocked,
        LockAction::Undefined => PublishedLockState::Unknown,
    }
}
