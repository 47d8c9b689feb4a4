//! Refresh bookkeeping and the per-tick priority selection.
//!
//! The orchestrator issues at most one BLE transaction per tick.  This
//! module holds the pieces that decide *whether* a transaction may start
//! (the [`CooldownGate`]) and *which* one it is (the [`select_job`]
//! priority order over the [`RefreshFlags`]).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Refresh triggers                         │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ BLE notify│  │ Timers    │  │ Fetch     │  │ Pairing  │   │
//! │  │ callback  │  │ (polling) │  │ failures  │  │ success  │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        │              │              │              │        │
//! │        ▼              ▼              ▼              ▼        │
//! │  ┌───────────────────────────┐  ┌─────────────────────────┐  │
//! │  │ RefreshRequests (atomic)  │─▶│ RefreshFlags (owned by  │  │
//! │  │ any context may set bits  │  │ the service)            │  │
//! │  └───────────────────────────┘  └────────────┬────────────┘  │
//! │                                              │               │
//! │                          CooldownGate ──▶ select_job()       │
//! │                                              │               │
//! │                                              ▼               │
//! │                                     exactly one transaction  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

// ═══════════════════════════════════════════════════════════════
//  Refresh categories
// ═══════════════════════════════════════════════════════════════

/// A category of lock data that can go stale.
///
/// Declaration order is the service order (status first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Refresh {
    Status = 1 << 0,
    Config = 1 << 1,
    AdvancedConfig = 1 << 2,
    AuthData = 1 << 3,
    EventLog = 1 << 4,
}

impl Refresh {
    /// All categories in priority order.
    pub const ALL: [Self; 5] = [
        Self::Status,
        Self::Config,
        Self::AdvancedConfig,
        Self::AuthData,
        Self::EventLog,
    ];

    const MASK: u8 = 0b1_1111;

    pub const fn bit(self) -> u8 {
        self as u8
    }
}

// ═══════════════════════════════════════════════════════════════
//  Dirty-flag register
// ═══════════════════════════════════════════════════════════════

/// Independent "needs refresh" flags, owned exclusively by the service.
///
/// A flag is cleared by the fetch routine at the moment it issues its
/// request, not on success, so a failing fetch can re-arm itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshFlags {
    pub status: bool,
    pub config: bool,
    pub advanced_config: bool,
    pub auth_data: bool,
    pub event_log: bool,
}

impl RefreshFlags {
    /// Every flag dirty (first full sync after pairing or boot).
    pub const fn all() -> Self {
        Self {
            status: true,
            config: true,
            advanced_config: true,
            auth_data: true,
            event_log: true,
        }
    }

    fn slot(&mut self, r: Refresh) -> &mut bool {
        match r {
            Refresh::Status => &mut self.status,
            Refresh::Config => &mut self.config,
            Refresh::AdvancedConfig => &mut self.advanced_config,
            Refresh::AuthData => &mut self.auth_data,
            Refresh::EventLog => &mut self.event_log,
        }
    }

    pub fn mark(&mut self, r: Refresh) {
        *self.slot(r) = true;
    }

    pub fn clear(&mut self, r: Refresh) {
        *self.slot(r) = false;
    }

    pub fn is_dirty(&self, r: Refresh) -> bool {
        match r {
            Refresh::Status => self.status,
            Refresh::Config => self.config,
            Refresh::AdvancedConfig => self.advanced_config,
            Refresh::AuthData => self.auth_data,
            Refresh::EventLog => self.event_log,
        }
    }

    pub fn any(&self) -> bool {
        Refresh::ALL.iter().any(|r| self.is_dirty(*r))
    }

    /// Merge a bitmask taken from [`RefreshRequests`].
    pub fn absorb(&mut self, bits: u8) {
        for r in Refresh::ALL {
            if bits & r.bit() != 0 {
                self.mark(r);
            }
        }
    }

    /// Highest-priority dirty category.
    pub fn next(&self) -> Option<Refresh> {
        Refresh::ALL.into_iter().find(|r| self.is_dirty(*r))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Cross-context refresh requests
// ═══════════════════════════════════════════════════════════════

/// Refresh requests from contexts that do not own the service (the BLE
/// notify callback, polling timers).
///
/// Requesters only ever set bits; the service swaps the mask out at the
/// start of each tick.  Safe to place in a `static`.
pub struct RefreshRequests {
    bits: AtomicU8,
}

impl RefreshRequests {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    pub fn request(&self, r: Refresh) {
        self.bits.fetch_or(r.bit(), Ordering::Release);
    }

    /// Take and reset all pending request bits.
    pub fn take(&self) -> u8 {
        self.bits.swap(0, Ordering::Acquire) & Refresh::MASK
    }

    pub fn is_pending(&self) -> bool {
        self.bits.load(Ordering::Relaxed) != 0
    }
}

impl Default for RefreshRequests {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Cooldown gate
// ═══════════════════════════════════════════════════════════════

/// Minimum spacing between two transport transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownGate {
    last_executed_at: u64,
    duration_ms: u32,
}

impl CooldownGate {
    pub const fn new() -> Self {
        Self {
            last_executed_at: 0,
            duration_ms: 0,
        }
    }

    /// `true` while `now - last_executed_at < duration`.
    pub fn is_gated(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_executed_at) < u64::from(self.duration_ms)
    }

    pub fn arm(&mut self, now_ms: u64, duration_ms: u32) {
        self.last_executed_at = now_ms;
        self.duration_ms = duration_ms;
    }

    /// Milliseconds until the gate opens (0 when clear).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.last_executed_at);
        u64::from(self.duration_ms).saturating_sub(elapsed)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Priority selection
// ═══════════════════════════════════════════════════════════════

/// The single unit of work a tick may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// One attempt of the pending lock action.
    Action,
    /// One security-PIN verification attempt.
    PinValidation,
    /// One fetch of a stale data category.
    Refresh(Refresh),
    /// One pairing attempt while unpaired and in pairing mode.
    Pairing,
}

/// Pick the work for a tick whose gate is clear.
///
/// Order: pending action, due PIN validation, then the refresh flags in
/// [`Refresh::ALL`] order.
pub fn select_job(action_pending: bool, pin_due: bool, flags: &RefreshFlags) -> Option<Job> {
    if action_pending {
        Some(Job::Action)
    } else if pin_due {
        Some(Job::PinValidation)
    } else {
        flags.next().map(Job::Refresh)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
