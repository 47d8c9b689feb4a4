//! Application core: pure orchestration logic, zero I/O.
//!
//! The [`service::LockService`] decides, tick by tick, which single BLE
//! transaction to run next.  All interaction with the lock, flash and the
//! outside world happens through the **port traits** in [`ports`], so this
//! layer is fully testable on the host.

pub mod commands;
pub mod events;
pub mod mailbox;
pub mod ports;
pub mod service;
