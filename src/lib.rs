//! LockBridge firmware library.
//!
//! Exposes the pure-logic modules for integration testing.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod action;
pub mod adapters;
pub mod app;
pub mod config;
pub mod connection;
pub mod error;
pub mod eventlog;
pub mod keypad;
pub mod lock;
pub mod notify;
pub mod pairing;
pub mod pin;
pub mod scheduler;
pub mod settings;
