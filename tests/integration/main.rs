//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below exercises one area of the lock service against the
//! scripted adapters in `mock_lock`.  All tests run on the host with a
//! virtual clock; no radio required.

mod action_tests;
mod keypad_settings_tests;
mod mock_lock;
mod pin_pairing_tests;
mod refresh_tests;
