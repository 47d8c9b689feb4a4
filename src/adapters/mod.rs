//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements     | Connects to                     |
//! |-------------|----------------|---------------------------------|
//! | `ble`       | LockTransport  | BLE lock client library (C)     |
//! | `sim_lock`  | LockTransport  | In-memory lock model (host)     |
//! | `log_sink`  | EventSink      | Serial log output               |
//! | `listeners` | EventSink      | Registered automation callbacks |
//! | `nvs`       | SettingsPort   | NVS / in-memory store           |
//! | `time`      | (none)         | ESP32 system timer              |

pub mod ble;
pub mod listeners;
pub mod log_sink;
pub mod nvs;
#[cfg(not(target_os = "espidf"))]
pub mod sim_lock;
pub mod time;
