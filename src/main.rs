//! LockBridge Firmware: Main Entry Point
//!
//! Hexagonal architecture with a cooperative main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspLockTransport   LogEventSink   Listeners    NvsSettings    │
//! │  (LockTransport)    (EventSink)    (EventSink)  (SettingsPort) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            LockService (pure logic)                    │    │
//! │  │  cooldown gate · priority scheduler · PIN · pairing    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  static INBOX  ◀── BLE notify callback / command handlers      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{error, info};

use lockbridge::adapters::ble::EspLockTransport;
use lockbridge::adapters::listeners::{Listeners, Topic};
use lockbridge::adapters::log_sink::LogEventSink;
use lockbridge::adapters::nvs::NvsSettings;
use lockbridge::adapters::time::MonotonicClock;
use lockbridge::app::commands::LockCommand;
use lockbridge::app::events::LockEvent;
use lockbridge::app::mailbox::Inbox;
use lockbridge::app::service::LockService;
use lockbridge::config::LockConfig;
use lockbridge::scheduler::Refresh;

/// Everything other contexts may post to the service.
static INBOX: Inbox = Inbox::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  LockBridge v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = LockConfig::default();
    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration: {}", e))?;

    // ── 3. Adapters ───────────────────────────────────────────
    let mut settings = NvsSettings::new().map_err(|e| anyhow!("NVS init failed: {}", e))?;
    let mut lock = EspLockTransport::new(&INBOX.notifications)?;
    let clock = MonotonicClock::new();

    let mut listeners = Listeners::new();
    listeners.on(Topic::PairingModeOff, |_| info!("Pairing window closed"));
    listeners.on(Topic::LogEntry, |event| {
        if let LockEvent::LogEntry(entry) = event {
            info!("Lock activity by {}", entry.authorization_name);
        }
    });
    let mut sink = (LogEventSink::new(), listeners);

    // ── 4. Service ────────────────────────────────────────────
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));
    let poll_ms = config.status_poll_interval_ms();
    let mut service = LockService::new(config, &INBOX, &settings);
    service.start(clock.uptime_ms(), &mut lock, &mut sink, &mut settings);

    if !service.is_paired() {
        INBOX.commands.post(LockCommand::SetPairingMode(true));
    }

    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    let mut last_poll = clock.uptime_ms();
    loop {
        std::thread::sleep(tick);
        let now = clock.uptime_ms();

        if now.saturating_sub(last_poll) >= poll_ms {
            INBOX.refresh.request(Refresh::Status);
            last_poll = now;
        }

        service.tick(now, &mut lock, &mut sink, &mut settings);

        if service.restart_required() {
            error!("Unrecoverable BLE state, restarting");
            std::thread::sleep(Duration::from_millis(100));
            // SAFETY: esp_restart never returns and has no preconditions.
            unsafe { esp_idf_svc::sys::esp_restart() };
        }
    }
}
