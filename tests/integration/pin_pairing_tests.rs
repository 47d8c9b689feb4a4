//! Security PIN validation, persistence and the pairing window.

use lockbridge::app::commands::LockCommand;
use lockbridge::app::events::LockEvent;
use lockbridge::config::LockConfig;
use lockbridge::error::CmdError;
use lockbridge::lock::{PinState, PublishedLockState};
use lockbridge::notify::TransportEvent;
use lockbridge::pin::PinSettings;
use lockbridge::scheduler::{Job, Refresh};

use crate::mock_lock::{Call, Harness, MemSettings, MockLock};

fn with_pin(pin: u32) -> LockConfig {
    LockConfig {
        security_pin: pin,
        ..LockConfig::default()
    }
}

// ── PIN ───────────────────────────────────────────────────────

#[test]
fn configured_pin_validated_on_first_tick() {
    let mut h = Harness::new(with_pin(123_456), MockLock::paired());
    assert_eq!(h.lock.calls, vec![Call::SetPin(123_456)]);
    assert_eq!(h.svc.pin_state(), PinState::Set);

    assert_eq!(h.tick(), Some(Job::PinValidation));
    assert_eq!(h.svc.pin_state(), PinState::Valid);
    assert_eq!(h.store.stored.map(|s| s.pin_state), Some(PinState::Valid));
    assert!(h.svc.flags().auth_data);
    assert!(h.svc.flags().event_log);
}

#[test]
fn rejected_pin_terminates_after_budget() {
    let mut lock = MockLock::paired();
    lock.fail_verify(20);
    let mut h = Harness::new(with_pin(123_456), lock);

    h.tick();
    h.run(100, 3_000);

    assert_eq!(h.lock.count(&Call::VerifyPin), 4);
    assert_eq!(h.sink.count(&LockEvent::PinStateChanged(PinState::Invalid)), 1);
    assert_eq!(h.svc.pin_state(), PinState::Invalid);
    assert_eq!(h.store.stored.map(|s| s.pin_state), Some(PinState::Invalid));
    assert_eq!(h.lock.count(&Call::AuthEntries(10)), 0);
}

#[test]
fn retries_are_spaced_by_retry_delay() {
    let mut lock = MockLock::paired();
    lock.fail_verify(1);
    let mut h = Harness::new(with_pin(123_456), lock);

    assert_eq!(h.tick(), Some(Job::PinValidation));
    assert_eq!(h.step(99), None);
    assert_eq!(h.step(1), Some(Job::PinValidation));
    assert_eq!(h.svc.pin_state(), PinState::Valid);
}

#[test]
fn invalid_pin_is_not_revalidated_at_boot() {
    let store = MemSettings {
        stored: Some(PinSettings {
            security_pin: 0,
            pin_state: PinState::Invalid,
        }),
        saves: 0,
    };
    let mut h = Harness::with_store(with_pin(123_456), MockLock::paired(), store);
    h.settle();

    assert_eq!(h.svc.pin_state(), PinState::Invalid);
    assert_eq!(h.lock.count(&Call::VerifyPin), 0);
}

#[test]
fn valid_pin_survives_restart_without_verification() {
    let store = MemSettings {
        stored: Some(PinSettings {
            security_pin: 654_321,
            pin_state: PinState::Valid,
        }),
        saves: 0,
    };
    let mut h = Harness::with_store(LockConfig::default(), MockLock::paired(), store);
    assert_eq!(h.lock.calls, vec![Call::SetPin(654_321)]);
    h.settle();

    assert_eq!(h.lock.count(&Call::VerifyPin), 0);
    assert_eq!(h.lock.count(&Call::AuthEntries(10)), 1);
    assert_eq!(h.store.saves, 0);
}

#[test]
fn runtime_pin_override_restarts_validation() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.settle();
    assert_eq!(h.svc.pin_state(), PinState::NotSet);

    h.inbox.commands.post_security_pin(246_813);
    assert_eq!(h.step(1_000), Some(Job::PinValidation));
    assert!(h.lock.calls.contains(&Call::SetPin(246_813)));
    assert_eq!(h.svc.pin_state(), PinState::Valid);
    assert_eq!(h.store.stored.map(|s| s.security_pin), Some(246_813));
}

#[test]
fn clearing_override_falls_back_to_configured_pin() {
    let store = MemSettings {
        stored: Some(PinSettings {
            security_pin: 654_321,
            pin_state: PinState::Valid,
        }),
        saves: 0,
    };
    let mut h = Harness::with_store(LockConfig::default(), MockLock::paired(), store);

    h.inbox.commands.post_security_pin(0);
    h.tick();
    assert!(h.lock.calls.contains(&Call::SetPin(0)));
    assert_eq!(h.svc.pin_state(), PinState::NotSet);
    assert_eq!(h.lock.count(&Call::VerifyPin), 0);
}

#[test]
fn out_of_range_pin_is_rejected() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.svc.handle_command(
        LockCommand::SetSecurityPin(1_000_000),
        0,
        &mut h.lock,
        &mut h.sink,
        &mut h.store,
    );

    assert_eq!(h.svc.pin_state(), PinState::NotSet);
    assert_eq!(h.store.saves, 0);
}

#[test]
fn bad_pin_notification_invalidates() {
    let mut h = Harness::new(with_pin(123_456), MockLock::paired());
    h.tick();
    assert_eq!(h.svc.pin_state(), PinState::Valid);

    h.inbox.notifications.notify(TransportEvent::BadPin);
    h.step(1_000);
    assert_eq!(h.svc.pin_state(), PinState::Invalid);
    assert_eq!(h.store.stored.map(|s| s.pin_state), Some(PinState::Invalid));
}

// ── Pairing ───────────────────────────────────────────────────

#[test]
fn pairing_window_times_out_once() {
    let config = LockConfig {
        pairing_mode_timeout_secs: 10,
        ..LockConfig::default()
    };
    let mut lock = MockLock::unpaired();
    lock.pair_results
        .extend(std::iter::repeat_n(Err(CmdError::NotConnected), 50));
    let mut h = Harness::new(config, lock);

    h.inbox.commands.post(LockCommand::SetPairingMode(true));
    assert_eq!(h.tick(), Some(Job::Pairing));
    assert!(h.svc.is_pairing_mode());
    h.run(1_000, 15_000);

    assert!(!h.svc.is_pairing_mode());
    assert!(!h.svc.is_paired());
    assert_eq!(h.sink.count(&LockEvent::PairingModeOn), 1);
    assert_eq!(h.sink.count(&LockEvent::PairingModeOff), 1);
    assert_eq!(h.lock.count(&Call::Pair), 11);
}

#[test]
fn successful_pairing_starts_full_sync() {
    let mut h = Harness::new(with_pin(123_456), MockLock::unpaired());
    assert_eq!(h.tick(), None);

    h.inbox.commands.post(LockCommand::SetPairingMode(true));
    assert_eq!(h.tick(), Some(Job::Pairing));

    let tail = &h.sink.events[h.sink.events.len() - 3..];
    assert_eq!(
        tail,
        &[LockEvent::Paired, LockEvent::PairingModeOff, LockEvent::PairedChanged(true)]
    );
    assert!(h.svc.is_paired());
    assert!(!h.svc.is_pairing_mode());

    // PIN validation first, then the full refresh set.
    let jobs = h.settle();
    assert_eq!(jobs[0], Job::PinValidation);
    assert_eq!(jobs[1], Job::Refresh(Refresh::Status));
    assert_eq!(h.svc.pin_state(), PinState::Valid);
}

#[test]
fn bond_completed_after_failed_attempt_still_validates_pin() {
    let mut lock = MockLock::unpaired();
    lock.pair_results.push_back(Err(CmdError::NotConnected));
    let mut h = Harness::new(with_pin(123_456), lock);

    h.inbox.commands.post(LockCommand::SetPairingMode(true));
    assert_eq!(h.tick(), Some(Job::Pairing));
    assert!(!h.svc.is_paired());

    // The library finishes the bond on its own.
    h.lock.paired = true;
    h.run(1_000, 30_000);

    assert!(h.svc.is_paired());
    assert!(!h.svc.is_pairing_mode());
    assert_eq!(h.svc.pin_state(), PinState::Valid);
    assert_eq!(h.lock.count(&Call::VerifyPin), 1);
    assert_eq!(h.lock.count(&Call::AuthEntries(10)), 1);
    assert_eq!(h.sink.count(&LockEvent::Paired), 1);
    assert_eq!(h.sink.count(&LockEvent::PairingModeOff), 1);
    assert_eq!(h.sink.count(&LockEvent::PairedChanged(true)), 1);
}

#[test]
fn reenabling_extends_the_window_without_new_event() {
    let config = LockConfig {
        pairing_mode_timeout_secs: 10,
        ..LockConfig::default()
    };
    let mut lock = MockLock::unpaired();
    lock.pair_results
        .extend(std::iter::repeat_n(Err(CmdError::NotConnected), 50));
    let mut h = Harness::new(config, lock);

    h.inbox.commands.post(LockCommand::SetPairingMode(true));
    h.tick();
    h.run(1_000, 8_000);
    h.inbox.commands.post(LockCommand::SetPairingMode(true));
    h.run(1_000, 8_000);

    assert!(h.svc.is_pairing_mode());
    assert_eq!(h.sink.count(&LockEvent::PairingModeOn), 1);
    assert_eq!(h.sink.count(&LockEvent::PairingModeOff), 0);
}

#[test]
fn pairing_mode_off_only_on_transition() {
    let mut h = Harness::new(LockConfig::default(), MockLock::unpaired());

    h.inbox.commands.post(LockCommand::SetPairingMode(false));
    h.tick();
    assert_eq!(h.sink.count(&LockEvent::PairingModeOff), 0);

    h.inbox.commands.post(LockCommand::SetPairingMode(true));
    h.inbox.commands.post(LockCommand::SetPairingMode(false));
    h.step(1_000);
    assert_eq!(h.sink.count(&LockEvent::PairingModeOn), 1);
    assert_eq!(h.sink.count(&LockEvent::PairingModeOff), 1);
}

#[test]
fn unpair_forgets_lock() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.settle();
    assert!(h.svc.is_connected());
    h.sink.clear();

    h.inbox.commands.post(LockCommand::Unpair);
    assert_eq!(h.step(1_000), None);

    assert!(h.lock.calls.contains(&Call::Unpair));
    assert!(!h.svc.is_paired());
    assert!(!h.svc.is_connected());
    assert_eq!(h.svc.lock_state(), PublishedLockState::Unknown);
    assert!(h.sink.contains(&LockEvent::PairedChanged(false)));
    assert!(h.sink.contains(&LockEvent::ConnectionChanged(false)));
    assert!(!h.svc.flags().any());
}
