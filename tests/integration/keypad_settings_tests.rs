//! Keypad administration and lock setting writes.

use lockbridge::config::LockConfig;
use lockbridge::error::{CmdError, KeypadError, SettingWriteError};
use lockbridge::lock::{ButtonPressAction, FobAction, KeypadEntry, MotorSpeed, Named};
use lockbridge::scheduler::{Job, Refresh};
use lockbridge::settings::SettingChange;

use crate::mock_lock::{Call, Harness, MockLock};

fn entry(code_id: u16, name: &str, code: u32) -> KeypadEntry {
    KeypadEntry {
        code_id,
        name: heapless::String::try_from(name).unwrap(),
        enabled: true,
        code,
    }
}

/// Paired, config known, PIN validated, gate clear.
fn ready() -> Harness {
    let config = LockConfig {
        security_pin: 123_456,
        ..LockConfig::default()
    };
    let mut lock = MockLock::paired();
    lock.keypad = vec![entry(1, "Front", 234_567), entry(2, "Cleaner", 345_678)];
    let mut h = Harness::new(config, lock);
    h.settle();
    h
}

// ── Keypad ────────────────────────────────────────────────────

#[test]
fn keypad_preconditions_in_order() {
    let mut h = Harness::new(LockConfig::default(), MockLock::unpaired());
    assert_eq!(
        h.svc.list_keypad_entries(h.now, &mut h.lock),
        Err(KeypadError::NotPaired)
    );

    // Config not fetched yet.
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    assert_eq!(
        h.svc.list_keypad_entries(h.now, &mut h.lock),
        Err(KeypadError::NoKeypad)
    );

    h.settle();
    assert_eq!(
        h.svc.list_keypad_entries(h.now, &mut h.lock),
        Err(KeypadError::PinNotValid)
    );
    assert_eq!(h.lock.count(&Call::KeypadList), 0);
}

#[test]
fn lock_without_keypad_is_refused() {
    let config = LockConfig {
        security_pin: 123_456,
        ..LockConfig::default()
    };
    let mut lock = MockLock::paired();
    lock.config.has_keypad = false;
    let mut h = Harness::new(config, lock);
    h.settle();

    assert_eq!(
        h.svc.add_keypad_entry(h.now, &mut h.lock, "Front", 234_567),
        Err(KeypadError::NoKeypad)
    );
}

#[test]
fn list_then_update_and_delete_known_ids() {
    let mut h = ready();

    let entries = h.svc.list_keypad_entries(h.now, &mut h.lock).unwrap();
    assert_eq!(entries.len(), 2);

    h.now += 1_000;
    assert_eq!(
        h.svc.update_keypad_entry(h.now, &mut h.lock, 1, "Front door", 456_789, false),
        Ok(())
    );
    assert!(h.lock.calls.contains(&Call::KeypadUpdate(1)));

    h.now += 1_000;
    assert_eq!(h.svc.delete_keypad_entry(h.now, &mut h.lock, 2), Ok(()));
    h.now += 1_000;
    assert_eq!(
        h.svc.delete_keypad_entry(h.now, &mut h.lock, 2),
        Err(KeypadError::UnknownId)
    );
    assert_eq!(h.lock.count(&Call::KeypadDelete(2)), 1);
}

#[test]
fn unknown_id_rejected_before_listing() {
    let mut h = ready();
    let before = h.lock.transactions();
    assert_eq!(
        h.svc.delete_keypad_entry(h.now, &mut h.lock, 1),
        Err(KeypadError::UnknownId)
    );
    assert_eq!(h.lock.transactions(), before);
}

#[test]
fn invalid_names_and_codes_never_reach_the_lock() {
    let mut h = ready();
    let before = h.lock.calls.len();

    assert_eq!(
        h.svc.add_keypad_entry(h.now, &mut h.lock, "", 234_567),
        Err(KeypadError::InvalidName)
    );
    assert_eq!(
        h.svc.add_keypad_entry(h.now, &mut h.lock, "A name far too long for it", 234_567),
        Err(KeypadError::InvalidName)
    );
    for code in [123_456, 23_456, 1_234_567, 204_567] {
        assert_eq!(
            h.svc.add_keypad_entry(h.now, &mut h.lock, "Guest", code),
            Err(KeypadError::InvalidCode),
            "code {code}"
        );
    }
    assert_eq!(h.lock.calls.len(), before);

    assert_eq!(h.svc.add_keypad_entry(h.now, &mut h.lock, "Guest", 987_654), Ok(()));
    assert_eq!(h.lock.calls.last(), Some(&Call::KeypadAdd("Guest".into(), 987_654)));
}

#[test]
fn admin_calls_share_the_cooldown_gate() {
    let mut h = ready();

    assert_eq!(h.svc.add_keypad_entry(h.now, &mut h.lock, "Guest", 987_654), Ok(()));
    assert_eq!(
        h.svc.list_keypad_entries(h.now + 500, &mut h.lock),
        Err(KeypadError::Busy)
    );

    // The scheduler also waits out the write.
    h.inbox.refresh.request(Refresh::Status);
    assert_eq!(h.step(500), None);
    assert_eq!(h.step(500), Some(Job::Refresh(Refresh::Status)));
}

#[test]
fn transport_failure_is_reported() {
    let mut h = ready();
    h.lock.admin_results.push_back(Err(CmdError::Failed(0x21)));

    assert_eq!(
        h.svc.add_keypad_entry(h.now, &mut h.lock, "Guest", 987_654),
        Err(KeypadError::Command(CmdError::Failed(0x21)))
    );
    assert!(h.svc.is_gated(h.now));
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn setting_validation_comes_first() {
    let mut h = Harness::new(LockConfig::default(), MockLock::unpaired());

    assert_eq!(
        h.svc.apply_setting(h.now, &mut h.lock, SettingChange::LedBrightness(9)),
        Err(SettingWriteError::OutOfRange)
    );
    assert_eq!(
        h.svc.apply_setting(
            h.now,
            &mut h.lock,
            SettingChange::FobAction {
                button: 4,
                action: FobAction::Lock,
            }
        ),
        Err(SettingWriteError::OutOfRange)
    );
    assert_eq!(
        h.svc.apply_setting(h.now, &mut h.lock, SettingChange::LedBrightness(5)),
        Err(SettingWriteError::NotPaired)
    );
    assert!(h.lock.calls.is_empty());
}

#[test]
fn basic_setting_refreshes_config() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.settle();

    assert_eq!(
        h.svc.apply_setting(h.now, &mut h.lock, SettingChange::LedEnabled(false)),
        Ok(())
    );
    assert!(h.svc.flags().config);
    assert!(!h.svc.flags().advanced_config);
    assert_eq!(
        h.svc.apply_setting(h.now, &mut h.lock, SettingChange::AutoUnlatch(true)),
        Err(SettingWriteError::Busy)
    );
    assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::Config)));
}

#[test]
fn advanced_setting_refreshes_advanced_config() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.settle();

    let change = SettingChange::DoubleButtonPressAction(ButtonPressAction::Unlatch);
    assert_eq!(h.svc.apply_setting(h.now, &mut h.lock, change), Ok(()));
    assert_eq!(h.lock.calls.last(), Some(&Call::Setting(change)));
    assert!(h.svc.flags().advanced_config);
    assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::AdvancedConfig)));
}

#[test]
fn unrecognised_select_option_never_reaches_the_lock() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.settle();
    let before = h.lock.calls.len();

    assert_eq!(
        h.svc.apply_setting(
            h.now,
            &mut h.lock,
            SettingChange::MotorSpeed(MotorSpeed::from_name("Turbo"))
        ),
        Err(SettingWriteError::OutOfRange)
    );
    assert_eq!(
        h.svc.apply_setting(
            h.now,
            &mut h.lock,
            SettingChange::SingleButtonPressAction(ButtonPressAction::from_name("bogus"))
        ),
        Err(SettingWriteError::OutOfRange)
    );
    assert_eq!(h.lock.calls.len(), before);
    assert!(!h.svc.is_gated(h.now));
}
