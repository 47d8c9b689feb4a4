//! Refresh scheduling: priority order, notifications, connection health,
//! event-log forwarding and fatal errors.

use lockbridge::app::events::LockEvent;
use lockbridge::config::LockConfig;
use lockbridge::error::CmdError;
use lockbridge::lock::{DoorSensorState, LockAction, LockState, LoggingType, PinState, PublishedLockState};
use lockbridge::notify::TransportEvent;
use lockbridge::scheduler::{Job, Refresh};

use crate::mock_lock::{Call, Harness, MockLock};

fn with_pin(pin: u32) -> LockConfig {
    LockConfig {
        security_pin: pin,
        ..LockConfig::default()
    }
}

#[test]
fn work_is_served_in_priority_order() {
    let mut h = Harness::new(with_pin(123_456), MockLock::paired());
    h.inbox.commands.post_action(LockAction::Lock);

    let mut jobs = vec![h.tick().unwrap()];
    jobs.extend(h.run(1_000, 8_000));

    assert_eq!(
        jobs,
        vec![
            Job::Action,
            Job::PinValidation,
            Job::Refresh(Refresh::Status),
            Job::Refresh(Refresh::Config),
            Job::Refresh(Refresh::AdvancedConfig),
            Job::Refresh(Refresh::AuthData),
            Job::Refresh(Refresh::EventLog),
        ]
    );
    assert_eq!(h.svc.pin_state(), PinState::Valid);
    assert!(!h.svc.flags().any());
}

#[test]
fn auth_and_log_need_a_valid_pin() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    let jobs = h.settle();

    assert!(jobs.contains(&Job::Refresh(Refresh::AuthData)));
    assert_eq!(h.lock.count(&Call::AuthEntries(10)), 0);
    assert_eq!(h.lock.count(&Call::LogEntries(3)), 0);
    assert_eq!(h.lock.count(&Call::Status), 1);
    assert_eq!(h.lock.count(&Call::Config), 1);
    assert_eq!(h.lock.count(&Call::AdvancedConfig), 1);
}

#[test]
fn status_publishes_battery_and_door_only_on_change() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.tick();

    assert!(h.sink.contains(&LockEvent::Battery {
        critical: false,
        charging: false,
        percent: 80,
    }));
    assert!(h.sink.contains(&LockEvent::DoorSensor(DoorSensorState::Unavailable)));
    assert!(h.sink.contains(&LockEvent::ConnectionChanged(true)));
    assert_eq!(h.svc.lock_state(), PublishedLockState::Locked);
    h.settle();
    h.sink.clear();

    h.inbox.refresh.request(Refresh::Status);
    h.step(1_000);
    assert!(h.sink.events.is_empty());

    h.lock.status.battery_percent = 40;
    h.lock.status.door_sensor_state = DoorSensorState::DoorOpened;
    h.inbox.refresh.request(Refresh::Status);
    h.step(1_000);
    assert_eq!(h.sink.events.len(), 2);
    assert_eq!(h.svc.is_door_open(), Some(true));
}

#[test]
fn status_notification_schedules_status_and_log() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.settle();

    h.inbox.notifications.notify(TransportEvent::KeyTurnerStatusUpdated);
    assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::Status)));
    assert!(h.svc.flags().event_log);
}

#[test]
fn transitional_state_keeps_polling_status() {
    let mut lock = MockLock::paired();
    lock.status.lock_state = LockState::Unlocking;
    let mut h = Harness::new(LockConfig::default(), lock);

    h.tick();
    assert_eq!(h.svc.lock_state(), PublishedLockState::Unlocking);
    assert!(h.svc.flags().status);

    h.lock.status.lock_state = LockState::Unlocked;
    assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::Status)));
    assert_eq!(h.svc.lock_state(), PublishedLockState::Unlocked);
}

#[test]
fn config_counter_change_refreshes_both_configs() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.settle();

    h.lock.status.config_update_count = 1;
    h.inbox.refresh.request(Refresh::Status);
    assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::Status)));
    assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::Config)));
    assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::AdvancedConfig)));
    assert_eq!(h.lock.count(&Call::Config), 2);
    assert!(h.svc.lock_settings().is_some_and(|s| s.has_keypad));
}

#[test]
fn connection_lost_only_after_tolerated_failures() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.settle();
    assert!(h.svc.is_connected());

    h.lock.fail_status(6);
    h.inbox.refresh.request(Refresh::Status);
    for _ in 0..5 {
        assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::Status)));
    }
    assert!(h.svc.is_connected());
    assert_eq!(h.svc.lock_state(), PublishedLockState::Locked);

    h.step(1_000);
    assert!(!h.svc.is_connected());
    assert_eq!(h.svc.lock_state(), PublishedLockState::Unknown);
    assert_eq!(h.sink.count(&LockEvent::ConnectionChanged(false)), 1);

    // The failed fetch stays scheduled and recovers on its own.
    h.step(1_000);
    assert!(h.svc.is_connected());
    assert_eq!(h.svc.lock_state(), PublishedLockState::Locked);
}

#[test]
fn log_entries_forwarded_once_with_resolved_names() {
    let mut lock = MockLock::paired();
    lock.add_auth(5, "Alice");
    lock.push_log(1, 5, LoggingType::LockAction, [0x02, 0x01, 0, 0, 0]);
    lock.push_log(2, 9, LoggingType::DoorSensor, [0x00, 0, 0, 0, 0]);
    let mut h = Harness::new(with_pin(123_456), lock);
    h.settle();

    let forwarded: Vec<_> = h
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            LockEvent::LogEntry(ev) => Some(ev.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(forwarded.len(), 2);
    assert_eq!(forwarded[0].index, 1);
    assert_eq!(forwarded[0].authorization_name.as_str(), "Alice");
    assert_eq!(forwarded[1].authorization_name.as_str(), "Manual");
    assert_eq!(h.svc.last_rolling_log_id(), 2);
    assert_eq!(h.svc.last_actor().map(|a| a.name.as_str()), Some("Alice"));

    // Same ring again: nothing new.
    h.sink.clear();
    h.inbox.refresh.request(Refresh::EventLog);
    assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::EventLog)));
    assert!(h.sink.events.is_empty());

    h.lock.push_log(3, 5, LoggingType::LockAction, [0x01, 0x01, 0, 0, 0]);
    h.inbox.refresh.request(Refresh::EventLog);
    h.step(1_000);
    assert_eq!(h.sink.events.len(), 1);
    assert_eq!(h.svc.last_rolling_log_id(), 3);
}

#[test]
fn log_fetch_failure_is_retried() {
    let mut lock = MockLock::paired();
    lock.log_results.push_back(Err(CmdError::NotConnected));
    lock.push_log(1, 0, LoggingType::LockAction, [0x02, 0x01, 0, 0, 0]);
    let mut h = Harness::new(with_pin(123_456), lock);
    h.settle();

    assert_eq!(h.lock.count(&Call::LogEntries(3)), 2);
    assert_eq!(h.svc.last_rolling_log_id(), 1);
}

#[test]
fn disabled_event_log_is_never_fetched() {
    let config = LockConfig {
        event_log_enabled: false,
        ..with_pin(123_456)
    };
    let mut h = Harness::new(config, MockLock::paired());
    h.settle();
    h.inbox.notifications.notify(TransportEvent::KeyTurnerStatusUpdated);
    h.settle();

    assert_eq!(h.lock.count(&Call::LogEntries(3)), 0);
    assert_eq!(h.lock.count(&Call::AuthEntries(10)), 1);
}

#[test]
fn fatal_error_requires_restart_once() {
    let mut lock = MockLock::paired();
    lock.status_results.push_back(Err(CmdError::Fatal));
    let mut h = Harness::new(LockConfig::default(), lock);

    assert_eq!(h.tick(), Some(Job::Refresh(Refresh::Status)));
    assert!(h.svc.restart_required());

    for _ in 0..5 {
        assert_eq!(h.step(1_000), None);
    }
    assert_eq!(h.sink.count(&LockEvent::RestartRequired), 1);
    assert_eq!(h.lock.transactions(), 1);
}

#[test]
fn fatal_notification_stops_all_work() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.inbox.notifications.notify(TransportEvent::FatalDisconnect);

    assert_eq!(h.tick(), None);
    assert!(h.svc.restart_required());
    assert_eq!(h.sink.count(&LockEvent::RestartRequired), 1);
    assert!(h.lock.calls.is_empty());
}
