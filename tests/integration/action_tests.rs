//! Lock actions: retry budget, optimistic publication, cooldowns and
//! supersession.

use lockbridge::app::commands::{LockCommand, LockIntent};
use lockbridge::app::events::LockEvent;
use lockbridge::config::LockConfig;
use lockbridge::error::CmdError;
use lockbridge::lock::{LockAction, PublishedLockState};
use lockbridge::scheduler::{Job, Refresh};

use crate::mock_lock::{Call, Harness, MockLock};

fn lock_states(events: &[LockEvent]) -> Vec<PublishedLockState> {
    events
        .iter()
        .filter_map(|e| match e {
            LockEvent::LockStateChanged(s) => Some(*s),
            _ => None,
        })
        .collect()
}

#[test]
fn exhausted_budget_publishes_unknown_then_resumes_refreshes() {
    let mut lock = MockLock::paired();
    lock.fail_actions(5, CmdError::Failed(0x01));
    let mut h = Harness::new(LockConfig::default(), lock);
    h.sink.clear();

    h.inbox.commands.post_action(LockAction::Lock);
    assert_eq!(h.tick(), Some(Job::Action));
    for _ in 0..4 {
        assert_eq!(h.step(1_000), Some(Job::Action));
    }

    assert_eq!(h.lock.action_calls(), 5);
    assert!(h.svc.pending_action().is_none());
    assert_eq!(
        lock_states(&h.sink.events),
        vec![PublishedLockState::Locking, PublishedLockState::Unknown]
    );

    // Budget spent: the slot goes back to refreshes.
    assert_eq!(h.step(1_000), Some(Job::Refresh(Refresh::Status)));
    assert_eq!(h.lock.action_calls(), 5);
}

#[test]
fn failed_attempts_are_spaced_by_normal_cooldown() {
    let mut lock = MockLock::paired();
    lock.fail_actions(2, CmdError::NotConnected);
    let mut h = Harness::new(LockConfig::default(), lock);

    h.inbox.commands.post_action(LockAction::Unlock);
    assert_eq!(h.tick(), Some(Job::Action));
    assert_eq!(h.step(999), None);
    assert_eq!(h.step(1), Some(Job::Action));
    assert_eq!(h.step(1_000), Some(Job::Action));

    // Third attempt succeeded.
    assert_eq!(h.lock.action_calls(), 3);
    assert!(h.svc.pending_action().is_none());
    assert_eq!(h.svc.lock_state(), PublishedLockState::Unlocked);
}

#[test]
fn unlatch_publishes_optimistically_and_holds_extended_cooldown() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());
    h.sink.clear();

    h.inbox.commands.open_latch();
    assert_eq!(h.tick(), Some(Job::Action));
    assert_eq!(h.lock.calls, vec![Call::Action(LockAction::Unlatch)]);
    assert_eq!(
        lock_states(&h.sink.events),
        vec![PublishedLockState::Unlocking, PublishedLockState::Unlocked]
    );

    assert_eq!(h.step(1_000), None);
    assert_eq!(h.step(1_000), None);
    assert_eq!(h.step(999), None);
    assert_eq!(h.lock.transactions(), 1);

    // A status refresh follows the action.
    assert_eq!(h.step(1), Some(Job::Refresh(Refresh::Status)));
}

#[test]
fn newer_request_supersedes_with_full_budget() {
    let mut lock = MockLock::paired();
    lock.fail_actions(1, CmdError::Failed(0x01));
    let mut h = Harness::new(LockConfig::default(), lock);

    h.inbox.commands.post_action(LockAction::Unlock);
    h.tick();
    let pending = h.svc.pending_action().unwrap();
    assert_eq!(pending.action, LockAction::Unlock);
    assert_eq!(pending.attempts_remaining, 4);

    h.inbox.commands.post_intent(LockIntent::lock());
    h.now += 500;
    h.tick();
    let pending = h.svc.pending_action().unwrap();
    assert_eq!(pending.action, LockAction::Lock);
    assert_eq!(pending.attempts_remaining, 5);

    assert_eq!(h.step(500), Some(Job::Action));
    assert_eq!(
        h.lock.calls,
        vec![Call::Action(LockAction::Unlock), Call::Action(LockAction::Lock)]
    );
    assert!(h.svc.pending_action().is_none());
    assert_eq!(h.svc.lock_state(), PublishedLockState::Locked);
}

#[test]
fn last_writer_wins_between_ticks() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());

    h.inbox.commands.post_action(LockAction::Unlock);
    h.inbox.commands.lock_n_go(false);
    h.inbox.commands.post(LockCommand::Action(LockAction::FullLock));
    h.tick();

    assert_eq!(h.lock.calls, vec![Call::Action(LockAction::FullLock)]);
}

#[test]
fn actions_are_dropped_while_unpaired() {
    let mut h = Harness::new(LockConfig::default(), MockLock::unpaired());

    h.inbox.commands.post_action(LockAction::Unlock);
    assert_eq!(h.tick(), None);
    assert!(h.svc.pending_action().is_none());
    assert_eq!(h.lock.action_calls(), 0);
}

#[test]
fn undefined_action_is_ignored() {
    let mut h = Harness::new(LockConfig::default(), MockLock::paired());

    h.inbox.commands.post_action(LockAction::Undefined);
    assert_eq!(h.tick(), Some(Job::Refresh(Refresh::Status)));
    assert_eq!(h.lock.action_calls(), 0);
}
