//! Tests for session admission, budget and teardown.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::backoff::BackoffPolicy;
use crate::clock::ManualClock;
use crate::error::RetryError;

use super::id::SessionIdSource;
use super::{create_session, SessionRegistry};

fn registry() -> (Arc<SessionRegistry>, ManualClock) {
    let clock = ManualClock::new();
    let registry = Arc::new(SessionRegistry::with_clock(Arc::new(clock.clone())));
    (registry, clock)
}

#[test]
fn create_inserts_zero_count_entry() {
    let (registry, _clock) = registry();
    let session = registry
        .create_session(Arc::new(BackoffPolicy::linear(1.0)), 3)
        .unwrap();
    assert_eq!(registry.live_sessions(), 1);
    assert_eq!(registry.attempts(session.id()), Some(0));
    assert_eq!(session.remaining(), Some(3));
    assert!(session.last_attempt_at().is_none());
    assert!(session.is_open());
}

#[test]
fn create_rejects_zero_budget() {
    let (registry, _clock) = registry();
    let err = registry
        .create_session(Arc::new(BackoffPolicy::linear(1.0)), 0)
        .unwrap_err();
    assert!(matches!(err, RetryError::BadRequest(_)));
    assert_eq!(registry.live_sessions(), 0);
}

#[test]
fn create_reports_id_exhaustion() {
    let clock = ManualClock::new();
    let registry = Arc::new(SessionRegistry::with_id_source(
        Arc::new(clock),
        SessionIdSource::starting_at(u64::MAX),
    ));
    let err = registry
        .create_session(Arc::new(BackoffPolicy::linear(1.0)), 1)
        .unwrap_err();
    assert_eq!(err, RetryError::SessionIdsExhausted);
}

#[test]
fn sessions_get_distinct_ids() {
    let (registry, _clock) = registry();
    let policy = Arc::new(BackoffPolicy::linear(1.0));
    let a = create_session(&registry, Arc::clone(&policy), 1).unwrap();
    let b = create_session(&registry, policy, 1).unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(registry.live_sessions(), 2);
}

#[test]
fn first_attempt_is_free_for_every_strategy() {
    let (registry, _clock) = registry();
    for policy in [
        BackoffPolicy::linear(100.0),
        BackoffPolicy::exponential(2.0).unwrap(),
        BackoffPolicy::exponential(0.1).unwrap(),
    ] {
        let session = registry.create_session(Arc::new(policy), 1).unwrap();
        assert_eq!(session.allow_retry(), Ok(true));
        assert_eq!(session.attempts(), Some(1));
    }
}

#[test]
fn budget_ceiling_is_permanent() {
    let (registry, clock) = registry();
    let session = registry
        .create_session(Arc::new(BackoffPolicy::linear(0.5)), 2)
        .unwrap();
    assert_eq!(session.allow_retry(), Ok(true));
    clock.advance_secs_f64(0.6);
    assert_eq!(session.allow_retry(), Ok(true));
    for _ in 0..3 {
        clock.advance(Duration::from_secs(60));
        assert_eq!(session.allow_retry(), Err(RetryError::MaxRetryExceeded));
    }
    assert_eq!(session.attempts(), Some(2));
    assert_eq!(session.remaining(), Some(0));
    // Still open and closeable after exhaustion.
    assert!(session.is_open());
    session.close().unwrap();
    assert!(!session.is_open());
}

#[test]
fn denial_does_not_mutate_state() {
    let (registry, clock) = registry();
    let session = registry
        .create_session(Arc::new(BackoffPolicy::linear(2.0)), 5)
        .unwrap();
    assert_eq!(session.allow_retry(), Ok(true));
    let stamped = session.last_attempt_at();
    clock.advance_secs_f64(1.0);
    assert_eq!(session.allow_retry(), Ok(false));
    assert_eq!(session.allow_retry(), Ok(false));
    assert_eq!(session.attempts(), Some(1));
    assert_eq!(session.last_attempt_at(), stamped);
}

#[test]
fn scenario_linear_two_second_window() {
    let (registry, clock) = registry();
    let session = registry
        .create_session(Arc::new(BackoffPolicy::linear(2.0)), 3)
        .unwrap();

    assert_eq!(session.allow_retry(), Ok(true));
    clock.advance_secs_f64(1.0);
    assert_eq!(session.allow_retry(), Ok(false));
    clock.advance_secs_f64(1.1);
    assert_eq!(session.allow_retry(), Ok(true));
    assert_eq!(session.attempts(), Some(2));
    clock.advance_secs_f64(2.1);
    assert_eq!(session.allow_retry(), Ok(true));
    assert_eq!(session.attempts(), Some(3));
    assert_eq!(session.allow_retry(), Err(RetryError::MaxRetryExceeded));
    clock.advance(Duration::from_secs(3600));
    assert_eq!(session.allow_retry(), Err(RetryError::MaxRetryExceeded));
}

#[test]
fn scenario_exponential_base_two() {
    let (registry, clock) = registry();
    let session = registry
        .create_session(Arc::new(BackoffPolicy::exponential(2.0).unwrap()), 5)
        .unwrap();

    assert_eq!(session.allow_retry(), Ok(true));
    // One attempt credited: the window is 2^1 = 2s.
    clock.advance_secs_f64(0.5);
    assert_eq!(session.allow_retry(), Ok(false));
    clock.advance_secs_f64(1.0);
    assert_eq!(session.allow_retry(), Ok(false));
    clock.advance_secs_f64(0.6);
    assert_eq!(session.allow_retry(), Ok(true));
    assert_eq!(session.attempts(), Some(2));

    // Then 2^2 = 4s.
    clock.advance_secs_f64(4.0);
    assert_eq!(session.allow_retry(), Ok(false));
    clock.advance_secs_f64(0.1);
    assert_eq!(session.allow_retry(), Ok(true));
    // And 2^3 = 8s.
    clock.advance_secs_f64(7.9);
    assert_eq!(session.allow_retry(), Ok(false));
    clock.advance_secs_f64(0.2);
    assert_eq!(session.allow_retry(), Ok(true));
    assert_eq!(session.attempts(), Some(4));
}

#[test]
fn scenario_linear_zero_window() {
    let (registry, clock) = registry();
    let session = registry
        .create_session(Arc::new(BackoffPolicy::linear(0.0)), 3)
        .unwrap();
    assert_eq!(session.allow_retry(), Err(RetryError::RetryWindowAbsent));
    clock.advance(Duration::from_secs(10));
    assert_eq!(session.allow_retry(), Err(RetryError::RetryWindowAbsent));
    assert_eq!(session.attempts(), Some(0));
}

#[test]
fn close_removes_session() {
    let (registry, _clock) = registry();
    let session = registry
        .create_session(Arc::new(BackoffPolicy::linear(1.0)), 3)
        .unwrap();
    session.close().unwrap();
    assert_eq!(registry.live_sessions(), 0);
    assert_eq!(session.attempts(), None);
    assert_eq!(session.remaining(), None);
    assert_eq!(session.allow_retry(), Err(RetryError::InvalidSession));
}

#[test]
fn double_close_is_a_no_op() {
    let (registry, _clock) = registry();
    let policy = Arc::new(BackoffPolicy::linear(1.0));
    let a = registry.create_session(Arc::clone(&policy), 3).unwrap();
    let b = registry.create_session(policy, 3).unwrap();
    a.close().unwrap();
    a.close().unwrap();
    assert_eq!(registry.live_sessions(), 1);
    assert_eq!(b.attempts(), Some(0));
}

#[test]
fn drop_closes_session() {
    let (registry, _clock) = registry();
    {
        let _session = registry
            .create_session(Arc::new(BackoffPolicy::linear(1.0)), 3)
            .unwrap();
        assert_eq!(registry.live_sessions(), 1);
    }
    assert_eq!(registry.live_sessions(), 0);
}

#[test]
fn policy_is_shared_with_caller() {
    let (registry, _clock) = registry();
    let policy = Arc::new(BackoffPolicy::linear(1.0));
    let session = registry.create_session(Arc::clone(&policy), 3).unwrap();
    assert!(Arc::ptr_eq(session.policy(), &policy));
    assert_eq!(Arc::strong_count(&policy), 2);
}

#[test]
fn concurrent_checks_on_one_session_admit_once() {
    let (registry, _clock) = registry();
    let session = Arc::new(
        registry
            .create_session(Arc::new(BackoffPolicy::linear(5.0)), 10)
            .unwrap(),
    );
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                (0..50)
                    .filter(|_| session.allow_retry() == Ok(true))
                    .count()
            })
        })
        .collect();
    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, 1);
    assert_eq!(session.attempts(), Some(1));
}

#[test]
fn concurrent_sessions_never_exceed_budget() {
    let (registry, clock) = registry();
    let policy = Arc::new(BackoffPolicy::linear(0.001));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let policy = Arc::clone(&policy);
            let clock = clock.clone();
            thread::spawn(move || {
                let session = registry.create_session(policy, 4).unwrap();
                let mut admitted = 0;
                for _ in 0..100 {
                    clock.advance(Duration::from_millis(2));
                    match session.allow_retry() {
                        Ok(true) => admitted += 1,
                        Ok(false) => {}
                        Err(err) => assert_eq!(err, RetryError::MaxRetryExceeded),
                    }
                }
                assert!(session.attempts().unwrap() <= 4);
                session.close().unwrap();
                admitted
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 4);
    }
    assert_eq!(registry.live_sessions(), 0);
}

#[test]
fn last_attempt_is_monotonic() {
    let (registry, clock) = registry();
    let session = registry
        .create_session(Arc::new(BackoffPolicy::exponential(1.0).unwrap()), 5)
        .unwrap();
    let mut previous = None;
    for _ in 0..5 {
        assert_eq!(session.allow_retry(), Ok(true));
        let at = session.last_attempt_at();
        assert!(at >= previous);
        previous = at;
        clock.advance_secs_f64(1.5);
    }
}
