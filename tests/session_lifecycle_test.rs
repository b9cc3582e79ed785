//! Integration tests for session lifecycle and control operations

use std::sync::Arc;

use sched_monitor::config::MonitorConfig;
use sched_monitor::core::{
    ContextId, DisableStatus, EnableStatus, LogBound, MonitorError, NotifierHub, OverflowPolicy,
    PreemptNotifier, Session, SubscriptionHandle,
};
use sched_monitor::infra::InProcessHub;
use sched_monitor::sync::Mutex;
use sched_monitor::util::ManualClock;

fn create(hub: &Arc<InProcessHub>, config: &MonitorConfig) -> (Session, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let session = Session::create(1, hub.clone(), clock.clone(), config).unwrap();
    (session, clock)
}

/// Hub that refuses every subscription and remembers what it was asked.
#[derive(Default)]
struct RefusingHub {
    attempts: Mutex<Vec<ContextId>>,
}

impl NotifierHub for RefusingHub {
    fn subscribe(
        &self,
        context: ContextId,
        _notifier: Arc<dyn PreemptNotifier>,
    ) -> Result<SubscriptionHandle, MonitorError> {
        self.attempts.lock().push(context);
        Err(MonitorError::SubscribeFailed("no notifier slots".into()))
    }

    fn unsubscribe(&self, _handle: SubscriptionHandle) {
        panic!("nothing was ever subscribed");
    }
}

#[test]
fn test_new_session_is_disabled_and_empty() {
    let hub = Arc::new(InProcessHub::new());
    let (session, _) = create(&hub, &MonitorConfig::default());
    assert!(!session.is_enabled());
    assert!(session.pending().is_empty());
    assert_eq!(session.context(), 1);
    assert_eq!(hub.subscription_count(), 0);
}

#[test]
fn test_enable_is_idempotent() {
    let hub = Arc::new(InProcessHub::new());
    let (session, _) = create(&hub, &MonitorConfig::default());
    assert_eq!(session.enable(), Ok(EnableStatus::Enabled));
    assert_eq!(session.enable(), Ok(EnableStatus::AlreadyEnabled));
    assert!(session.is_enabled());
    assert_eq!(hub.subscription_count(), 1);
    assert_eq!(hub.gate().users(), 1);
}

#[test]
fn test_disable_when_not_enabled_keeps_log() {
    let hub = Arc::new(InProcessHub::new());
    let (session, _) = create(&hub, &MonitorConfig::default());
    session.enable().unwrap();
    hub.sched_out(1, "B");
    hub.sched_in(1, 0);
    assert_eq!(session.disable(), DisableStatus::Disabled);

    let before = session.pending();
    assert_eq!(session.disable(), DisableStatus::NotEnabled);
    assert_eq!(session.pending(), before);
}

#[test]
fn test_no_callbacks_after_disable() {
    let hub = Arc::new(InProcessHub::new());
    let (session, _) = create(&hub, &MonitorConfig::default());
    session.enable().unwrap();
    session.disable();

    hub.sched_out(1, "late");
    hub.sched_in(1, 0);
    assert!(session.pending().is_empty());
    assert_eq!(session.stats().recorded, 0);
    assert!(!hub.gate().is_active());
}

#[test]
fn test_reenable_resumes_recording() {
    let hub = Arc::new(InProcessHub::new());
    let (session, _) = create(&hub, &MonitorConfig::default());
    session.enable().unwrap();
    session.disable();
    assert_eq!(session.enable(), Ok(EnableStatus::Enabled));
    hub.sched_out(1, "B");
    assert_eq!(session.pending().len(), 1);
}

#[test]
fn test_subscribe_failure_is_returned_verbatim() {
    let hub = Arc::new(RefusingHub::default());
    let clock = Arc::new(ManualClock::new(0));
    let session = Session::create(9, hub.clone(), clock, &MonitorConfig::default()).unwrap();

    assert_eq!(
        session.enable(),
        Err(MonitorError::SubscribeFailed("no notifier slots".into()))
    );
    assert!(!session.is_enabled());
    assert_eq!(*hub.attempts.lock(), vec![9]);
    // Dropping must not try to unsubscribe.
    drop(session);
}

#[test]
fn test_destroy_drains_all_records() {
    let hub = Arc::new(InProcessHub::new());
    let (session, clock) = create(&hub, &MonitorConfig::default());
    session.enable().unwrap();
    for i in 0..10u64 {
        clock.set(i * 10);
        hub.sched_out(1, "w");
        clock.set(i * 10 + 3);
        hub.sched_in(1, 0);
    }
    session.disable();

    let report = session.destroy();
    assert_eq!(report.drained, 10);
    assert_eq!(report.open, 0);
    assert!(!report.was_enabled);
}

#[test]
fn test_destroy_while_enabled_unsubscribes_first() {
    let hub = Arc::new(InProcessHub::new());
    let (session, _) = create(&hub, &MonitorConfig::default());
    session.enable().unwrap();
    hub.sched_out(1, "w");

    let report = session.destroy();
    assert!(report.was_enabled);
    assert_eq!(report.drained, 1);
    assert_eq!(report.open, 1);
    assert_eq!(hub.subscription_count(), 0);

    // The hub no longer reaches the destroyed session.
    hub.sched_in(1, 0);
    assert!(!hub.gate().is_active());
}

#[test]
fn test_drop_releases_subscription() {
    let hub = Arc::new(InProcessHub::new());
    {
        let (session, _) = create(&hub, &MonitorConfig::default());
        session.enable().unwrap();
        assert_eq!(hub.subscription_count(), 1);
    }
    assert_eq!(hub.subscription_count(), 0);
}

#[test]
fn test_sessions_on_same_context_are_independent() {
    let hub = Arc::new(InProcessHub::new());
    let (a, _) = create(&hub, &MonitorConfig::default());
    let (b, _) = create(&hub, &MonitorConfig::default());
    a.enable().unwrap();
    hub.sched_out(1, "first");
    b.enable().unwrap();
    hub.sched_out(1, "second");

    assert_eq!(a.pending().len(), 1);
    assert_eq!(b.pending().len(), 1);
    assert_eq!(b.pending()[0].preempted_by().as_str(), "second");
    assert_eq!(a.stats().superseded, 1);
}

#[test]
fn test_bounded_drop_newest() {
    let hub = Arc::new(InProcessHub::new());
    let config = MonitorConfig {
        log_bound: LogBound::Bounded {
            max_entries: 3,
            overflow: OverflowPolicy::DropNewest,
        },
        ..MonitorConfig::default()
    };
    let (session, clock) = create(&hub, &config);
    session.enable().unwrap();
    for i in 0..5u64 {
        clock.set(i * 100);
        hub.sched_out(1, &format!("p{i}"));
        clock.set(i * 100 + 10);
        hub.sched_in(1, 0);
    }

    let stats = session.stats();
    assert_eq!(stats.recorded, 3);
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.orphan_sched_in, 2);

    let read: Vec<(String, u64)> = std::iter::from_fn(|| session.read_one())
        .map(|i| (i.preempted_by.to_string(), i.time_on))
        .collect();
    // p2's following "off" was refused, so its run time is unknown.
    assert_eq!(
        read,
        [("p0".to_string(), 90), ("p1".to_string(), 90), ("p2".to_string(), 0)]
    );
}

#[test]
fn test_bounded_evict_oldest() {
    let hub = Arc::new(InProcessHub::new());
    let config = MonitorConfig {
        log_bound: LogBound::Bounded {
            max_entries: 2,
            overflow: OverflowPolicy::EvictOldest,
        },
        ..MonitorConfig::default()
    };
    let (session, clock) = create(&hub, &config);
    session.enable().unwrap();
    for i in 0..5u64 {
        clock.set(i * 100);
        hub.sched_out(1, &format!("p{i}"));
        clock.set(i * 100 + 10);
        hub.sched_in(1, 0);
    }

    assert_eq!(session.stats().evicted, 3);
    let first = session.read_one().unwrap();
    assert_eq!(first.preempted_by.as_str(), "p3");
    assert_eq!(first.time_on, 90);
    let second = session.read_one().unwrap();
    assert_eq!(second.preempted_by.as_str(), "p4");
    assert_eq!(second.time_on, 0);
}
