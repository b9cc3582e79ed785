//! Tests for utility functions

use sched_monitor::util::{Clock, ManualClock, MonotonicClock};

#[test]
fn test_manual_clock_is_shared_through_trait() {
    let clock = ManualClock::new(5);
    let as_trait: &dyn Clock = &clock;
    clock.advance(10);
    assert_eq!(as_trait.now_ns(), 15);
}

#[test]
fn test_monotonic_clock_advances() {
    let clock = MonotonicClock::new();
    let before = clock.now_ns();
    std::thread::sleep(std::time::Duration::from_millis(1));
    assert!(clock.now_ns() > before);
}
