//! Tests for builders

use std::sync::Arc;

use sched_monitor::builders::{build_device, build_in_process};
use sched_monitor::config::MonitorConfig;
use sched_monitor::core::{LogBound, MonitorError, OverflowPolicy};
use sched_monitor::infra::InProcessHub;
use sched_monitor::util::ManualClock;

#[test]
fn test_build_device_rejects_invalid_config() {
    let cfg = MonitorConfig {
        log_bound: LogBound::Bounded {
            max_entries: 0,
            overflow: OverflowPolicy::DropNewest,
        },
        ..MonitorConfig::default()
    };
    let result = build_device(cfg, Arc::new(InProcessHub::new()), Arc::new(ManualClock::new(0)));
    assert!(matches!(result, Err(MonitorError::Config(_))));
}

#[test]
fn test_build_in_process() {
    let (device, hub) = build_in_process(MonitorConfig::default()).unwrap();
    assert_eq!(device.name(), "sched_monitor");
    assert_eq!(device.open_sessions(), 0);
    assert_eq!(hub.subscription_count(), 0);
}
