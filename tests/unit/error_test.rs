//! Tests for error types

use sched_monitor::core::MonitorError;

#[test]
fn test_config_error() {
    let err = MonitorError::Config("max_entries must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: max_entries must be greater than 0"
    );
}

#[test]
fn test_invalid_size_error() {
    let err = MonitorError::InvalidSize {
        requested: 72,
        expected: 36,
    };
    assert_eq!(
        format!("{}", err),
        "invalid size: requested 72 bytes, expected 36"
    );
}

#[test]
fn test_unsupported_error() {
    let err = MonitorError::Unsupported(0x1234);
    assert_eq!(format!("{}", err), "unsupported operation: 0x1234");
}

#[test]
fn test_subscribe_failed_error() {
    let err = MonitorError::SubscribeFailed("hub is closed".to_string());
    assert_eq!(format!("{}", err), "subscribe failed: hub is closed");
}

#[test]
fn test_bad_handle_error() {
    let err = MonitorError::BadHandle(9);
    assert_eq!(format!("{}", err), "no such session handle: 9");
}
