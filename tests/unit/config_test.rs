//! Tests for configuration validation

use std::collections::HashMap;

use sched_monitor::config::MonitorConfig;
use sched_monitor::core::{LogBound, OverflowPolicy};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_config_from_json_defaults() {
    let config = MonitorConfig::from_json_str("{}").unwrap();
    assert_eq!(config, MonitorConfig::default());
}

#[test]
fn test_config_from_json_bounded() {
    let json = r#"{
        "device_name": "preempt_mon",
        "initial_capacity": 128,
        "log_bound": {
            "mode": "bounded",
            "max_entries": 1024,
            "overflow": "evict_oldest"
        }
    }"#;

    let config = MonitorConfig::from_json_str(json).unwrap();
    assert_eq!(config.device_name, "preempt_mon");
    assert_eq!(config.initial_capacity, 128);
    assert_eq!(
        config.log_bound,
        LogBound::Bounded {
            max_entries: 1024,
            overflow: OverflowPolicy::EvictOldest,
        }
    );
}

#[test]
fn test_config_from_json_unbounded_tag() {
    let config = MonitorConfig::from_json_str(r#"{"log_bound": {"mode": "unbounded"}}"#).unwrap();
    assert_eq!(config.log_bound, LogBound::Unbounded);
}

#[test]
fn test_config_invalid_device_name() {
    let config = MonitorConfig {
        device_name: String::new(),
        ..MonitorConfig::default()
    };
    assert!(config.validate().is_err());

    let config = MonitorConfig {
        device_name: "a/b".into(),
        ..MonitorConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_config_invalid_capacity() {
    let config = MonitorConfig {
        initial_capacity: usize::MAX,
        ..MonitorConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_config_json_parse_error() {
    let err = MonitorConfig::from_json_str("{not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_config_from_lookup_empty_is_default() {
    let config = MonitorConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, MonitorConfig::default());
}

#[test]
fn test_config_from_lookup_bounded() {
    let config = MonitorConfig::from_lookup(lookup(&[
        ("SCHED_MONITOR_DEVICE_NAME", "mon"),
        ("SCHED_MONITOR_INITIAL_CAPACITY", "16"),
        ("SCHED_MONITOR_MAX_ENTRIES", "32768"),
        ("SCHED_MONITOR_OVERFLOW", "evict_oldest"),
    ]))
    .unwrap();
    assert_eq!(config.device_name, "mon");
    assert_eq!(config.initial_capacity, 16);
    assert_eq!(
        config.log_bound,
        LogBound::Bounded {
            max_entries: 32768,
            overflow: OverflowPolicy::EvictOldest,
        }
    );
}

#[test]
fn test_config_from_lookup_rejects_bad_values() {
    assert!(MonitorConfig::from_lookup(lookup(&[("SCHED_MONITOR_MAX_ENTRIES", "lots")])).is_err());
    assert!(MonitorConfig::from_lookup(lookup(&[("SCHED_MONITOR_MAX_ENTRIES", "0")])).is_err());
    assert!(MonitorConfig::from_lookup(lookup(&[("SCHED_MONITOR_OVERFLOW", "random")])).is_err());
}
