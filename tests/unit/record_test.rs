//! Tests for records and the wire layout

use sched_monitor::core::{PreemptionInfo, TaskName, TASK_NAME_LEN, WIRE_SIZE};

#[test]
fn test_wire_size_matches_packed_fields() {
    assert_eq!(WIRE_SIZE, 4 + 8 + 8 + TASK_NAME_LEN);
}

#[test]
fn test_decode_rejects_short_buffer() {
    assert!(PreemptionInfo::from_bytes(&[0u8; WIRE_SIZE - 1]).is_err());
}

#[test]
fn test_task_name_serializes_as_string() {
    let info = PreemptionInfo {
        cpu: 1,
        time_on: 2,
        time_off: 3,
        preempted_by: TaskName::new("kworker/0:1"),
    };
    let json = serde_json::to_value(info).unwrap();
    assert_eq!(json["preempted_by"], "kworker/0:1");
    assert_eq!(json["cpu"], 1);

    let back: PreemptionInfo = serde_json::from_value(json).unwrap();
    assert_eq!(back, info);
}

#[test]
fn test_task_name_display() {
    assert_eq!(TaskName::new("fibonacci").to_string(), "fibonacci");
    assert_eq!(TaskName::default().to_string(), "");
}
