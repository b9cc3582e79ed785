//! Event records and the derived record handed to consumers.
//!
//! An [`EventRecord`] describes one interval during which the tracked context
//! was off a processor. It is created open by the "scheduled off" callback and
//! closed by the following "scheduled in" callback. Consumers never see event
//! records directly: retrieval converts one closed record (plus the off time of
//! its successor, when known) into a [`PreemptionInfo`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::MonitorError;

/// Width of the fixed successor-name field, in bytes.
pub const TASK_NAME_LEN: usize = 16;

/// Size of one [`PreemptionInfo`] on the wire: `i32 + u64 + u64 + [u8; 16]`, packed.
pub const WIRE_SIZE: usize = 4 + 8 + 8 + TASK_NAME_LEN;

/// Fixed-width, NUL-padded name of an execution context.
///
/// Names built from text keep at most `TASK_NAME_LEN - 1` bytes so the field
/// always carries a terminating NUL, cut on a character boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct TaskName([u8; TASK_NAME_LEN]);

impl TaskName {
    /// Build a bounded copy of `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(TASK_NAME_LEN - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        let mut bytes = [0u8; TASK_NAME_LEN];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self(bytes)
    }

    /// Take the raw field as found on the wire.
    #[must_use]
    pub const fn from_raw(bytes: [u8; TASK_NAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw NUL-padded bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TASK_NAME_LEN] {
        &self.0
    }

    /// Text up to the first NUL. Invalid UTF-8 from a raw field is cut at the
    /// last valid character.
    #[must_use]
    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|b| *b == 0).unwrap_or(TASK_NAME_LEN);
        let text = &self.0[..len];
        match std::str::from_utf8(text) {
            Ok(s) => s,
            Err(e) => std::str::from_utf8(&text[..e.valid_up_to()]).unwrap_or_default(),
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskName({:?})", self.as_str())
    }
}

impl From<&str> for TaskName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TaskName {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<TaskName> for String {
    fn from(name: TaskName) -> Self {
        name.as_str().to_owned()
    }
}

/// Lifecycle state of an [`EventRecord`] while it sits in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Descheduled, not yet put back on a processor.
    Open,
    /// Both timestamps and the core are known.
    Closed,
}

/// One descheduled interval of a tracked context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    core: Option<i32>,
    scheduled_off_at: u64,
    scheduled_on_at: Option<u64>,
    preempted_by: TaskName,
    successor_lost: bool,
}

impl EventRecord {
    /// Create an open record for a context taken off a processor at `off_at`.
    #[must_use]
    pub const fn open(off_at: u64, preempted_by: TaskName) -> Self {
        Self {
            core: None,
            scheduled_off_at: off_at,
            scheduled_on_at: None,
            preempted_by,
            successor_lost: false,
        }
    }

    /// Complete the record. Returns `false` and leaves it untouched if it was
    /// already closed.
    pub fn close(&mut self, core: i32, on_at: u64) -> bool {
        if self.scheduled_on_at.is_some() {
            return false;
        }
        self.core = Some(core);
        self.scheduled_on_at = Some(on_at);
        true
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RecordState {
        if self.scheduled_on_at.is_some() {
            RecordState::Closed
        } else {
            RecordState::Open
        }
    }

    /// Whether the record is still waiting for its "scheduled in".
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.scheduled_on_at.is_none()
    }

    /// Processor the context was put back on, once closed.
    #[must_use]
    pub const fn core(&self) -> Option<i32> {
        self.core
    }

    /// Time the context was taken off a processor (ns).
    #[must_use]
    pub const fn scheduled_off_at(&self) -> u64 {
        self.scheduled_off_at
    }

    /// Time the context was put back on a processor (ns), once closed.
    #[must_use]
    pub const fn scheduled_on_at(&self) -> Option<u64> {
        self.scheduled_on_at
    }

    /// Context that was granted the processor.
    #[must_use]
    pub const fn preempted_by(&self) -> &TaskName {
        &self.preempted_by
    }

    /// Whether the "off" event that followed this record was lost, leaving its
    /// run time unknown.
    #[must_use]
    pub const fn successor_lost(&self) -> bool {
        self.successor_lost
    }

    /// Note that the next "off" event was dropped.
    pub fn mark_successor_lost(&mut self) {
        self.successor_lost = true;
    }

    /// Off-processor duration, once closed.
    #[must_use]
    pub fn time_off(&self) -> Option<u64> {
        self.scheduled_on_at
            .map(|on| on.saturating_sub(self.scheduled_off_at))
    }
}

/// Derived record returned by one retrieval.
///
/// `time_on` is the run time that followed this off interval, known only once
/// the next "scheduled off" has been recorded; `0` means "still running or
/// unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreemptionInfo {
    /// Processor the context was put back on.
    pub cpu: i32,
    /// Nanoseconds spent running before the next preemption.
    pub time_on: u64,
    /// Nanoseconds spent off-processor.
    pub time_off: u64,
    /// Context that took the processor.
    pub preempted_by: TaskName,
}

impl PreemptionInfo {
    /// Encode into the packed wire layout (native byte order, no padding).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; WIRE_SIZE] {
        let mut out = [0u8; WIRE_SIZE];
        out[0..4].copy_from_slice(&self.cpu.to_ne_bytes());
        out[4..12].copy_from_slice(&self.time_on.to_ne_bytes());
        out[12..20].copy_from_slice(&self.time_off.to_ne_bytes());
        out[20..WIRE_SIZE].copy_from_slice(self.preempted_by.as_bytes());
        out
    }

    /// Copy the encoded record into `buf`, which must be exactly one record wide.
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidSize`] when `buf` is not [`WIRE_SIZE`] bytes.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, MonitorError> {
        check_size(buf.len())?;
        buf.copy_from_slice(&self.to_bytes());
        Ok(WIRE_SIZE)
    }

    /// Decode one record from its packed wire layout.
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidSize`] when `bytes` is not [`WIRE_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MonitorError> {
        check_size(bytes.len())?;
        Ok(Self {
            cpu: i32::from_ne_bytes(field(bytes, 0)),
            time_on: u64::from_ne_bytes(field(bytes, 4)),
            time_off: u64::from_ne_bytes(field(bytes, 12)),
            preempted_by: TaskName::from_raw(field(bytes, 20)),
        })
    }
}

/// Reject any transfer not sized for exactly one record.
///
/// # Errors
///
/// [`MonitorError::InvalidSize`] for every length other than [`WIRE_SIZE`].
pub fn check_size(requested: usize) -> Result<(), MonitorError> {
    if requested == WIRE_SIZE {
        Ok(())
    } else {
        Err(MonitorError::InvalidSize {
            requested,
            expected: WIRE_SIZE,
        })
    }
}

fn field<const N: usize>(bytes: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}
