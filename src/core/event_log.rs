//! Ordered, owned log of event records for one session.
//!
//! The log is the sole owner of its records. Only the tail may be open; every
//! earlier record is closed. Records leave the log through [`EventLog::pop_completed`]
//! (consumer retrieval) or [`EventLog::drain`] (session teardown), nowhere else.
//!
//! Records live in list nodes. A node is allocated, or taken from a
//! [`SlotPool`], before the tracker takes its lock; the methods that run under
//! the lock only link and unlink nodes, so none of them allocate or free and
//! each is O(1). Unlinked nodes are handed back to the caller as
//! [`RecordSlot`]s to recycle or free once the lock is released.

use std::collections::LinkedList;

use serde::{Deserialize, Serialize};

use crate::core::{EventRecord, PreemptionInfo, TaskName};

/// What to do when a bounded log is full and a new "off" event arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Drop the incoming event; the log keeps its oldest history.
    DropNewest,
    /// Discard the oldest (closed) record to make room.
    EvictOldest,
}

/// Growth limit for an event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LogBound {
    /// No limit. A session that never reads grows without bound.
    #[default]
    Unbounded,
    /// At most `max_entries` records.
    Bounded {
        /// Maximum number of records held.
        max_entries: usize,
        /// Behaviour once the limit is reached.
        overflow: OverflowPolicy,
    },
}

/// A single list node holding one record, detached from any log.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSlot(LinkedList<EventRecord>);

impl RecordSlot {
    /// Allocate a node holding `record`.
    #[must_use]
    pub fn new(record: EventRecord) -> Self {
        let mut node = LinkedList::new();
        node.push_back(record);
        Self(node)
    }

    /// Replace the held record, reusing the node.
    pub fn refill(&mut self, record: EventRecord) {
        match self.0.front_mut() {
            Some(held) => *held = record,
            None => self.0.push_back(record),
        }
    }

    /// The held record.
    #[must_use]
    pub fn record(&self) -> Option<&EventRecord> {
        self.0.front()
    }
}

/// Spare nodes recycled between the read path and the callbacks, so a
/// steady-state session does not allocate per event.
#[derive(Debug, Default)]
pub struct SlotPool {
    spare: LinkedList<EventRecord>,
    limit: usize,
}

impl SlotPool {
    /// Pre-allocate `limit` spare nodes; the pool never holds more than that.
    #[must_use]
    pub fn with_capacity(limit: usize) -> Self {
        let spare = std::iter::repeat_n(EventRecord::open(0, TaskName::default()), limit).collect();
        Self { spare, limit }
    }

    /// Number of spare nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spare.len()
    }

    /// Whether no spare node is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spare.is_empty()
    }

    /// Take a spare node, if any.
    pub fn take(&mut self) -> Option<RecordSlot> {
        let len = self.spare.len();
        if len == 0 {
            return None;
        }
        Some(RecordSlot(self.spare.split_off(len - 1)))
    }

    /// Return a node to the pool. A full pool hands it back to be freed.
    pub fn put(&mut self, mut slot: RecordSlot) -> Option<RecordSlot> {
        if self.spare.len() >= self.limit {
            return Some(slot);
        }
        self.spare.append(&mut slot.0);
        None
    }
}

/// Result of appending an open record.
#[derive(Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The record was appended as the new tail.
    Appended {
        /// Oldest record discarded under [`OverflowPolicy::EvictOldest`].
        evicted: Option<RecordSlot>,
        /// Previous tail that was still open (its "scheduled in" was never seen).
        superseded: Option<RecordSlot>,
    },
    /// The log is full under [`OverflowPolicy::DropNewest`]; the slot comes back unused.
    Rejected(RecordSlot),
}

/// Result of completing the tail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The open tail was closed.
    Closed,
    /// Nothing has been recorded yet.
    EmptyLog,
    /// The tail is already closed, so there is no matching "off".
    NoOpenTail,
}

/// FIFO of event records, oldest at the head.
#[derive(Debug, Default)]
pub struct EventLog {
    records: LinkedList<EventRecord>,
    bound: LogBound,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub const fn new(bound: LogBound) -> Self {
        Self {
            records: LinkedList::new(),
            bound,
        }
    }

    /// Growth limit applied by this log.
    #[must_use]
    pub const fn bound(&self) -> LogBound {
        self.bound
    }

    /// Number of records held, open tail included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the tail is waiting for its "scheduled in".
    #[must_use]
    pub fn has_open_tail(&self) -> bool {
        self.records.back().is_some_and(EventRecord::is_open)
    }

    /// Iterate records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    /// Link `slot` in as the new open tail.
    ///
    /// Whenever an "off" event is lost (refused by a full log, or a stale open
    /// tail replaced) the record before it is marked so its run time reads as
    /// unknown instead of spanning the gap.
    pub fn push(&mut self, mut slot: RecordSlot) -> AppendOutcome {
        let stale_tail = self.has_open_tail();

        let mut evicted = None;
        if let LogBound::Bounded {
            max_entries,
            overflow,
        } = self.bound
        {
            let kept = self.records.len() - usize::from(stale_tail);
            if kept >= max_entries {
                match overflow {
                    OverflowPolicy::DropNewest => {
                        self.mark_tail_successor_lost();
                        return AppendOutcome::Rejected(slot);
                    }
                    OverflowPolicy::EvictOldest => evicted = self.detach_front(),
                }
            }
        }

        let superseded = if stale_tail {
            let stale = self.detach_back();
            self.mark_tail_successor_lost();
            stale
        } else {
            None
        };

        self.records.append(&mut slot.0);
        AppendOutcome::Appended {
            evicted,
            superseded,
        }
    }

    /// Close the open tail with the processor and time it resumed on.
    pub fn close_tail(&mut self, core: i32, on_at: u64) -> CloseOutcome {
        match self.records.back_mut() {
            None => CloseOutcome::EmptyLog,
            Some(tail) => {
                if tail.close(core, on_at) {
                    CloseOutcome::Closed
                } else {
                    CloseOutcome::NoOpenTail
                }
            }
        }
    }

    /// Unlink the oldest closed record and derive its consumer view.
    ///
    /// Returns `None` without touching the log when it is empty or when the
    /// head is still open.
    pub fn pop_completed(&mut self) -> Option<(PreemptionInfo, RecordSlot)> {
        let head = self.records.front()?;
        let on_at = head.scheduled_on_at()?;
        let time_on = if head.successor_lost() {
            0
        } else {
            self.records
                .iter()
                .nth(1)
                .map_or(0, |next| next.scheduled_off_at().saturating_sub(on_at))
        };
        let info = PreemptionInfo {
            cpu: head.core().unwrap_or_default(),
            time_on,
            time_off: on_at.saturating_sub(head.scheduled_off_at()),
            preempted_by: *head.preempted_by(),
        };
        let slot = self.detach_front()?;
        Some((info, slot))
    }

    /// Take every record out of the log, oldest first.
    pub fn drain(&mut self) -> LinkedList<EventRecord> {
        std::mem::take(&mut self.records)
    }

    fn detach_front(&mut self) -> Option<RecordSlot> {
        if self.records.is_empty() {
            return None;
        }
        let rest = self.records.split_off(1);
        Some(RecordSlot(std::mem::replace(&mut self.records, rest)))
    }

    fn detach_back(&mut self) -> Option<RecordSlot> {
        let len = self.records.len();
        if len == 0 {
            return None;
        }
        Some(RecordSlot(self.records.split_off(len - 1)))
    }

    fn mark_tail_successor_lost(&mut self) {
        if let Some(tail) = self.records.back_mut() {
            tail.mark_successor_lost();
        }
    }
}
