//! Per-session tracking state shared with the scheduler callbacks.
//!
//! A [`Tracker`] is the part of a session the notification hub holds on to.
//! It owns the spin-locked [`EventLog`] and implements both callbacks plus the
//! single-record read path. Timestamps are taken and list nodes obtained before
//! the log lock is acquired; inside it records are only linked and unlinked.

use std::collections::LinkedList;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::core::{
    AppendOutcome, CloseOutcome, EventLog, EventRecord, PreemptNotifier, PreemptionInfo,
    RecordSlot, SlotPool, TaskName,
};
use crate::sync::SpinMutex;
use crate::util::clock::Clock;

/// Snapshot of a tracker's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    /// "Off" events appended to the log.
    pub recorded: u64,
    /// Records closed by a matching "in" event.
    pub completed: u64,
    /// Records handed to the consumer.
    pub retrieved: u64,
    /// "Off" events refused by a full log under `DropNewest`.
    pub rejected: u64,
    /// Records discarded under `EvictOldest`.
    pub evicted: u64,
    /// Open records replaced because their "in" event never arrived.
    pub superseded: u64,
    /// "In" events with no open record to complete.
    pub orphan_sched_in: u64,
    /// Records currently in the log.
    pub pending: usize,
    /// Pre-allocated nodes waiting to be reused.
    pub spare_slots: usize,
}

#[derive(Debug, Default)]
struct TrackerCounters {
    recorded: AtomicU64,
    completed: AtomicU64,
    retrieved: AtomicU64,
    rejected: AtomicU64,
    evicted: AtomicU64,
    superseded: AtomicU64,
    orphan_sched_in: AtomicU64,
}

impl TrackerCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, pending: usize, spare_slots: usize) -> TrackerStats {
        TrackerStats {
            recorded: self.recorded.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            retrieved: self.retrieved.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            orphan_sched_in: self.orphan_sched_in.load(Ordering::Relaxed),
            pending,
            spare_slots,
        }
    }
}

/// Event log plus the callbacks that feed it.
pub struct Tracker {
    session: Uuid,
    log: SpinMutex<EventLog>,
    spares: SpinMutex<SlotPool>,
    clock: Arc<dyn Clock>,
    counters: TrackerCounters,
}

impl Tracker {
    /// Wrap `log` for the session identified by `session`, feeding it from `spares`.
    pub fn new(session: Uuid, log: EventLog, spares: SlotPool, clock: Arc<dyn Clock>) -> Self {
        Self {
            session,
            log: SpinMutex::new(log),
            spares: SpinMutex::new(spares),
            clock,
            counters: TrackerCounters::default(),
        }
    }

    /// Session this tracker belongs to.
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session
    }

    /// The tracked context is being descheduled in favour of `successor`.
    pub fn on_scheduled_off(&self, successor: &str) {
        let name = TaskName::new(successor);
        let now = self.clock.now_ns();
        let record = EventRecord::open(now, name);

        let spare = self.spares.lock().take();
        let slot = match spare {
            Some(mut slot) => {
                slot.refill(record);
                slot
            }
            None => RecordSlot::new(record),
        };
        let outcome = self.log.lock().push(slot);

        match outcome {
            AppendOutcome::Appended {
                evicted,
                superseded,
            } => {
                TrackerCounters::bump(&self.counters.recorded);
                if let Some(slot) = evicted {
                    TrackerCounters::bump(&self.counters.evicted);
                    self.recycle(slot);
                }
                if let Some(stale) = superseded {
                    TrackerCounters::bump(&self.counters.superseded);
                    warn!(
                        session = %self.session,
                        off_at = ?stale.record().map(EventRecord::scheduled_off_at),
                        "scheduled off again before scheduled in; discarding open record"
                    );
                    self.recycle(stale);
                }
                trace!(session = %self.session, at = now, next = %name, "sched_out");
            }
            AppendOutcome::Rejected(slot) => {
                TrackerCounters::bump(&self.counters.rejected);
                debug!(session = %self.session, next = %name, "event log full; dropping newest event");
                self.recycle(slot);
            }
        }
    }

    /// The tracked context was put onto processor `cpu`.
    pub fn on_scheduled_in(&self, cpu: i32) {
        let now = self.clock.now_ns();
        let outcome = self.log.lock().close_tail(cpu, now);

        match outcome {
            CloseOutcome::Closed => {
                TrackerCounters::bump(&self.counters.completed);
                trace!(session = %self.session, at = now, cpu, "sched_in");
            }
            CloseOutcome::EmptyLog | CloseOutcome::NoOpenTail => {
                TrackerCounters::bump(&self.counters.orphan_sched_in);
                warn!(
                    session = %self.session,
                    cpu,
                    reason = ?outcome,
                    "sched_in without a preceding sched_out; ignoring"
                );
            }
        }
    }

    /// Pop the oldest completed record, if any. Never blocks on an empty log.
    pub fn read_one(&self) -> Option<PreemptionInfo> {
        let popped = self.log.lock().pop_completed();
        let (info, slot) = popped?;
        self.recycle(slot);
        TrackerCounters::bump(&self.counters.retrieved);
        Some(info)
    }

    /// Remove every record, oldest first.
    pub fn drain(&self) -> LinkedList<EventRecord> {
        self.log.lock().drain()
    }

    /// Copy of the records currently held, oldest first.
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.log.lock().iter().cloned().collect()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> TrackerStats {
        let pending = self.len();
        let spare_slots = self.spares.lock().len();
        self.counters.snapshot(pending, spare_slots)
    }

    fn recycle(&self, slot: RecordSlot) {
        // A surplus node is freed here, after the pool lock is released.
        let surplus = self.spares.lock().put(slot);
        drop(surplus);
    }
}

impl PreemptNotifier for Tracker {
    fn sched_in(&self, cpu: i32) {
        self.on_scheduled_in(cpu);
    }

    fn sched_out(&self, next: &str) {
        self.on_scheduled_off(next);
    }
}
