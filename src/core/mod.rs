//! Tracking engine: records, the event log, callbacks, sessions.

pub mod error;
pub mod event_log;
pub mod notifier;
pub mod record;
pub mod session;
pub mod tracker;

pub use error::{AppResult, MonitorError};
pub use event_log::{
    AppendOutcome, CloseOutcome, EventLog, LogBound, OverflowPolicy, RecordSlot, SlotPool,
};
pub use notifier::{ContextId, NotifierHub, PreemptNotifier, SubscriptionHandle};
pub use record::{EventRecord, PreemptionInfo, RecordState, TaskName, TASK_NAME_LEN, WIRE_SIZE};
pub use session::{DisableStatus, DrainReport, EnableStatus, Session};
pub use tracker::{Tracker, TrackerStats};
