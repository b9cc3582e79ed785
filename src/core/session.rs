//! Monitoring sessions: lifecycle, control and consumption.
//!
//! A [`Session`] binds one tracked context to a [`Tracker`] and a
//! [`NotifierHub`]. Enabling subscribes the tracker to the context's scheduling
//! transitions; disabling unsubscribes it synchronously. Records are consumed
//! one at a time with [`Session::read_one`] or, for raw transports,
//! [`Session::read_into`].
//!
//! Dropping a session (or calling [`Session::destroy`]) disables it if needed,
//! then drains whatever the consumer never retrieved into the operator log.
//! Because `destroy` takes the session by value it cannot overlap a read on the
//! same session.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::core::record::check_size;
use crate::core::{
    ContextId, EventLog, EventRecord, MonitorError, NotifierHub, PreemptNotifier, PreemptionInfo,
    SlotPool, SubscriptionHandle, Tracker, TrackerStats,
};
use crate::sync::Mutex;
use crate::util::clock::Clock;

/// Outcome of [`Session::enable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnableStatus {
    /// A new subscription was made.
    Enabled,
    /// Tracking was already on; nothing changed.
    AlreadyEnabled,
}

/// Outcome of [`Session::disable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisableStatus {
    /// The subscription was removed.
    Disabled,
    /// Tracking was not on; nothing changed.
    NotEnabled,
}

/// Summary of a session teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    /// Records discarded without being retrieved.
    pub drained: usize,
    /// How many of those were still open.
    pub open: usize,
    /// Whether teardown had to disable tracking first.
    pub was_enabled: bool,
}

#[derive(Debug, Default)]
struct ControlState {
    subscription: Option<SubscriptionHandle>,
}

/// Monitoring state for one tracked execution context.
pub struct Session {
    id: Uuid,
    context: ContextId,
    tracker: Arc<Tracker>,
    hub: Arc<dyn NotifierHub>,
    control: Mutex<ControlState>,
    torn_down: bool,
}

impl Session {
    /// Create a disabled session for `context` with an empty log.
    ///
    /// # Errors
    ///
    /// [`MonitorError::Config`] if `config` does not validate.
    pub fn create(
        context: ContextId,
        hub: Arc<dyn NotifierHub>,
        clock: Arc<dyn Clock>,
        config: &MonitorConfig,
    ) -> Result<Self, MonitorError> {
        config.validate().map_err(MonitorError::Config)?;
        let id = Uuid::new_v4();
        let log = EventLog::new(config.log_bound);
        let spares = SlotPool::with_capacity(config.initial_capacity);
        debug!(session = %id, context, "session created");
        Ok(Self {
            id,
            context,
            tracker: Arc::new(Tracker::new(id, log, spares, clock)),
            hub,
            control: Mutex::new(ControlState::default()),
            torn_down: false,
        })
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Context this session tracks.
    #[must_use]
    pub const fn context(&self) -> ContextId {
        self.context
    }

    /// Whether a live subscription exists.
    pub fn is_enabled(&self) -> bool {
        self.control.lock().subscription.is_some()
    }

    /// Start receiving scheduling callbacks.
    ///
    /// # Errors
    ///
    /// The hub's subscribe error, verbatim.
    pub fn enable(&self) -> Result<EnableStatus, MonitorError> {
        let mut control = self.control.lock();
        if control.subscription.is_some() {
            warn!(session = %self.id, context = self.context, "tracking already enabled");
            return Ok(EnableStatus::AlreadyEnabled);
        }
        let notifier: Arc<dyn PreemptNotifier> = self.tracker.clone();
        let handle = self.hub.subscribe(self.context, notifier)?;
        control.subscription = Some(handle);
        debug!(session = %self.id, context = self.context, subscription = handle.id, "tracking enabled");
        Ok(EnableStatus::Enabled)
    }

    /// Stop receiving scheduling callbacks. When this returns no callback for
    /// this session is running or will run.
    pub fn disable(&self) -> DisableStatus {
        let mut control = self.control.lock();
        let Some(handle) = control.subscription.take() else {
            warn!(session = %self.id, context = self.context, "tracking not enabled");
            return DisableStatus::NotEnabled;
        };
        self.hub.unsubscribe(handle);
        debug!(session = %self.id, context = self.context, subscription = handle.id, "tracking disabled");
        DisableStatus::Disabled
    }

    /// Retrieve the oldest completed record, or `None` when nothing is ready.
    pub fn read_one(&self) -> Option<PreemptionInfo> {
        let info = self.tracker.read_one();
        if info.is_none() {
            debug!(session = %self.id, "no completed record to read");
        }
        info
    }

    /// Retrieve one record into `buf` in wire layout.
    ///
    /// Returns the number of bytes written: a full record, or `0` when nothing
    /// is ready.
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidSize`] unless `buf` is exactly one record wide;
    /// the log is untouched in that case.
    pub fn read_into(&self, buf: &mut [u8]) -> Result<usize, MonitorError> {
        check_size(buf.len())?;
        match self.read_one() {
            Some(info) => info.write_to(buf),
            None => Ok(0),
        }
    }

    /// Copy of the records currently held, oldest first.
    pub fn pending(&self) -> Vec<EventRecord> {
        self.tracker.snapshot()
    }

    /// Counter snapshot for this session.
    pub fn stats(&self) -> TrackerStats {
        self.tracker.stats()
    }

    /// Tear the session down and report what was discarded.
    pub fn destroy(mut self) -> DrainReport {
        self.teardown()
    }

    fn teardown(&mut self) -> DrainReport {
        self.torn_down = true;
        let was_enabled = self.is_enabled() && self.disable() == DisableStatus::Disabled;

        let records = self.tracker.drain();
        let mut report = DrainReport {
            drained: records.len(),
            open: 0,
            was_enabled,
        };
        let mut iter = records.iter().peekable();
        while let Some(rec) = iter.next() {
            if rec.is_open() {
                report.open += 1;
            }
            info!(
                session = %self.id,
                off_at = rec.scheduled_off_at(),
                on_at = ?rec.scheduled_on_at(),
                "scheduled off"
            );
            let successor = iter.peek().filter(|_| !rec.successor_lost());
            if let (Some(next), Some(on_at)) = (successor, rec.scheduled_on_at()) {
                info!(
                    session = %self.id,
                    on_at,
                    next_off_at = next.scheduled_off_at(),
                    core = ?rec.core(),
                    "scheduled on"
                );
            }
            info!(session = %self.id, preempted_by = %rec.preempted_by(), "preempted");
        }
        drop(records);

        debug!(session = %self.id, context = self.context, drained = report.drained, "session destroyed");
        report
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.torn_down {
            self.teardown();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("context", &self.context)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
