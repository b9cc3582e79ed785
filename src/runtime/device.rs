//! Control channel: a device-style surface over sessions.
//!
//! [`MonitorDevice`] mirrors a character device. `open` creates a session bound
//! to the calling context and returns a handle, `ioctl` toggles tracking with the
//! command codes below, `read` transfers exactly one packed record (or nothing),
//! and `close` destroys the session.
//!
//! ```
//! use std::sync::Arc;
//! use sched_monitor::config::MonitorConfig;
//! use sched_monitor::infra::InProcessHub;
//! use sched_monitor::runtime::{ControlReply, MonitorDevice, ENABLE_TRACKING};
//! use sched_monitor::util::clock::MonotonicClock;
//!
//! let hub = Arc::new(InProcessHub::new());
//! let device = MonitorDevice::new(MonitorConfig::default(), hub, Arc::new(MonotonicClock::new()));
//! let fd = device.open(1).unwrap();
//! assert_eq!(device.ioctl(fd, ENABLE_TRACKING), Ok(ControlReply::Enabled));
//! device.close(fd).unwrap();
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::core::{
    ContextId, DisableStatus, EnableStatus, MonitorError, NotifierHub, Session, TrackerStats,
};
use crate::sync::RwLock;
use crate::util::clock::Clock;

/// Command code that enables tracking.
pub const ENABLE_TRACKING: u32 = 0xdead_beef;

/// Command code that disables tracking.
pub const DISABLE_TRACKING: u32 = 0xdead_dead;

/// Opaque handle for an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionHandle(u64);

impl SessionHandle {
    /// Raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Start tracking.
    Enable,
    /// Stop tracking.
    Disable,
}

impl TryFrom<u32> for ControlCommand {
    type Error = MonitorError;

    fn try_from(cmd: u32) -> Result<Self, Self::Error> {
        match cmd {
            ENABLE_TRACKING => Ok(Self::Enable),
            DISABLE_TRACKING => Ok(Self::Disable),
            other => Err(MonitorError::Unsupported(other)),
        }
    }
}

/// Status returned by a successful control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlReply {
    /// Tracking switched on.
    Enabled,
    /// Tracking was already on.
    AlreadyEnabled,
    /// Tracking switched off.
    Disabled,
    /// Tracking was not on.
    NotEnabled,
}

impl From<EnableStatus> for ControlReply {
    fn from(status: EnableStatus) -> Self {
        match status {
            EnableStatus::Enabled => Self::Enabled,
            EnableStatus::AlreadyEnabled => Self::AlreadyEnabled,
        }
    }
}

impl From<DisableStatus> for ControlReply {
    fn from(status: DisableStatus) -> Self {
        match status {
            DisableStatus::Disabled => Self::Disabled,
            DisableStatus::NotEnabled => Self::NotEnabled,
        }
    }
}

/// Session host exposing open / ioctl / read / close.
pub struct MonitorDevice {
    config: MonitorConfig,
    hub: Arc<dyn NotifierHub>,
    clock: Arc<dyn Clock>,
    sessions: RwLock<HashMap<SessionHandle, Arc<Session>>>,
    next_handle: AtomicU64,
}

impl MonitorDevice {
    /// Device with no open sessions.
    pub fn new(config: MonitorConfig, hub: Arc<dyn NotifierHub>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            hub,
            clock,
            sessions: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(3),
        }
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.config.device_name
    }

    /// Device configuration.
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Number of open sessions.
    pub fn open_sessions(&self) -> usize {
        self.sessions.read().len()
    }

    /// Open a session tracking `context`.
    ///
    /// # Errors
    ///
    /// [`MonitorError::Config`] when the device configuration does not validate.
    pub fn open(&self, context: ContextId) -> Result<SessionHandle, MonitorError> {
        let session = Session::create(context, self.hub.clone(), self.clock.clone(), &self.config)
            .inspect_err(|e| warn!(context, error = %e, "failed to create session"))?;
        let handle = SessionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        debug!(context, handle = %handle, session = %session.id(), "opened {}", self.config.device_path());
        self.sessions.write().insert(handle, Arc::new(session));
        Ok(handle)
    }

    /// Apply a control command to a session.
    ///
    /// # Errors
    ///
    /// [`MonitorError::BadHandle`], [`MonitorError::Unsupported`] for unknown
    /// codes, or the hub's subscribe error.
    pub fn ioctl(&self, handle: SessionHandle, cmd: u32) -> Result<ControlReply, MonitorError> {
        let session = self.session(handle)?;
        let command = ControlCommand::try_from(cmd)
            .inspect_err(|_| warn!(handle = %handle, cmd = %format!("{cmd:#x}"), "no such ioctl"))?;
        match command {
            ControlCommand::Enable => session.enable().map(ControlReply::from),
            ControlCommand::Disable => Ok(session.disable().into()),
        }
    }

    /// Transfer one record into `buf`. Returns bytes written, `0` when empty.
    ///
    /// # Errors
    ///
    /// [`MonitorError::BadHandle`] or [`MonitorError::InvalidSize`].
    pub fn read(&self, handle: SessionHandle, buf: &mut [u8]) -> Result<usize, MonitorError> {
        self.session(handle)?.read_into(buf)
    }

    /// Counter snapshot for a session.
    ///
    /// # Errors
    ///
    /// [`MonitorError::BadHandle`].
    pub fn stats(&self, handle: SessionHandle) -> Result<TrackerStats, MonitorError> {
        Ok(self.session(handle)?.stats())
    }

    /// Close a session. Teardown runs once no read on it is still in progress.
    ///
    /// # Errors
    ///
    /// [`MonitorError::BadHandle`].
    pub fn close(&self, handle: SessionHandle) -> Result<(), MonitorError> {
        let session = self
            .sessions
            .write()
            .remove(&handle)
            .ok_or(MonitorError::BadHandle(handle.raw()))?;
        debug!(handle = %handle, session = %session.id(), "closed {}", self.config.device_path());
        drop(session);
        Ok(())
    }

    fn session(&self, handle: SessionHandle) -> Result<Arc<Session>, MonitorError> {
        self.sessions
            .read()
            .get(&handle)
            .cloned()
            .ok_or(MonitorError::BadHandle(handle.raw()))
    }
}

impl fmt::Debug for MonitorDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorDevice")
            .field("name", &self.config.device_name)
            .field("open_sessions", &self.open_sessions())
            .finish_non_exhaustive()
    }
}
