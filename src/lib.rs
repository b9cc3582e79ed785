//! # Sched Monitor
//!
//! A per-process scheduling event monitor.
//!
//! A monitoring [`Session`](core::Session) observes one execution context and
//! records every time it is taken off a processor and put back on: when it
//! happened, which context took the processor, and which core it resumed on.
//! Consumers read the history back one record at a time as a derived
//! [`PreemptionInfo`](core::PreemptionInfo): how long the context was off the
//! processor and how long it then ran before the next preemption.
//!
//! ## Key Features
//!
//! - **Non-blocking callbacks**: scheduler hooks touch the log under a
//!   per-session spin lock with O(1) critical sections
//! - **Synchronous disable**: once tracking is disabled no callback is in flight
//! - **Single-record reads**: a fixed 36-byte packed record per transfer
//! - **Owned event log**: records are released only by retrieval or teardown
//! - **Optional bound**: unbounded by default, with drop-newest or evict-oldest
//!   policies for long-running sessions
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use sched_monitor::config::MonitorConfig;
//! use sched_monitor::core::{EnableStatus, Session};
//! use sched_monitor::infra::InProcessHub;
//! use sched_monitor::util::clock::ManualClock;
//!
//! let hub = Arc::new(InProcessHub::new());
//! let clock = Arc::new(ManualClock::new(0));
//! let session = Session::create(1, hub.clone(), clock.clone(), &MonitorConfig::default()).unwrap();
//! assert_eq!(session.enable(), Ok(EnableStatus::Enabled));
//!
//! hub.sched_out(1, "B");
//! clock.set(100);
//! hub.sched_in(1, 2);
//! session.disable();
//!
//! let info = session.read_one().unwrap();
//! assert_eq!((info.cpu, info.time_off, info.time_on), (2, 100, 0));
//! assert!(session.read_one().is_none());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Tracking engine: records, event log, callbacks and sessions.
pub mod core;
/// Configuration models for the device and event logs.
pub mod config;
/// Builders to construct monitor components from configuration.
pub mod builders;
/// Notification hub implementations.
pub mod infra;
/// Control channel and simulated scheduler.
pub mod runtime;
/// Locks used by the tracking engine.
pub mod sync;
/// Shared utilities.
pub mod util;

/// Name the control device registers under.
pub const MODULE_NAME: &str = "sched_monitor";

/// Path of the control device.
pub const DEV_NAME: &str = "/dev/sched_monitor";
