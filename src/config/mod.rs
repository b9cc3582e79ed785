//! Configuration models for the monitor device and event logs.

pub mod monitor;

pub use monitor::MonitorConfig;
