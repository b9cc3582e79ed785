//! Monitor configuration: device naming and event log sizing.

use serde::{Deserialize, Serialize};

use crate::core::{LogBound, OverflowPolicy};

/// Name of the control device.
pub const DEFAULT_DEVICE_NAME: &str = "sched_monitor";

/// Records reserved per session up front.
pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

/// Upper limit accepted for `initial_capacity`.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 20;

/// Root monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Control device name; the device path is `/dev/<device_name>`.
    pub device_name: String,
    /// Spare record nodes pre-allocated per session so steady-state callbacks do not allocate.
    pub initial_capacity: usize,
    /// Growth limit applied to every session's log.
    pub log_bound: LogBound,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.into(),
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            log_bound: LogBound::Unbounded,
        }
    }
}

impl MonitorConfig {
    /// Device path derived from the device name.
    #[must_use]
    pub fn device_path(&self) -> String {
        format!("/dev/{}", self.device_name)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// A description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.device_name.is_empty() {
            return Err("device_name must not be empty".into());
        }
        if self.device_name.contains('/') {
            return Err("device_name must not contain '/'".into());
        }
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(format!(
                "initial_capacity must be at most {MAX_INITIAL_CAPACITY}"
            ));
        }
        if let LogBound::Bounded { max_entries: 0, .. } = self.log_bound {
            return Err("max_entries must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env` file
    /// first when one is present.
    ///
    /// Recognised variables: `SCHED_MONITOR_DEVICE_NAME`,
    /// `SCHED_MONITOR_INITIAL_CAPACITY`, `SCHED_MONITOR_MAX_ENTRIES` and
    /// `SCHED_MONITOR_OVERFLOW` (`drop_newest` or `evict_oldest`).
    ///
    /// # Errors
    ///
    /// Malformed values or validation failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, starting from defaults.
    ///
    /// # Errors
    ///
    /// Malformed values or validation failure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(name) = lookup("SCHED_MONITOR_DEVICE_NAME") {
            cfg.device_name = name;
        }
        if let Some(raw) = lookup("SCHED_MONITOR_INITIAL_CAPACITY") {
            cfg.initial_capacity = raw
                .parse()
                .map_err(|e| format!("SCHED_MONITOR_INITIAL_CAPACITY: {e}"))?;
        }
        let overflow = match lookup("SCHED_MONITOR_OVERFLOW").as_deref() {
            None | Some("drop_newest") => OverflowPolicy::DropNewest,
            Some("evict_oldest") => OverflowPolicy::EvictOldest,
            Some(other) => return Err(format!("SCHED_MONITOR_OVERFLOW: unknown policy `{other}`")),
        };
        if let Some(raw) = lookup("SCHED_MONITOR_MAX_ENTRIES") {
            let max_entries = raw
                .parse()
                .map_err(|e| format!("SCHED_MONITOR_MAX_ENTRIES: {e}"))?;
            cfg.log_bound = LogBound::Bounded {
                max_entries,
                overflow,
            };
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid_and_unbounded() {
        let cfg = MonitorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.log_bound, LogBound::Unbounded);
        assert_eq!(cfg.device_path(), "/dev/sched_monitor");
    }

    #[test]
    fn test_zero_bound_rejected() {
        let cfg = MonitorConfig {
            log_bound: LogBound::Bounded {
                max_entries: 0,
                overflow: OverflowPolicy::EvictOldest,
            },
            ..MonitorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
