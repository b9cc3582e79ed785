//! Error types for monitor operations.

use thiserror::Error;

/// Errors produced by sessions, the control channel and configuration.
///
/// Benign outcomes (double enable, disable while idle, reading an empty log)
/// are reported through status values, not through this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// A retrieve request was not sized for exactly one record.
    #[error("invalid size: requested {requested} bytes, expected {expected}")]
    InvalidSize {
        /// Size the caller asked for.
        requested: usize,
        /// Size of one derived record.
        expected: usize,
    },
    /// Unknown control command.
    #[error("unsupported operation: {0:#x}")]
    Unsupported(u32),
    /// The notification hub refused the subscription.
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),
    /// No open session is bound to this handle.
    #[error("no such session handle: {0}")]
    BadHandle(u64),
    /// Configuration rejected during validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
