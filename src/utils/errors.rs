// src/utils/errors.rs
//! Error types for interception and dispatch
//!
//! Two failure kinds are part of the public contract and are meant to be
//! matched on by callers:
//!
//! - [`HookError::TimeoutExceeded`]: a time-boxed call expired and no fallback
//!   was configured
//! - [`HookError::HandlerRequired`]: a wrapper kind that needs a handler was
//!   registered without one
//!
//! Failures raised by the wrapped operations themselves travel as
//! [`HookError::Operation`] and pass through every layer untouched unless a
//! failure interceptor absorbs them.

use crate::interception::InterceptionKind;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, HookError>;

/// Errors produced while registering wrappers or dispatching calls
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    TimeoutExceeded(#[from] TimeoutExceeded),

    #[error("{kind} interception requires a handler")]
    HandlerRequired { kind: InterceptionKind },

    #[error("undefined operation `{operation}` for type `{type_name}`")]
    UnknownOperation { type_name: String, operation: String },

    #[error("no {kind} handler registered under `{name}`")]
    UnknownHandler { kind: InterceptionKind, name: String },

    #[error("operation `{operation}` was cancelled")]
    Cancelled { operation: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Operation(#[from] anyhow::Error),
}

impl HookError {
    /// True for a time-box expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, HookError::TimeoutExceeded(_))
    }

    /// True when a wrapper was registered without its mandatory handler
    pub fn is_handler_required(&self) -> bool {
        matches!(self, HookError::HandlerRequired { .. })
    }
}

/// Raised when a time-boxed operation does not finish within its limit.
///
/// Handed to the fallback handler when one is configured; otherwise returned
/// to the caller wrapped in [`HookError::TimeoutExceeded`].
#[derive(Debug, Clone, Error)]
#[error("`{operation}` {message} (limit {limit:?})")]
pub struct TimeoutExceeded {
    /// Operation that expired
    pub operation: String,

    /// Human readable description
    pub message: String,

    /// Configured limit
    pub limit: Duration,

    /// Time the caller actually waited
    pub elapsed: Duration,

    /// Where the expired call was waited on
    pub origin: CallOrigin,
}

impl TimeoutExceeded {
    pub(crate) const MESSAGE: &'static str = "execution expired";

    pub(crate) fn new(operation: impl Into<String>, limit: Duration, elapsed: Duration) -> Self {
        Self {
            operation: operation.into(),
            message: Self::MESSAGE.to_string(),
            limit,
            elapsed,
            origin: CallOrigin::capture(),
        }
    }
}

/// Captured calling context of an expired call.
///
/// Frames are only resolved when backtraces are enabled through
/// `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`.
#[derive(Clone)]
pub struct CallOrigin {
    backtrace: Arc<Backtrace>,
}

impl CallOrigin {
    pub(crate) fn capture() -> Self {
        Self {
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn is_captured(&self) -> bool {
        self.backtrace.status() == BacktraceStatus::Captured
    }

    /// Rendered frames, one entry per line of the backtrace
    pub fn frames(&self) -> Vec<String> {
        if !self.is_captured() {
            return Vec::new();
        }

        self.backtrace
            .to_string()
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl fmt::Debug for CallOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOrigin")
            .field("status", &self.backtrace.status())
            .finish()
    }
}
