// src/utils/mod.rs
//! Shared error and configuration types

pub mod config;
pub mod errors;

pub use self::config::{HooksConfig, LogFormat, LoggingSettings, TimeBoxSettings};
pub use self::errors::{CallOrigin, HookError, Result, TimeoutExceeded};
