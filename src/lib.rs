// src/lib.rs
//! Method Hooks Library
//!
//! Wraps named operations with cross-cutting behavior without touching the
//! operations themselves.
//!
//! # Architecture
//!
//! - **descriptor**: type descriptors (`name -> operation` tables), instances
//!   and the per-call invocation context
//! - **interception**: time-box, rescue, before and after wrappers and the
//!   registrar that layers them onto a descriptor
//! - **observability**: tracing subscriber setup
//! - **utils**: errors and configuration
//!
//! # Example
//!
//! ```no_run
//! use method_hooks::descriptor::{operation, Instance, Invocation, TypeDescriptor};
//! use method_hooks::interception::{rescue, InterceptionRegistrar};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> method_hooks::Result<()> {
//! let client = Arc::new(TypeDescriptor::new("Client"));
//! client.define(
//!     "fetch",
//!     operation(|_inv: Invocation<()>| async {
//!         tokio::time::sleep(Duration::from_secs(5)).await;
//!         Ok(json!("payload"))
//!     }),
//! );
//!
//! InterceptionRegistrar::new(Arc::clone(&client))
//!     .time_box(Duration::from_millis(250), &["fetch"], None)?
//!     .rescue_on_fail(&["fetch"], rescue(|_: &Instance<()>, _err| Ok(json!(null))))?;
//!
//! let value = client.instantiate(()).call("fetch", vec![]).await?;
//! assert_eq!(value, json!(null));
//! # Ok(())
//! # }
//! ```

// Public module exports
pub mod descriptor;
pub mod interception;
pub mod observability;
pub mod utils;

// Re-export commonly used types
pub use descriptor::{Instance, Invocation, Operation, TypeDescriptor, Value};
pub use interception::{CancelPolicy, Interception, InterceptionKind, InterceptionRegistrar};
pub use utils::config::HooksConfig;
pub use utils::errors::{HookError, Result, TimeoutExceeded};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
