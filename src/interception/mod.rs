// src/interception/mod.rs
//! Operation interception layer
//!
//! Four wrapper kinds, each applied by name through [`InterceptionRegistrar`]:
//!
//! - **Time-box**: bound the caller's wait, answer with a fallback or
//!   `TimeoutExceeded` on expiry
//! - **Rescue**: replace a failure with a handler's result
//! - **Before**: observe name, arguments and callback before the call
//! - **After**: transform the result after the call
//!
//! # Layering
//!
//! ```text
//! registrar.time_box(..., &["fetch"], None)?;
//! registrar.rescue_on_fail(&["fetch"], handler)?;
//!
//! instance.call("fetch")
//!     └─ rescue            (applied last, outermost)
//!         └─ time_box
//!             └─ fetch     (original, untouched)
//! ```

pub mod hooks;
pub mod plan;
pub mod registrar;
pub mod rescue;
pub mod time_box;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// Re-export commonly used types
pub use hooks::{after_hook, before_hook, AfterHook, BeforeHook};
pub use plan::{HandlerRegistry, InterceptionSpec};
pub use registrar::InterceptionRegistrar;
pub use rescue::{rescue, RescueHandler};
pub use time_box::{fallback, CancelPolicy, Fallback, TimeBox};

/// The four wrapper kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptionKind {
    TimeBox,
    Rescue,
    Before,
    After,
}

impl InterceptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterceptionKind::TimeBox => "time_box",
            InterceptionKind::Rescue => "rescue",
            InterceptionKind::Before => "before",
            InterceptionKind::After => "after",
        }
    }

    /// Whether registering this kind without a handler is an error
    pub fn requires_handler(&self) -> bool {
        !matches!(self, InterceptionKind::TimeBox)
    }
}

impl fmt::Display for InterceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interception request with its payload.
///
/// Handlers are optional here so that a missing one can be reported as
/// `HandlerRequired` when the request is applied.
pub enum Interception<S> {
    TimeBox {
        limit: Duration,
        fallback: Option<Fallback<S>>,
        policy: CancelPolicy,
    },
    Rescue(Option<RescueHandler<S>>),
    Before(Option<BeforeHook<S>>),
    After(Option<AfterHook<S>>),
}

impl<S> Interception<S> {
    pub fn kind(&self) -> InterceptionKind {
        match self {
            Interception::TimeBox { .. } => InterceptionKind::TimeBox,
            Interception::Rescue(_) => InterceptionKind::Rescue,
            Interception::Before(_) => InterceptionKind::Before,
            Interception::After(_) => InterceptionKind::After,
        }
    }
}
