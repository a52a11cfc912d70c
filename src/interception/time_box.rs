// src/interception/time_box.rs
//! Time-boxed execution
//!
//! The wrapped operation runs on its own tokio task while the caller waits at
//! most `limit`. Only the wait is bounded: on expiry the inner invocation's
//! cancellation token is cancelled, and with [`CancelPolicy::Abort`] the task
//! is also aborted at its next `.await`. The same happens when the caller
//! drops the call before it settles. Synchronous work inside the operation is
//! never interrupted.

use crate::descriptor::{Instance, Invocation, OpFuture, Operation, Value};
use crate::utils::errors::{HookError, Result, TimeoutExceeded};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinError};
use tokio::time::Instant;
use tokio_util::sync::DropGuard;
use tracing::{debug, warn};

/// Handler invoked in place of a timed-out call
pub type Fallback<S> = Arc<dyn Fn(&Instance<S>, TimeoutExceeded) -> Result<Value> + Send + Sync>;

/// Build a [`Fallback`] from a closure
pub fn fallback<S, F>(f: F) -> Fallback<S>
where
    F: Fn(&Instance<S>, TimeoutExceeded) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Fate of the abandoned call once the caller stops waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Cancel the invocation's token and let the task finish on its own
    #[default]
    Cooperative,

    /// Cancel the token and abort the task
    Abort,
}

/// Payload of a time-box wrapper
pub struct TimeBox<S> {
    pub limit: Duration,
    pub fallback: Option<Fallback<S>>,
    pub policy: CancelPolicy,
}

impl<S> Clone for TimeBox<S> {
    fn clone(&self) -> Self {
        Self {
            limit: self.limit,
            fallback: self.fallback.clone(),
            policy: self.policy,
        }
    }
}

/// Wrap `inner` so callers wait at most `settings.limit`
pub(crate) fn wrap<S>(inner: Operation<S>, settings: TimeBox<S>) -> Operation<S>
where
    S: Send + Sync + 'static,
{
    Arc::new(move |invocation: Invocation<S>| -> OpFuture {
        let inner = Arc::clone(&inner);
        let settings = settings.clone();

        Box::pin(async move {
            let receiver = invocation.receiver.clone();
            let operation = Arc::clone(&invocation.operation);
            let token = invocation.cancellation.child_token();
            let invocation = Invocation {
                cancellation: token.clone(),
                ..invocation
            };

            let started = Instant::now();
            let mut task = tokio::spawn(inner(invocation));
            let abandon = Abandon {
                cancel: Some(token.drop_guard()),
                abort: (settings.policy == CancelPolicy::Abort).then(|| task.abort_handle()),
            };

            match tokio::time::timeout(settings.limit, &mut task).await {
                Ok(joined) => {
                    abandon.disarm();
                    debug!("{} finished in {:?}", operation, started.elapsed());
                    joined.unwrap_or_else(|e| Err(join_failure(&operation, e)))
                }
                Err(_) => {
                    drop(abandon);

                    let expired = TimeoutExceeded::new(&*operation, settings.limit, started.elapsed());
                    metrics::counter!("method_hooks_timeouts_total", "operation" => operation.to_string())
                        .increment(1);

                    match &settings.fallback {
                        Some(fallback) => {
                            warn!("{} expired after {:?}, using fallback", operation, settings.limit);
                            metrics::counter!("method_hooks_fallbacks_total", "operation" => operation.to_string())
                                .increment(1);
                            fallback(&receiver, expired)
                        }
                        None => {
                            warn!("{} expired after {:?}", operation, settings.limit);
                            Err(HookError::TimeoutExceeded(expired))
                        }
                    }
                }
            }
        })
    })
}

/// Cancels the inner call, and aborts its task under
/// [`CancelPolicy::Abort`], once the waiting caller goes away without a result
struct Abandon {
    cancel: Option<DropGuard>,
    abort: Option<AbortHandle>,
}

impl Abandon {
    fn disarm(mut self) {
        self.abort = None;
        if let Some(guard) = self.cancel.take() {
            guard.disarm();
        }
    }
}

impl Drop for Abandon {
    fn drop(&mut self) {
        if let Some(handle) = self.abort.take() {
            handle.abort();
        }
    }
}

/// Panics are re-raised on the waiting caller; they are not interceptable.
fn join_failure(operation: &str, error: JoinError) -> HookError {
    match error.try_into_panic() {
        Ok(payload) => std::panic::resume_unwind(payload),
        Err(_) => HookError::Cancelled {
            operation: operation.to_string(),
        },
    }
}
