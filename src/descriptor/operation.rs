// src/descriptor/operation.rs
//! Operation values and the per-call invocation context

use crate::descriptor::instance::Instance;
use crate::utils::errors::Result;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Argument and result values
pub type Value = serde_json::Value;

/// Optional trailing callback passed alongside the positional arguments
pub type Callback = Arc<dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync>;

/// Future returned by every operation
pub type OpFuture = BoxFuture<'static, Result<Value>>;

/// A bound operation implementation.
///
/// Implementations are never mutated once built; wrapping produces a new
/// `Operation` that owns the previous one.
pub type Operation<S> = Arc<dyn Fn(Invocation<S>) -> OpFuture + Send + Sync>;

/// Build an [`Operation`] from an async closure
pub fn operation<S, F, Fut>(f: F) -> Operation<S>
where
    S: Send + Sync + 'static,
    F: Fn(Invocation<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move |invocation: Invocation<S>| -> OpFuture { Box::pin(f(invocation)) })
}

/// Build a [`Callback`] from a closure
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Everything a single call carries through the wrapper chain
pub struct Invocation<S> {
    /// Receiving instance
    pub receiver: Instance<S>,

    /// Name the call was dispatched under
    pub operation: Arc<str>,

    /// Positional arguments
    pub args: Vec<Value>,

    /// Trailing callback, if the caller supplied one
    pub callback: Option<Callback>,

    /// Cancelled when a surrounding time-box gives up on this call.
    /// Long-running operations should observe it.
    pub cancellation: CancellationToken,
}

impl<S> Invocation<S> {
    pub fn new(receiver: Instance<S>, operation: impl Into<Arc<str>>, args: Vec<Value>) -> Self {
        Self {
            receiver,
            operation: operation.into(),
            args,
            callback: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_callback(mut self, callback: Option<Callback>) -> Self {
        self.callback = callback;
        self
    }

    /// Positional argument by index
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Invoke the trailing callback, failing if none was passed
    pub fn yield_to(&self, args: Vec<Value>) -> Result<Value> {
        match &self.callback {
            Some(callback) => callback(args),
            None => Err(anyhow::anyhow!("no callback given to `{}`", self.operation).into()),
        }
    }
}

impl<S> std::fmt::Debug for Invocation<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("operation", &self.operation)
            .field("args", &self.args)
            .field("callback", &self.callback.is_some())
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}
