// src/interception/hooks.rs
//! Before and after hooks

use crate::descriptor::{Instance, Invocation, OpFuture, Operation, Value};
use crate::utils::errors::Result;
use std::sync::Arc;

/// Observes a call before it runs. Sees the operation name, arguments and
/// callback; an `Err` aborts the call.
pub type BeforeHook<S> = Arc<dyn Fn(&Invocation<S>) -> Result<()> + Send + Sync>;

/// Receives the result of a call and returns the result the caller sees
pub type AfterHook<S> = Arc<dyn Fn(&Instance<S>, Value) -> Result<Value> + Send + Sync>;

pub fn before_hook<S, F>(f: F) -> BeforeHook<S>
where
    F: Fn(&Invocation<S>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn after_hook<S, F>(f: F) -> AfterHook<S>
where
    F: Fn(&Instance<S>, Value) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn wrap_before<S>(inner: Operation<S>, hook: BeforeHook<S>) -> Operation<S>
where
    S: Send + Sync + 'static,
{
    Arc::new(move |invocation: Invocation<S>| -> OpFuture {
        let inner = Arc::clone(&inner);
        let hook = Arc::clone(&hook);

        Box::pin(async move {
            hook(&invocation)?;
            inner(invocation).await
        })
    })
}

/// Predecessor errors skip the hook.
pub(crate) fn wrap_after<S>(inner: Operation<S>, hook: AfterHook<S>) -> Operation<S>
where
    S: Send + Sync + 'static,
{
    Arc::new(move |invocation: Invocation<S>| -> OpFuture {
        let inner = Arc::clone(&inner);
        let hook = Arc::clone(&hook);

        Box::pin(async move {
            let receiver = invocation.receiver.clone();
            let value = inner(invocation).await?;
            hook(&receiver, value)
        })
    })
}
