// src/interception/rescue.rs
//! Failure interception
//!
//! Any `HookError` coming out of the wrapped operation, a timeout from an
//! inner time-box included, is handed to the handler and its result replaces
//! the failure. Panics are not caught.

use crate::descriptor::{Instance, Invocation, OpFuture, Operation, Value};
use crate::utils::errors::{HookError, Result};
use std::sync::Arc;
use tracing::warn;

/// Handler invoked with the failure of the wrapped operation
pub type RescueHandler<S> = Arc<dyn Fn(&Instance<S>, HookError) -> Result<Value> + Send + Sync>;

/// Build a [`RescueHandler`] from a closure
pub fn rescue<S, F>(f: F) -> RescueHandler<S>
where
    F: Fn(&Instance<S>, HookError) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn wrap<S>(inner: Operation<S>, handler: RescueHandler<S>) -> Operation<S>
where
    S: Send + Sync + 'static,
{
    Arc::new(move |invocation: Invocation<S>| -> OpFuture {
        let inner = Arc::clone(&inner);
        let handler = Arc::clone(&handler);

        Box::pin(async move {
            let receiver = invocation.receiver.clone();
            let operation = Arc::clone(&invocation.operation);

            match inner(invocation).await {
                Ok(value) => Ok(value),
                Err(error) => {
                    warn!("Rescuing {} from: {}", operation, error);
                    metrics::counter!("method_hooks_rescued_total", "operation" => operation.to_string())
                        .increment(1);
                    handler(&receiver, error)
                }
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{operation, TypeDescriptor};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn instance_with(op: Operation<()>) -> Instance<()> {
        let descriptor = Arc::new(TypeDescriptor::new("Flaky"));
        descriptor.define("meth", op);
        descriptor.instantiate(())
    }

    #[tokio::test]
    async fn test_failure_is_absorbed() {
        let failing = operation(|_inv: Invocation<()>| async { Err(anyhow::anyhow!("connection reset").into()) });
        let handler = rescue(|_: &Instance<()>, error: HookError| Ok(json!(format!("rescued: {}", error))));

        let instance = instance_with(wrap(failing, handler));
        let result = instance.call("meth", vec![]).await.unwrap();

        assert_eq!(result, json!("rescued: connection reset"));
    }

    #[tokio::test]
    async fn test_success_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = {
            let calls = Arc::clone(&calls);
            rescue(move |_: &Instance<()>, _error: HookError| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!(null))
            })
        };

        let ok = operation(|inv: Invocation<()>| async move { Ok(json!(inv.args.len())) });
        let instance = instance_with(wrap(ok, handler));

        assert_eq!(instance.call("meth", vec![json!(1), json!(2)]).await.unwrap(), json!(2));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_may_fail() {
        let failing = operation(|_inv: Invocation<()>| async { Err(anyhow::anyhow!("first").into()) });
        let handler = rescue(|_: &Instance<()>, _error: HookError| Err(anyhow::anyhow!("second").into()));

        let instance = instance_with(wrap(failing, handler));
        let err = instance.call("meth", vec![]).await.unwrap_err();
        assert_eq!(err.to_string(), "second");
    }
}
