// src/descriptor/instance.rs
//! Instances dispatch calls through their descriptor

use crate::descriptor::operation::{Callback, Invocation, Value};
use crate::descriptor::type_descriptor::TypeDescriptor;
use crate::utils::errors::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Handle to one instance of a type.
///
/// Cloning is cheap and yields a handle to the same instance.
pub struct Instance<S> {
    inner: Arc<InstanceInner<S>>,
}

struct InstanceInner<S> {
    descriptor: Arc<TypeDescriptor<S>>,
    state: S,
}

impl<S> Clone for Instance<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Send + Sync + 'static> Instance<S> {
    pub fn new(descriptor: Arc<TypeDescriptor<S>>, state: S) -> Self {
        Self {
            inner: Arc::new(InstanceInner { descriptor, state }),
        }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor<S>> {
        &self.inner.descriptor
    }

    /// Instance state. Use interior mutability for state that handlers or
    /// operations need to change.
    pub fn state(&self) -> &S {
        &self.inner.state
    }

    /// Call `name` with positional arguments
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        self.call_with(name, args, None).await
    }

    /// Call `name` with positional arguments and an optional callback
    pub async fn call_with(
        &self,
        name: &str,
        args: Vec<Value>,
        callback: Option<Callback>,
    ) -> Result<Value> {
        self.dispatch(name, args, callback, CancellationToken::new()).await
    }

    /// Call `name` under an existing cancellation scope, e.g. from inside
    /// another operation that is itself time-boxed
    pub async fn dispatch(
        &self,
        name: &str,
        args: Vec<Value>,
        callback: Option<Callback>,
        cancellation: CancellationToken,
    ) -> Result<Value> {
        let op = self.inner.descriptor.resolve(name)?;
        let invocation = Invocation {
            receiver: self.clone(),
            operation: Arc::from(name),
            args,
            callback,
            cancellation,
        };
        op(invocation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::operation::{callback, operation};
    use crate::utils::errors::HookError;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct Counter {
        hits: Mutex<u64>,
    }

    fn counter_type() -> Arc<TypeDescriptor<Counter>> {
        let descriptor = Arc::new(TypeDescriptor::new("Counter"));
        descriptor.define(
            "bump",
            operation(|inv: Invocation<Counter>| async move {
                let by = inv.arg(0).and_then(Value::as_u64).unwrap_or(1);
                let mut hits = inv.receiver.state().hits.lock();
                *hits += by;
                Ok(json!(*hits))
            }),
        );
        descriptor.define(
            "each",
            operation(|inv: Invocation<Counter>| async move {
                let total: i64 = inv.args.iter().filter_map(Value::as_i64).sum();
                inv.yield_to(vec![json!(total)])
            }),
        );
        descriptor
    }

    #[tokio::test]
    async fn test_call_uses_instance_state() {
        let descriptor = counter_type();
        let a = descriptor.instantiate(Counter::default());
        let b = descriptor.instantiate(Counter::default());

        a.call("bump", vec![json!(2)]).await.unwrap();
        a.call("bump", vec![]).await.unwrap();
        b.call("bump", vec![]).await.unwrap();

        assert_eq!(*a.state().hits.lock(), 3);
        assert_eq!(*b.state().hits.lock(), 1);
    }

    #[tokio::test]
    async fn test_callback_is_forwarded() {
        let instance = counter_type().instantiate(Counter::default());
        let doubled = callback(|args| Ok(json!(args[0].as_i64().unwrap_or(0) * 2)));

        let result = instance
            .call_with("each", vec![json!(1), json!(2)], Some(doubled))
            .await
            .unwrap();
        assert_eq!(result, json!(6));
    }

    #[tokio::test]
    async fn test_missing_callback_fails() {
        let instance = counter_type().instantiate(Counter::default());
        let err = instance.call("each", vec![json!(1)]).await.unwrap_err();
        assert!(matches!(err, HookError::Operation(_)));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let instance = counter_type().instantiate(Counter::default());
        let err = instance.call("reset", vec![]).await.unwrap_err();
        assert_eq!(err.to_string(), "undefined operation `reset` for type `Counter`");
    }
}
