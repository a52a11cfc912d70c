// src/descriptor/type_descriptor.rs
//! Named table of operations
//!
//! A `TypeDescriptor` plays the role of a class: it maps operation names to
//! their current implementation and hands out [`Instance`]s that dispatch
//! through that table. Rebinding a name is visible to every instance,
//! including ones created before the rebind.

use crate::descriptor::instance::Instance;
use crate::descriptor::operation::Operation;
use crate::utils::errors::{HookError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of `name -> implementation` for one type
pub struct TypeDescriptor<S> {
    name: String,
    operations: DashMap<String, Operation<S>>,
}

impl<S: Send + Sync + 'static> TypeDescriptor<S> {
    /// Create an empty descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind `name` to `op`, replacing any existing binding
    pub fn define(&self, name: impl Into<String>, op: Operation<S>) -> &Self {
        let name = name.into();
        debug!("Defining {}#{}", self.name, name);
        self.operations.insert(name, op);
        self
    }

    /// Current implementation bound to `name`.
    ///
    /// The returned handle stays valid even if the name is rebound
    /// afterwards.
    pub fn resolve(&self, name: &str) -> Result<Operation<S>> {
        self.operations
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| self.unknown(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Names of all bound operations, sorted
    pub fn operation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.operations.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Replace the binding for `name` with `wrap(current)`.
    ///
    /// Read and write happen under the entry's shard lock, so two concurrent
    /// rebinds of the same name both land. `wrap` must not touch this
    /// descriptor.
    pub fn rebind<F>(&self, name: &str, wrap: F) -> Result<()>
    where
        F: FnOnce(Operation<S>) -> Operation<S>,
    {
        match self.operations.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                let current = Arc::clone(entry.get());
                entry.insert(wrap(current));
                Ok(())
            }
            Entry::Vacant(_) => Err(self.unknown(name)),
        }
    }

    /// Create an instance of this type holding `state`
    pub fn instantiate(self: &Arc<Self>, state: S) -> Instance<S> {
        Instance::new(Arc::clone(self), state)
    }

    pub(crate) fn unknown(&self, operation: &str) -> HookError {
        HookError::UnknownOperation {
            type_name: self.name.clone(),
            operation: operation.to_string(),
        }
    }
}
