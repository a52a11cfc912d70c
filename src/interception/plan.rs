// src/interception/plan.rs
//! Declarative interception plans
//!
//! A plan is a list of [`InterceptionSpec`]s, usually read from the
//! `[[interceptions]]` tables of `HooksConfig`. Handlers are referenced by
//! name and looked up in a [`HandlerRegistry`] built in code.

use crate::interception::hooks::{AfterHook, BeforeHook};
use crate::interception::registrar::InterceptionRegistrar;
use crate::interception::rescue::RescueHandler;
use crate::interception::time_box::Fallback;
use crate::interception::{Interception, InterceptionKind};
use crate::utils::config::limit_from_secs;
use crate::utils::errors::{HookError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// One entry of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptionSpec {
    pub kind: InterceptionKind,

    /// Operations to wrap
    pub operations: Vec<String>,

    /// Time-box limit in seconds; falls back to `time_box.default_limit_secs`
    #[serde(default)]
    pub limit_secs: Option<f64>,

    /// Registry name of the handler (the fallback, for time-boxes)
    #[serde(default)]
    pub handler: Option<String>,
}

impl InterceptionSpec {
    pub fn new(kind: InterceptionKind, operations: &[&str]) -> Self {
        Self {
            kind,
            operations: operations.iter().map(|s| s.to_string()).collect(),
            limit_secs: None,
            handler: None,
        }
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_limit_secs(mut self, secs: f64) -> Self {
        self.limit_secs = Some(secs);
        self
    }
}

/// Named handlers a plan can refer to
pub struct HandlerRegistry<S> {
    fallbacks: HashMap<String, Fallback<S>>,
    rescuers: HashMap<String, RescueHandler<S>>,
    befores: HashMap<String, BeforeHook<S>>,
    afters: HashMap<String, AfterHook<S>>,
}

impl<S> Default for HandlerRegistry<S> {
    fn default() -> Self {
        Self {
            fallbacks: HashMap::new(),
            rescuers: HashMap::new(),
            befores: HashMap::new(),
            afters: HashMap::new(),
        }
    }
}

impl<S> HandlerRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallback(mut self, name: impl Into<String>, handler: Fallback<S>) -> Self {
        self.fallbacks.insert(name.into(), handler);
        self
    }

    pub fn rescue(mut self, name: impl Into<String>, handler: RescueHandler<S>) -> Self {
        self.rescuers.insert(name.into(), handler);
        self
    }

    pub fn before(mut self, name: impl Into<String>, hook: BeforeHook<S>) -> Self {
        self.befores.insert(name.into(), hook);
        self
    }

    pub fn after(mut self, name: impl Into<String>, hook: AfterHook<S>) -> Self {
        self.afters.insert(name.into(), hook);
        self
    }
}

fn lookup<T: Clone>(table: &HashMap<String, T>, kind: InterceptionKind, name: Option<&str>) -> Result<Option<T>> {
    match name {
        None => Ok(None),
        Some(name) => table
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| HookError::UnknownHandler {
                kind,
                name: name.to_string(),
            }),
    }
}

impl<S: Send + Sync + 'static> InterceptionRegistrar<S> {
    /// Apply every entry of `plan` in order.
    ///
    /// Entries are applied one at a time; an error stops the plan with the
    /// earlier entries already in place.
    pub fn apply_plan(&self, plan: &[InterceptionSpec], handlers: &HandlerRegistry<S>) -> Result<&Self> {
        for spec in plan {
            let names: Vec<&str> = spec.operations.iter().map(String::as_str).collect();
            let interception = self.resolve(spec, handlers)?;
            self.apply(&names, interception)?;
        }

        info!("Applied {} planned interceptions to {}", plan.len(), self.descriptor().name());
        Ok(self)
    }

    fn resolve(&self, spec: &InterceptionSpec, handlers: &HandlerRegistry<S>) -> Result<Interception<S>> {
        let kind = spec.kind;
        let name = spec.handler.as_deref();

        let interception = match kind {
            InterceptionKind::TimeBox => {
                let limit = match spec.limit_secs {
                    Some(secs) => limit_from_secs(secs)?,
                    None => self.settings().default_limit()?,
                };
                Interception::TimeBox {
                    limit,
                    fallback: lookup(&handlers.fallbacks, kind, name)?,
                    policy: self.settings().cancel_policy,
                }
            }
            InterceptionKind::Rescue => {
                Interception::Rescue(lookup(&handlers.rescuers, kind, name)?)
            }
            InterceptionKind::Before => {
                Interception::Before(lookup(&handlers.befores, kind, name)?)
            }
            InterceptionKind::After => {
                Interception::After(lookup(&handlers.afters, kind, name)?)
            }
        };

        Ok(interception)
    }
}
