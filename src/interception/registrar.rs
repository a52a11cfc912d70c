// src/interception/registrar.rs
//! Registration of wrappers on a type descriptor
//!
//! Every registration reads the implementation currently bound to a name,
//! builds a wrapper closing over it and binds the wrapper in its place. Two
//! registrations on the same name therefore nest, the later one outermost.

use crate::descriptor::{Operation, TypeDescriptor};
use crate::interception::hooks::{self, AfterHook, BeforeHook};
use crate::interception::rescue::{self, RescueHandler};
use crate::interception::time_box::{self, CancelPolicy, Fallback, TimeBox};
use crate::interception::{Interception, InterceptionKind};
use crate::utils::config::TimeBoxSettings;
use crate::utils::errors::{HookError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Applies interceptions to the operations of one type
pub struct InterceptionRegistrar<S> {
    descriptor: Arc<TypeDescriptor<S>>,
    settings: TimeBoxSettings,
}

impl<S: Send + Sync + 'static> InterceptionRegistrar<S> {
    pub fn new(descriptor: Arc<TypeDescriptor<S>>) -> Self {
        Self::with_settings(descriptor, TimeBoxSettings::default())
    }

    pub fn with_settings(descriptor: Arc<TypeDescriptor<S>>, settings: TimeBoxSettings) -> Self {
        Self { descriptor, settings }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor<S>> {
        &self.descriptor
    }

    pub fn settings(&self) -> &TimeBoxSettings {
        &self.settings
    }

    /// Bound each named operation by `limit`, answering with `fallback` (or
    /// `TimeoutExceeded`) when it expires
    pub fn time_box(
        &self,
        limit: Duration,
        names: &[&str],
        fallback: impl Into<Option<Fallback<S>>>,
    ) -> Result<&Self> {
        self.apply(
            names,
            Interception::TimeBox {
                limit,
                fallback: fallback.into(),
                policy: self.settings.cancel_policy,
            },
        )
    }

    /// Replace failures of each named operation with `handler`'s result
    pub fn rescue_on_fail(&self, names: &[&str], handler: impl Into<Option<RescueHandler<S>>>) -> Result<&Self> {
        self.apply(names, Interception::Rescue(handler.into()))
    }

    pub fn before(&self, names: &[&str], handler: impl Into<Option<BeforeHook<S>>>) -> Result<&Self> {
        self.apply(names, Interception::Before(handler.into()))
    }

    pub fn after(&self, names: &[&str], handler: impl Into<Option<AfterHook<S>>>) -> Result<&Self> {
        self.apply(names, Interception::After(handler.into()))
    }

    /// Wrap every name in `names` with `interception`.
    ///
    /// Nothing is rebound unless the payload is complete and every name is
    /// defined. A name listed more than once is wrapped once.
    pub fn apply(&self, names: &[&str], interception: Interception<S>) -> Result<&Self> {
        let kind = interception.kind();
        let wrapper = Wrapper::try_from(interception)?;

        if let Some(missing) = names.iter().find(|name| !self.descriptor.contains(name)) {
            return Err(self.descriptor.unknown(missing));
        }

        let mut seen = HashSet::new();
        for name in names.iter().filter(|name| seen.insert(**name)) {
            let wrapper = wrapper.clone();
            self.descriptor.rebind(name, move |current| wrapper.wrap(current))?;

            info!("Wrapped {}#{} with {}", self.descriptor.name(), name, kind);
            metrics::counter!("method_hooks_wrapped_total", "kind" => kind.as_str()).increment(1);
        }

        Ok(self)
    }
}

/// An interception whose payload has been checked
enum Wrapper<S> {
    TimeBox(TimeBox<S>),
    Rescue(RescueHandler<S>),
    Before(BeforeHook<S>),
    After(AfterHook<S>),
}

impl<S> Clone for Wrapper<S> {
    fn clone(&self) -> Self {
        match self {
            Wrapper::TimeBox(settings) => Wrapper::TimeBox(settings.clone()),
            Wrapper::Rescue(handler) => Wrapper::Rescue(Arc::clone(handler)),
            Wrapper::Before(hook) => Wrapper::Before(Arc::clone(hook)),
            Wrapper::After(hook) => Wrapper::After(Arc::clone(hook)),
        }
    }
}

impl<S> TryFrom<Interception<S>> for Wrapper<S> {
    type Error = HookError;

    fn try_from(interception: Interception<S>) -> Result<Self> {
        let kind = interception.kind();
        let required = || HookError::HandlerRequired { kind };

        match interception {
            Interception::TimeBox { limit, fallback, policy } => {
                if limit.is_zero() {
                    return Err(HookError::ConfigError("time limit must be greater than zero".to_string()));
                }
                Ok(Wrapper::TimeBox(TimeBox { limit, fallback, policy }))
            }
            Interception::Rescue(handler) => handler.map(Wrapper::Rescue).ok_or_else(required),
            Interception::Before(hook) => hook.map(Wrapper::Before).ok_or_else(required),
            Interception::After(hook) => hook.map(Wrapper::After).ok_or_else(required),
        }
    }
}

impl<S: Send + Sync + 'static> Wrapper<S> {
    fn wrap(self, inner: Operation<S>) -> Operation<S> {
        match self {
            Wrapper::TimeBox(settings) => time_box::wrap(inner, settings),
            Wrapper::Rescue(handler) => rescue::wrap(inner, handler),
            Wrapper::Before(hook) => hooks::wrap_before(inner, hook),
            Wrapper::After(hook) => hooks::wrap_after(inner, hook),
        }
    }
}
