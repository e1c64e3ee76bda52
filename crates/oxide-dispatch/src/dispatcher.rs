//! Request dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::Result;
use crate::registry::RouteRegistry;
use crate::request::{RequestDescriptor, Verb};

/// What happens after the first route matching a request has fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchPolicy {
    /// Keep scanning; every matching route fires, in registration order.
    #[default]
    FireAll,
    /// Stop after the first matching route.
    FirstMatch,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DispatcherConfig {
    /// Match policy.
    pub policy: DispatchPolicy,
}

impl DispatcherConfig {
    /// Creates a configuration with the given policy.
    pub fn with_policy(policy: DispatchPolicy) -> Self {
        Self { policy }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`](crate::DispatchError::InvalidConfig)
    /// if the input is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Receives the result of every handler that fires.
///
/// This is the transport's "process into response" step.
pub trait ResultSink<R> {
    /// Processes one handler result.
    fn process(&mut self, result: R);
}

impl<R> ResultSink<R> for Vec<R> {
    fn process(&mut self, result: R) {
        self.push(result);
    }
}

/// Matches requests against a frozen registry and invokes handlers.
///
/// Cloning is cheap; clones share the registry.
pub struct Dispatcher<C, R> {
    registry: Arc<RouteRegistry<C, R>>,
    config: DispatcherConfig,
}

impl<C, R> Clone for Dispatcher<C, R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }
}

impl<C, R> Dispatcher<C, R> {
    /// Finalizes `registry` and builds a dispatcher over it.
    pub fn new(mut registry: RouteRegistry<C, R>, config: DispatcherConfig) -> Self {
        registry.finalize();
        info!(
            routes = registry.len(),
            policy = ?config.policy,
            "dispatcher ready"
        );
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &RouteRegistry<C, R> {
        &self.registry
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Dispatches one request.
    ///
    /// Routes are tried in registration order. A route fires when its verb
    /// equals the request method (ignoring ASCII case) and its pattern
    /// matches the whole path. Each firing route's result goes to `sink`.
    /// Under [`DispatchPolicy::FireAll`] scanning continues after a match,
    /// so overlapping routes all fire.
    ///
    /// Returns true if at least one route fired.
    pub fn dispatch<S>(&self, req: &RequestDescriptor, context: &C, sink: &mut S) -> bool
    where
        S: ResultSink<R> + ?Sized,
    {
        let mut fired = 0usize;

        for route in self.registry.routes() {
            if !route.verb().matches(&req.method) {
                continue;
            }
            let Some(args) = route.bind(&req.path, &req.query) else {
                continue;
            };

            debug!(
                verb = %route.verb(),
                template = route.pattern().template(),
                path = %req.path,
                "route matched"
            );
            sink.process(route.invoke(&args, context));
            fired += 1;

            if self.config.policy == DispatchPolicy::FirstMatch {
                break;
            }
        }

        if fired == 0 {
            trace!(method = %req.method, path = %req.path, "no route matched");
        } else if fired > 1 {
            debug!(method = %req.method, path = %req.path, fired, "multiple routes fired");
        }
        fired > 0
    }

    /// Returns the verbs of the routes whose pattern matches `path`, in
    /// registration order and without repeats.
    ///
    /// A transport can use this to tell "method not allowed" from "not found"
    /// when [`dispatch`](Self::dispatch) returns false.
    pub fn allowed_verbs(&self, path: &str) -> Vec<Verb> {
        let mut verbs = Vec::new();
        for route in self.registry.routes() {
            if route.pattern().is_match(path) && !verbs.contains(&route.verb()) {
                verbs.push(route.verb());
            }
        }
        verbs
    }
}
