//! The route registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::binder::{Arguments, DEFAULT_RESERVED_NAMES, ParamPlan};
use crate::error::{DispatchError, Result};
use crate::path::PathPattern;
use crate::request::Verb;

/// A shared handler: takes the bound arguments and the transport context,
/// returns an opaque result.
pub type Handler<C, R> = Arc<dyn Fn(&Arguments<'_>, &C) -> R + Send + Sync>;

/// A compiled route.
pub struct Route<C, R> {
    /// Optional route name for reverse URL lookup.
    name: Option<String>,
    /// HTTP verb.
    verb: Verb,
    /// Compiled path template.
    pattern: PathPattern,
    /// How the declared parameters are resolved.
    plan: ParamPlan,
    /// Request handler.
    handler: Handler<C, R>,
}

impl<C, R> Route<C, R> {
    /// Returns the route name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the verb.
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Returns the compiled pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the parameter plan.
    pub fn plan(&self) -> &ParamPlan {
        &self.plan
    }

    /// Matches `path` and binds the declared parameters from the captures and
    /// `query`. Returns `None` if the path does not match.
    pub fn bind<'a>(
        &'a self,
        path: &'a str,
        query: &'a HashMap<String, String>,
    ) -> Option<Arguments<'a>> {
        let captures = self.pattern.captures(path)?;
        Some(self.plan.bind(self.pattern.variables(), &captures, query))
    }

    /// Calls the handler.
    pub fn invoke(&self, args: &Arguments<'_>, context: &C) -> R {
        (self.handler)(args, context)
    }
}

impl<C, R> Clone for Route<C, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            verb: self.verb,
            pattern: self.pattern.clone(),
            plan: self.plan.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<C, R> fmt::Debug for Route<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("verb", &self.verb)
            .field("template", &self.pattern.template())
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

/// A route declaration that has not been compiled yet.
struct Declaration<C, R> {
    verb: Verb,
    template: String,
    params: Vec<String>,
    handler: Handler<C, R>,
}

/// A group of route declarations sharing a path prefix.
///
/// Declarations keep their order and are compiled when the group is added to
/// a registry.
pub struct RouteGroup<C, R> {
    /// Prefix prepended to every template in this group.
    prefix: String,
    /// Declarations in this group.
    declarations: Vec<Declaration<C, R>>,
}

impl<C, R> RouteGroup<C, R> {
    /// Creates a new route group with the given prefix.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            declarations: Vec::new(),
        }
    }

    /// Declares a route with any verb.
    #[must_use]
    pub fn route<F>(mut self, verb: Verb, template: &str, params: &[&str], handler: F) -> Self
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.declarations.push(Declaration {
            verb,
            template: format!("{}{}", self.prefix, template),
            params: params.iter().map(|p| (*p).to_string()).collect(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Declares a GET route.
    #[must_use]
    pub fn get<F>(self, template: &str, params: &[&str], handler: F) -> Self
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.route(Verb::Get, template, params, handler)
    }

    /// Declares a POST route.
    #[must_use]
    pub fn post<F>(self, template: &str, params: &[&str], handler: F) -> Self
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.route(Verb::Post, template, params, handler)
    }

    /// Declares a DELETE route.
    #[must_use]
    pub fn delete<F>(self, template: &str, params: &[&str], handler: F) -> Self
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.route(Verb::Delete, template, params, handler)
    }

    /// Returns the number of declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns true if the group declares nothing.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// The ordered table of compiled routes.
///
/// Routes are kept in registration order and never merged or reordered.
/// Once [`finalize`](Self::finalize) has been called the registry rejects
/// further registrations and is read-only.
pub struct RouteRegistry<C, R> {
    /// Registered routes, in declaration order.
    routes: Vec<Route<C, R>>,
    /// Named routes, by index into `routes`.
    names: HashMap<String, usize>,
    /// Declared parameter names that designate the transport context.
    reserved: Vec<String>,
    frozen: bool,
}

impl<C, R> Default for RouteRegistry<C, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, R> RouteRegistry<C, R> {
    /// Creates an empty registry with the default reserved names.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            names: HashMap::new(),
            reserved: DEFAULT_RESERVED_NAMES.iter().map(|s| (*s).to_string()).collect(),
            frozen: false,
        }
    }

    /// Replaces the reserved context parameter names.
    ///
    /// Only affects routes registered afterwards.
    #[must_use]
    pub fn reserved_names(mut self, names: &[&str]) -> Self {
        self.reserved = names.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Registers a route.
    ///
    /// `params` is the handler's declared parameter list, in order.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RegistryFrozen`] after [`finalize`](Self::finalize)
    /// and [`DispatchError::InvalidPattern`] if the template cannot be
    /// compiled.
    pub fn register<F>(
        &mut self,
        verb: Verb,
        template: &str,
        params: &[&str],
        handler: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.push(None, verb, template, params, Arc::new(handler))?;
        Ok(self)
    }

    /// Registers a named route, reachable through [`url_for`](Self::url_for).
    ///
    /// # Errors
    ///
    /// As [`register`](Self::register), plus
    /// [`DispatchError::DuplicateRouteName`] if the name is taken.
    pub fn register_named<F>(
        &mut self,
        name: &str,
        verb: Verb,
        template: &str,
        params: &[&str],
        handler: F,
    ) -> Result<&mut Self>
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.push(Some(name.to_string()), verb, template, params, Arc::new(handler))?;
        Ok(self)
    }

    /// Registers a GET route.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn get<F>(&mut self, template: &str, params: &[&str], handler: F) -> Result<&mut Self>
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.register(Verb::Get, template, params, handler)
    }

    /// Registers a POST route.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn post<F>(&mut self, template: &str, params: &[&str], handler: F) -> Result<&mut Self>
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.register(Verb::Post, template, params, handler)
    }

    /// Registers a PUT route.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn put<F>(&mut self, template: &str, params: &[&str], handler: F) -> Result<&mut Self>
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.register(Verb::Put, template, params, handler)
    }

    /// Registers a PATCH route.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn patch<F>(&mut self, template: &str, params: &[&str], handler: F) -> Result<&mut Self>
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.register(Verb::Patch, template, params, handler)
    }

    /// Registers a DELETE route.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn delete<F>(&mut self, template: &str, params: &[&str], handler: F) -> Result<&mut Self>
    where
        F: Fn(&Arguments<'_>, &C) -> R + Send + Sync + 'static,
    {
        self.register(Verb::Delete, template, params, handler)
    }

    /// Registers every declaration of a group, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first declaration that fails to register; the ones
    /// before it stay registered.
    pub fn group(&mut self, group: RouteGroup<C, R>) -> Result<&mut Self> {
        for decl in group.declarations {
            self.push(None, decl.verb, &decl.template, &decl.params, decl.handler)?;
        }
        Ok(self)
    }

    /// Freezes the registry. Later registrations fail.
    pub fn finalize(&mut self) {
        if !self.frozen {
            debug!(routes = self.routes.len(), "route registry finalized");
        }
        self.frozen = true;
    }

    /// Returns true once [`finalize`](Self::finalize) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Returns the routes in registration order.
    pub fn routes(&self) -> &[Route<C, R>] {
        &self.routes
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the named route.
    pub fn route_named(&self, name: &str) -> Option<&Route<C, R>> {
        self.names.get(name).and_then(|&i| self.routes.get(i))
    }

    /// Generates a path for a named route.
    pub fn url_for(&self, name: &str, values: &HashMap<String, String>) -> Option<String> {
        self.route_named(name).and_then(|r| r.pattern.reverse(values))
    }

    fn push<S: AsRef<str>>(
        &mut self,
        name: Option<String>,
        verb: Verb,
        template: &str,
        params: &[S],
        handler: Handler<C, R>,
    ) -> Result<()> {
        if self.frozen {
            return Err(DispatchError::RegistryFrozen {
                template: template.to_string(),
            });
        }
        if let Some(name) = &name {
            if self.names.contains_key(name) {
                return Err(DispatchError::DuplicateRouteName(name.clone()));
            }
        }

        let pattern = PathPattern::compile(template)?;
        let variables = pattern.variables();
        for (i, variable) in variables.iter().enumerate() {
            if variables[..i].contains(variable) {
                warn!(template, variable = %variable, "duplicate path variable name");
            }
        }
        let plan = ParamPlan::new(params, variables, &self.reserved);

        debug!(
            verb = %verb,
            template,
            variables = ?variables,
            params = plan.len(),
            "registered route"
        );

        if let Some(name) = &name {
            self.names.insert(name.clone(), self.routes.len());
        }
        self.routes.push(Route {
            name,
            verb,
            pattern,
            plan,
            handler,
        });
        Ok(())
    }
}

impl<C, R> fmt::Debug for RouteRegistry<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.routes)
            .field("reserved", &self.reserved)
            .field("frozen", &self.frozen)
            .finish_non_exhaustive()
    }
}
