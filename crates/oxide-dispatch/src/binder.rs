//! Handler argument binding.
//!
//! Each route carries a [`ParamPlan`] computed at registration time. It maps
//! every declared handler parameter to where its value comes from: a path
//! variable, the query string, or the transport context. Dispatch only runs
//! the lookups.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{DispatchError, Result};

/// Parameter names that designate the transport context by default.
pub const DEFAULT_RESERVED_NAMES: [&str; 2] = ["request", "response"];

/// Where a declared parameter takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// The path variable at this capture index.
    Path(usize),
    /// The query parameter with the same name.
    Query,
    /// The transport context object; carries no string value.
    Context,
}

/// The resolution plan for a route's declared parameters.
#[derive(Debug, Clone, Default)]
pub struct ParamPlan {
    entries: Vec<(String, ParamSource)>,
}

impl ParamPlan {
    /// Builds a plan for `declared`, given the route's path variables and the
    /// reserved context names.
    ///
    /// Path variables take precedence over reserved names and query keys.
    /// If a variable name occurs more than once in the template, the first
    /// occurrence is bound.
    pub fn new<S: AsRef<str>>(declared: &[S], variables: &[String], reserved: &[String]) -> Self {
        let entries = declared
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let source = if let Some(index) = variables.iter().position(|v| v == name) {
                    ParamSource::Path(index)
                } else if reserved.iter().any(|r| r == name) {
                    ParamSource::Context
                } else {
                    ParamSource::Query
                };
                (name.to_string(), source)
            })
            .collect();
        Self { entries }
    }

    /// Returns the declared names with their sources, in declared order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, ParamSource)> {
        self.entries.iter().map(|(name, source)| (name.as_str(), *source))
    }

    /// Returns the number of declared parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the handler declares no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds the declared parameters for one matched request.
    ///
    /// `captures` must hold one value per entry of `variables`.
    pub fn bind<'a>(
        &'a self,
        variables: &'a [String],
        captures: &[&'a str],
        query: &'a HashMap<String, String>,
    ) -> Arguments<'a> {
        let params = self
            .entries
            .iter()
            .map(|(name, source)| {
                let value = match *source {
                    ParamSource::Path(index) => captures.get(index).copied(),
                    ParamSource::Query => query.get(name).map(String::as_str),
                    ParamSource::Context => None,
                };
                Binding {
                    name,
                    source: *source,
                    value,
                }
            })
            .collect();
        let path = variables
            .iter()
            .map(String::as_str)
            .zip(captures.iter().copied())
            .collect();
        Arguments { params, path }
    }
}

/// One bound handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding<'a> {
    /// Declared parameter name.
    pub name: &'a str,
    /// Where the value came from.
    pub source: ParamSource,
    /// The value, or `None` for a missing query key or a context parameter.
    pub value: Option<&'a str>,
}

/// Arguments handed to a handler for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments<'a> {
    params: Vec<Binding<'a>>,
    path: Vec<(&'a str, &'a str)>,
}

impl<'a> Arguments<'a> {
    /// Declared parameters, in declared order.
    pub fn params(&self) -> &[Binding<'a>] {
        &self.params
    }

    /// Path variables, in the order they appear in the template.
    pub fn path(&self) -> &[(&'a str, &'a str)] {
        &self.path
    }

    /// Value of the declared parameter at `index`.
    pub fn value(&self, index: usize) -> Option<&'a str> {
        self.params.get(index).and_then(|b| b.value)
    }

    /// Looks a value up by name: declared parameters first, then path
    /// variables.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.params
            .iter()
            .find(|b| b.name == name)
            .and_then(|b| b.value)
            .or_else(|| self.path_var(name))
    }

    /// Looks up a path variable by name.
    pub fn path_var(&self, name: &str) -> Option<&'a str> {
        self.path.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    /// Gets a value or returns an error.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingParameter`] if `name` has no value.
    pub fn require(&self, name: &str) -> Result<&'a str> {
        self.get(name)
            .ok_or_else(|| DispatchError::MissingParameter(name.to_string()))
    }

    /// Parses a value as a specific type.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }
}
