//! Verbs and the inbound request descriptor.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{DispatchError, Result};

/// HTTP verbs a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// GET method
    Get,
    /// POST method
    Post,
    /// PUT method
    Put,
    /// PATCH method
    Patch,
    /// DELETE method
    Delete,
    /// HEAD method
    Head,
    /// OPTIONS method
    Options,
}

impl Verb {
    /// All supported verbs.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
    ];

    /// Returns the verb as an upper-case string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Compares against a request method, ignoring ASCII case.
    pub fn matches(self, method: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(method)
    }
}

impl FromStr for Verb {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.matches(s))
            .ok_or_else(|| DispatchError::UnknownVerb(s.to_string()))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An already-parsed request, as handed over by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Request method, in whatever case the transport received it.
    pub method: String,
    /// Request path, without the query string.
    pub path: String,
    /// Decoded query parameters.
    pub query: HashMap<String, String>,
}

impl RequestDescriptor {
    /// Creates a request with no query parameters.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: HashMap::new(),
        }
    }

    /// Creates a request from a target such as `/books?page=2`.
    ///
    /// The query string is form-decoded as by [`parse_query_string`].
    pub fn from_target(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query_string(query)),
            None => (target, HashMap::new()),
        };
        Self {
            method: method.into(),
            path: path.to_string(),
            query,
        }
    }

    /// Sets a query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Gets a query parameter.
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

/// Decodes an `application/x-www-form-urlencoded` query string.
///
/// Decoding is lenient: a key without `=` maps to an empty value and a
/// malformed percent escape is kept as-is. When a key repeats, the last value
/// wins.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    // String pairs accept any input.
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .unwrap_or_default()
        .into_iter()
        .collect()
}
