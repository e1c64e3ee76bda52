//! Error types for route registration and dispatch.

use thiserror::Error;

/// Dispatch-specific errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The generated matcher for a template was rejected by the regex engine.
    #[error("invalid path pattern {template:?}: {source}")]
    InvalidPattern {
        template: String,
        #[source]
        source: regex::Error,
    },

    /// A route was registered after the registry was finalized.
    #[error("registry is frozen, cannot register {template:?}")]
    RegistryFrozen { template: String },

    /// Two named routes share a name.
    #[error("duplicate route name: {0}")]
    DuplicateRouteName(String),

    /// A method string does not name a supported verb.
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    /// Dispatcher configuration could not be parsed.
    #[error("invalid dispatcher configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// A required handler argument has no value.
    #[error("missing parameter: {0}")]
    MissingParameter(String),
}

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
