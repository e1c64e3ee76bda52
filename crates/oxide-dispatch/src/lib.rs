//! # oxide-dispatch
//!
//! A route table and request dispatcher for an external HTTP transport.
//!
//! This crate provides:
//! - Path templates with `:name` variables compiled to anchored matchers
//! - An ordered route registry, frozen before serving
//! - Parameter binding from path variables and query parameters
//! - A dispatcher that invokes every matching handler, or only the first
//!
//! The transport parses the request and produces the response; this crate
//! only decides which handlers run and with which arguments.
//!
//! ## Quick Start
//!
//! ```
//! use oxide_dispatch::{
//!     Arguments, Dispatcher, DispatcherConfig, RequestDescriptor, RouteRegistry,
//! };
//!
//! fn show_book(args: &Arguments<'_>, _ctx: &()) -> String {
//!     let id = args.get("id").unwrap_or("?");
//!     let format = args.get("format").unwrap_or("html");
//!     format!("book {id} as {format}")
//! }
//!
//! let mut registry = RouteRegistry::new();
//! registry.get("/books/:id", &["format", "id"], show_book).unwrap();
//! let dispatcher = Dispatcher::new(registry, DispatcherConfig::default());
//!
//! let req = RequestDescriptor::new("GET", "/books/42").query_param("format", "json");
//! let mut responses = Vec::new();
//! assert!(dispatcher.dispatch(&req, &(), &mut responses));
//! assert_eq!(responses, vec!["book 42 as json"]);
//! ```
//!
//! ## Path Variables
//!
//! A template variable is a colon followed by word characters. It matches
//! one or more word characters in the request path:
//!
//! ```ignore
//! registry.get("/posts/:post_id/comments/:comment_id", &[], handler)?;
//! ```
//!
//! ## Parameters
//!
//! Each route declares its handler's parameter names. A name that is also a
//! path variable is bound from the path; a reserved name (`request`,
//! `response` by default) stands for the transport context; every other name
//! is looked up in the query string and is `None` when absent.
//!
//! ## Overlapping Routes
//!
//! By default every route matching a request fires, in registration order.
//! Use [`DispatchPolicy::FirstMatch`] to stop at the first one:
//!
//! ```ignore
//! let config = DispatcherConfig::with_policy(DispatchPolicy::FirstMatch);
//! let dispatcher = Dispatcher::new(registry, config);
//! ```

mod binder;
mod dispatcher;
mod error;
mod path;
mod registry;
mod request;

pub use binder::{Arguments, Binding, DEFAULT_RESERVED_NAMES, ParamPlan, ParamSource};
pub use dispatcher::{DispatchPolicy, Dispatcher, DispatcherConfig, ResultSink};
pub use error::{DispatchError, Result};
pub use path::{PathPattern, Segment};
pub use registry::{Handler, Route, RouteGroup, RouteRegistry};
pub use request::{RequestDescriptor, Verb, parse_query_string};
