#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use oxide_dispatch::{
    Arguments, DispatchPolicy, Dispatcher, DispatcherConfig, RequestDescriptor, RouteRegistry,
};

/// Transport context handed to every handler in these tests.
#[derive(Debug, Default)]
pub struct Context {
    pub user: Option<String>,
}

/// What a test handler saw: its tag, declared values and path variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub tag: &'static str,
    pub params: Vec<(String, Option<String>)>,
    pub path: Vec<(String, String)>,
}

pub type Registry = RouteRegistry<Context, Call>;

/// A handler that records its arguments.
pub fn recorder(tag: &'static str) -> impl Fn(&Arguments<'_>, &Context) -> Call + Send + Sync {
    move |args, _ctx| Call {
        tag,
        params: args
            .params()
            .iter()
            .map(|b| (b.name.to_string(), b.value.map(str::to_string)))
            .collect(),
        path: args
            .path()
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect(),
    }
}

/// A handler that appends its tag to a shared log and returns a recorded call.
pub fn logging(
    tag: &'static str,
    log: &Arc<Mutex<Vec<&'static str>>>,
) -> impl Fn(&Arguments<'_>, &Context) -> Call + Send + Sync + 'static {
    let log = Arc::clone(log);
    let record = recorder(tag);
    move |args, ctx| {
        log.lock().unwrap().push(tag);
        record(args, ctx)
    }
}

pub fn build(registry: Registry) -> Dispatcher<Context, Call> {
    Dispatcher::new(registry, DispatcherConfig::default())
}

pub fn build_with(registry: Registry, policy: DispatchPolicy) -> Dispatcher<Context, Call> {
    Dispatcher::new(registry, DispatcherConfig::with_policy(policy))
}

/// Dispatches and returns (handled, calls).
pub fn run(dispatcher: &Dispatcher<Context, Call>, req: &RequestDescriptor) -> (bool, Vec<Call>) {
    let mut calls = Vec::new();
    let handled = dispatcher.dispatch(req, &Context::default(), &mut calls);
    (handled, calls)
}

pub fn get(path: &str) -> RequestDescriptor {
    RequestDescriptor::new("GET", path)
}
