//! Tests for matching, binding and dispatch order.

mod common;
use common::*;

use std::sync::{Arc, Mutex};

use oxide_dispatch::{DispatchError, DispatchPolicy, RequestDescriptor, Verb};

#[test]
fn single_variable_route() {
    let mut registry = Registry::new();
    registry.get("/books/:id", &[], recorder("show")).unwrap();
    let d = build(registry);

    let (handled, calls) = run(&d, &get("/books/42"));
    assert!(handled);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, vec![("id".to_string(), "42".to_string())]);

    let (handled, calls) = run(&d, &get("/books/42/chapters"));
    assert!(!handled);
    assert!(calls.is_empty());
}

#[test]
fn variables_bound_in_template_order() {
    let mut registry = Registry::new();
    registry.get("/a/:x/b/:y", &["y", "x"], recorder("ab")).unwrap();
    let d = build(registry);

    let (_, calls) = run(&d, &get("/a/1/b/2"));
    let call = &calls[0];
    assert_eq!(
        call.path,
        vec![
            ("x".to_string(), "1".to_string()),
            ("y".to_string(), "2".to_string()),
        ]
    );
    assert_eq!(
        call.params,
        vec![
            ("y".to_string(), Some("2".to_string())),
            ("x".to_string(), Some("1".to_string())),
        ]
    );
}

#[test]
fn identical_routes_all_fire_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    registry
        .get("/x", &[], logging("h1", &log))
        .unwrap()
        .get("/x", &[], logging("h2", &log))
        .unwrap();
    let d = build(registry);

    let (handled, calls) = run(&d, &get("/x"));
    assert!(handled);
    assert_eq!(*log.lock().unwrap(), vec!["h1", "h2"]);
    let tags: Vec<_> = calls.iter().map(|c| c.tag).collect();
    assert_eq!(tags, vec!["h1", "h2"]);
}

#[test]
fn overlapping_patterns_all_fire() {
    let mut registry = Registry::new();
    registry
        .get("/users/:id", &[], recorder("by-id"))
        .unwrap()
        .get("/users/me", &[], recorder("me"))
        .unwrap();
    let d = build(registry);

    let (_, calls) = run(&d, &get("/users/me"));
    let tags: Vec<_> = calls.iter().map(|c| c.tag).collect();
    assert_eq!(tags, vec!["by-id", "me"]);
}

#[test]
fn first_match_policy_stops_after_first() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    registry
        .get("/x", &[], logging("h1", &log))
        .unwrap()
        .get("/x", &[], logging("h2", &log))
        .unwrap();
    let d = build_with(registry, DispatchPolicy::FirstMatch);

    let (handled, calls) = run(&d, &get("/x"));
    assert!(handled);
    assert_eq!(calls.len(), 1);
    assert_eq!(*log.lock().unwrap(), vec!["h1"]);
}

#[test]
fn unknown_method_invokes_nothing() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    registry.get("/x", &[], logging("h1", &log)).unwrap();
    let d = build(registry);

    let (handled, calls) = run(&d, &RequestDescriptor::new("PURGE", "/x"));
    assert!(!handled);
    assert!(calls.is_empty());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn method_compared_case_insensitively() {
    let mut registry = Registry::new();
    registry.delete("/books/:id", &[], recorder("del")).unwrap();
    let d = build(registry);

    let (handled, _) = run(&d, &RequestDescriptor::new("delete", "/books/3"));
    assert!(handled);
}

#[test]
fn missing_query_parameter_binds_none() {
    let mut registry = Registry::new();
    registry.get("/books", &["page", "sort"], recorder("list")).unwrap();
    let d = build(registry);

    let (handled, calls) = run(&d, &get("/books").query_param("page", "3"));
    assert!(handled);
    assert_eq!(
        calls[0].params,
        vec![
            ("page".to_string(), Some("3".to_string())),
            ("sort".to_string(), None),
        ]
    );
}

#[test]
fn path_variable_beats_query_parameter() {
    let mut registry = Registry::new();
    registry.get("/books/:id", &["id"], recorder("show")).unwrap();
    let d = build(registry);

    let (_, calls) = run(&d, &get("/books/7").query_param("id", "99"));
    assert_eq!(calls[0].params, vec![("id".to_string(), Some("7".to_string()))]);
}

#[test]
fn reserved_parameter_receives_no_value() {
    let mut registry = Registry::new();
    registry.get("/me", &["request", "fields"], recorder("me")).unwrap();
    let d = build(registry);

    let (_, calls) = run(
        &d,
        &get("/me").query_param("request", "ignored").query_param("fields", "name"),
    );
    assert_eq!(
        calls[0].params,
        vec![
            ("request".to_string(), None),
            ("fields".to_string(), Some("name".to_string())),
        ]
    );
}

#[test]
fn handler_sees_context() {
    let mut registry = Registry::new();
    registry
        .get("/whoami", &[], |_args, ctx: &Context| Call {
            tag: if ctx.user.is_some() { "user" } else { "anonymous" },
            params: Vec::new(),
            path: Vec::new(),
        })
        .unwrap();
    let d = build(registry);

    let ctx = Context {
        user: Some("ada".to_string()),
    };
    let mut calls = Vec::new();
    assert!(d.dispatch(&get("/whoami"), &ctx, &mut calls));
    assert_eq!(calls[0].tag, "user");
}

#[test]
fn from_target_feeds_query_binding() {
    let mut registry = Registry::new();
    registry.get("/search", &["q"], recorder("search")).unwrap();
    let d = build(registry);

    let req = RequestDescriptor::from_target("GET", "/search?q=rust+lang");
    let (_, calls) = run(&d, &req);
    assert_eq!(calls[0].params, vec![("q".to_string(), Some("rust lang".to_string()))]);
}

#[test]
fn allowed_verbs_distinguishes_not_found() {
    let mut registry = Registry::new();
    registry
        .get("/books/:id", &[], recorder("show"))
        .unwrap()
        .delete("/books/:id", &[], recorder("del"))
        .unwrap();
    let d = build(registry);

    let (handled, _) = run(&d, &RequestDescriptor::new("PUT", "/books/1"));
    assert!(!handled);
    assert_eq!(d.allowed_verbs("/books/1"), vec![Verb::Get, Verb::Delete]);
    assert!(d.allowed_verbs("/authors/1").is_empty());
}

#[test]
fn registration_after_freeze_fails() {
    let mut registry = Registry::new();
    registry.get("/a", &[], recorder("a")).unwrap();
    registry.finalize();

    let err = registry.post("/a", &[], recorder("b")).unwrap_err();
    assert!(matches!(err, DispatchError::RegistryFrozen { .. }));
}

#[test]
fn oversized_template_is_rejected() {
    let template: String = (0..200_000).map(|i| format!("/:v{i}")).collect();
    let mut registry = Registry::new();
    registry.get("/a", &[], recorder("a")).unwrap();

    let err = registry.get(&template, &[], recorder("huge")).unwrap_err();
    assert!(matches!(err, DispatchError::InvalidPattern { template: t, .. } if t == template));
    assert_eq!(registry.len(), 1);
}
