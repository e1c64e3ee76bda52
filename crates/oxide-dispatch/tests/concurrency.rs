//! Concurrent dispatch against a shared, frozen registry.

mod common;
use common::*;

use std::thread;

#[test]
fn concurrent_dispatch_is_consistent() {
    let mut registry = Registry::new();
    registry
        .get("/books/:id", &["id", "format"], recorder("show"))
        .unwrap()
        .get("/books/:id", &[], recorder("audit"))
        .unwrap()
        .get("/authors/:name", &["name"], recorder("author"))
        .unwrap();
    let d = build(registry);

    thread::scope(|s| {
        for t in 0..8 {
            let d = d.clone();
            s.spawn(move || {
                for i in 0..200 {
                    let id = format!("{}", t * 1000 + i);
                    let req = get(&format!("/books/{id}")).query_param("format", "json");
                    let (handled, calls) = run(&d, &req);
                    assert!(handled);
                    let tags: Vec<_> = calls.iter().map(|c| c.tag).collect();
                    assert_eq!(tags, vec!["show", "audit"]);
                    assert_eq!(
                        calls[0].params,
                        vec![
                            ("id".to_string(), Some(id.clone())),
                            ("format".to_string(), Some("json".to_string())),
                        ]
                    );

                    let (handled, calls) = run(&d, &get("/authors/le_guin"));
                    assert!(handled);
                    assert_eq!(calls.len(), 1);

                    let (handled, _) = run(&d, &get("/nowhere"));
                    assert!(!handled);
                }
            });
        }
    });
}
