//! Demo route table: an in-memory bookstore.
//!
//! The store is the transport context handed to every handler. Handlers
//! return a [`Response`]; writing it out is the transport's job.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use oxide_dispatch::{Arguments, Result, RouteGroup, RouteRegistry, Verb};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use crate::response::Response;

/// A book in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: u32,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    pub views: u32,
}

/// Shared bookstore state.
#[derive(Debug, Default)]
pub struct Store {
    books: RwLock<BTreeMap<u32, Book>>,
    next_id: AtomicU32,
}

impl Store {
    /// A store with a few books in it.
    pub fn seeded() -> Self {
        let store = Self::default();
        store.insert("The Dispossessed", "le_guin", Some(1974));
        store.insert("The Left Hand of Darkness", "le_guin", Some(1969));
        store.insert("Dune", "herbert", Some(1965));
        store
    }

    /// Adds a book. Returns `None` if the store lock is poisoned.
    pub fn insert(&self, title: &str, author: &str, year: Option<u16>) -> Option<Book> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let book = Book {
            id,
            title: title.to_string(),
            author: author.to_string(),
            year,
            views: 0,
        };
        self.books.write().ok()?.insert(id, book.clone());
        Some(book)
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.books.read().map_or(0, |books| books.len())
    }
}

/// Builds the bookstore route table, in declaration order.
///
/// `GET /books/:id` is declared twice: once to show the book and once to
/// count the view. Under the fire-all policy both run.
///
/// # Errors
///
/// Returns an error if a template fails to compile.
pub fn routes() -> Result<RouteRegistry<Store, Response>> {
    let mut registry = RouteRegistry::new();
    registry
        .get("/health", &[], health)?
        .get("/books", &["author", "limit"], list_books)?
        .register_named("book", Verb::Get, "/books/:id", &["id", "request"], show_book)?
        .get("/books/:id", &["id"], count_view)?
        .post("/books", &["title", "author", "year"], create_book)?
        .delete("/books/:id", &["id"], delete_book)?
        .group(RouteGroup::new("/authors").get("/:author/books", &["author", "limit"], list_books))?;
    Ok(registry)
}

fn health(_args: &Arguments<'_>, store: &Store) -> Response {
    Response::json(200, &json!({ "status": "ok", "books": store.len() }))
}

fn list_books(args: &Arguments<'_>, store: &Store) -> Response {
    let Ok(books) = store.books.read() else {
        return poisoned();
    };
    let limit = match args.get("limit") {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) => n,
            Err(_) => return Response::bad_request(format!("invalid limit: {raw}")),
        },
        None => usize::MAX,
    };
    let author = args.get("author");

    let listed: Vec<&Book> = books
        .values()
        .filter(|b| author.is_none_or(|a| b.author == a))
        .take(limit)
        .collect();
    debug!(count = listed.len(), ?author, "listing books");
    Response::json(200, &listed)
}

fn show_book(args: &Arguments<'_>, store: &Store) -> Response {
    let id = match book_id(args) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Ok(books) = store.books.read() else {
        return poisoned();
    };
    books
        .get(&id)
        .map_or_else(Response::not_found, |book| Response::json(200, book))
}

fn count_view(args: &Arguments<'_>, store: &Store) -> Response {
    let id = match book_id(args) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Ok(mut books) = store.books.write() else {
        return poisoned();
    };
    match books.get_mut(&id) {
        Some(book) => {
            book.views += 1;
            Response::no_content().header("X-Views", book.views.to_string())
        }
        None => Response::not_found(),
    }
}

fn create_book(args: &Arguments<'_>, store: &Store) -> Response {
    let (title, author) = match (args.require("title"), args.require("author")) {
        (Ok(title), Ok(author)) => (title, author),
        (Err(e), _) | (_, Err(e)) => return Response::bad_request(e.to_string()),
    };
    let year = match args.get("year") {
        Some(raw) => match raw.parse::<u16>() {
            Ok(year) => Some(year),
            Err(_) => return Response::bad_request(format!("invalid year: {raw}")),
        },
        None => None,
    };
    store
        .insert(title, author, year)
        .map_or_else(poisoned, |book| Response::json(201, &book))
}

fn delete_book(args: &Arguments<'_>, store: &Store) -> Response {
    let id = match book_id(args) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Ok(mut books) = store.books.write() else {
        return poisoned();
    };
    match books.remove(&id) {
        Some(_) => Response::no_content(),
        None => Response::not_found(),
    }
}

fn book_id(args: &Arguments<'_>) -> std::result::Result<u32, Response> {
    let raw = args.get("id").unwrap_or_default();
    raw.parse()
        .map_err(|_| Response::bad_request(format!("invalid book id: {raw}")))
}

fn poisoned() -> Response {
    error!("bookstore lock poisoned");
    Response::internal_server_error()
}
