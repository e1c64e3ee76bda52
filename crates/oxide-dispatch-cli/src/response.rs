//! Responses produced by the bookstore handlers, and the sink that writes
//! them out.

use std::collections::BTreeMap;
use std::io::Write;

use oxide_dispatch::{ResultSink, Verb};
use tracing::warn;

/// An HTTP-like response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// Response headers, sorted for stable output.
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a new response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a JSON response.
    pub fn json<T: serde::Serialize>(status: u16, data: &T) -> Self {
        match serde_json::to_vec(data) {
            Ok(body) => Self::new(status)
                .header("Content-Type", "application/json")
                .body(body),
            Err(_) => Self::internal_server_error(),
        }
    }

    /// Creates a plain-text response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::new(status)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
    }

    /// Creates a 204 No Content response.
    pub fn no_content() -> Self {
        Self::new(204)
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::text(400, reason)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::text(404, "Not Found")
    }

    /// Creates a 405 response listing the allowed verbs.
    pub fn method_not_allowed(allowed: &[Verb]) -> Self {
        let allow = allowed
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self::text(405, "Method Not Allowed").header("Allow", allow)
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_server_error() -> Self {
        Self::text(500, "Internal Server Error")
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the body as a string.
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    /// Returns the status text for the current status code.
    pub fn status_text(&self) -> &'static str {
        match self.status {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }
}

/// Writes every response it receives to an output stream.
pub struct ResponseWriter<W> {
    out: W,
    written: usize,
    error: Option<std::io::Error>,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: 0,
            error: None,
        }
    }

    /// Number of responses written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Takes the first error hit while writing dispatched responses.
    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.error.take()
    }

    /// Writes one response.
    pub fn write(&mut self, res: &Response) -> std::io::Result<()> {
        writeln!(self.out, "{} {}", res.status, res.status_text())?;
        for (key, value) in &res.headers {
            writeln!(self.out, "{key}: {value}")?;
        }
        if !res.body.is_empty() {
            writeln!(self.out)?;
            self.out.write_all(&res.body)?;
            writeln!(self.out)?;
        }
        self.written += 1;
        Ok(())
    }
}

impl<W: Write> ResultSink<Response> for ResponseWriter<W> {
    fn process(&mut self, result: Response) {
        // Once the output is broken, drop the rest of the batch.
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write(&result) {
            warn!(status = result.status, error = %e, "failed to write response");
            self.error = Some(e);
        }
    }
}
