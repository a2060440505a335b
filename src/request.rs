//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use hyper::body::Incoming;

/// An incoming HTTP request.
///
/// The body is **not** buffered: [`Request::into_body`] hands out the live
/// byte stream, so a handler can forward gigabytes without the server ever
/// holding more than a frame in memory.
pub struct Request {
    head: http::request::Parts,
    body: Incoming,
    params: HashMap<String, String>,
    remote_addr: SocketAddr,
}

impl Request {
    pub(crate) fn new(
        req: hyper::Request<Incoming>,
        params: HashMap<String, String>,
        remote_addr: SocketAddr,
    ) -> Self {
        let (head, body) = req.into_parts();
        Self { head, body, params, remote_addr }
    }

    pub fn method(&self) -> &http::Method {
        &self.head.method
    }

    pub fn path(&self) -> &str {
        self.head.uri.path()
    }

    /// The peer address of the connection this request arrived on.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Case-insensitive header lookup. Returns `None` for headers whose
    /// value is not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Consumes the request and returns the body stream.
    pub fn into_body(self) -> Incoming {
        self.body
    }
}
