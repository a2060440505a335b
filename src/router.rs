//! Radix-tree request router.
//!
//! One tree for all HTTP methods: the routing decision here is made on the
//! path alone, and a matched handler sees every method unchanged. Exact
//! matches only — `/echo` does not match `/echo/` or `/echoes`.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};

/// The application router.
///
/// O(path-length) lookup via [`matchit`]. Build it once at startup; pass it
/// to [`Server::start`](crate::Server::start). Each [`Router::route`] call
/// returns `self` so registrations chain naturally.
pub struct Router {
    tree: MatchitRouter<BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self { tree: MatchitRouter::new() }
    }

    /// Register a handler for a path, regardless of HTTP method.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves
    /// them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern or conflicts with an
    /// existing registration. Routes are registered at startup, before the
    /// listener binds, so a bad pattern fails the process early.
    pub fn route(mut self, path: &str, handler: impl Handler) -> Self {
        self.tree
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(&self, path: &str) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let matched = self.tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
