//! Path and method based route table.

use crate::http::request::{Method, Request};
use crate::http::response::Response;
use std::collections::HashMap;
use std::sync::Arc;

/// A request handler.
///
/// Any `Fn(&Request) -> anyhow::Result<Response>` closure or function works.
/// Errors are opaque to the server: they become a 502 for the client.
pub type Handler = Arc<dyn Fn(&Request) -> anyhow::Result<Response> + Send + Sync>;

/// Why a (path, method) pair has no handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The path is routed, but not for this method. Maps to 405.
    #[error("unsupported method {method} for url {path}")]
    UnsupportedMethod { path: String, method: Method },

    /// Nothing is routed at this path. Maps to 404.
    #[error("invalid url {path}")]
    UrlNotFound { path: String },
}

#[derive(Default)]
pub struct Router {
    acceptable_methods: HashMap<String, Vec<Method>>,
    handlers: HashMap<(String, Method), Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `path` for each of `methods`.
    ///
    /// A pair that is already bound is silently rebound. Methods accumulate
    /// per path across calls.
    pub fn register(&mut self, path: &str, methods: &[Method], handler: Handler) {
        for &method in methods {
            let acceptable = self.acceptable_methods.entry(path.to_string()).or_default();
            if !acceptable.contains(&method) {
                acceptable.push(method);
            }

            self.handlers.insert((path.to_string(), method), Arc::clone(&handler));
        }
    }

    /// Looks up the handler for `path` and `method`.
    pub fn lookup(&self, path: &str, method: Method) -> Result<&Handler, RouteError> {
        let acceptable = self
            .acceptable_methods
            .get(path)
            .ok_or_else(|| RouteError::UrlNotFound { path: path.to_string() })?;

        if !acceptable.contains(&method) {
            return Err(RouteError::UnsupportedMethod {
                path: path.to_string(),
                method,
            });
        }

        self.handlers
            .get(&(path.to_string(), method))
            .ok_or_else(|| RouteError::UnsupportedMethod {
                path: path.to_string(),
                method,
            })
    }

    /// Methods registered for `path`, in registration order.
    pub fn methods(&self, path: &str) -> &[Method] {
        self.acceptable_methods.get(path).map(Vec::as_slice).unwrap_or(&[])
    }
}
