use crate::app::router::{Handler, RouteError, Router};
use crate::http::request::{Method, Request};
use crate::http::response::{Canned, Response, StatusCode};
use crate::http::writer::ResponseWriter;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Dispatches requests to registered handlers.
///
/// Routes are registered up front; the server then shares the application
/// immutably behind an `Arc`.
///
/// ```
/// use webtoy::app::Application;
/// use webtoy::http::request::{Method, RequestBuilder};
/// use webtoy::http::response::Response;
///
/// let mut app = Application::new();
/// app.get("/hello", |req| Ok(Response::ok(req.query("name").unwrap_or("anonymous"))));
///
/// let req = RequestBuilder::new().method(Method::GET).url("/hello?name=guiqiqi").build().unwrap();
/// assert_eq!(app.respond(&req).body, b"guiqiqi");
/// ```
/// What the dispatcher decided to send back.
///
/// Routing misses and handler failures resolve to a [`Canned`] response whose
/// pre-rendered bytes go on the wire unchanged.
#[derive(Debug)]
pub enum Reply {
    Handler(Response),
    Canned(Canned),
}

impl Reply {
    pub fn status(&self) -> StatusCode {
        match self {
            Reply::Handler(response) => response.status,
            Reply::Canned(canned) => canned.status(),
        }
    }

    pub fn into_response(self) -> Response {
        match self {
            Reply::Handler(response) => response,
            Reply::Canned(canned) => canned.response(),
        }
    }

    /// Renders handler responses; canned ones reuse their shared bytes.
    pub fn into_writer(self) -> ResponseWriter {
        match self {
            Reply::Handler(response) => ResponseWriter::new(&response),
            Reply::Canned(canned) => ResponseWriter::from_bytes(canned.bytes()),
        }
    }
}

#[derive(Default)]
pub struct Application {
    router: Router,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F>(&mut self, path: &str, methods: &[Method], handler: F) -> &mut Self
    where
        F: Fn(&Request) -> anyhow::Result<Response> + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.router.register(path, methods, handler);
        self
    }

    /// Shorthand for a GET-only route.
    pub fn get<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request) -> anyhow::Result<Response> + Send + Sync + 'static,
    {
        self.route(path, &[Method::GET], handler)
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Produces the response for `request`.
    ///
    /// Unsupported methods answer 405, unknown paths 404, and a handler that
    /// fails or panics 502. Otherwise the handler's response is returned as is.
    pub fn respond(&self, request: &Request) -> Response {
        self.dispatch(request).into_response()
    }

    /// Like [`Application::respond`], but keeps error outcomes as [`Canned`]
    /// so the connection can write their pre-rendered bytes.
    pub fn dispatch(&self, request: &Request) -> Reply {
        let handler = match self.router.lookup(&request.path, request.method) {
            Ok(handler) => handler,
            Err(RouteError::UnsupportedMethod { .. }) => return Reply::Canned(Canned::MethodNotAllowed),
            Err(RouteError::UrlNotFound { .. }) => return Reply::Canned(Canned::NotFound),
        };

        match catch_unwind(AssertUnwindSafe(|| handler(request))) {
            Ok(Ok(response)) => Reply::Handler(response),
            Ok(Err(e)) => {
                tracing::error!(
                    method = %request.method,
                    url = %request.url,
                    error = %format!("{e:#}"),
                    "Handler failed"
                );
                Reply::Canned(Canned::BadGateway)
            }
            Err(_) => {
                tracing::error!(
                    method = %request.method,
                    url = %request.url,
                    "Handler panicked"
                );
                Reply::Canned(Canned::BadGateway)
            }
        }
    }
}
