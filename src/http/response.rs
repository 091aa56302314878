use crate::http::headers::Headers;
use crate::http::writer::render;
use bytes::Bytes;
use once_cell::sync::Lazy;
use std::fmt;

/// An HTTP status code.
///
/// Any `u16` is accepted; codes missing from the reason table render with
/// the placeholder reason `unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const REQUEST_TIMEOUT: StatusCode = StatusCode(408);
    pub const LENGTH_REQUIRED: StatusCode = StatusCode(411);
    pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
    pub const HEADER_FIELDS_TOO_LARGE: StatusCode = StatusCode(431);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);

    pub const UNKNOWN_REASON: &'static str = "unknown";

    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use webtoy::http::response::StatusCode;
    /// assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the reason phrase for this status code.
    ///
    /// ```
    /// # use webtoy::http::response::StatusCode;
    /// assert_eq!(StatusCode(431).reason_phrase(), "Request Header Fields Too Large");
    /// assert_eq!(StatusCode(299).reason_phrase(), "unknown");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            102 => "Processing",
            103 => "Early Hints",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            203 => "Non-Authoritative Information",
            204 => "No Content",
            205 => "Reset Content",
            206 => "Partial Content",
            207 => "Multi-Status",
            208 => "Already Reported",
            226 => "IM Used",
            300 => "Multiple Choices",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            305 => "Use Proxy",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            402 => "Payment Required",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            407 => "Proxy Authentication Required",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            412 => "Precondition Failed",
            413 => "Payload Too Large",
            414 => "URI Too Long",
            415 => "Unsupported Media Type",
            416 => "Range Not Satisfiable",
            417 => "Expectation Failed",
            421 => "Misdirected Request",
            422 => "Unprocessable Entity",
            423 => "Locked",
            424 => "Failed Dependency",
            425 => "Too Early",
            426 => "Upgrade Required",
            428 => "Precondition Required",
            429 => "Too Many Requests",
            431 => "Request Header Fields Too Large",
            451 => "Unavailable For Legal Reasons",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            506 => "Variant Also Negotiates",
            507 => "Insufficient Storage",
            508 => "Loop Detected",
            510 => "Not Extended",
            511 => "Network Authentication Required",
            _ => Self::UNKNOWN_REASON,
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// An HTTP response produced by a handler or by the server itself.
///
/// `Content-Length` is always recomputed from `body` when the response is
/// rendered, and `Content-Type` falls back to `text/html` if unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    pub const DEFAULT_CONTENT_TYPE: &'static str = "text/html";

    pub fn new(status: impl Into<StatusCode>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: status.into(),
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// A response with the given status and an empty body.
    pub fn with_status(status: impl Into<StatusCode>) -> Self {
        Self::new(status, Vec::new())
    }

    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Wire bytes for this response.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(render(self))
    }
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use webtoy::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::OK)
///     .header("Content-Type", "application/json")
///     .body("{}")
///     .build();
/// assert_eq!(response.header("Content-Type"), Some("application/json"));
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
}

impl ResponseBuilder {
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

// Rendered once, written verbatim on every protocol error.
static BAD_REQUEST: Lazy<Bytes> = Lazy::new(|| Response::with_status(StatusCode::BAD_REQUEST).to_bytes());
static NOT_FOUND: Lazy<Bytes> = Lazy::new(|| Response::with_status(StatusCode::NOT_FOUND).to_bytes());
static METHOD_NOT_ALLOWED: Lazy<Bytes> =
    Lazy::new(|| Response::with_status(StatusCode::METHOD_NOT_ALLOWED).to_bytes());
static REQUEST_TIMEOUT: Lazy<Bytes> = Lazy::new(|| Response::with_status(StatusCode::REQUEST_TIMEOUT).to_bytes());
static LENGTH_REQUIRED: Lazy<Bytes> = Lazy::new(|| Response::with_status(StatusCode::LENGTH_REQUIRED).to_bytes());
static PAYLOAD_TOO_LARGE: Lazy<Bytes> =
    Lazy::new(|| Response::with_status(StatusCode::PAYLOAD_TOO_LARGE).to_bytes());
static HEADER_FIELDS_TOO_LARGE: Lazy<Bytes> =
    Lazy::new(|| Response::with_status(StatusCode::HEADER_FIELDS_TOO_LARGE).to_bytes());
static BAD_GATEWAY: Lazy<Bytes> = Lazy::new(|| Response::with_status(StatusCode::BAD_GATEWAY).to_bytes());

/// Error statuses the server emits on its own, each with a pre-rendered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canned {
    BadRequest,
    NotFound,
    MethodNotAllowed,
    RequestTimeout,
    LengthRequired,
    PayloadTooLarge,
    HeaderFieldsTooLarge,
    BadGateway,
}

impl Canned {
    pub fn status(&self) -> StatusCode {
        match self {
            Canned::BadRequest => StatusCode::BAD_REQUEST,
            Canned::NotFound => StatusCode::NOT_FOUND,
            Canned::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Canned::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Canned::LengthRequired => StatusCode::LENGTH_REQUIRED,
            Canned::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Canned::HeaderFieldsTooLarge => StatusCode::HEADER_FIELDS_TOO_LARGE,
            Canned::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }

    /// The shared rendered bytes. Cloning a `Bytes` does not copy.
    pub fn bytes(&self) -> Bytes {
        let rendered: &Lazy<Bytes> = match self {
            Canned::BadRequest => &BAD_REQUEST,
            Canned::NotFound => &NOT_FOUND,
            Canned::MethodNotAllowed => &METHOD_NOT_ALLOWED,
            Canned::RequestTimeout => &REQUEST_TIMEOUT,
            Canned::LengthRequired => &LENGTH_REQUIRED,
            Canned::PayloadTooLarge => &PAYLOAD_TOO_LARGE,
            Canned::HeaderFieldsTooLarge => &HEADER_FIELDS_TOO_LARGE,
            Canned::BadGateway => &BAD_GATEWAY,
        };
        Bytes::clone(rendered)
    }

    pub fn response(&self) -> Response {
        Response::with_status(self.status())
    }
}
