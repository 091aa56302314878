use crate::http::headers::Headers;
use crate::http::parser::{ParseError, form_decode};
use std::collections::HashMap;
use std::fmt;

/// HTTP request methods.
///
/// The eight RFC 2616 methods plus PATCH, which is accepted so that every
/// body-bearing method can actually be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    OPTIONS,
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    TRACE,
    CONNECT,
    PATCH,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Matching is case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use webtoy::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OPTIONS" => Some(Method::OPTIONS),
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "TRACE" => Some(Method::TRACE),
            "CONNECT" => Some(Method::CONNECT),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::OPTIONS => "OPTIONS",
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::TRACE => "TRACE",
            Method::CONNECT => "CONNECT",
            Method::PATCH => "PATCH",
        }
    }

    /// Whether a request with this method may carry a body.
    pub fn has_body(&self) -> bool {
        matches!(self, Method::POST | Method::PUT | Method::DELETE | Method::PATCH)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed HTTP request.
///
/// Built from the header block by [`parse_head`](crate::http::parser::parse_head),
/// then completed with [`Request::attach_body`]. `Content-Length` and
/// `Content-Type` are always present in `headers`.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// The raw request target, query string included.
    pub url: String,
    /// The part of `url` before the first `?`.
    pub path: String,
    pub headers: Headers,
    /// Decoded query string, if the url had one.
    pub queries: Option<HashMap<String, String>>,
    /// Decoded `Cookie` header, if one was sent.
    pub cookies: Option<HashMap<String, String>>,
    pub body: Vec<u8>,
    /// Decoded form fields for `application/x-www-form-urlencoded` bodies.
    pub forms: Option<HashMap<String, String>>,
    declared_length: Option<usize>,
}

impl Request {
    pub const DEFAULT_CONTENT_TYPE: &'static str = "text/plain";
    pub const FORM_CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";

    pub(crate) fn from_parts(
        method: Method,
        url: String,
        path: String,
        headers: Headers,
        queries: Option<HashMap<String, String>>,
        cookies: Option<HashMap<String, String>>,
        declared_length: Option<usize>,
    ) -> Self {
        Self {
            method,
            url,
            path,
            headers,
            queries,
            cookies,
            body: Vec::new(),
            forms: None,
            declared_length,
        }
    }

    /// Retrieves a header value by exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// The body length the client declared, or 0 when it sent no
    /// `Content-Length`.
    pub fn content_length(&self) -> usize {
        self.declared_length.unwrap_or(0)
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.queries.as_ref()?.get(key).map(String::as_str)
    }

    pub fn cookie(&self, key: &str) -> Option<&str> {
        self.cookies.as_ref()?.get(key).map(String::as_str)
    }

    pub fn form(&self, key: &str) -> Option<&str> {
        self.forms.as_ref()?.get(key).map(String::as_str)
    }

    /// Body as UTF-8 text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    fn is_form(&self) -> bool {
        self.header("Content-Type")
            .and_then(|v| v.split(';').next())
            .is_some_and(|media| media.trim().eq_ignore_ascii_case(Self::FORM_CONTENT_TYPE))
    }

    /// Attaches the body and decodes form fields.
    ///
    /// Methods outside the body-bearing set ignore `body` entirely. Otherwise
    /// the body is cut to the declared `Content-Length` (or kept whole if none
    /// was sent), `Content-Length` is rewritten to the kept length, and a form
    /// body is decoded into [`Request::forms`].
    pub fn attach_body(&mut self, mut body: Vec<u8>) -> Result<(), ParseError> {
        if !self.method.has_body() {
            return Ok(());
        }

        let length = self.declared_length.unwrap_or(body.len()).min(body.len());
        body.truncate(length);
        self.headers.insert("Content-Length", length.to_string());

        if self.is_form() {
            let text = std::str::from_utf8(&body)
                .map_err(|_| ParseError::InvalidEncoding(String::from_utf8_lossy(&body).into_owned()))?;
            self.forms = Some(form_decode(text, "&")?);
        }

        self.body = body;
        Ok(())
    }
}

/// Builder for constructing Request objects outside the wire parser.
pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<String>,
    headers: Headers,
    body: Vec<u8>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            url: None,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Renders the parts to wire form and runs them through the parser, so
    /// built requests get exactly the decoding a received one would.
    pub fn build(self) -> Result<Request, ParseError> {
        let method = self.method.ok_or_else(|| ParseError::InvalidRequestLine("method missing".into()))?;
        let url = self.url.ok_or_else(|| ParseError::InvalidRequestLine("url missing".into()))?;

        let mut head = format!("{} {} {}\r\n", method, url, crate::http::parser::HTTP_VERSION);
        for (k, v) in self.headers.iter() {
            head.push_str(k);
            head.push_str(": ");
            head.push_str(v);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        let mut request = crate::http::parser::parse_head(head.as_bytes())?;
        request.attach_body(self.body)?;
        Ok(request)
    }
}
