use crate::http::headers::Headers;
use crate::http::request::{Method, Request};
use std::collections::HashMap;

/// The only request version the server accepts.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Reasons a request could not be parsed.
///
/// Every variant other than `Incomplete` means the client sent an invalid
/// request; the connection engine answers those with an error status and
/// closes the connection.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid request line: {0:?}")]
    InvalidRequestLine(String),

    #[error("invalid request method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid request version: {0:?}")]
    InvalidVersion(String),

    #[error("invalid header line: {0:?}")]
    InvalidHeader(String),

    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),

    #[error("invalid url encoded data: {0:?}")]
    InvalidEncoding(String),

    #[error("request header block is incomplete")]
    Incomplete,
}

/// Locates the blank line that terminates a header block.
///
/// The scanner keeps the last four bytes it has seen and remembers how far
/// into the buffer it got, so each call only inspects bytes appended since
/// the previous call.
#[derive(Debug, Default)]
pub struct HeaderTerminator {
    window: u32,
    scanned: usize,
}

impl HeaderTerminator {
    const CRLF_CRLF: u32 = u32::from_be_bytes(*b"\r\n\r\n");

    pub fn new() -> Self {
        Self::default()
    }

    /// Scans newly appended bytes of `buf`.
    ///
    /// Returns the length of the header block, terminator included, once the
    /// terminator has been seen. `buf` must only ever grow between calls.
    pub fn scan(&mut self, buf: &[u8]) -> Option<usize> {
        while self.scanned < buf.len() {
            self.window = (self.window << 8) | u32::from(buf[self.scanned]);
            self.scanned += 1;

            if self.window == Self::CRLF_CRLF {
                return Some(self.scanned);
            }
        }

        None
    }
}

/// Parses a complete header block (request line, header lines, blank line).
///
/// The returned request has no body yet; see [`Request::attach_body`].
pub fn parse_head(head: &[u8]) -> Result<Request, ParseError> {
    let head = std::str::from_utf8(head)
        .map_err(|_| ParseError::InvalidHeader(String::from_utf8_lossy(head).into_owned()))?;

    let mut lines = head.split("\r\n");

    let request_line = lines
        .next()
        .ok_or_else(|| ParseError::InvalidRequestLine(String::new()))?;
    let (method, url, path, queries) = parse_request_line(request_line)?;

    let mut headers = Headers::new();
    let mut cookies = None;

    for line in lines {
        if line.is_empty() {
            break;
        }

        let (key, value) = parse_header_line(line)?;
        if key == "Cookie" {
            cookies = Some(url_decode(value, "; ")?);
        }
        headers.insert(key, value);
    }

    let declared_length = match headers.get("Content-Length") {
        Some(v) => Some(parse_content_length(v)?),
        None => None,
    };

    if !headers.contains_key("Content-Length") {
        headers.insert("Content-Length", "0");
    }
    if !headers.contains_key("Content-Type") {
        headers.insert("Content-Type", Request::DEFAULT_CONTENT_TYPE);
    }

    Ok(Request::from_parts(
        method,
        url.to_string(),
        path.to_string(),
        headers,
        queries,
        cookies,
        declared_length,
    ))
}

/// Parses a full request held in one buffer: header block plus body.
///
/// Returns [`ParseError::Incomplete`] if the buffer holds no header
/// terminator. Bytes after the terminator are attached as the body.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    let head_len = HeaderTerminator::new()
        .scan(buf)
        .ok_or(ParseError::Incomplete)?;

    let mut request = parse_head(&buf[..head_len])?;
    request.attach_body(buf[head_len..].to_vec())?;
    Ok(request)
}

type RequestLine<'a> = (Method, &'a str, &'a str, Option<HashMap<String, String>>);

/// `Method SP Request-URI SP HTTP-Version`
fn parse_request_line(line: &str) -> Result<RequestLine<'_>, ParseError> {
    let parts: Vec<&str> = line.split(' ').collect();
    let &[method, url, version] = parts.as_slice() else {
        return Err(ParseError::InvalidRequestLine(line.to_string()));
    };

    let method = Method::from_str(method).ok_or_else(|| ParseError::InvalidMethod(method.to_string()))?;

    if version != HTTP_VERSION {
        return Err(ParseError::InvalidVersion(version.to_string()));
    }

    let (path, queries) = match url.split_once('?') {
        Some((path, query)) => (path, Some(form_decode(query, "&")?)),
        None => (url, None),
    };

    Ok((method, url, path, queries))
}

/// `Content-Length = 1*DIGIT`; signs and whitespace are not allowed.
fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidContentLength(value.to_string()));
    }

    value
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidContentLength(value.to_string()))
}

/// `header-key ": " header-value`
fn parse_header_line(line: &str) -> Result<(&str, &str), ParseError> {
    let mut parts = line.split(": ");

    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) if !key.is_empty() => Ok((key, value)),
        _ => Err(ParseError::InvalidHeader(line.to_string())),
    }
}

/// Decodes `key=value` pairs separated by `delimiter`, percent-decoding values.
///
/// Segments without `=` are skipped. `"Great=Hello%20world&Language=Java"`
/// with `"&"` yields `{"Great": "Hello world", "Language": "Java"}`.
pub fn url_decode(params: &str, delimiter: &str) -> Result<HashMap<String, String>, ParseError> {
    decode_pairs(params, delimiter, false)
}

/// Like [`url_decode`] but also decodes `+` as a space, as
/// `application/x-www-form-urlencoded` bodies and query strings do.
pub fn form_decode(params: &str, delimiter: &str) -> Result<HashMap<String, String>, ParseError> {
    decode_pairs(params, delimiter, true)
}

fn decode_pairs(
    params: &str,
    delimiter: &str,
    plus_as_space: bool,
) -> Result<HashMap<String, String>, ParseError> {
    let mut result = HashMap::new();

    for param in params.split(delimiter) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };

        let value = percent_decode(value.as_bytes(), plus_as_space)
            .ok_or_else(|| ParseError::InvalidEncoding(param.to_string()))?;
        result.insert(key.to_string(), value);
    }

    Ok(result)
}

fn percent_decode(input: &[u8], plus_as_space: bool) -> Option<String> {
    let mut decoded = Vec::with_capacity(input.len());

    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'%' => {
                let hi = hex_digit(*input.get(i + 1)?)?;
                let lo = hex_digit(*input.get(i + 2)?)?;
                decoded.push(hi << 4 | lo);
                i += 3;
            }
            b'+' if plus_as_space => {
                decoded.push(b' ');
                i += 1;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded).ok()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
