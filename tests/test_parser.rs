use std::collections::HashMap;
use webtoy::http::parser::{HeaderTerminator, ParseError, form_decode, parse_head, parse_http_request, url_decode};
use webtoy::http::request::Method;

fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_parse_get_with_query() {
    let req = b"GET /hello?test=1&other=0 HTTP/1.1\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.url, "/hello?test=1&other=0");
    assert_eq!(parsed.path, "/hello");
    assert_eq!(parsed.queries, Some(map(&[("test", "1"), ("other", "0")])));
}

#[test]
fn test_parse_query_skips_pairs_without_value() {
    let req = b"GET /hello?test=1&other=0&incompleteIgnore HTTP/1.1\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.query("test"), Some("1"));
    assert_eq!(parsed.query("other"), Some("0"));
    assert_eq!(parsed.query("incompleteIgnore"), None);
}

#[test]
fn test_parse_without_query_has_no_query_map() {
    let parsed = parse_http_request(b"GET /plain HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.path, "/plain");
    assert!(parsed.queries.is_none());
    assert!(parsed.cookies.is_none());
}

#[test]
fn test_parse_post_form_body() {
    let req = b"POST /foo.php HTTP/1.1\r\n\
        Content-Type: application/x-www-form-urlencoded\r\n\
        Content-Length: 43\r\n\
        Cookie: PHPSESSID=r2t5uvjq435r4q7ib3vtdjq120\r\n\
        \r\n\
        first_name=John&last_name=Doe&action=Submit";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(
        parsed.forms,
        Some(map(&[("first_name", "John"), ("last_name", "Doe"), ("action", "Submit")]))
    );
    assert_eq!(parsed.cookie("PHPSESSID"), Some("r2t5uvjq435r4q7ib3vtdjq120"));
}

#[test]
fn test_parse_multiple_cookies() {
    let req = b"GET / HTTP/1.1\r\nCookie: a=1; b=hello%20there\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.cookies, Some(map(&[("a", "1"), ("b", "hello there")])));
}

#[test]
fn test_parse_duplicate_headers_last_wins() {
    let req = b"GET / HTTP/1.1\r\nX-Token: first\r\nX-Token: second\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.header("X-Token"), Some("second"));
}

#[test]
fn test_parse_defaults_content_headers() {
    let parsed = parse_head(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();

    assert_eq!(parsed.header("Content-Length"), Some("0"));
    assert_eq!(parsed.header("Content-Type"), Some("text/plain"));
    assert_eq!(parsed.header("Host"), Some("example.com"));
}

#[test]
fn test_parse_request_line_needs_three_tokens() {
    let result = parse_head(b"GET /\r\n\r\n");
    assert!(matches!(result, Err(ParseError::InvalidRequestLine(_))));

    let result = parse_head(b"GET  / HTTP/1.1\r\n\r\n");
    assert!(matches!(result, Err(ParseError::InvalidRequestLine(_))));
}

#[test]
fn test_parse_invalid_http_method() {
    let result = parse_head(b"INVALID / HTTP/1.1\r\n\r\n");
    assert_eq!(result.unwrap_err(), ParseError::InvalidMethod("INVALID".to_string()));

    let result = parse_head(b"get / HTTP/1.1\r\n\r\n");
    assert!(matches!(result, Err(ParseError::InvalidMethod(_))));
}

#[test]
fn test_parse_rejects_other_versions() {
    let result = parse_head(b"GET / HTTP/1.0\r\n\r\n");
    assert_eq!(result.unwrap_err(), ParseError::InvalidVersion("HTTP/1.0".to_string()));
}

#[test]
fn test_parse_malformed_header() {
    let result = parse_head(b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n");
    assert!(matches!(result, Err(ParseError::InvalidHeader(_))));

    let result = parse_head(b"GET / HTTP/1.1\r\nHost:example.com\r\n\r\n");
    assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
}

#[test]
fn test_parse_invalid_content_length() {
    let result = parse_head(b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n");
    assert!(matches!(result, Err(ParseError::InvalidContentLength(_))));
}

#[test]
fn test_parse_content_length_must_be_plain_digits() {
    for value in ["+5", "-0", " 5", "5 ", "0x10", ""] {
        let raw = format!("POST / HTTP/1.1\r\nContent-Length: {value}\r\n\r\n");
        let result = parse_head(raw.as_bytes());
        assert_eq!(
            result.unwrap_err(),
            ParseError::InvalidContentLength(value.to_string()),
            "{value:?}"
        );
    }

    let parsed = parse_head(b"POST / HTTP/1.1\r\nContent-Length: 007\r\n\r\n").unwrap();
    assert_eq!(parsed.content_length(), 7);
}

#[test]
fn test_parse_bad_query_escape() {
    let result = parse_head(b"GET /x?q=%zz HTTP/1.1\r\n\r\n");
    assert!(matches!(result, Err(ParseError::InvalidEncoding(_))));
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let result = parse_http_request(b"GET / HTTP/1.1\r\nHost: example.com\r\n");
    assert_eq!(result.unwrap_err(), ParseError::Incomplete);
}

#[test]
fn test_parse_various_http_methods() {
    let methods = vec![
        ("OPTIONS", Method::OPTIONS),
        ("GET", Method::GET),
        ("HEAD", Method::HEAD),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("TRACE", Method::TRACE),
        ("CONNECT", Method::CONNECT),
        ("PATCH", Method::PATCH),
    ];

    for (method_str, expected_method) in methods {
        let req = format!("{} / HTTP/1.1\r\n\r\n", method_str);
        let parsed = parse_http_request(req.as_bytes()).unwrap();
        assert_eq!(parsed.method, expected_method);
    }
}

#[test]
fn test_url_decode_example() {
    let decoded = url_decode("Great=Hello%20world&Language=Java", "&").unwrap();
    assert_eq!(decoded, map(&[("Great", "Hello world"), ("Language", "Java")]));
}

#[test]
fn test_url_decode_is_idempotent_on_plain_ascii() {
    let once = url_decode("a=plain text&b=x+y", "&").unwrap();
    assert_eq!(once, map(&[("a", "plain text"), ("b", "x+y")]));

    for (k, v) in &once {
        let again = url_decode(&format!("{k}={v}"), "&").unwrap();
        assert_eq!(again.get(k), Some(v));
    }
}

#[test]
fn test_url_decode_multibyte() {
    let decoded = url_decode("name=%E4%BD%A0%E5%A5%BD", "&").unwrap();
    assert_eq!(decoded.get("name").map(String::as_str), Some("你好"));
}

#[test]
fn test_url_decode_value_keeps_later_equals() {
    let decoded = url_decode("expr=a=b", "&").unwrap();
    assert_eq!(decoded.get("expr").map(String::as_str), Some("a=b"));
}

#[test]
fn test_url_decode_errors() {
    assert!(matches!(url_decode("a=%", "&"), Err(ParseError::InvalidEncoding(_))));
    assert!(matches!(url_decode("a=%4", "&"), Err(ParseError::InvalidEncoding(_))));
    assert!(matches!(url_decode("a=%G0", "&"), Err(ParseError::InvalidEncoding(_))));
    assert!(matches!(url_decode("a=%FF%FE", "&"), Err(ParseError::InvalidEncoding(_))));
}

#[test]
fn test_url_decode_empty_input() {
    assert!(url_decode("", "&").unwrap().is_empty());
}

#[test]
fn test_form_decode_plus_is_space() {
    let decoded = form_decode("q=hello+world", "&").unwrap();
    assert_eq!(decoded.get("q").map(String::as_str), Some("hello world"));
}

#[test]
fn test_header_terminator_incremental() {
    let mut scanner = HeaderTerminator::new();
    let mut buf = Vec::new();

    let chunks: [&[u8]; 4] = [b"GET / HTTP/1.1\r", b"\nHost: a\r\n", b"\r", b"\nbody"];
    for chunk in chunks {
        buf.extend_from_slice(chunk);
        if let Some(end) = scanner.scan(&buf) {
            assert_eq!(&buf[..end], b"GET / HTTP/1.1\r\nHost: a\r\n\r\n");
            assert_eq!(&buf[end..], b"body");
            return;
        }
    }

    panic!("terminator not found");
}

#[test]
fn test_header_terminator_ignores_lone_newlines() {
    let mut scanner = HeaderTerminator::new();
    assert_eq!(scanner.scan(b"GET / HTTP/1.1\n\n\r\n\n"), None);
}
