use webtoy::app::{Application, Reply};
use webtoy::http::parser::parse_http_request;
use webtoy::http::request::Method;
use webtoy::http::response::{Canned, Response, StatusCode};

fn hello_app() -> Application {
    let mut app = Application::new();
    app.get("/hello", |req| Ok(Response::ok(req.query("name").unwrap_or("anonymous"))));
    app
}

#[test]
fn test_application_routes_to_handler() {
    let app = hello_app();
    let req = parse_http_request(b"GET /hello?name=guiqiqi HTTP/1.1\r\n\r\n").unwrap();

    let response = app.respond(&req);
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"guiqiqi");
}

#[test]
fn test_application_unknown_path_is_404() {
    let app = hello_app();
    let req = parse_http_request(b"GET /nope HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(app.respond(&req).status, StatusCode::NOT_FOUND);
}

#[test]
fn test_application_wrong_method_is_405() {
    let app = hello_app();
    let req = parse_http_request(b"POST /hello HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(app.respond(&req).status, StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_application_handler_error_is_502() {
    let mut app = Application::new();
    app.get("/fail", |_req| Err(anyhow::anyhow!("database unreachable")));
    let req = parse_http_request(b"GET /fail HTTP/1.1\r\n\r\n").unwrap();

    let response = app.respond(&req);
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.body.is_empty());
}

#[test]
fn test_application_handler_panic_is_502() {
    let mut app = Application::new();
    app.get("/panic", |_req| panic!("handler bug"));
    let req = parse_http_request(b"GET /panic HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(app.respond(&req).status, StatusCode::BAD_GATEWAY);
}

#[test]
fn test_application_returns_handler_response_unchanged() {
    let mut app = Application::new();
    app.route("/teapot", &[Method::GET, Method::PUT], |_req| {
        let mut response = Response::new(418u16, "short and stout");
        response.headers.insert("X-Kind", "teapot");
        Ok(response)
    });
    let req = parse_http_request(b"PUT /teapot HTTP/1.1\r\n\r\n").unwrap();

    let response = app.respond(&req);
    assert_eq!(response.status.as_u16(), 418);
    assert_eq!(response.header("X-Kind"), Some("teapot"));
    assert_eq!(response.body, b"short and stout");
}

#[test]
fn test_application_dispatch_keeps_failures_canned() {
    let mut app = hello_app();
    app.get("/fail", |_req| Err(anyhow::anyhow!("boom")));

    let dispatch = |raw: &[u8]| app.dispatch(&parse_http_request(raw).unwrap());

    assert!(matches!(dispatch(b"GET /nope HTTP/1.1\r\n\r\n"), Reply::Canned(Canned::NotFound)));
    assert!(matches!(
        dispatch(b"POST /hello HTTP/1.1\r\n\r\n"),
        Reply::Canned(Canned::MethodNotAllowed)
    ));
    assert!(matches!(dispatch(b"GET /fail HTTP/1.1\r\n\r\n"), Reply::Canned(Canned::BadGateway)));

    let reply = dispatch(b"GET /hello?name=x HTTP/1.1\r\n\r\n");
    assert_eq!(reply.status(), StatusCode::OK);
    assert!(matches!(reply, Reply::Handler(_)));
}
