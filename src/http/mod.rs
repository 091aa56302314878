//! HTTP protocol implementation.
//!
//! Serves exactly one request per connection; there is no keep-alive.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine driving reads, dispatch and the write
//! - **`parser`**: request line, header lines, url decoding and header terminator scanning
//! - **`headers`**: ordered header map shared by requests and responses
//! - **`request`**: HTTP request representation and body attachment
//! - **`response`**: status codes, responses and pre-rendered error responses
//! - **`writer`**: serializes and writes HTTP responses to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────────┐
//!        │  ReadingHeader  │ ← Read until CRLF CRLF (431 at the size cap)
//!        └──────┬──────────┘
//!               │ Terminator found
//!               ▼
//!        ┌─────────────────┐
//!        │ HeaderComplete  │ ← Parse head (411 if malformed, 413 if too long)
//!        └──────┬──────────┘
//!               ▼
//!        ┌─────────────────┐
//!        │   ReadingBody   │ ← Read the rest of Content-Length (400 if undecodable)
//!        └──────┬──────────┘
//!               ▼
//!        ┌─────────────────┐
//!        │   Dispatching   │ ← Route and run the handler (404 / 405 / 502)
//!        └──────┬──────────┘
//!               ▼
//!        ┌─────────────────┐
//!        │     Writing     │ ← Send response to client
//!        └──────┬──────────┘
//!               ▼
//!            Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use webtoy::app::Application;
//! use webtoy::config::Limits;
//! use webtoy::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = Arc::new(Application::new());
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, addr) = listener.accept().await?;
//!         let app = Arc::clone(&app);
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, addr.to_string(), app, Limits::default());
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
