//! webtoy - a minimal HTTP/1.1 server
//!
//! Core library: request ingestion, routing and response rendering.

pub mod app;
pub mod config;
pub mod http;
pub mod server;

pub use app::Application;
pub use config::{Config, Limits};
pub use http::request::{Method, Request};
pub use http::response::Response;
pub use server::Server;
