//! Routing and dispatch.
//!
//! - **`router`**: (path, method) to handler table with distinct 404/405 misses
//! - **`application`**: calls the matched handler and maps failures to statuses

pub mod application;
pub mod router;

pub use application::{Application, Reply};
pub use router::{Handler, RouteError, Router};
