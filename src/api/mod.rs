//! HTTP upload interface.
//!
//! A single page at `/` posts a PDF to `/api/extract`; the JSON endpoints
//! under `/api/` expose the model registry. The router is composable:
//! `api_router()` returns a `Router` that any axum server can mount.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod staging;
pub mod types;

pub use router::api_router;
pub use server::{serve_until_shutdown, start_server, ApiServer};
pub use types::ApiContext;
