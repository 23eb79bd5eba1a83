//! # Trellis server
//!
//! HTTP application layer over the `trellis-core` radix router.
//!
//! ## Features
//! - Static, `:param` and trailing `*` routes with backtracking priority
//! - `404` / `405` / trailing-slash `301` fallbacks, each overridable
//! - Middleware applied per app, per scope and per route
//! - Prefix scopes sharing one route table
//! - JSON configuration and a tokio + hyper HTTP/1 serving loop
//!
//! ## Quick Start
//!
//! ```no_run
//! use trellis_server::{App, Json, Reply, Request, RequestLogger, Routes};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = App::new().port(3000);
//!     app.use_middleware(RequestLogger);
//!
//!     app.get("/", |_req: Request| async { "Hello, World!" })?;
//!     app.get("/api/users/:id", |req: Request| async move {
//!         let id = req.param("id").unwrap_or_default().into_owned();
//!         Reply::from(Json(json!({ "id": id })))
//!     })?;
//!
//!     let mut admin = app.sub("/admin", &[]);
//!     admin.get("/stats", |_req: Request| async { "ok" })?;
//!
//!     Ok(app.listen().await?)
//! }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

// Re-export main types for convenient use
pub use app::{redirect_location, App, Endpoint, Resolution, Routes, Scope};
pub use config::{GroupConfig, MiddlewareConfig, ResponseConfig, RouteConfig, ServerConfig, TrellisConfig};
pub use error::{TrellisError, TrellisResult};
pub use handler::{BoxedHandler, FixedResponse, Handler, HandlerFuture};
pub use middleware::{chain, middleware_fn, Middleware, RequestLogger};
pub use request::Request;
pub use response::{Json, Reply};

// Re-export important types from core crate for convenience
pub use trellis_core::{Method, Params, RouterError};
