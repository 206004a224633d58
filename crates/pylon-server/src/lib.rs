//! # Pylon Server
//!
//! The default router and HTTP transport for Pylon endpoints.
//!
//! The heavy lifting happens in `pylon-pipeline`; this crate only finds the
//! right engine for a request and moves bytes:
//!
//! - [`Router`] binds endpoints to method + path patterns (with `{name}`
//!   parameters), rejects duplicate bindings, and answers unmatched requests
//!   with the standard 404 envelope.
//! - [`Server`] accepts TCP connections, serves them over HTTP/1.1 via
//!   hyper, collects request bodies up front, and enforces the optional
//!   per-request time budget (408 while reading the body, 504 during
//!   dispatch).
//! - [`ShutdownSignal`] and [`ConnectionTracker`] coordinate graceful
//!   shutdown: stop accepting, then drain in-flight connections up to the
//!   configured timeout.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pylon_pipeline::MiddlewareRegistry;
//! use pylon_server::{Router, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = MiddlewareRegistry::builder()
//!         .auth_gate(MyAuthGate)
//!         .build();
//!
//!     let mut router = Router::new();
//!     router.register(ListItems::new(), &registry)?;
//!     router.register(DownloadReport::new(), &registry)?;
//!
//!     Server::new(ServerConfig::default(), router).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/pylon-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod router;
mod server;
mod shutdown;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use router::{Router, RouterError};
pub use server::{Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
