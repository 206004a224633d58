//! # Pylon
//!
//! **Declarative endpoint framework with a fixed request lifecycle**
//!
//! Pylon turns a declarative endpoint description into a running HTTP
//! service:
//!
//! - 📋 **Declarative Endpoints** – Each endpoint states its method, path,
//!   auth requirement, and response kind up front
//! - 🔒 **Auth by Default** – Every endpoint passes the auth gate unless it
//!   explicitly opts out
//! - 🧱 **Fixed Pipeline** – Stages always run in the same order and cannot
//!   be reordered per endpoint
//! - 📦 **One Response per Request** – Every request produces exactly one
//!   response or one structured error envelope
//! - 🌊 **Streaming Responses** – File and stream payloads relay chunk by
//!   chunk with a completion notice to the endpoint
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pylon::prelude::*;
//!
//! struct Ping {
//!     descriptor: EndpointDescriptor,
//! }
//!
//! impl Ping {
//!     fn new() -> Self {
//!         Self {
//!             descriptor: EndpointDescriptor::new(RouteMethod::Get, "/ping")
//!                 .with_auth_required(false),
//!         }
//!     }
//! }
//!
//! impl Endpoint for Ping {
//!     fn descriptor(&self) -> &EndpointDescriptor {
//!         &self.descriptor
//!     }
//!
//!     fn handle<'a>(&'a self, _request: &'a RequestData) -> BoxFuture<'a, HttpResult<Payload>> {
//!         Box::pin(async { Payload::json(&serde_json::json!({"pong": true})) })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = MiddlewareRegistry::builder().build();
//!     let mut router = Router::new();
//!     router.register(Ping::new(), &registry)?;
//!
//!     Server::new(ServerConfig::default(), router).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Every request walks the same pipeline; no stage can be skipped or
//! reordered:
//!
//! ```text
//! Request → Validate → AuthGate → SharedMiddleware → HeaderHook → Handler
//!                                                                    ↓
//! Response ←──────────────── ResponseDispatcher ←───────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/pylon/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the vocabulary crate
pub use pylon_core as core;

// Re-export the lifecycle pipeline
pub use pylon_pipeline as pipeline;

// Re-export the router and HTTP transport
pub use pylon_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use pylon::prelude::*;
/// ```
pub mod prelude {
    pub use pylon_core::{
        BoxFuture, Endpoint, EndpointDescriptor, FieldError, FnValidator, HttpError, HttpResult,
        Payload, Request, RequestData, RequestId, Response, ResponseEnvelope, ResponseKind,
        RouteMethod, Validator,
    };

    // Re-export pipeline assembly types
    pub use pylon_pipeline::{
        FnMiddleware, LifecycleEngine, Middleware, MiddlewareContext, MiddlewareRegistry,
        MissingGatePolicy, Next,
    };

    // Re-export serving types
    pub use pylon_server::{
        Router, RouterError, Server, ServerConfig, ServerError, ShutdownSignal,
    };
}
