//! # Pylon Pipeline
//!
//! The request lifecycle pipeline for Pylon endpoints.
//!
//! Every request to a Pylon endpoint runs through the same fixed stage
//! order. Stages cannot be reordered or skipped per request; an endpoint's
//! descriptor decides only whether the auth gate applies.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → Validate → AuthGate → SharedMiddleware → HeaderHook → Handler → Dispatch
//!                │          │              │              │           │         │
//!                └──────────┴──────────────┴──── Err ─────┴───────────┴─────────┘
//!                                           ↓
//!                                    Error boundary → single JSON error response
//! ```
//!
//! | Stage | Source | Purpose |
//! |-------|--------|---------|
//! | 1 | Endpoint validator | Reject bad input with the full field-error list |
//! | 2 | Registry auth gate | Authenticate, when the descriptor requires it |
//! | 3 | Registry shared middleware | Cross-cutting stages, registration order |
//! | 4 | Endpoint header hook | Decide status and headers before the body |
//! | 5 | Endpoint handler | Produce the payload |
//! | 6 | Dispatcher | Check payload against the declared kind and send |
//!
//! ## Guarantees
//!
//! - **One response per request**: [`LifecycleEngine::dispatch`] is
//!   infallible; stage errors become exactly one error envelope.
//! - **Fixed order**: endpoints cannot observe requests outside this order.
//! - **Committed bodies stay committed**: failures after the response head
//!   is sent are logged and truncate the body; they never produce a second
//!   response. [`RelayOutcome`] reports how each relayed body ended.

#![doc(html_root_url = "https://docs.rs/pylon-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod boundary;
mod context;
mod dispatch;
mod engine;
mod middleware;
mod registry;
mod relay;

pub use boundary::error_response;
pub use context::MiddlewareContext;
pub use engine::LifecycleEngine;
pub use middleware::{FnMiddleware, Middleware, MiddlewareFn, Next};
pub use registry::{MiddlewareRegistry, MissingGatePolicy, RegistryBuilder};
pub use relay::RelayOutcome;

// Re-exported so middleware implementations need only this crate in scope.
pub use pylon_core::BoxFuture;
