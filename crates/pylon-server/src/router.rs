//! The route table.
//!
//! [`Router`] binds endpoints to method + path patterns at startup and
//! dispatches incoming requests to the matching endpoint's
//! [`LifecycleEngine`]. Patterns use `{name}` placeholders for path
//! parameters, matched segment-wise:
//!
//! ```text
//! /items/{id}        matches  /items/42       params {id: "42"}
//! /items/{id}/tags   matches  /items/42/tags  params {id: "42"}
//! ```
//!
//! Routes are checked in registration order and the first match wins.
//! Binding the same method + pattern twice is rejected at registration, so
//! a route can never be served by two pipelines.
//!
//! # Example
//!
//! ```rust
//! use pylon_core::{
//!     BoxFuture, Endpoint, EndpointDescriptor, HttpResult, Payload, RequestData, RouteMethod,
//! };
//! use pylon_pipeline::MiddlewareRegistry;
//! use pylon_server::Router;
//!
//! struct Health {
//!     descriptor: EndpointDescriptor,
//! }
//!
//! impl Endpoint for Health {
//!     fn descriptor(&self) -> &EndpointDescriptor {
//!         &self.descriptor
//!     }
//!
//!     fn handle<'a>(&'a self, _request: &'a RequestData) -> BoxFuture<'a, HttpResult<Payload>> {
//!         Box::pin(async { Payload::json(&serde_json::json!({"status": "ok"})) })
//!     }
//! }
//!
//! let registry = MiddlewareRegistry::default();
//! let mut router = Router::new();
//!
//! router
//!     .register(
//!         Health {
//!             descriptor: EndpointDescriptor::new(RouteMethod::Get, "/health")
//!                 .with_auth_required(false),
//!         },
//!         &registry,
//!     )
//!     .unwrap();
//!
//! assert_eq!(router.route_count(), 1);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use http::Method;
use thiserror::Error;

use pylon_core::{Endpoint, HttpError, PathParams, Request, RequestId, Response};
use pylon_pipeline::{error_response, LifecycleEngine, MiddlewareRegistry};

/// Errors reported when a route cannot be registered.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The same method + pattern pair is already bound.
    #[error("route {method} {pattern} is already registered")]
    DuplicateRoute {
        /// Method of the rejected binding.
        method: Method,
        /// Pattern of the rejected binding.
        pattern: String,
    },

    /// The pattern does not parse into path segments.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// One segment of a parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// Matches exactly this text.
    Literal(String),
    /// Matches any single segment, capturing it under this name.
    Param(String),
}

/// Parses a pattern like `/items/{id}` into segments.
fn parse_pattern(pattern: &str) -> Result<Vec<PathSegment>, RouterError> {
    let invalid = |reason: String| RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    if !pattern.starts_with('/') {
        return Err(invalid("pattern must start with '/'".to_string()));
    }

    let mut segments = Vec::new();
    let mut seen = HashSet::new();

    for raw in pattern.split('/').filter(|s| !s.is_empty()) {
        if let Some(inner) = raw.strip_prefix('{') {
            let Some(name) = inner.strip_suffix('}') else {
                return Err(invalid(format!("malformed parameter segment `{raw}`")));
            };
            if name.is_empty() {
                return Err(invalid("empty parameter name".to_string()));
            }
            if name.contains(['{', '}']) {
                return Err(invalid(format!("malformed parameter segment `{raw}`")));
            }
            if !seen.insert(name.to_string()) {
                return Err(invalid(format!("parameter `{name}` appears twice")));
            }
            segments.push(PathSegment::Param(name.to_string()));
        } else if raw.contains(['{', '}']) {
            return Err(invalid(format!(
                "braces must wrap a whole segment, found `{raw}`"
            )));
        } else {
            segments.push(PathSegment::Literal(raw.to_string()));
        }
    }

    Ok(segments)
}

/// A registered route: the parsed pattern plus the engine serving it.
#[derive(Debug)]
struct Route {
    method: Method,
    pattern: String,
    segments: Vec<PathSegment>,
    engine: LifecycleEngine,
}

impl Route {
    /// Matches a request path against this route, extracting parameters.
    fn match_path(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut actual = path.split('/').filter(|s| !s.is_empty());

        for segment in &self.segments {
            let value = actual.next()?;
            match segment {
                PathSegment::Literal(expected) => {
                    if expected != value {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), value.to_string());
                }
            }
        }

        // Longer paths do not match shorter patterns.
        if actual.next().is_some() {
            return None;
        }

        Some(params)
    }
}

/// Maps requests to per-endpoint lifecycle engines.
///
/// Register every endpoint during startup, then hand the router (immutable
/// from then on) to the transport. [`handle`](Self::handle) is infallible
/// like [`LifecycleEngine::dispatch`]: unmatched requests get the standard
/// 404 error envelope.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers an endpoint under its descriptor's method and path.
    ///
    /// The endpoint is wrapped in a [`LifecycleEngine`] wired to `registry`,
    /// so every route registered against the same registry shares the same
    /// auth gate and middleware chain.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] when the descriptor's path
    /// does not parse, and [`RouterError::DuplicateRoute`] when the exact
    /// method + pattern pair is already bound.
    pub fn register(
        &mut self,
        endpoint: impl Endpoint,
        registry: &MiddlewareRegistry,
    ) -> Result<(), RouterError> {
        self.register_arc(Arc::new(endpoint), registry)
    }

    /// Registers an already-shared endpoint. See [`register`](Self::register).
    pub fn register_arc(
        &mut self,
        endpoint: Arc<dyn Endpoint>,
        registry: &MiddlewareRegistry,
    ) -> Result<(), RouterError> {
        let descriptor = endpoint.descriptor();
        let method = Method::from(descriptor.method());
        let pattern = descriptor.path().to_string();
        let segments = parse_pattern(&pattern)?;

        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.pattern == pattern)
        {
            return Err(RouterError::DuplicateRoute { method, pattern });
        }

        tracing::info!(method = %method, pattern = %pattern, "route registered");

        self.routes.push(Route {
            method,
            pattern,
            segments,
            engine: LifecycleEngine::from_arc(endpoint, registry.clone()),
        });

        Ok(())
    }

    /// The number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Finds the engine for a method + path, extracting path parameters.
    ///
    /// Routes are tried in registration order; the first match wins.
    #[must_use]
    pub fn match_route(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(&LifecycleEngine, PathParams)> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| route.match_path(path).map(|params| (&route.engine, params)))
    }

    /// Routes one request to its engine, or answers 404.
    pub async fn handle(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match self.match_route(&method, &path) {
            Some((engine, params)) => engine.dispatch(request, params).await,
            None => {
                let request_id = RequestId::new();
                tracing::debug!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    "no route matched"
                );
                error_response(
                    &HttpError::not_found(format!("no route for {method} {path}")),
                    request_id,
                )
            }
        }
    }
}
