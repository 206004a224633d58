//! The lifecycle engine.
//!
//! One [`LifecycleEngine`] wraps one endpoint and runs every request to it
//! through the same fixed stage order:
//!
//! ```text
//! validate -> auth gate -> shared middleware -> header hook -> handler -> dispatch
//! ```
//!
//! [`LifecycleEngine::dispatch`] is infallible by construction: any stage
//! error is rendered by the error boundary, so a request gets exactly one
//! response no matter where it fails.

use std::sync::Arc;

use pylon_core::{
    Endpoint, EndpointDescriptor, HttpError, HttpResult, PathParams, Request, RequestData,
    Response,
};

use crate::boundary::error_response;
use crate::context::MiddlewareContext;
use crate::dispatch;
use crate::middleware::Next;
use crate::registry::{MiddlewareRegistry, MissingGatePolicy};

/// Runs requests for a single endpoint through the pipeline.
///
/// # Example
///
/// ```
/// use pylon_core::{
///     BoxFuture, Endpoint, EndpointDescriptor, HttpResult, PathParams, Payload, RequestData,
///     RouteMethod,
/// };
/// use pylon_pipeline::{LifecycleEngine, MiddlewareRegistry};
///
/// struct Ping {
///     descriptor: EndpointDescriptor,
/// }
///
/// impl Endpoint for Ping {
///     fn descriptor(&self) -> &EndpointDescriptor {
///         &self.descriptor
///     }
///
///     fn handle<'a>(&'a self, _request: &'a RequestData) -> BoxFuture<'a, HttpResult<Payload>> {
///         Box::pin(async { Payload::json(&serde_json::json!({"pong": true})) })
///     }
/// }
///
/// # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
/// # rt.block_on(async {
/// let engine = LifecycleEngine::new(
///     Ping {
///         descriptor: EndpointDescriptor::new(RouteMethod::Get, "/ping")
///             .with_auth_required(false),
///     },
///     MiddlewareRegistry::default(),
/// );
///
/// let request = http::Request::builder()
///     .uri("/ping")
///     .body(bytes::Bytes::new())
///     .unwrap();
///
/// let response = engine.dispatch(request, PathParams::new()).await;
/// assert_eq!(response.status(), http::StatusCode::OK);
/// # });
/// ```
pub struct LifecycleEngine {
    endpoint: Arc<dyn Endpoint>,
    registry: MiddlewareRegistry,
}

impl LifecycleEngine {
    /// Creates an engine for the endpoint, wired to the given registry.
    pub fn new(endpoint: impl Endpoint, registry: MiddlewareRegistry) -> Self {
        Self::from_arc(Arc::new(endpoint), registry)
    }

    /// Creates an engine from an already-shared endpoint.
    #[must_use]
    pub fn from_arc(endpoint: Arc<dyn Endpoint>, registry: MiddlewareRegistry) -> Self {
        Self { endpoint, registry }
    }

    /// The wrapped endpoint's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &EndpointDescriptor {
        self.endpoint.descriptor()
    }

    /// Runs one request through the pipeline.
    ///
    /// Always produces a response: stage errors become the error boundary's
    /// JSON envelope, so callers never render errors themselves.
    pub async fn dispatch(&self, request: Request, params: PathParams) -> Response {
        let mut ctx = MiddlewareContext::new();
        let request_id = ctx.request_id();

        match self.run(request, params, &mut ctx).await {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    status = %response.status(),
                    elapsed = ?ctx.elapsed(),
                    "request completed"
                );
                response
            }
            Err(error) => error_response(&error, request_id),
        }
    }

    async fn run(
        &self,
        request: Request,
        params: PathParams,
        ctx: &mut MiddlewareContext,
    ) -> HttpResult<Response> {
        let descriptor = self.endpoint.descriptor();
        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %descriptor.method(),
            path = descriptor.path(),
            "request started"
        );

        // Stage 1: validation, before anything else touches the request.
        if let Some(validator) = self.endpoint.validator() {
            let errors = validator.validate(&request).await;
            if !errors.is_empty() {
                return Err(HttpError::validation(errors));
            }
        }

        // Terminal stage: header hook, handler, dispatch.
        let endpoint = Arc::clone(&self.endpoint);
        let terminal = Next::terminal(move |ctx, request| {
            let request_id = ctx.request_id();
            Box::pin(async move {
                let data = RequestData::from_request(request, params);
                let envelope = endpoint.headers(&data).await?;
                let payload = endpoint.handle(&data).await?;
                dispatch::dispatch(&endpoint, envelope, payload, request_id).await
            })
        });

        // Shared middleware runs in registration order, so the first
        // registered stage is outermost.
        let mut next = terminal;
        for middleware in self.registry.shared().iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        // The auth gate wraps everything else, but only for endpoints that
        // ask for it.
        if descriptor.auth_required() {
            if let Some(gate) = self.registry.auth_gate() {
                next = Next::new(gate.as_ref(), next);
            } else {
                match self.registry.missing_gate_policy() {
                    MissingGatePolicy::Deny => {
                        return Err(HttpError::configuration(format!(
                            "endpoint {} {} requires auth but no auth gate is registered",
                            descriptor.method(),
                            descriptor.path()
                        )));
                    }
                    MissingGatePolicy::Allow => {
                        tracing::warn!(
                            request_id = %ctx.request_id(),
                            method = %descriptor.method(),
                            path = descriptor.path(),
                            "auth required but no auth gate registered; proceeding"
                        );
                    }
                }
            }
        }

        next.run(ctx, request).await
    }
}

impl std::fmt::Debug for LifecycleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleEngine")
            .field("descriptor", self.endpoint.descriptor())
            .field("registry", &self.registry)
            .finish()
    }
}
