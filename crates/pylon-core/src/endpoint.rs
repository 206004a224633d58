//! The endpoint contract.
//!
//! An [`Endpoint`] bundles a descriptor with the per-endpoint hooks the
//! pipeline calls in order: optional validation, the header hook, the
//! handler, and the post-send notification for file responses. Everything
//! else — auth, shared middleware, dispatch — is supplied by the pipeline
//! and is identical across endpoints.

use crate::descriptor::EndpointDescriptor;
use crate::error::{FieldError, HttpResult};
use crate::request::RequestData;
use crate::response::{Payload, ResponseEnvelope};
use crate::types::{BoxFuture, Request};

/// Validates a raw request before any other stage runs.
///
/// A validator reports every violation it finds, not just the first; the
/// pipeline rejects the request with the full list so clients can fix all
/// input problems in one round trip. An empty list means the request passes.
pub trait Validator: Send + Sync {
    /// Inspects the request and returns all field errors found.
    fn validate<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Vec<FieldError>>;
}

/// Adapts a synchronous closure into a [`Validator`].
///
/// # Example
///
/// ```
/// use pylon_core::{FieldError, FnValidator};
///
/// let validator = FnValidator::new(|request| {
///     let mut errors = Vec::new();
///     if request.body().is_empty() {
///         errors.push(FieldError::new("body", "must not be empty"));
///     }
///     errors
/// });
/// # let _ = validator;
/// ```
pub struct FnValidator<F> {
    f: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Request) -> Vec<FieldError> + Send + Sync,
{
    /// Wraps the closure.
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Request) -> Vec<FieldError> + Send + Sync,
{
    fn validate<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Vec<FieldError>> {
        Box::pin(std::future::ready((self.f)(request)))
    }
}

/// A declaratively described endpoint.
///
/// Implementations provide the descriptor and the handler; the remaining
/// hooks default to "do nothing sensible" so a minimal JSON endpoint is a
/// descriptor plus one method.
///
/// # Example
///
/// ```
/// use pylon_core::{
///     Endpoint, EndpointDescriptor, HttpResult, Payload, RequestData, RouteMethod,
/// };
/// use pylon_core::BoxFuture;
///
/// struct Health {
///     descriptor: EndpointDescriptor,
/// }
///
/// impl Health {
///     fn new() -> Self {
///         Self {
///             descriptor: EndpointDescriptor::new(RouteMethod::Get, "/health")
///                 .with_auth_required(false),
///         }
///     }
/// }
///
/// impl Endpoint for Health {
///     fn descriptor(&self) -> &EndpointDescriptor {
///         &self.descriptor
///     }
///
///     fn handle<'a>(&'a self, _request: &'a RequestData) -> BoxFuture<'a, HttpResult<Payload>> {
///         Box::pin(async { Payload::json(&serde_json::json!({"status": "ok"})) })
///     }
/// }
/// ```
pub trait Endpoint: Send + Sync + 'static {
    /// The declarative description: route, auth flag, response kind.
    fn descriptor(&self) -> &EndpointDescriptor;

    /// The validator to run first, if the endpoint has one.
    fn validator(&self) -> Option<&dyn Validator> {
        None
    }

    /// Produces the status and headers for the response.
    ///
    /// Runs after shared middleware and before the handler. Default: a bare
    /// 200 envelope, which lets the dispatcher fill in content-type.
    ///
    /// # Errors
    ///
    /// An error here skips the handler and goes to the error boundary.
    fn headers<'a>(
        &'a self,
        request: &'a RequestData,
    ) -> BoxFuture<'a, HttpResult<ResponseEnvelope>> {
        let _ = request;
        Box::pin(std::future::ready(Ok(ResponseEnvelope::ok())))
    }

    /// Produces the response payload.
    ///
    /// The payload's variant must match the descriptor's declared response
    /// kind; the dispatcher treats a mismatch as a configuration error.
    ///
    /// # Errors
    ///
    /// An error here goes to the error boundary instead of the dispatcher.
    fn handle<'a>(&'a self, request: &'a RequestData) -> BoxFuture<'a, HttpResult<Payload>>;

    /// Called exactly once after a file response finishes sending, whether
    /// it completed, failed mid-transfer, or was abandoned by the client.
    ///
    /// The hook exists so endpoints serving generated files can clean up
    /// temporaries. Default: nothing.
    fn on_file_sent(&self, path: &str) {
        let _ = path;
    }
}
