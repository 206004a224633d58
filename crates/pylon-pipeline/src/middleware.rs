//! Middleware trait and chain types.
//!
//! This module defines the [`Middleware`] trait implemented by the auth gate
//! and by shared middleware stages. Middleware runs in a fixed order decided
//! at registration: stages cannot reorder themselves per request, so every
//! endpoint sees the same pipeline shape.
//!
//! A stage has exactly three legal outcomes:
//!
//! - call `next.run()` once and return its result (possibly decorated),
//! - short-circuit with its own `Ok(response)`,
//! - short-circuit with `Err`, which the error boundary turns into the
//!   single error response for the request.

use pylon_core::{BoxFuture, HttpResult, Request, Response};

use crate::context::MiddlewareContext;

/// A pipeline stage.
///
/// Stages receive the mutable per-request context, the request, and a
/// [`Next`] handle to the rest of the chain.
///
/// # Invariants
///
/// - A stage must call `next.run()` at most once; `Next` is consumed by
///   `run` so the type system enforces it.
/// - A stage must not swallow downstream errors into a second response;
///   producing the error response is the boundary's job.
///
/// # Example
///
/// ```
/// use pylon_pipeline::{BoxFuture, Middleware, MiddlewareContext, Next};
/// use pylon_core::{HttpResult, Request, Response};
///
/// struct Timing;
///
/// impl Middleware for Timing {
///     fn name(&self) -> &'static str {
///         "timing"
///     }
///
///     fn process<'a>(
///         &'a self,
///         ctx: &'a mut MiddlewareContext,
///         request: Request,
///         next: Next<'a>,
///     ) -> BoxFuture<'a, HttpResult<Response>> {
///         Box::pin(async move {
///             let response = next.run(ctx, request).await;
///             tracing::debug!(elapsed = ?ctx.elapsed(), "stage done");
///             response
///         })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// The stage's name, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    ///
    /// Returns either the downstream result, the stage's own short-circuit
    /// response, or an error for the boundary.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<Response>>;
}

/// Handle to the remainder of the chain.
///
/// Consumed by [`Next::run`], so a stage can continue the pipeline at most
/// once. Dropping it without running short-circuits the chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More stages to process.
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain: the endpoint stages (headers, handler, dispatch).
    Terminal(TerminalFn<'a>),
}

type TerminalFn<'a> = Box<
    dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, HttpResult<Response>>
        + Send
        + 'a,
>;

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given stage.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates the terminal `Next` that invokes the endpoint stages.
    pub(crate) fn terminal<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, HttpResult<Response>>
            + Send
            + 'a,
    {
        Self {
            inner: NextInner::Terminal(Box::new(f)),
        }
    }

    /// Invokes the rest of the chain.
    ///
    /// Consumes `self` so it can only be called once.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> HttpResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Terminal(terminal) => terminal(ctx, request).await,
        }
    }
}

/// A middleware built from a plain function.
///
/// Useful for small stages that don't warrant a named type. The function
/// receives the same arguments as [`Middleware::process`] and returns a
/// boxed future tied to the borrow.
///
/// # Example
///
/// ```
/// use pylon_pipeline::{BoxFuture, FnMiddleware, MiddlewareContext, Next};
/// use pylon_core::{HttpResult, Request, Response};
///
/// fn log_stage<'a>(
///     ctx: &'a mut MiddlewareContext,
///     request: Request,
///     next: Next<'a>,
/// ) -> BoxFuture<'a, HttpResult<Response>> {
///     Box::pin(async move {
///         tracing::debug!(request_id = %ctx.request_id(), path = request.uri().path(), "request");
///         next.run(ctx, request).await
///     })
/// }
///
/// let middleware = FnMiddleware::new("log", log_stage);
/// # let _ = middleware;
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

/// The function signature [`FnMiddleware`] adapts.
pub trait MiddlewareFn:
    for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, HttpResult<Response>>
    + Send
    + Sync
    + 'static
{
}

impl<F> MiddlewareFn for F where
    F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, HttpResult<Response>>
        + Send
        + Sync
        + 'static
{
}

impl<F: MiddlewareFn> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F: MiddlewareFn> Middleware for FnMiddleware<F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<Response>> {
        (self.func)(ctx, request, next)
    }
}
