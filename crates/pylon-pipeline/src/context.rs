//! Per-request pipeline context.
//!
//! The [`MiddlewareContext`] carries cross-stage state through one request:
//! the request ID, timing, and type-erased extensions that let the auth gate
//! and shared middleware hand values (a caller identity, a rate-limit
//! budget) to later stages without widening the middleware signature.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

use pylon_core::RequestId;

/// Context that flows through the pipeline for one request.
///
/// Mutable during middleware processing so each stage can enrich it; the
/// terminal stage reads from it when building the handler's request view.
///
/// # Example
///
/// ```
/// use pylon_pipeline::MiddlewareContext;
///
/// #[derive(Clone)]
/// struct CallerId(String);
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_extension(CallerId("svc-billing".to_string()));
///
/// assert!(ctx.has_extension::<CallerId>());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// When the request started processing.
    started_at: Instant,

    /// Type-erased extension data.
    ///
    /// Middleware can store arbitrary data here using type-safe keys.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    ///
    /// Useful when the ID was assigned upstream, e.g. by the transport.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns when the request started processing.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// Extensions let a stage stash data that later stages retrieve by type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    ///
    /// Returns `None` if no extension of the given type was stored.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_assigned_request_id() {
        let id = RequestId::new();
        let ctx = MiddlewareContext::with_request_id(id);
        assert_eq!(ctx.request_id(), id);
    }

    #[test]
    fn extensions_round_trip_by_type() {
        #[derive(Debug, PartialEq)]
        struct Quota(u32);

        let mut ctx = MiddlewareContext::new();
        assert!(!ctx.has_extension::<Quota>());

        ctx.set_extension(Quota(9));
        assert_eq!(ctx.get_extension::<Quota>(), Some(&Quota(9)));

        let removed = ctx.remove_extension::<Quota>();
        assert_eq!(removed, Some(Quota(9)));
        assert!(!ctx.has_extension::<Quota>());
    }

    #[test]
    fn elapsed_advances() {
        let ctx = MiddlewareContext::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(ctx.elapsed() >= std::time::Duration::from_millis(5));
    }
}
