//! Middleware registration.
//!
//! A [`MiddlewareRegistry`] is assembled once at startup and shared by every
//! endpoint's pipeline. It holds the shared stages in registration order and
//! the auth gate in its own slot: the gate is not an ordinary stage, because
//! endpoints opt in or out of it per descriptor while shared stages always
//! run.
//!
//! The registry is immutable after [`RegistryBuilder::build`]; pipelines
//! hold cheap clones of it.

use std::sync::Arc;

use crate::middleware::Middleware;

/// What the pipeline does when an endpoint requires auth but no gate was
/// registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingGatePolicy {
    /// Proceed without authentication, logging a warning per request.
    ///
    /// The default, so a bare registry stays usable in development.
    #[default]
    Allow,
    /// Reject the request as a server configuration error.
    Deny,
}

#[derive(Default)]
struct RegistryInner {
    shared: Vec<Arc<dyn Middleware>>,
    auth_gate: Option<Arc<dyn Middleware>>,
    missing_gate_policy: MissingGatePolicy,
}

/// An immutable, shareable set of pipeline stages.
///
/// # Example
///
/// ```
/// use pylon_pipeline::MiddlewareRegistry;
///
/// let registry = MiddlewareRegistry::builder().build();
/// assert!(registry.auth_gate().is_none());
/// assert!(registry.shared().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    inner: Arc<RegistryInner>,
}

impl MiddlewareRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Shared stages, in the order they run.
    #[must_use]
    pub fn shared(&self) -> &[Arc<dyn Middleware>] {
        &self.inner.shared
    }

    /// The auth gate, if one was registered.
    #[must_use]
    pub fn auth_gate(&self) -> Option<&Arc<dyn Middleware>> {
        self.inner.auth_gate.as_ref()
    }

    /// The policy for auth-required endpoints when no gate is registered.
    #[must_use]
    pub fn missing_gate_policy(&self) -> MissingGatePolicy {
        self.inner.missing_gate_policy
    }
}

impl std::fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field(
                "shared",
                &self
                    .inner
                    .shared
                    .iter()
                    .map(|m| m.name())
                    .collect::<Vec<_>>(),
            )
            .field("auth_gate", &self.inner.auth_gate.as_ref().map(|m| m.name()))
            .field("missing_gate_policy", &self.inner.missing_gate_policy)
            .finish()
    }
}

/// Builder for [`MiddlewareRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    inner: RegistryInner,
}

impl RegistryBuilder {
    /// Appends a shared stage. Stages run in append order.
    #[must_use]
    pub fn append(self, middleware: impl Middleware) -> Self {
        self.append_arc(Arc::new(middleware))
    }

    /// Appends an already-shared stage.
    #[must_use]
    pub fn append_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.inner.shared.push(middleware);
        self
    }

    /// Registers the auth gate.
    ///
    /// Registering twice replaces the earlier gate; the replacement is
    /// logged because it is usually a wiring mistake.
    #[must_use]
    pub fn auth_gate(self, middleware: impl Middleware) -> Self {
        self.auth_gate_arc(Arc::new(middleware))
    }

    /// Registers an already-shared auth gate.
    #[must_use]
    pub fn auth_gate_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        if let Some(previous) = &self.inner.auth_gate {
            tracing::warn!(
                previous = previous.name(),
                replacement = middleware.name(),
                "auth gate registered twice; keeping the replacement"
            );
        }
        self.inner.auth_gate = Some(middleware);
        self
    }

    /// Sets the policy for auth-required endpoints when no gate exists.
    #[must_use]
    pub const fn missing_gate_policy(mut self, policy: MissingGatePolicy) -> Self {
        self.inner.missing_gate_policy = policy;
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> MiddlewareRegistry {
        MiddlewareRegistry {
            inner: Arc::new(self.inner),
        }
    }
}
