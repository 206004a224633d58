//! Endpoint descriptors.
//!
//! An [`EndpointDescriptor`] is the declarative half of an endpoint: the
//! route it binds, whether the auth gate runs, and which payload kind the
//! dispatcher will accept from its handler. Everything the pipeline decides
//! per endpoint it decides from this value, before the handler runs.

use std::fmt;

use http::Method;
use serde::{Deserialize, Serialize};

/// The HTTP methods an endpoint may bind.
///
/// A closed set on purpose: routing, auth, and dispatch are only defined for
/// these four, and a descriptor cannot be constructed outside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP DELETE.
    Delete,
}

impl RouteMethod {
    /// The method as its wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RouteMethod> for Method {
    fn from(method: RouteMethod) -> Self {
        match method {
            RouteMethod::Get => Self::GET,
            RouteMethod::Post => Self::POST,
            RouteMethod::Put => Self::PUT,
            RouteMethod::Delete => Self::DELETE,
        }
    }
}

/// How an endpoint's handler result reaches the wire.
///
/// The dispatcher checks the handler's payload against this declaration and
/// treats a mismatch as an endpoint authoring error, not a client error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Serialize the payload as a JSON body.
    #[default]
    Json,
    /// Treat the payload as a filesystem path and stream that file.
    File,
    /// Relay the payload's byte stream to the client as it arrives.
    Stream,
}

impl ResponseKind {
    /// The kind as a lowercase name, for logs and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::File => "file",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of a single endpoint.
///
/// Auth is opt-out: endpoints require the auth gate unless they explicitly
/// declare otherwise, so a forgotten flag fails closed.
///
/// # Example
///
/// ```
/// use pylon_core::{EndpointDescriptor, ResponseKind, RouteMethod};
///
/// let descriptor = EndpointDescriptor::new(RouteMethod::Get, "/reports/{id}")
///     .with_auth_required(false)
///     .with_response_kind(ResponseKind::File);
///
/// assert_eq!(descriptor.path(), "/reports/{id}");
/// assert!(!descriptor.auth_required());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    method: RouteMethod,
    path: String,
    auth_required: bool,
    response_kind: ResponseKind,
}

impl EndpointDescriptor {
    /// Creates a descriptor with auth required and a JSON response kind.
    #[must_use]
    pub fn new(method: RouteMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            auth_required: true,
            response_kind: ResponseKind::default(),
        }
    }

    /// Sets whether the auth gate runs for this endpoint.
    #[must_use]
    pub const fn with_auth_required(mut self, auth_required: bool) -> Self {
        self.auth_required = auth_required;
        self
    }

    /// Sets the declared response kind.
    #[must_use]
    pub const fn with_response_kind(mut self, response_kind: ResponseKind) -> Self {
        self.response_kind = response_kind;
        self
    }

    /// The HTTP method this endpoint binds.
    #[must_use]
    pub const fn method(&self) -> RouteMethod {
        self.method
    }

    /// The path pattern this endpoint binds, e.g. `/items/{id}`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the auth gate runs for this endpoint.
    #[must_use]
    pub const fn auth_required(&self) -> bool {
        self.auth_required
    }

    /// The declared response kind.
    #[must_use]
    pub const fn response_kind(&self) -> ResponseKind {
        self.response_kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_auth_required_json() {
        let descriptor = EndpointDescriptor::new(RouteMethod::Post, "/items");
        assert!(descriptor.auth_required());
        assert_eq!(descriptor.response_kind(), ResponseKind::Json);
    }

    #[test]
    fn builder_overrides_stick() {
        let descriptor = EndpointDescriptor::new(RouteMethod::Get, "/files/{name}")
            .with_auth_required(false)
            .with_response_kind(ResponseKind::Stream);

        assert_eq!(descriptor.method(), RouteMethod::Get);
        assert!(!descriptor.auth_required());
        assert_eq!(descriptor.response_kind(), ResponseKind::Stream);
    }

    #[test]
    fn route_method_converts_to_http_method() {
        assert_eq!(Method::from(RouteMethod::Get), Method::GET);
        assert_eq!(Method::from(RouteMethod::Delete), Method::DELETE);
    }

    #[test]
    fn kind_names_match_wire_casing() {
        assert_eq!(ResponseKind::Json.as_str(), "json");
        assert_eq!(ResponseKind::File.to_string(), "file");
        assert_eq!(RouteMethod::Put.to_string(), "PUT");
    }
}
