//! Request identity and the handler-facing request view.
//!
//! The pipeline assigns every request a [`RequestId`] at ingress and carries
//! it through logs and error envelopes. Handlers never see the raw transport
//! request; they receive [`RequestData`], an owned snapshot with the route
//! parameters already extracted.

use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HttpError, HttpResult};
use crate::types::{PathParams, Request};

/// Unique identifier for a request, assigned at ingress.
///
/// Uses UUID v7 so identifiers sort roughly by arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The request view handed to validators, header hooks, and handlers.
///
/// Owned and detached from the transport: by the time an endpoint runs, the
/// body has been read in full and the matched route parameters resolved.
#[derive(Debug, Clone)]
pub struct RequestData {
    method: Method,
    path: String,
    params: PathParams,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestData {
    /// Builds the handler view from a transport request plus the route
    /// parameters extracted during matching.
    ///
    /// Query parsing is lenient the way URL query strings are in practice:
    /// repeated keys are all kept, in order, and a missing query string
    /// yields an empty list.
    #[must_use]
    pub fn from_request(request: Request, params: PathParams) -> Self {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();
        let query = parts
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default();

        Self {
            method: parts.method,
            path,
            params,
            query,
            headers: parts.headers,
            body,
        }
    }

    /// The request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The request path, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Route parameters captured from the matched path pattern.
    #[must_use]
    pub const fn params(&self) -> &PathParams {
        &self.params
    }

    /// Returns a single route parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Query pairs in request order, duplicates preserved.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the first query value for a key.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The raw request body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns a 400 error if the body is not valid JSON for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> HttpResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            HttpError::status(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}"))
        })
    }
}
