//! Handler output types.
//!
//! A handler produces two things, on separate tracks: a [`ResponseEnvelope`]
//! (status and headers, fixed before the body starts) from the header hook,
//! and a [`Payload`] (the body-to-be) from the handler itself. The dispatcher
//! joins them into the single wire response.

use std::fmt;

use bytes::Bytes;
use futures_util::Stream;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::Serialize;

use crate::error::{HttpError, HttpResult};
use crate::types::{BoxError, ByteStream};

/// Status and headers for a response, decided before the body.
///
/// Produced by an endpoint's header hook; the dispatcher applies it to every
/// payload kind. Content-type is usually left to the dispatcher, which fills
/// a default per payload kind when the hook did not set one.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseEnvelope {
    /// A 200 envelope with no extra headers.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// Creates an envelope with the given status.
    #[must_use]
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    /// Sets the status, keeping headers.
    #[must_use]
    pub const fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Appends a typed header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Appends a header from string parts.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name or value is not a legal
    /// header; a hook emitting garbage headers is an endpoint bug.
    pub fn try_header(mut self, name: &str, value: &str) -> HttpResult<Self> {
        let name = HeaderName::try_from(name)
            .map_err(|e| HttpError::configuration(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::try_from(value).map_err(|e| {
            HttpError::configuration(format!("invalid header value for {name}: {e}"))
        })?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Consumes the envelope into its status and header map.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap) {
        (self.status, self.headers)
    }
}

impl Default for ResponseEnvelope {
    fn default() -> Self {
        Self::ok()
    }
}

/// What a handler hands back for the dispatcher to send.
///
/// Each variant corresponds to one declared
/// [`ResponseKind`](crate::ResponseKind); the dispatcher rejects a payload
/// whose variant does not match the endpoint's declaration.
pub enum Payload {
    /// A JSON document, serialized into the response body.
    Json(serde_json::Value),
    /// A filesystem path; the dispatcher opens and streams the file.
    File(String),
    /// An already-produced byte stream, relayed chunk by chunk.
    Stream(ByteStream),
}

impl Payload {
    /// Builds a JSON payload from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the value cannot be represented as JSON.
    pub fn json<T: Serialize>(value: &T) -> HttpResult<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| HttpError::internal_with_source("failed to serialize payload", e))
    }

    /// Builds a file payload from a path.
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self::File(path.into())
    }

    /// Builds a stream payload from any byte stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + Sync + 'static,
    {
        Self::Stream(Box::pin(stream))
    }

    /// The payload's kind name, matching
    /// [`ResponseKind::as_str`](crate::ResponseKind::as_str) casing.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::File(_) => "file",
            Self::Stream(_) => "stream",
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Stream(_) => f.debug_tuple("Stream").field(&"..").finish(),
        }
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}
