//! Shared wire-level type aliases.
//!
//! The pipeline works on requests whose bodies have already been collected
//! into memory ([`Request`]) and produces responses whose bodies may be
//! buffered or streamed ([`Response`]). All body variants share the
//! [`BoxBody`] type so middleware and handlers never care which one they
//! are holding.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use http::StatusCode;
use http_body_util::{BodyExt, Empty, Full};

/// An incoming request with its body collected into memory.
///
/// Body parsing beyond byte collection is the transport's concern; the
/// pipeline only ever sees `Bytes`.
pub type Request = http::Request<Bytes>;

/// An outgoing response with a type-erased body.
pub type Response = http::Response<BoxBody>;

/// Type-erased response body.
///
/// The error type is [`Infallible`]: streaming stages swallow transport
/// failures internally (logging them) rather than surfacing them through
/// the body, because by then the response head is already on the wire.
pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, Infallible>;

/// A type-erased error for byte-stream sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A pinned, heap-allocated source of byte chunks.
///
/// This is the "readable stream" capability consumed by STREAM dispatch:
/// a terminable sequence of chunk results, polled under backpressure from
/// the connection's body writer.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send + Sync>>;

/// A boxed future, as returned by object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Route parameters extracted by the router, keyed by placeholder name.
pub type PathParams = HashMap<String, String>;

/// Wraps already-materialized bytes as a [`BoxBody`].
#[must_use]
pub fn full_body(bytes: impl Into<Bytes>) -> BoxBody {
    Full::new(bytes.into()).boxed()
}

/// An empty [`BoxBody`].
#[must_use]
pub fn empty_body() -> BoxBody {
    Empty::new().boxed()
}

/// Builds a JSON response from a status code and a serializable value.
///
/// Falls back to an empty body if the value cannot be serialized, which
/// for `serde_json::Value` inputs cannot happen in practice.
#[must_use]
pub fn json_response(status: StatusCode, value: &serde_json::Value) -> Response {
    let body = serde_json::to_vec(value).unwrap_or_default();

    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(full_body(body))
        .unwrap_or_else(|_| {
            let mut response = http::Response::new(empty_body());
            *response.status_mut() = status;
            response
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn full_body_yields_all_bytes() {
        let body = full_body("hello");
        let collected = body.collect().await.expect("infallible body");
        assert_eq!(collected.to_bytes(), Bytes::from("hello"));
    }

    #[tokio::test]
    async fn empty_body_yields_nothing() {
        let body = empty_body();
        let collected = body.collect().await.expect("infallible body");
        assert!(collected.to_bytes().is_empty());
    }

    #[tokio::test]
    async fn json_response_sets_status_and_content_type() {
        let response = json_response(StatusCode::NOT_FOUND, &serde_json::json!({"ok": false}));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response
                .headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({"ok": false}));
    }
}
