//! Response dispatch.
//!
//! The dispatcher is the last pipeline stage that can still fail cleanly.
//! It checks the handler's payload against the endpoint's declared response
//! kind, then turns the payload plus the header hook's envelope into the
//! wire response. A mismatched payload is a configuration error: the
//! endpoint author declared one kind and wrote a handler producing another.
//!
//! Failures before the head is committed (kind mismatch, file open errors)
//! propagate to the error boundary as usual. Failures after are the
//! relay's problem; see [`crate::relay`].

use std::sync::Arc;

use futures_util::TryStreamExt;
use http::header::{self, HeaderValue};
use http_body_util::{BodyExt, StreamBody};
use pylon_core::{
    BoxBody, BoxError, ByteStream, Endpoint, HttpError, HttpResult, Payload, RequestId, Response,
    ResponseEnvelope, ResponseKind,
};
use tokio_util::io::ReaderStream;

use crate::relay::StreamRelay;

/// Sends the handler's payload according to the endpoint's declared kind.
pub(crate) async fn dispatch(
    endpoint: &Arc<dyn Endpoint>,
    envelope: ResponseEnvelope,
    payload: Payload,
    request_id: RequestId,
) -> HttpResult<Response> {
    let kind = endpoint.descriptor().response_kind();
    match (kind, payload) {
        (ResponseKind::Json, Payload::Json(value)) => send_json(envelope, &value),
        (ResponseKind::File, Payload::File(path)) => {
            send_file(endpoint, envelope, path, request_id).await
        }
        (ResponseKind::Stream, Payload::Stream(source)) => {
            Ok(send_stream(envelope, source, request_id))
        }
        (ResponseKind::Json, other) => Err(HttpError::configuration(format!(
            "json endpoint produced {} payload; expected JSON value",
            other.kind_name()
        ))),
        (ResponseKind::File, other) => Err(HttpError::configuration(format!(
            "file endpoint produced {} payload; expected string file path",
            other.kind_name()
        ))),
        (ResponseKind::Stream, other) => Err(HttpError::configuration(format!(
            "stream endpoint produced {} payload; expected readable stream",
            other.kind_name()
        ))),
    }
}

fn send_json(envelope: ResponseEnvelope, value: &serde_json::Value) -> HttpResult<Response> {
    let body = serde_json::to_vec(value)
        .map_err(|e| HttpError::internal_with_source("failed to serialize JSON response", e))?;

    Ok(assemble(
        envelope,
        pylon_core::full_body(body),
        HeaderValue::from_static("application/json"),
    ))
}

async fn send_file(
    endpoint: &Arc<dyn Endpoint>,
    envelope: ResponseEnvelope,
    path: String,
    request_id: RequestId,
) -> HttpResult<Response> {
    let (file, len) = open_file(&path).await?;

    let source: ByteStream = Box::pin(ReaderStream::new(file).map_err(BoxError::from));

    let hook_endpoint = Arc::clone(endpoint);
    let hook_path = path.clone();
    let relay = StreamRelay::with_completion(source, request_id, move |outcome| {
        tracing::debug!(
            request_id = %request_id,
            path = %hook_path,
            outcome = ?outcome,
            "file send finished"
        );
        hook_endpoint.on_file_sent(&hook_path);
    });

    let mut response = assemble(
        envelope,
        StreamBody::new(relay).boxed(),
        content_type_for_path(&path),
    );
    response
        .headers_mut()
        .entry(header::CONTENT_LENGTH)
        .or_insert_with(|| HeaderValue::from(len));

    Ok(response)
}

fn send_stream(envelope: ResponseEnvelope, source: ByteStream, request_id: RequestId) -> Response {
    let relay = StreamRelay::new(source, request_id);
    assemble(
        envelope,
        StreamBody::new(relay).boxed(),
        HeaderValue::from_static("application/octet-stream"),
    )
}

/// Applies the envelope to a body, filling in a content-type when the
/// header hook did not set one.
fn assemble(envelope: ResponseEnvelope, body: BoxBody, default_content_type: HeaderValue) -> Response {
    let (status, headers) = envelope.into_parts();
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
        .headers_mut()
        .entry(header::CONTENT_TYPE)
        .or_insert(default_content_type);
    response
}

async fn open_file(path: &str) -> HttpResult<(tokio::fs::File, u64)> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HttpError::not_found(format!("file not found: {path}"))
        } else {
            HttpError::internal_with_source(format!("failed to open file: {path}"), e)
        }
    })?;

    let metadata = file
        .metadata()
        .await
        .map_err(|e| HttpError::internal_with_source(format!("failed to stat file: {path}"), e))?;

    if !metadata.is_file() {
        return Err(HttpError::not_found(format!("not a regular file: {path}")));
    }

    Ok((file, metadata.len()))
}

/// Content type by file extension, octet-stream when unknown.
fn content_type_for_path(path: &str) -> HeaderValue {
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let mime = match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        _ => "application/octet-stream",
    };

    HeaderValue::from_static(mime)
}
