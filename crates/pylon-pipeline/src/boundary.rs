//! The error boundary.
//!
//! Every error a pipeline stage forwards ends up here, exactly once, and
//! becomes the request's single response. Nothing else in the pipeline
//! renders errors; stages either succeed or hand their error up.

use http::header::{self, HeaderValue};
use pylon_core::{full_body, HttpError, RequestId, Response};

/// Renders a forwarded error as the request's error response.
///
/// Server errors are logged at error level, client errors at debug. Routers
/// and transports reuse this for failures that never reach an engine, such
/// as unmatched routes or request timeouts, so every error on the wire has
/// the same envelope.
pub fn error_response(error: &HttpError, request_id: RequestId) -> Response {
    let status = error.status_code();

    if status.is_server_error() {
        tracing::error!(
            request_id = %request_id,
            code = error.error_code(),
            error = %error,
            "request failed"
        );
    } else {
        tracing::debug!(
            request_id = %request_id,
            code = error.error_code(),
            error = %error,
            "request rejected"
        );
    }

    let id = request_id.to_string();
    let envelope = error.to_envelope(Some(&id));
    let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| {
        // Fallback shape if the envelope itself will not serialize.
        format!(
            "{{\"error\":{{\"code\":\"INTERNAL_ERROR\",\"message\":\"error serialization failed\"}},\"request_id\":\"{id}\"}}"
        )
        .into_bytes()
    });

    let mut response = Response::new(full_body(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use pylon_core::FieldError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn renders_envelope_with_request_id() {
        let request_id = RequestId::new();
        let response = error_response(&HttpError::not_found("no such route"), request_id);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["request_id"], request_id.to_string());
    }

    #[tokio::test]
    async fn validation_errors_keep_their_order() {
        let error = HttpError::validation(vec![
            FieldError::new("b", "second"),
            FieldError::new("a", "first"),
        ]);

        let response = error_response(&error, RequestId::new());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        let details = json["error"]["details"].as_array().unwrap();
        assert_eq!(details[0]["field"], "b");
        assert_eq!(details[1]["field"], "a");
    }
}
