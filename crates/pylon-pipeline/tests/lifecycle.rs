//! End-to-end lifecycle tests.
//!
//! These tests run whole requests through [`LifecycleEngine`] and verify the
//! fixed stage order and its failure modes:
//!
//! 1. Validate - reject bad input with the full field-error list
//! 2. AuthGate - authenticate, only for endpoints that require it
//! 3. SharedMiddleware - registration order, every endpoint
//! 4. HeaderHook - status/headers before the body
//! 5. Handler - payload production
//! 6. Dispatch - payload/kind agreement, file and stream bodies

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use pylon_core::{
    BoxError, BoxFuture, Endpoint, EndpointDescriptor, FieldError, FnValidator, HttpError,
    HttpResult, PathParams, Payload, Request, RequestData, Response, ResponseEnvelope,
    ResponseKind, RouteMethod, Validator,
};
use pylon_pipeline::{
    LifecycleEngine, Middleware, MiddlewareContext, MiddlewareRegistry, Next,
};

/// Records stage visits across one or more requests.
type Trace = Arc<Mutex<Vec<String>>>;

fn new_trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

fn snapshot(trace: &Trace) -> Vec<String> {
    trace.lock().unwrap().clone()
}

/// Shared middleware that records its name, then continues the chain.
struct Recording {
    name: &'static str,
    trace: Trace,
}

impl Middleware for Recording {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<Response>> {
        Box::pin(async move {
            self.trace.lock().unwrap().push(self.name.to_string());
            next.run(ctx, request).await
        })
    }
}

/// Auth gate that requires an `authorization` header, any value.
struct BearerGate {
    trace: Trace,
}

impl Middleware for BearerGate {
    fn name(&self) -> &'static str {
        "auth-gate"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<Response>> {
        Box::pin(async move {
            self.trace.lock().unwrap().push("auth-gate".to_string());
            if request.headers().contains_key("authorization") {
                next.run(ctx, request).await
            } else {
                Err(HttpError::unauthorized("missing bearer token"))
            }
        })
    }
}

type HeaderFn = Box<dyn Fn(&RequestData) -> HttpResult<ResponseEnvelope> + Send + Sync>;
type HandlerFn = Box<dyn Fn(&RequestData) -> HttpResult<Payload> + Send + Sync>;

/// Endpoint whose hooks are supplied per test and which records every stage
/// it participates in.
struct Scripted {
    descriptor: EndpointDescriptor,
    trace: Trace,
    validator: Option<Box<dyn Validator>>,
    on_headers: Option<HeaderFn>,
    on_handle: HandlerFn,
    file_notices: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(
        descriptor: EndpointDescriptor,
        trace: Trace,
        on_handle: impl Fn(&RequestData) -> HttpResult<Payload> + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor,
            trace,
            validator: None,
            on_headers: None,
            on_handle: Box::new(on_handle),
            file_notices: Mutex::new(Vec::new()),
        }
    }

    fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    fn with_headers(
        mut self,
        on_headers: impl Fn(&RequestData) -> HttpResult<ResponseEnvelope> + Send + Sync + 'static,
    ) -> Self {
        self.on_headers = Some(Box::new(on_headers));
        self
    }
}

impl Endpoint for Scripted {
    fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    fn validator(&self) -> Option<&dyn Validator> {
        self.validator.as_deref()
    }

    fn headers<'a>(
        &'a self,
        request: &'a RequestData,
    ) -> BoxFuture<'a, HttpResult<ResponseEnvelope>> {
        Box::pin(async move {
            self.trace.lock().unwrap().push("headers".to_string());
            match &self.on_headers {
                Some(hook) => hook(request),
                None => Ok(ResponseEnvelope::ok()),
            }
        })
    }

    fn handle<'a>(&'a self, request: &'a RequestData) -> BoxFuture<'a, HttpResult<Payload>> {
        Box::pin(async move {
            self.trace.lock().unwrap().push("handler".to_string());
            (self.on_handle)(request)
        })
    }

    fn on_file_sent(&self, path: &str) {
        self.file_notices.lock().unwrap().push(path.to_string());
    }
}

/// Registry with the bearer gate and two recording stages.
fn standard_registry(trace: &Trace) -> MiddlewareRegistry {
    MiddlewareRegistry::builder()
        .auth_gate(BearerGate {
            trace: Arc::clone(trace),
        })
        .append(Recording {
            name: "alpha",
            trace: Arc::clone(trace),
        })
        .append(Recording {
            name: "beta",
            trace: Arc::clone(trace),
        })
        .build()
}

fn engine_for(endpoint: Arc<Scripted>, registry: MiddlewareRegistry) -> LifecycleEngine {
    LifecycleEngine::from_arc(endpoint as Arc<dyn Endpoint>, registry)
}

fn get(uri: &str) -> Request {
    http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

fn authed_get(uri: &str) -> Request {
    http::Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", "Bearer test-token")
        .body(Bytes::new())
        .unwrap()
}

async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn authed_json_request_runs_every_stage_in_order() {
    let trace = new_trace();
    let endpoint = Arc::new(
        Scripted::new(
            EndpointDescriptor::new(RouteMethod::Get, "/widgets/{id}"),
            Arc::clone(&trace),
            |request| {
                Payload::json(&serde_json::json!({
                    "id": request.param("id"),
                }))
            },
        )
        .with_headers(|_| ResponseEnvelope::ok().try_header("x-widget-store", "main")),
    );

    let engine = engine_for(Arc::clone(&endpoint), standard_registry(&trace));

    let mut params = PathParams::new();
    params.insert("id".to_string(), "7".to_string());
    let response = engine.dispatch(authed_get("/widgets/7"), params).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-widget-store").unwrap(), "main");
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let json = body_json(response).await;
    assert_eq!(json["id"], "7");

    assert_eq!(
        snapshot(&trace),
        vec!["auth-gate", "alpha", "beta", "headers", "handler"]
    );
}

#[tokio::test]
async fn validation_failure_reports_every_field_and_runs_nothing_else() {
    let trace = new_trace();
    let endpoint = Arc::new(
        Scripted::new(
            EndpointDescriptor::new(RouteMethod::Post, "/widgets"),
            Arc::clone(&trace),
            |_| Payload::json(&serde_json::json!({})),
        )
        .with_validator(FnValidator::new(|_request| {
            vec![
                FieldError::new("name", "required"),
                FieldError::new("price", "must be positive"),
            ]
        })),
    );

    let engine = engine_for(endpoint, standard_registry(&trace));

    // No authorization header: validation must still win over the gate.
    let response = engine.dispatch(get("/widgets"), PathParams::new()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");

    let details = json["error"]["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["field"], "name");
    assert_eq!(details[1]["field"], "price");

    // Neither the gate, the shared stages, nor the endpoint hooks ran.
    assert!(snapshot(&trace).is_empty());
}

#[tokio::test]
async fn gate_rejection_short_circuits_shared_stages_and_handler() {
    let trace = new_trace();
    let endpoint = Arc::new(Scripted::new(
        EndpointDescriptor::new(RouteMethod::Get, "/widgets"),
        Arc::clone(&trace),
        |_| Payload::json(&serde_json::json!({})),
    ));

    let engine = engine_for(endpoint, standard_registry(&trace));
    let response = engine.dispatch(get("/widgets"), PathParams::new()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    assert!(json["request_id"].is_string());

    assert_eq!(snapshot(&trace), vec!["auth-gate"]);
}

#[tokio::test]
async fn opt_out_endpoint_never_sees_the_gate() {
    let trace = new_trace();
    let endpoint = Arc::new(Scripted::new(
        EndpointDescriptor::new(RouteMethod::Get, "/health").with_auth_required(false),
        Arc::clone(&trace),
        |_| Payload::json(&serde_json::json!({"status": "ok"})),
    ));

    let engine = engine_for(endpoint, standard_registry(&trace));
    let response = engine.dispatch(get("/health"), PathParams::new()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        snapshot(&trace),
        vec!["alpha", "beta", "headers", "handler"]
    );
}

#[tokio::test]
async fn shared_stages_run_for_every_endpoint_of_the_registry() {
    let trace = new_trace();
    let registry = standard_registry(&trace);

    let first = Arc::new(Scripted::new(
        EndpointDescriptor::new(RouteMethod::Get, "/a").with_auth_required(false),
        Arc::clone(&trace),
        |_| Payload::json(&serde_json::json!({})),
    ));
    let second = Arc::new(Scripted::new(
        EndpointDescriptor::new(RouteMethod::Get, "/b").with_auth_required(false),
        Arc::clone(&trace),
        |_| Payload::json(&serde_json::json!({})),
    ));

    engine_for(first, registry.clone())
        .dispatch(get("/a"), PathParams::new())
        .await;
    engine_for(second, registry)
        .dispatch(get("/b"), PathParams::new())
        .await;

    let visits: Vec<String> = snapshot(&trace)
        .into_iter()
        .filter(|name| name == "alpha" || name == "beta")
        .collect();
    assert_eq!(visits, vec!["alpha", "beta", "alpha", "beta"]);
}

#[tokio::test]
async fn handler_error_becomes_exactly_one_envelope() {
    let trace = new_trace();
    let endpoint = Arc::new(Scripted::new(
        EndpointDescriptor::new(RouteMethod::Put, "/widgets/{id}").with_auth_required(false),
        Arc::clone(&trace),
        |_| {
            Err(HttpError::status(
                StatusCode::CONFLICT,
                "widget version conflict",
            ))
        },
    ));

    let engine = engine_for(endpoint, MiddlewareRegistry::default());
    let response = engine.dispatch(get("/widgets/9"), PathParams::new()).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "HTTP_ERROR");
    assert_eq!(json["error"]["message"], "widget version conflict");

    // The handler ran once; the dispatcher never produced a second body.
    assert_eq!(snapshot(&trace), vec!["headers", "handler"]);
}

#[tokio::test]
async fn header_hook_error_skips_the_handler() {
    let trace = new_trace();
    let endpoint = Arc::new(
        Scripted::new(
            EndpointDescriptor::new(RouteMethod::Get, "/widgets").with_auth_required(false),
            Arc::clone(&trace),
            |_| Payload::json(&serde_json::json!({})),
        )
        .with_headers(|_| Err(HttpError::forbidden("tenant suspended"))),
    );

    let engine = engine_for(endpoint, MiddlewareRegistry::default());
    let response = engine.dispatch(get("/widgets"), PathParams::new()).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(snapshot(&trace), vec!["headers"]);
}

#[tokio::test]
async fn file_endpoint_streams_contents_and_notifies_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    std::fs::write(&path, "id,name\n1,widget\n").unwrap();
    let path = path.to_str().unwrap().to_string();

    let trace = new_trace();
    let handler_path = path.clone();
    let endpoint = Arc::new(Scripted::new(
        EndpointDescriptor::new(RouteMethod::Get, "/reports/latest")
            .with_auth_required(false)
            .with_response_kind(ResponseKind::File),
        Arc::clone(&trace),
        move |_| Ok(Payload::file(handler_path.clone())),
    ));

    let engine = engine_for(Arc::clone(&endpoint), MiddlewareRegistry::default());
    let response = engine
        .dispatch(get("/reports/latest"), PathParams::new())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/csv");
    assert_eq!(
        response.headers().get("content-length").unwrap(),
        &http::HeaderValue::from(17_u64)
    );

    assert_eq!(body_bytes(response).await, "id,name\n1,widget\n".as_bytes());
    assert_eq!(*endpoint.file_notices.lock().unwrap(), vec![path]);
}

#[tokio::test]
async fn file_endpoint_with_missing_file_is_not_found_and_skips_notice() {
    let trace = new_trace();
    let endpoint = Arc::new(Scripted::new(
        EndpointDescriptor::new(RouteMethod::Get, "/reports/latest")
            .with_auth_required(false)
            .with_response_kind(ResponseKind::File),
        Arc::clone(&trace),
        |_| Ok(Payload::file("/nonexistent/report.csv")),
    ));

    let engine = engine_for(Arc::clone(&endpoint), MiddlewareRegistry::default());
    let response = engine
        .dispatch(get("/reports/latest"), PathParams::new())
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(endpoint.file_notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mismatched_payload_is_a_configuration_error() {
    let trace = new_trace();
    let endpoint = Arc::new(Scripted::new(
        EndpointDescriptor::new(RouteMethod::Get, "/reports/latest")
            .with_auth_required(false)
            .with_response_kind(ResponseKind::File),
        Arc::clone(&trace),
        |_| Payload::json(&serde_json::json!({"oops": true})),
    ));

    let engine = engine_for(Arc::clone(&endpoint), MiddlewareRegistry::default());
    let response = engine
        .dispatch(get("/reports/latest"), PathParams::new())
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "CONFIGURATION_ERROR");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("expected string"));

    assert!(endpoint.file_notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stream_endpoint_truncates_on_mid_stream_failure() {
    let trace = new_trace();
    let endpoint = Arc::new(Scripted::new(
        EndpointDescriptor::new(RouteMethod::Get, "/events")
            .with_auth_required(false)
            .with_response_kind(ResponseKind::Stream),
        Arc::clone(&trace),
        |_| {
            let chunks: Vec<Result<Bytes, BoxError>> = vec![
                Ok(Bytes::from_static(b"alpha")),
                Ok(Bytes::from_static(b"beta")),
                Err("simulated source failure".into()),
            ];
            Ok(Payload::stream(futures_util::stream::iter(chunks)))
        },
    ));

    let engine = engine_for(endpoint, MiddlewareRegistry::default());
    let response = engine.dispatch(get("/events"), PathParams::new()).await;

    // The head was committed before the failure: still a 200, no envelope.
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );

    // The body carries everything up to the failure, then just ends.
    assert_eq!(body_bytes(response).await, "alphabeta".as_bytes());
}
