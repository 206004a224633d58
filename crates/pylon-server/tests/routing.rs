//! Routing tests through the full stack: router, registry, and engines.
//!
//! The pipeline's own test suite covers stage semantics; these tests verify
//! what the router adds on top — pattern matching feeding path parameters
//! into the pipeline, one shared registry across routes, and the 404
//! envelope for unmatched requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use pylon_core::{
    BoxFuture, Endpoint, EndpointDescriptor, HttpError, HttpResult, Payload, Request, RequestData,
    Response, RouteMethod,
};
use pylon_pipeline::{Middleware, MiddlewareContext, MiddlewareRegistry, Next};
use pylon_server::{Router, RouterError};

/// Endpoint that echoes its binding and the request's extracted inputs.
struct Lookup {
    descriptor: EndpointDescriptor,
}

impl Lookup {
    fn gated(method: RouteMethod, path: &str) -> Self {
        Self {
            descriptor: EndpointDescriptor::new(method, path),
        }
    }

    fn open(method: RouteMethod, path: &str) -> Self {
        Self {
            descriptor: EndpointDescriptor::new(method, path).with_auth_required(false),
        }
    }
}

impl Endpoint for Lookup {
    fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    fn handle<'a>(&'a self, request: &'a RequestData) -> BoxFuture<'a, HttpResult<Payload>> {
        Box::pin(async move {
            Payload::json(&serde_json::json!({
                "pattern": self.descriptor.path(),
                "id": request.param("id"),
                "verbose": request.query_value("verbose"),
            }))
        })
    }
}

/// Auth gate requiring an `authorization` header, any value.
struct TokenGate;

impl Middleware for TokenGate {
    fn name(&self) -> &'static str {
        "token-gate"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<Response>> {
        Box::pin(async move {
            if request.headers().contains_key("authorization") {
                next.run(ctx, request).await
            } else {
                Err(HttpError::unauthorized("missing token"))
            }
        })
    }
}

/// Shared middleware that counts how many requests passed through it.
struct Counting {
    hits: Arc<AtomicUsize>,
}

impl Middleware for Counting {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResult<Response>> {
        Box::pin(async move {
            self.hits.fetch_add(1, Ordering::SeqCst);
            next.run(ctx, request).await
        })
    }
}

fn gated_registry() -> MiddlewareRegistry {
    MiddlewareRegistry::builder().auth_gate(TokenGate).build()
}

fn get(uri: &str) -> Request {
    http::Request::builder().uri(uri).body(Bytes::new()).unwrap()
}

fn post(uri: &str) -> Request {
    http::Request::builder()
        .method("POST")
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

fn authed_get(uri: &str) -> Request {
    http::Request::builder()
        .uri(uri)
        .header("authorization", "Bearer ops")
        .body(Bytes::new())
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn matched_route_runs_the_gate_then_the_handler() {
    let registry = gated_registry();
    let mut router = Router::new();
    router
        .register(Lookup::gated(RouteMethod::Get, "/items/{id}"), &registry)
        .unwrap();

    let denied = router.handle(get("/items/42")).await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(denied).await["error"]["code"], "UNAUTHORIZED");

    let allowed = router.handle(authed_get("/items/42")).await;
    assert_eq!(allowed.status(), StatusCode::OK);

    let json = body_json(allowed).await;
    assert_eq!(json["pattern"], "/items/{id}");
    assert_eq!(json["id"], "42");
}

#[tokio::test]
async fn opt_out_route_skips_the_gate() {
    let registry = gated_registry();
    let mut router = Router::new();
    router
        .register(Lookup::open(RouteMethod::Get, "/health"), &registry)
        .unwrap();

    let response = router.handle(get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn query_strings_do_not_affect_matching() {
    let registry = MiddlewareRegistry::default();
    let mut router = Router::new();
    router
        .register(Lookup::open(RouteMethod::Get, "/items/{id}"), &registry)
        .unwrap();

    let response = router.handle(get("/items/42?verbose=1")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["id"], "42");
    assert_eq!(json["verbose"], "1");
}

#[tokio::test]
async fn unmatched_path_and_method_both_answer_404() {
    let registry = MiddlewareRegistry::default();
    let mut router = Router::new();
    router
        .register(Lookup::open(RouteMethod::Get, "/items"), &registry)
        .unwrap();

    for response in [
        router.handle(get("/nothing-here")).await,
        router.handle(post("/items")).await,
    ] {
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["request_id"].is_string());
    }
}

#[tokio::test]
async fn duplicate_registration_keeps_the_first_binding() {
    let registry = MiddlewareRegistry::default();
    let mut router = Router::new();

    router
        .register(Lookup::open(RouteMethod::Get, "/items/{id}"), &registry)
        .unwrap();
    let error = router
        .register(Lookup::open(RouteMethod::Get, "/items/{id}"), &registry)
        .unwrap_err();
    assert!(matches!(error, RouterError::DuplicateRoute { .. }));

    // The first binding still serves.
    let response = router.handle(get("/items/7")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], "7");
}

#[tokio::test]
async fn all_routes_share_the_registry_stages() {
    let hits = Arc::new(AtomicUsize::new(0));
    let registry = MiddlewareRegistry::builder()
        .append(Counting {
            hits: Arc::clone(&hits),
        })
        .build();

    let mut router = Router::new();
    router
        .register(Lookup::open(RouteMethod::Get, "/a"), &registry)
        .unwrap();
    router
        .register(Lookup::open(RouteMethod::Get, "/b"), &registry)
        .unwrap();

    router.handle(get("/a")).await;
    router.handle(get("/b")).await;

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
