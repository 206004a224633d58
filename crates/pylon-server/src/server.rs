//! The HTTP transport.
//!
//! [`Server`] owns a TCP accept loop and serves each connection over
//! HTTP/1.1, collecting request bodies to [`Bytes`] before handing them to
//! the [`Router`]. Responses stream back through hyper, so FILE and STREAM
//! endpoints never buffer their bodies here.
//!
//! Shutdown is cooperative: triggering the [`ShutdownSignal`] stops the
//! accept loop, then in-flight connections are drained up to the configured
//! shutdown timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! use pylon_pipeline::MiddlewareRegistry;
//! use pylon_server::{Router, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pylon_server::ServerError> {
//!     let registry = MiddlewareRegistry::default();
//!     let mut router = Router::new();
//!     // router.register(..., &registry) for each endpoint
//!
//!     let server = Server::new(ServerConfig::default(), router);
//!     server.run().await
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Collected};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use pylon_core::{HttpError, RequestId, Response};
use pylon_pipeline::error_response;

use crate::config::ServerConfig;
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors that stop the server before it can accept connections.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured bind address does not parse.
    #[error("invalid bind address {addr:?}: {source}")]
    InvalidAddress {
        /// The configured address text.
        addr: String,
        /// The parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The TCP listener could not bind.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// HTTP/1.1 transport for a fully registered [`Router`].
pub struct Server {
    config: ServerConfig,
    router: Arc<Router>,
}

impl Server {
    /// Creates a server from a configuration and a registered router.
    ///
    /// Register every route before constructing the server; the router is
    /// immutable from here on.
    #[must_use]
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// The server's configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The router serving this server's requests.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Runs the server until the process receives a termination signal.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured address does not parse or the
    /// listener cannot bind.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs the server until `shutdown` is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured address does not parse or the
    /// listener cannot bind.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!(%addr, routes = self.router.route_count(), "server listening");

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            let router = Arc::clone(&self.router);
                            let request_timeout = self.config.request_timeout();
                            let token = tracker.acquire();
                            let conn_shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                let served =
                                    handle_connection(stream, router, request_timeout, conn_shutdown)
                                        .await;
                                if let Err(error) = served {
                                    tracing::error!(%remote_addr, %error, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(error) => {
                            tracing::error!(%error, "failed to accept connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    tracing::info!("shutdown signal received, draining connections");
                    break;
                }
            }
        }

        let timeout = self.config.shutdown_timeout();
        tokio::select! {
            _ = tracker.drained() => {
                tracing::info!("all connections closed");
            }
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!(
                    remaining = tracker.active_connections(),
                    "shutdown timeout reached with connections still open"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("routes", &self.router.route_count())
            .finish()
    }
}

/// Serves one connection until it closes or shutdown is triggered.
async fn handle_connection(
    stream: TcpStream,
    router: Arc<Router>,
    request_timeout: Option<Duration>,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |request: http::Request<Incoming>| {
        let router = Arc::clone(&router);
        async move { Ok::<_, Infallible>(handle_request(&router, request, request_timeout).await) }
    });

    let connection = http1::Builder::new().serve_connection(io, service);

    tokio::select! {
        result = connection => result,
        _ = shutdown.recv() => {
            tracing::debug!("connection closed by shutdown");
            Ok(())
        }
    }
}

/// Collects the body, dispatches through the router, and enforces the
/// per-request time budget on both phases.
async fn handle_request(
    router: &Router,
    request: http::Request<Incoming>,
    request_timeout: Option<Duration>,
) -> Response {
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let bytes = match read_body(body, request_timeout).await {
        Ok(bytes) => bytes,
        Err(error) => return error_response(&error, RequestId::new()),
    };

    let request = http::Request::from_parts(parts, bytes);
    let dispatch = router.handle(request);

    match request_timeout {
        Some(limit) => match tokio::time::timeout(limit, dispatch).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(method = %method, path = %path, "request dispatch timed out");
                error_response(
                    &HttpError::status(StatusCode::GATEWAY_TIMEOUT, "request dispatch timed out"),
                    RequestId::new(),
                )
            }
        },
        None => dispatch.await,
    }
}

/// Collects the request body, bounded by the request timeout when set.
async fn read_body(body: Incoming, limit: Option<Duration>) -> Result<Bytes, HttpError> {
    let collect = body.collect();

    let collected = match limit {
        Some(limit) => match tokio::time::timeout(limit, collect).await {
            Ok(collected) => collected,
            Err(_) => {
                return Err(HttpError::status(
                    StatusCode::REQUEST_TIMEOUT,
                    "request body read timed out",
                ));
            }
        },
        None => collect.await,
    };

    collected.map(Collected::to_bytes).map_err(|error| {
        HttpError::status(
            StatusCode::BAD_REQUEST,
            format!("failed to read request body: {error}"),
        )
    })
}
