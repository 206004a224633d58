//! # Pylon Core
//!
//! Core types and traits for the Pylon endpoint pipeline.
//!
//! This crate provides the vocabulary shared by every Pylon crate:
//!
//! - [`EndpointDescriptor`] - Declarative endpoint description (route, auth, response kind)
//! - [`Endpoint`] / [`Validator`] - The per-endpoint hook traits
//! - [`RequestData`] / [`RequestId`] - The handler-facing request view and its identity
//! - [`ResponseEnvelope`] / [`Payload`] - Handler output, pre-dispatch
//! - [`HttpError`] - Standard error types and the JSON error envelope

#![doc(html_root_url = "https://docs.rs/pylon-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod descriptor;
mod endpoint;
mod error;
mod request;
mod response;
mod types;

pub use descriptor::{EndpointDescriptor, ResponseKind, RouteMethod};
pub use endpoint::{Endpoint, FnValidator, Validator};
pub use error::{ErrorDetail, ErrorEnvelope, FieldError, HttpError, HttpResult};
pub use request::{RequestData, RequestId};
pub use response::{Payload, ResponseEnvelope};
pub use types::{
    empty_body, full_body, json_response, BoxBody, BoxError, BoxFuture, ByteStream, PathParams,
    Request, Response,
};
