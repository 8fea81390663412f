//! HTTP request pipeline with per-call timeout overrides.
//!
//! Callers collect parameters in a [`ParamStore`], which encodes them as JSON,
//! a URL-encoded form or multipart. The body carries the caller's timeout
//! overrides and extra headers; the [`TimeoutInterceptor`] recovers them on
//! the way to the transport, strips them from the request and applies the
//! overrides to that one call.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use courier::prelude::*;
//!
//! # async fn run() -> courier::Result<()> {
//! let dispatcher = Dispatcher::with_defaults();
//!
//! let mut params = ParamStore::new();
//! params.put("user", "alice")?.put("age", 30)?;
//! params
//!     .with_encoding(Encoding::Form)
//!     .read_timeout(Duration::from_secs(5));
//!
//! // Sent as `user=alice&age=30`, read timeout of 5 s for this call only
//! let response = dispatcher
//!     .post("https://api.example.com/users", params)?
//!     .execute()
//!     .await?
//!     .error_for_status()?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! [`TimeoutInterceptor`]: middleware::TimeoutInterceptor

mod client;
mod config;
mod connector;
mod dispatcher;
pub mod middleware;
pub mod prelude;

// Re-export client types
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_MAX_REQUESTS};
pub use dispatcher::{Call, Callback, Dispatcher};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use courier_core::{
    Body, CallTimeouts, ContentType, DEFAULT_TIMEOUT, Encoding, Error, Exchange, FileAttachment,
    Form, FormBody, HttpClient, Method, ParamStore, Part, RawBody, Request, RequestBuilder,
    Response, Result, TimeoutCarrier, Timeouts, from_json, sentinel, to_form, to_json,
    to_query_string,
};

// Re-export http types for status codes and headers
pub use courier_core::{StatusCode, header};

pub use url;
