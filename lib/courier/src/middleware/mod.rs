//! Tower middleware for the courier transport.
//!
//! Every layer here is a [`tower::Service`] over [`courier_core::Exchange`], so
//! it sees both the request and the timeouts scoped to its call.
//!
//! - [`LoggingLayer`] - Logs requests, scoped timeouts and responses using `tracing`
//! - [`Chain`] and [`Interceptor`] - Rewrite a request and its timeouts, then proceed
//! - [`InterceptorLayer`] - Adapts an [`Interceptor`] into a tower layer
//! - [`TimeoutInterceptor`] - Recovers per-call timeouts and headers carried by the body
//!
//! # Example
//!
//! ```no_run
//! use courier::HyperClient;
//! use courier::middleware::{InterceptorLayer, TimeoutInterceptor};
//!
//! let client = HyperClient::builder()
//!     .with_logging()
//!     .layer(InterceptorLayer::new(TimeoutInterceptor))
//!     .build();
//! ```

mod chain;
mod logging;
mod timeout;

pub use chain::{Chain, Intercepted, Interceptor, InterceptorLayer};
pub use logging::{LogLevel, Logging, LoggingLayer};
pub use timeout::TimeoutInterceptor;

pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::{Layer, ServiceBuilder};
