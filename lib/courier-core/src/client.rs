//! HTTP client trait.

use std::future::Future;

use crate::{Request, Response, Result};

/// Low-level HTTP execution.
///
/// Implementations apply their own default timeouts; per-call overrides are
/// recovered from the request by the middleware stack.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request.
    ///
    /// Non-2xx responses are returned as responses, not errors.
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}
