//! A request in flight together with the timeouts scoped to its call.

use crate::{CallTimeouts, Request};

/// What flows through the middleware stack: the request and the timeouts
/// the transport must apply to this one call.
///
/// Middleware may rewrite both; changes are visible only to the layers below.
#[derive(Debug)]
pub struct Exchange {
    /// The request to send.
    pub request: Request,
    /// The timeouts applied by the transport.
    pub timeouts: CallTimeouts,
}

impl Exchange {
    /// Pair a request with its call timeouts.
    #[must_use]
    pub const fn new(request: Request, timeouts: CallTimeouts) -> Self {
        Self { request, timeouts }
    }

    /// Pair a request with the default call timeouts.
    #[must_use]
    pub fn with_default_timeouts(request: Request) -> Self {
        Self::new(request, CallTimeouts::default())
    }

    /// Split into request and timeouts.
    #[must_use]
    pub fn into_parts(self) -> (Request, CallTimeouts) {
        (self.request, self.timeouts)
    }
}
