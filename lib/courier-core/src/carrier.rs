//! Body decorator carrying timeout and header metadata.

use std::time::Duration;

use bytes::{BufMut, Bytes};
use indexmap::IndexMap;

use crate::{RawBody, Timeouts};

/// A body that carries per-call timeouts and headers alongside its payload.
///
/// On the wire it is indistinguishable from the wrapped body: length, content
/// type and bytes are delegated. The metadata is read by the timeout
/// interceptor before the request is sent.
///
/// Headers can be taken exactly once; the carrier is not `Clone`.
#[derive(Debug)]
pub struct TimeoutCarrier {
    inner: RawBody,
    timeouts: Timeouts,
    headers: Option<IndexMap<String, String>>,
}

impl TimeoutCarrier {
    /// Wrap a body, with no overrides and no headers.
    #[must_use]
    pub fn new(inner: RawBody) -> Self {
        Self {
            inner,
            timeouts: Timeouts::default(),
            headers: None,
        }
    }

    /// Wrap a serialized JSON payload.
    #[must_use]
    pub fn json(data: impl Into<Bytes>) -> Self {
        Self::new(RawBody::json(data))
    }

    /// Set the timeout overrides.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the headers to inject.
    #[must_use]
    pub fn with_headers(mut self, headers: IndexMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Copy the timeout overrides of another carrier.
    #[must_use]
    pub fn copy_timeouts(mut self, other: &Self) -> Self {
        self.timeouts = other.timeouts;
        self
    }

    /// The timeout overrides.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Connect timeout override, or `default` when unset.
    #[must_use]
    pub fn connect_timeout(&self, default: Duration) -> Duration {
        self.timeouts.connect().unwrap_or(default)
    }

    /// Read timeout override, or `default` when unset.
    #[must_use]
    pub fn read_timeout(&self, default: Duration) -> Duration {
        self.timeouts.read().unwrap_or(default)
    }

    /// Write timeout override, or `default` when unset.
    #[must_use]
    pub fn write_timeout(&self, default: Duration) -> Duration {
        self.timeouts.write().unwrap_or(default)
    }

    /// The headers not yet taken.
    #[must_use]
    pub const fn headers(&self) -> Option<&IndexMap<String, String>> {
        self.headers.as_ref()
    }

    /// Take the headers, leaving none behind.
    pub fn take_headers(&mut self) -> Option<IndexMap<String, String>> {
        self.headers.take()
    }

    /// The content type of the wrapped body.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.inner.content_type()
    }

    /// The length of the wrapped body.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.inner.len()
    }

    /// The bytes of the wrapped body.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        self.inner.data()
    }

    /// Write the wrapped body to a buffer.
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.inner.data());
    }

    /// Unwrap, dropping the metadata.
    #[must_use]
    pub fn into_inner(self) -> RawBody {
        self.inner
    }
}
