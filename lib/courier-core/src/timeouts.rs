//! Timeout overrides and resolved per-call timeouts.

use std::time::Duration;

/// Default connect, read and write timeout of a client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Optional per-request timeout overrides.
///
/// Each value is either unset (inherit the chain's current timeout) or a
/// positive number of whole milliseconds, the resolution of the wire format.
/// Values are truncated to milliseconds and anything below 1 ms is
/// normalized to unset, so the wire value `"0"` always means "no override"
/// and every encoding carries the same override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    connect: Option<Duration>,
    read: Option<Duration>,
    write: Option<Duration>,
}

fn positive(timeout: Option<Duration>) -> Option<Duration> {
    timeout.map(whole_millis).filter(|it| !it.is_zero())
}

fn whole_millis(timeout: Duration) -> Duration {
    Duration::from_millis(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
}

impl Timeouts {
    /// Create overrides from optional values.
    #[must_use]
    pub fn new(
        connect: Option<Duration>,
        read: Option<Duration>,
        write: Option<Duration>,
    ) -> Self {
        Self {
            connect: positive(connect),
            read: positive(read),
            write: positive(write),
        }
    }

    /// Set the connect timeout override.
    #[must_use]
    pub fn with_connect(mut self, timeout: Duration) -> Self {
        self.connect = positive(Some(timeout));
        self
    }

    /// Set the read timeout override.
    #[must_use]
    pub fn with_read(mut self, timeout: Duration) -> Self {
        self.read = positive(Some(timeout));
        self
    }

    /// Set the write timeout override.
    #[must_use]
    pub fn with_write(mut self, timeout: Duration) -> Self {
        self.write = positive(Some(timeout));
        self
    }

    /// Connect timeout override, if any.
    #[must_use]
    pub const fn connect(&self) -> Option<Duration> {
        self.connect
    }

    /// Read timeout override, if any.
    #[must_use]
    pub const fn read(&self) -> Option<Duration> {
        self.read
    }

    /// Write timeout override, if any.
    #[must_use]
    pub const fn write(&self) -> Option<Duration> {
        self.write
    }

    /// Returns `true` if no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.connect.is_none() && self.read.is_none() && self.write.is_none()
    }

    /// Apply the overrides on top of the given call timeouts.
    #[must_use]
    pub fn resolve(&self, defaults: CallTimeouts) -> CallTimeouts {
        CallTimeouts {
            connect: self.connect.unwrap_or(defaults.connect),
            read: self.read.unwrap_or(defaults.read),
            write: self.write.unwrap_or(defaults.write),
        }
    }
}

/// The timeouts scoped to one call through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimeouts {
    /// Time allowed to establish a connection.
    pub connect: Duration,
    /// Time allowed to wait for response data.
    pub read: Duration,
    /// Time allowed to send the request.
    pub write: Duration,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self::uniform(DEFAULT_TIMEOUT)
    }
}

impl CallTimeouts {
    /// Create call timeouts.
    #[must_use]
    pub const fn new(connect: Duration, read: Duration, write: Duration) -> Self {
        Self {
            connect,
            read,
            write,
        }
    }

    /// Use the same value for connect, read and write.
    #[must_use]
    pub const fn uniform(timeout: Duration) -> Self {
        Self::new(timeout, timeout, timeout)
    }

    /// Deadline for receiving the response head: connecting, sending the
    /// request, then waiting for the first response bytes.
    #[must_use]
    pub fn head_deadline(&self) -> Duration {
        self.connect
            .saturating_add(self.write)
            .saturating_add(self.read)
    }
}
