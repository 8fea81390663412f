//! Client configuration types.

use std::time::Duration;

use courier_core::{CallTimeouts, DEFAULT_TIMEOUT};

/// Configuration for the HTTP client.
///
/// The three timeouts are the defaults of every call; a request may override
/// them through the timeout interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Default connect timeout.
    pub connect_timeout: Duration,
    /// Default read timeout.
    pub read_timeout: Duration,
    /// Default write timeout.
    pub write_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// Maximum number of requests in flight, unlimited if `None`.
    pub max_requests: Option<usize>,
}

/// Default limit of in-flight requests used by [`crate::Dispatcher::with_defaults`].
pub const DEFAULT_MAX_REQUESTS: usize = 128;

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            max_requests: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// The timeouts every call starts with.
    #[must_use]
    pub const fn call_timeouts(&self) -> CallTimeouts {
        CallTimeouts::new(self.connect_timeout, self.read_timeout, self.write_timeout)
    }

    /// Same configuration with another connect timeout.
    #[must_use]
    pub fn with_connect_timeout(self, timeout: Duration) -> Self {
        Self {
            connect_timeout: or_default(timeout),
            ..self
        }
    }

    /// Same configuration with another read timeout.
    #[must_use]
    pub fn with_read_timeout(self, timeout: Duration) -> Self {
        Self {
            read_timeout: or_default(timeout),
            ..self
        }
    }

    /// Same configuration with another write timeout.
    #[must_use]
    pub fn with_write_timeout(self, timeout: Duration) -> Self {
        Self {
            write_timeout: or_default(timeout),
            ..self
        }
    }

    /// Same configuration with another in-flight request limit.
    #[must_use]
    pub fn with_max_requests(self, max_requests: usize) -> Self {
        Self {
            max_requests: (max_requests > 0).then_some(max_requests),
            ..self
        }
    }
}

/// Zero falls back to [`DEFAULT_TIMEOUT`].
fn or_default(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_TIMEOUT
    } else {
        timeout
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    max_requests: Option<usize>,
}

impl ClientConfigBuilder {
    /// Set the default connect timeout; zero keeps the default.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the default read timeout; zero keeps the default.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the default write timeout; zero keeps the default.
    #[must_use]
    pub const fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Set the same default for connect, read and write.
    #[must_use]
    pub const fn timeout(self, timeout: Duration) -> Self {
        self.connect_timeout(timeout)
            .read_timeout(timeout)
            .write_timeout(timeout)
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Limit the number of requests in flight; zero means unlimited.
    #[must_use]
    pub const fn max_requests(mut self, max: usize) -> Self {
        self.max_requests = Some(max);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            connect_timeout: self.connect_timeout.map_or(defaults.connect_timeout, or_default),
            read_timeout: self.read_timeout.map_or(defaults.read_timeout, or_default),
            write_timeout: self.write_timeout.map_or(defaults.write_timeout, or_default),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            max_requests: self.max_requests.filter(|max| *max > 0),
        }
    }
}
