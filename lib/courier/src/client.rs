//! HTTP client implementation using hyper-util.

use std::collections::HashMap;
use std::future::Future;
use std::pin::{Pin, pin};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use courier_core::{
    CallTimeouts, Error, Exchange, HttpClient, Request, Response, Result, header,
};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;
use tracing::trace;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::connector::https_connector;
use crate::middleware::{
    ConcurrencyLimitLayer, InterceptorLayer, Interceptor, LoggingLayer, TimeoutInterceptor,
};

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased service for middleware composition.
///
/// Every layer of a [`HyperClient`] is a service of this shape: it receives
/// the request together with the timeouts scoped to its call.
pub type BoxedService = BoxCloneService<Exchange, Response, Error>;

/// Future type for Tower Service implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Thread-safe wrapper for `BoxedService`.
///
/// The `Mutex` only guards cloning; each call drives its own clone.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, exchange: Exchange) -> ServiceFuture {
        // Lock, clone the service, and release the lock immediately
        let service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(service.oneshot(exchange))
    }
}

// ============================================================================
// Raw Client (internal, used for direct hyper access)
// ============================================================================

/// Raw HTTP client using hyper-util (internal implementation).
#[derive(Clone)]
struct RawHyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl RawHyperClient {
    fn new(config: &ClientConfig) -> Self {
        let connector = https_connector();

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner }
    }

    /// Build a hyper request from a courier request.
    fn build_hyper_request(request: Request) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let has_content_type = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str()));

        let body = match body {
            Some(body) => {
                if !has_content_type && let Some(content_type) = body.content_type() {
                    builder = builder.header(header::CONTENT_TYPE, content_type);
                }
                Full::new(body.to_bytes())
            }
            None => Full::default(),
        };

        builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    /// Extract response headers as a `HashMap`.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Send the exchange, bounded by its scoped timeouts.
    ///
    /// The pooled client cannot time the connect and write phases apart, so
    /// the response head must arrive within connect + write + read; then each
    /// body frame must arrive within read.
    async fn execute(&self, exchange: Exchange) -> Result<Response> {
        let (request, timeouts) = exchange.into_parts();
        let hyper_request = Self::build_hyper_request(request)?;
        trace!(?timeouts, "sending exchange");

        let response = tokio::time::timeout(
            timeouts.head_deadline(),
            self.inner.request(hyper_request),
        )
        .await
        .map_err(|_| Error::Timeout)?
        .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::extract_headers(response.headers());

        let body = Self::read_body(response.into_body(), timeouts).await?;

        Ok(Response::new(status, response_headers, body))
    }

    async fn read_body<B>(body: B, timeouts: CallTimeouts) -> Result<Bytes>
    where
        B: http_body_util::BodyExt<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let mut body = pin!(body);
        let mut data = BytesMut::new();

        loop {
            let frame = tokio::time::timeout(timeouts.read, body.as_mut().frame())
                .await
                .map_err(|_| Error::Timeout)?;

            match frame {
                None => break,
                Some(Ok(frame)) => {
                    if let Ok(chunk) = frame.into_data() {
                        data.extend_from_slice(&chunk);
                    }
                }
                Some(Err(e)) => return Err(Error::connection(e.to_string())),
            }
        }

        Ok(data.freeze())
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Service<Exchange> for RawHyperClient {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, exchange: Exchange) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(exchange).await })
    }
}

// ============================================================================
// Public Client
// ============================================================================

/// HTTP client using hyper-util with connection pooling, TLS, and middleware support.
///
/// Every call starts with the connect, read and write timeouts of the
/// [`ClientConfig`]. A [`TimeoutInterceptor`] in the stack may replace them
/// for one call.
///
/// # Example
///
/// ```no_run
/// use courier::HyperClient;
/// use std::time::Duration;
///
/// // Transport only, no middleware
/// let client = HyperClient::new();
///
/// // Logging, timeout interceptor and a concurrency limit
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(10))
///     .max_requests(32)
///     .with_defaults()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: SyncService,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a new client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration (no middleware).
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperClient::new(&config);
        Self::with_service(BoxCloneService::new(raw), config)
    }

    /// Create a client with a pre-configured service (used by builder).
    fn with_service(service: BoxedService, config: ClientConfig) -> Self {
        Self {
            service: SyncService::new(service),
            config,
        }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send an exchange through the middleware stack as is.
    pub fn send(&self, exchange: Exchange) -> ServiceFuture {
        self.service.call(exchange)
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for HyperClient {
    async fn execute(&self, request: Request) -> Result<Response> {
        let exchange = Exchange::new(request, self.config.call_timeouts());
        self.send(exchange).await
    }
}

// ============================================================================
// Tower Service Implementation
// ============================================================================

impl Service<Request> for HyperClient {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        // The stack is polled for readiness by each call's oneshot
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.send(Exchange::new(request, self.config.call_timeouts()))
    }
}

/// Builder for [`HyperClient`].
///
/// Layers wrap the ones added before them: the last layer added sees each
/// exchange first. Defaults and the concurrency limit always sit outside the
/// layers added here.
///
/// # Example
///
/// ```no_run
/// use courier::HyperClient;
/// use courier::middleware::LoggingLayer;
/// use std::time::Duration;
///
/// let client = HyperClient::builder()
///     .read_timeout(Duration::from_secs(60))
///     .layer(LoggingLayer::debug())
///     .with_timeout_interceptor()
///     .build();
/// ```
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
    use_defaults: bool,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .field("use_defaults", &self.use_defaults)
            .finish()
    }
}

impl HyperClientBuilder {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Start from an existing configuration.
    #[must_use]
    pub fn config(mut self, config: &ClientConfig) -> Self {
        let mut builder = ClientConfig::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .write_timeout(config.write_timeout)
            .pool_idle_per_host(config.pool_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout);
        if let Some(max) = config.max_requests {
            builder = builder.max_requests(max);
        }
        self.config = builder;
        self
    }

    /// Set the default connect, read and write timeouts at once.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the default connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the default read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.read_timeout(timeout);
        self
    }

    /// Set the default write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.write_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Limit the number of requests in flight across all clones of the client.
    #[must_use]
    pub fn max_requests(mut self, max: usize) -> Self {
        self.config = self.config.max_requests(max);
        self
    }

    /// Alias of [`HyperClientBuilder::max_requests`].
    #[must_use]
    pub fn with_max_requests(self, max: usize) -> Self {
        self.max_requests(max)
    }

    // ========================================================================
    // Generic Middleware API
    // ========================================================================

    /// Add a Tower layer to the client.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use courier::HyperClient;
    /// use courier::middleware::LoggingLayer;
    ///
    /// let client = HyperClient::builder()
    ///     .layer(LoggingLayer::new())
    ///     .build();
    /// ```
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service:
            Service<Exchange, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Exchange>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Add middleware using the reqwest-middleware style `.with()` method.
    ///
    /// This is an alias for `.layer()`.
    #[must_use]
    pub fn with<L>(self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service:
            Service<Exchange, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Exchange>>::Future: Send,
    {
        self.layer(layer)
    }

    /// Add an interceptor.
    #[must_use]
    pub fn interceptor<I: Interceptor>(self, interceptor: I) -> Self {
        self.layer(InterceptorLayer::new(interceptor))
    }

    // ========================================================================
    // Defaults Control
    // ========================================================================

    /// Enable the default middleware.
    ///
    /// Wraps the configured layers with, from the inside out:
    /// - logging at info level,
    /// - the [`TimeoutInterceptor`].
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.use_defaults = true;
        self
    }

    /// Disable all default middleware.
    #[must_use]
    pub fn without_defaults(mut self) -> Self {
        self.use_defaults = false;
        self
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Add the [`TimeoutInterceptor`].
    #[must_use]
    pub fn with_timeout_interceptor(self) -> Self {
        self.interceptor(TimeoutInterceptor)
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes headers and more detail).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the client with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = self.config.build();

        // Start with base service
        let mut service: BoxedService = BoxCloneService::new(RawHyperClient::new(&config));

        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        if self.use_defaults {
            service = BoxCloneService::new(LoggingLayer::new().layer(service));
            service = BoxCloneService::new(InterceptorLayer::new(TimeoutInterceptor).layer(service));
        }

        if let Some(max) = config.max_requests {
            service = BoxCloneService::new(ConcurrencyLimitLayer::new(max).layer(service));
        }

        HyperClient::with_service(service, config)
    }
}
