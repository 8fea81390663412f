//! Interceptor chain over a tower service.
//!
//! An [`Interceptor`] receives a [`Chain`]: a view on the request in flight,
//! the timeouts of the current call, and the rest of the stack. It may rewrite
//! the request and the timeouts, then call [`Chain::proceed`]. Timeouts set on
//! the chain apply to that proceed call only; they never leak to other calls
//! sharing the same client.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use courier_core::{CallTimeouts, Error, Exchange, Request, Response, Result};
use tower::{Layer, Service, ServiceExt};

/// The request in flight and the rest of the stack.
#[derive(Debug)]
pub struct Chain<S> {
    next: S,
    request: Request,
    timeouts: CallTimeouts,
}

impl<S> Chain<S> {
    /// Create a chain that forwards `exchange` to `next`.
    pub fn new(next: S, exchange: Exchange) -> Self {
        let (request, timeouts) = exchange.into_parts();
        Self {
            next,
            request,
            timeouts,
        }
    }

    /// The request in flight.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Mutable access to the request in flight.
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// The timeouts of the current call.
    #[must_use]
    pub const fn timeouts(&self) -> CallTimeouts {
        self.timeouts
    }

    /// The current connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.timeouts.connect
    }

    /// The current read timeout.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        self.timeouts.read
    }

    /// The current write timeout.
    #[must_use]
    pub const fn write_timeout(&self) -> Duration {
        self.timeouts.write
    }

    /// Use another connect timeout for the next proceed call.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect = timeout;
        self
    }

    /// Use another read timeout for the next proceed call.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.read = timeout;
        self
    }

    /// Use another write timeout for the next proceed call.
    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.write = timeout;
        self
    }

    /// Replace all timeouts for the next proceed call.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: CallTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

impl<S> Chain<S>
where
    S: Service<Exchange, Response = Response, Error = Error>,
{
    /// Forward the current request to the rest of the stack.
    pub async fn proceed(self) -> Result<Response> {
        let exchange = Exchange::new(self.request, self.timeouts);
        self.next.oneshot(exchange).await
    }

    /// Forward `request` instead of the current one.
    pub async fn proceed_with(mut self, request: Request) -> Result<Response> {
        self.request = request;
        self.proceed().await
    }
}

/// Rewrites a request, or its call timeouts, before it reaches the transport.
///
/// Implementations are shared by every call of a client and must not keep
/// per-request state.
pub trait Interceptor: Clone + Send + Sync + 'static {
    /// Handle one call, usually ending with [`Chain::proceed`].
    fn intercept<S>(&self, chain: Chain<S>) -> impl Future<Output = Result<Response>> + Send
    where
        S: Service<Exchange, Response = Response, Error = Error> + Send + 'static,
        S::Future: Send;
}

/// Layer running an [`Interceptor`] in front of the inner service.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterceptorLayer<I> {
    interceptor: I,
}

impl<I> InterceptorLayer<I> {
    /// Wrap an interceptor.
    pub const fn new(interceptor: I) -> Self {
        Self { interceptor }
    }
}

impl<S, I: Clone> Layer<S> for InterceptorLayer<I> {
    type Service = Intercepted<S, I>;

    fn layer(&self, inner: S) -> Self::Service {
        Intercepted {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

/// Service produced by [`InterceptorLayer`].
#[derive(Debug, Clone)]
pub struct Intercepted<S, I> {
    inner: S,
    interceptor: I,
}

impl<S, I> Service<Exchange> for Intercepted<S, I>
where
    S: Service<Exchange, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
    I: Interceptor,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, exchange: Exchange) -> Self::Future {
        // Hand the readied service to the chain, keep a fresh clone
        let clone = self.inner.clone();
        let next = std::mem::replace(&mut self.inner, clone);
        let interceptor = self.interceptor.clone();

        Box::pin(async move { interceptor.intercept(Chain::new(next, exchange)).await })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use courier_core::Method;
    use tower::service_fn;

    use super::*;

    type Seen = Arc<Mutex<Vec<(String, CallTimeouts)>>>;

    fn recording_service(
        seen: Seen,
    ) -> impl Service<Exchange, Response = Response, Error = Error, Future: Send> + Clone + Send + 'static
    {
        service_fn(move |exchange: Exchange| {
            let seen = Arc::clone(&seen);
            async move {
                let path = exchange.request.url().path().to_string();
                seen.lock()
                    .expect("lock")
                    .push((path, exchange.timeouts));
                Ok::<_, Error>(Response::new(200, HashMap::new(), "ok"))
            }
        })
    }

    fn exchange(path: &str) -> Exchange {
        let url = url::Url::parse("http://localhost")
            .and_then(|base| base.join(path))
            .expect("url");
        Exchange::with_default_timeouts(Request::builder(Method::Get, url).build())
    }

    #[derive(Clone)]
    struct SlowReads;

    impl Interceptor for SlowReads {
        fn intercept<S>(&self, chain: Chain<S>) -> impl Future<Output = Result<Response>> + Send
        where
            S: Service<Exchange, Response = Response, Error = Error> + Send + 'static,
            S::Future: Send,
        {
            let read = chain.read_timeout() * 2;
            chain.with_read_timeout(read).proceed()
        }
    }

    #[tokio::test]
    async fn timeouts_are_scoped_to_the_call() {
        let seen = Seen::default();
        let service = InterceptorLayer::new(SlowReads).layer(recording_service(Arc::clone(&seen)));

        let response = service.clone().oneshot(exchange("/a")).await.expect("response");
        assert_eq!(response.status(), 200);
        service.oneshot(exchange("/b")).await.expect("response");

        let seen = seen.lock().expect("lock");
        let expected = CallTimeouts::new(
            Duration::from_secs(20),
            Duration::from_secs(40),
            Duration::from_secs(20),
        );
        assert_eq!(
            *seen,
            vec![("/a".to_string(), expected), ("/b".to_string(), expected)]
        );
    }

    #[tokio::test]
    async fn proceed_with_replaces_request() {
        let seen = Seen::default();
        let mut exchange = exchange("/original");
        exchange.timeouts = CallTimeouts::uniform(Duration::from_secs(1));
        let chain = Chain::new(recording_service(Arc::clone(&seen)), exchange);

        assert_eq!(chain.connect_timeout(), Duration::from_secs(1));
        assert_eq!(chain.request().url().path(), "/original");

        let replacement = Request::builder(
            Method::Get,
            url::Url::parse("http://localhost/replaced").expect("url"),
        )
        .build();
        chain
            .with_write_timeout(Duration::from_millis(5))
            .proceed_with(replacement)
            .await
            .expect("response");

        let seen = seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        let (path, timeouts) = seen.first().expect("one call");
        assert_eq!(path, "/replaced");
        assert_eq!(timeouts.write, Duration::from_millis(5));
        assert_eq!(timeouts.read, Duration::from_secs(1));
    }
}
