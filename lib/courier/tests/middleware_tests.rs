//! Integration tests for middleware functionality.

use std::future::Future;
use std::time::{Duration, Instant};

use courier::middleware::{Chain, Interceptor, LoggingLayer, TimeoutInterceptor};
use courier::{
    Error, Exchange, FormBody, HttpClient, HyperClient, Method, Request, Response, Result,
};
use tower::Service;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, header, header_exists, method, path},
};

fn url(server: &MockServer, path: &str) -> url::Url {
    url::Url::parse(&format!("{}{path}", server.uri())).expect("url")
}

/// Adds a header, and records the read timeout it saw in another one.
#[derive(Clone)]
struct Stamp(&'static str);

impl Interceptor for Stamp {
    fn intercept<S>(&self, mut chain: Chain<S>) -> impl Future<Output = Result<Response>> + Send
    where
        S: Service<Exchange, Response = Response, Error = Error> + Send + 'static,
        S::Future: Send,
    {
        let read_ms = chain.read_timeout().as_millis().to_string();
        let request = chain.request_mut();
        request.set_header("X-Stamp", self.0);
        request.set_header("X-Read-Ms", read_ms);
        chain.proceed()
    }
}

/// Test that logging middleware doesn't break request/response flow.
#[tokio::test]
async fn test_logging_middleware() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logged"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"logged": true})))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .with_logging()
        .layer(LoggingLayer::debug())
        .build();

    let request = Request::builder(Method::Get, url(&mock_server, "/logged")).build();
    let response = client.execute(request).await.expect("response");

    assert!(response.is_success());
}

/// Without the timeout interceptor the metadata travels as plain form fields.
#[tokio::test]
async fn test_metadata_needs_interceptor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/raw"))
        .and(body_string("a=1&read_timeout=5000"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_logging().build();
    let request = Request::builder(Method::Post, url(&mock_server, "/raw"))
        .body(FormBody::new().add("a", "1").add("read_timeout", "5000"))
        .build();

    let response = client.execute(request).await.expect("response");
    assert!(response.is_success());
}

/// User layers sit inside the defaults: they see the stripped request and
/// the resolved timeouts.
#[tokio::test]
async fn test_user_layers_see_resolved_timeouts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/stamped"))
        .and(header("X-Stamp", "inner"))
        .and(header("X-Read-Ms", "1500"))
        .and(body_string("a=1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .interceptor(Stamp("inner"))
        .with_defaults()
        .build();

    let form = FormBody::new()
        .add("a", "1")
        .add("connect_timeout", "0")
        .add("read_timeout", "1500")
        .add("write_timeout", "0");
    let request = Request::builder(Method::Post, url(&mock_server, "/stamped"))
        .body(form)
        .build();

    let response = client.execute(request).await.expect("response");
    assert!(response.is_success());
}

/// The last layer added sees the request first.
#[tokio::test]
async fn test_layer_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/order"))
        .and(header("X-Stamp", "first"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    // "second" runs first, then "first" overwrites the header
    let client = HyperClient::builder()
        .interceptor(Stamp("first"))
        .interceptor(Stamp("second"))
        .build();

    let request = Request::builder(Method::Get, url(&mock_server, "/order")).build();
    let response = client.execute(request).await.expect("response");
    assert!(response.is_success());
}

#[tokio::test]
async fn test_explicit_timeout_interceptor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(header_exists("X-Read-Ms"))
        .and(header("X-Read-Ms", "250"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .interceptor(Stamp("x"))
        .with_timeout_interceptor()
        .build();

    let request = Request::builder(Method::Get, url(&mock_server, "/headers"))
        .header("read_timeout", "250")
        .build();
    let response = client.execute(request).await.expect("response");
    assert!(response.is_success());
}

#[tokio::test]
async fn test_concurrency_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().max_requests(1).build();
    let first = client.clone();

    let start = Instant::now();
    let (a, b) = tokio::join!(
        first.execute(Request::builder(Method::Get, url(&mock_server, "/limited")).build()),
        client.execute(Request::builder(Method::Get, url(&mock_server, "/limited")).build()),
    );

    assert!(a.expect("first").is_success());
    assert!(b.expect("second").is_success());
    assert!(
        start.elapsed() >= Duration::from_millis(600),
        "requests overlapped: {:?}",
        start.elapsed()
    );
}
