//! End-to-end tests of per-call timeout overrides.
//!
//! The transport bounds the response head by connect + write + read, so the
//! overrides below shrink (or grow) all three together.

use std::time::Duration;

use assert2::{check, let_assert};
use courier::{Dispatcher, Encoding, HyperClient, ParamStore};
use wiremock::{
    Mock, MockServer, Request, ResponseTemplate,
    matchers::{body_string, header, method, path},
};

const SHORT: Duration = Duration::from_millis(100);
const DELAY: Duration = Duration::from_secs(1);

fn dispatcher(timeout: Duration) -> Dispatcher {
    let client = HyperClient::builder()
        .timeout(timeout)
        .with_defaults()
        .build();
    Dispatcher::new(client)
}

fn no_sentinel_headers(request: &Request) -> bool {
    ["connect_timeout", "read_timeout", "write_timeout"]
        .iter()
        .all(|name| !request.headers.contains_key(*name))
}

async fn slow_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(status).set_delay(DELAY))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn form_overrides_shorten_one_call() {
    let server = slow_server(200).await;
    let dispatcher = dispatcher(Duration::from_secs(5));
    let url = format!("{}/slow", server.uri());

    let mut params = ParamStore::new();
    params.put("user", "alice").expect("put");
    params
        .with_encoding(Encoding::Form)
        .set_timeouts(Some(SHORT), Some(SHORT), Some(SHORT));

    let result = dispatcher.post(&url, params).expect("call").execute().await;
    let_assert!(Err(err) = result);
    check!(err.is_timeout());

    // Same client, no override: the client defaults apply again
    let mut params = ParamStore::new();
    params.put("user", "alice").expect("put");
    params.with_encoding(Encoding::Form);

    let response = dispatcher
        .post(&url, params)
        .expect("call")
        .execute()
        .await
        .expect("response");
    check!(response.status() == 200);
}

#[tokio::test]
async fn json_overrides_extend_one_call() {
    let server = slow_server(200).await;
    let dispatcher = dispatcher(SHORT);
    let url = format!("{}/slow", server.uri());

    let mut params = ParamStore::new();
    params.json_params(r#"{"a":1}"#).set_timeouts(
        Some(Duration::from_secs(3)),
        Some(Duration::from_secs(3)),
        Some(Duration::from_secs(3)),
    );

    let response = dispatcher
        .post(&url, params)
        .expect("call")
        .execute()
        .await
        .expect("response");
    check!(response.status() == 200);

    let mut params = ParamStore::new();
    params.json_params(r#"{"a":1}"#);
    let result = dispatcher.put(&url, params).expect("call").execute().await;
    let_assert!(Err(err) = result);
    check!(err.is_timeout());
}

#[tokio::test]
async fn header_channel_overrides_get() {
    let server = slow_server(200).await;
    let dispatcher = dispatcher(SHORT);
    let url = format!("{}/slow", server.uri());

    let mut params = ParamStore::new();
    params.set_timeouts(
        Some(Duration::from_secs(3)),
        Some(Duration::from_secs(3)),
        Some(Duration::from_secs(3)),
    );

    let response = dispatcher
        .get(&url, params)
        .expect("call")
        .execute()
        .await
        .expect("response");
    check!(response.status() == 200);
}

#[tokio::test]
async fn form_metadata_is_stripped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("X-Token", "abc"))
        .and(body_string("user=alice&age=30"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = ParamStore::new();
    params.put("user", "alice").expect("put").put("age", 30).expect("put");
    params
        .with_encoding(Encoding::Form)
        .add_header("X-Token", "abc")
        .read_timeout(Duration::from_millis(5000));

    let response = dispatcher(Duration::from_secs(5))
        .post(&format!("{}/login", server.uri()), params)
        .expect("call")
        .execute()
        .await
        .expect("response");
    check!(response.status() == 200);
}

#[tokio::test]
async fn json_body_and_headers_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/items/1"))
        .and(header("Content-Type", "application/json; charset=utf-8"))
        .and(header("Accept-Language", "fr"))
        .and(body_string(r#"{"a":1}"#))
        .and(no_sentinel_headers)
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = ParamStore::new();
    params
        .json_params(r#"{"a":1}"#)
        .add_header("Accept-Language", "fr")
        .connect_timeout(Duration::from_millis(2000));

    let response = dispatcher(Duration::from_secs(5))
        .put(&format!("{}/items/1", server.uri()), params)
        .expect("call")
        .execute()
        .await
        .expect("response");
    check!(response.status() == 200);
}

#[tokio::test]
async fn header_channel_is_stripped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("Accept", "application/json"))
        .and(no_sentinel_headers)
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = ParamStore::new();
    params.put("q", "rust").expect("put");
    params
        .add_header("Accept", "application/json")
        .read_timeout(Duration::from_millis(750))
        .write_timeout(Duration::from_millis(750));

    let response = dispatcher(Duration::from_secs(5))
        .get(&format!("{}/search", server.uri()), params)
        .expect("call")
        .execute()
        .await
        .expect("response");
    check!(response.status() == 200);
}

#[tokio::test]
async fn malformed_override_keeps_client_default() {
    let server = slow_server(200).await;
    let dispatcher = dispatcher(Duration::from_secs(5));

    // A raw form body bypasses the store, so the sentinel value can be anything
    let response = dispatcher
        .post_raw(
            &format!("{}/slow", server.uri()),
            "user=alice&connect_timeout=abc&read_timeout=-1&write_timeout=0",
            "application/x-www-form-urlencoded",
            [("X-Source", "raw")],
        )
        .expect("call")
        .execute()
        .await
        .expect("response");
    check!(response.status() == 200);

    let requests = server.received_requests().await.expect("recording");
    let_assert!([request] = requests.as_slice());
    check!(request.body == b"user=alice");
}
