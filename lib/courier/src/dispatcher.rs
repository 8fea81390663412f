//! Dispatch boundary: turns parameter stores into calls and runs them.
//!
//! A [`Dispatcher`] builds requests from [`ParamStore`]s and hands out
//! [`Call`]s. A call runs either inline with [`Call::execute`] or in the
//! background with [`Call::enqueue`], which reports to a [`Callback`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use courier::{Dispatcher, Encoding, ParamStore};
//!
//! # async fn run() -> courier::Result<()> {
//! let dispatcher = Dispatcher::with_defaults();
//!
//! let mut params = ParamStore::new();
//! params.put("user", "alice")?;
//! params
//!     .with_encoding(Encoding::Form)
//!     .read_timeout(Duration::from_secs(5));
//!
//! let response = dispatcher
//!     .post("https://api.example.com/login", params)?
//!     .execute()
//!     .await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use courier_core::{
    Body, Error, HttpClient, Method, ParamStore, Request, Response, Result, to_query_string,
};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use crate::HyperClient;
use crate::config::DEFAULT_MAX_REQUESTS;

/// Builds calls against a client.
#[derive(Debug, Clone)]
pub struct Dispatcher<C = HyperClient> {
    client: C,
}

impl Dispatcher<HyperClient> {
    /// A dispatcher over a [`HyperClient`] with the default middleware and at
    /// most [`DEFAULT_MAX_REQUESTS`] requests in flight.
    #[must_use]
    pub fn with_defaults() -> Self {
        let client = HyperClient::builder()
            .with_defaults()
            .max_requests(DEFAULT_MAX_REQUESTS)
            .build();
        Self::new(client)
    }
}

impl Default for Dispatcher<HyperClient> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<C> Dispatcher<C>
where
    C: HttpClient + Clone + 'static,
{
    /// Dispatch through `client`.
    #[must_use]
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Wrap a ready-made request.
    #[must_use]
    pub fn new_call(&self, request: Request) -> Call<C> {
        Call {
            client: self.client.clone(),
            request,
        }
    }

    /// A GET call: values go to the query string, headers and timeout
    /// overrides travel as request headers.
    ///
    /// Files and the raw JSON payload of the store are ignored.
    pub fn get(&self, url: &str, params: ParamStore) -> Result<Call<C>> {
        let mut url = Url::parse(url)?;
        let query = to_query_string(&params.query_pairs())?;
        if !query.is_empty() {
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
                _ => query,
            };
            url.set_query(Some(&query));
        }

        let request = Request::builder(Method::Get, url)
            .headers(params.headers().clone())
            .headers(params.timeout_headers())
            .build();
        Ok(self.new_call(request))
    }

    /// A POST call with the encoded store as body.
    pub fn post(&self, url: &str, params: ParamStore) -> Result<Call<C>> {
        self.encoded(Method::Post, url, params)
    }

    /// A PUT call with the encoded store as body.
    pub fn put(&self, url: &str, params: ParamStore) -> Result<Call<C>> {
        self.encoded(Method::Put, url, params)
    }

    /// A DELETE call with the encoded store as body.
    pub fn delete(&self, url: &str, params: ParamStore) -> Result<Call<C>> {
        self.encoded(Method::Delete, url, params)
    }

    /// A POST call with a caller-provided body.
    pub fn post_raw<K, V>(
        &self,
        url: &str,
        body: impl Into<Bytes>,
        content_type: &str,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Call<C>>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.raw(Method::Post, url, body.into(), content_type, headers)
    }

    /// A PUT call with a caller-provided body.
    pub fn put_raw<K, V>(
        &self,
        url: &str,
        body: impl Into<Bytes>,
        content_type: &str,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Call<C>>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.raw(Method::Put, url, body.into(), content_type, headers)
    }

    /// A DELETE call with a caller-provided body.
    pub fn delete_raw<K, V>(
        &self,
        url: &str,
        body: impl Into<Bytes>,
        content_type: &str,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Call<C>>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.raw(Method::Delete, url, body.into(), content_type, headers)
    }

    fn encoded(&self, method: Method, url: &str, params: ParamStore) -> Result<Call<C>> {
        let mut builder = Request::builder(method, Url::parse(url)?);

        // Multipart bodies have no slot for metadata
        if !params.files().is_empty() {
            builder = builder
                .headers(params.headers().clone())
                .headers(params.timeout_headers());
        }

        let body = params.encode()?;
        debug!(%method, content_type = body.content_type(), "encoded parameters");
        Ok(self.new_call(builder.body(body).build()))
    }

    fn raw<K, V>(
        &self,
        method: Method,
        url: &str,
        body: Bytes,
        content_type: &str,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Call<C>>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let request = Request::builder(method, Url::parse(url)?)
            .headers(headers)
            .body(Body::raw(Some(content_type), body))
            .build();
        Ok(self.new_call(request))
    }
}

/// One request bound to a client, run once.
#[derive(Debug)]
pub struct Call<C> {
    client: C,
    request: Request,
}

impl<C> Call<C>
where
    C: HttpClient + 'static,
{
    /// The request this call sends.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Send the request and wait for the response.
    ///
    /// Non-2xx responses are returned as responses.
    pub async fn execute(self) -> Result<Response> {
        self.client.execute(self.request).await
    }

    /// Run the call on the tokio runtime and report to `callback`.
    ///
    /// Non-2xx responses are reported as [`Error::Http`]; a 2xx body is
    /// decoded as JSON, an empty one as `None`. Aborting the returned handle
    /// cancels the call and drops the callback unnotified.
    pub fn enqueue<T, CB>(self, callback: CB) -> JoinHandle<()>
    where
        T: DeserializeOwned + Send + 'static,
        CB: Callback<T>,
    {
        tokio::spawn(async move {
            let outcome = self
                .execute()
                .await
                .and_then(Response::error_for_status)
                .and_then(Response::json_opt::<T>);

            match outcome {
                Ok(value) => callback.on_success(value),
                Err(err) => {
                    debug!(error = %err, "enqueued call failed");
                    callback.on_failure(err);
                }
            }
        })
    }
}

/// Receives the outcome of an enqueued [`Call`].
///
/// Any `FnOnce(Result<Option<T>>)` closure is a callback.
pub trait Callback<T>: Send + 'static {
    /// The call completed with a 2xx status.
    fn on_success(self, value: Option<T>);

    /// The call failed, or completed with a non-2xx status.
    fn on_failure(self, error: Error);
}

impl<T, F> Callback<T> for F
where
    F: FnOnce(Result<Option<T>>) + Send + 'static,
{
    fn on_success(self, value: Option<T>) {
        self(Ok(value));
    }

    fn on_failure(self, error: Error) {
        self(Err(error));
    }
}
