//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers, query parameters, and bodies.
//!
//! # Example
//!
//! ```
//! use courier_core::{Method, Request};
//!
//! let request = Request::builder(Method::Get, "https://api.example.com".parse()?)
//!     .header("Accept", "application/json")
//!     .query("page", "1")
//!     .build();
//! assert_eq!(request.url().as_str(), "https://api.example.com/?page=1");
//! # Ok::<(), url::ParseError>(())
//! ```

use std::collections::HashMap;

use crate::{Body, ContentType, Method};

/// An HTTP request.
///
/// Headers are single-valued. Names keep the case they were added with;
/// lookups, inserts and removals ignore case, so a name never appears twice.
/// Requests are not `Clone` because their body has a single owner.
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<Body>,
}

impl Request {
    /// Create a new request builder.
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// Get the HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Get the URL.
    #[must_use]
    pub const fn url(&self) -> &url::Url {
        &self.url
    }

    /// Get the headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Get mutable access to the headers.
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Get a header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a header, replacing any header with the same name in any case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        insert_header(&mut self.headers, name.into(), value.into());
    }

    /// Remove a header by name, ignoring case.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let key = self
            .headers
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()?;
        self.headers.remove(&key)
    }

    /// Get the body.
    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Get mutable access to the body.
    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.body.as_mut()
    }

    /// Take the body, leaving the request bodyless.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// Consume the request and return its parts.
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HashMap<String, String>, Option<Body>) {
        (self.method, self.url, self.headers, self.body)
    }

    /// Turn the request back into a builder.
    #[must_use]
    pub fn into_builder(self) -> RequestBuilder {
        RequestBuilder {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

fn insert_header(headers: &mut HashMap<String, String>, name: String, value: String) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

/// Builder for HTTP requests.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<Body>,
}

impl RequestBuilder {
    /// Create a new request builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Add a header, replacing any header with the same name in any case.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Add multiple headers; later names replace earlier ones in any case.
    #[must_use]
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            insert_header(&mut self.headers, name.into(), value.into());
        }
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Add multiple query parameters.
    #[must_use]
    pub fn query_pairs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut pairs = pairs.into_iter().peekable();
        if pairs.peek().is_some() {
            self.url.query_pairs_mut().extend_pairs(pairs);
        }
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn json<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        Body::json(value).map(|body| self.body(body))
    }

    /// Set a form URL-encoded body.
    ///
    /// # Errors
    ///
    /// Returns an error if form serialization fails.
    pub fn form<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let data = crate::to_form(value)?;
        Ok(self.body(Body::raw(Some(ContentType::FormUrlEncoded.as_str()), data)))
    }

    /// Build the request.
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormBody, RawBody};

    fn url(path: &str) -> url::Url {
        url::Url::parse("https://api.example.com")
            .and_then(|base| base.join(path))
            .expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::builder(Method::Get, url("/users"))
            .header("Accept", "application/json")
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "https://api.example.com/users");
        assert_eq!(request.header("accept"), Some("application/json"));
        assert!(request.body().is_none());
    }

    #[test]
    fn request_builder_with_query() {
        let request = Request::builder(Method::Get, url("/users"))
            .query("page", "1")
            .query_pairs([("limit", "10"), ("q", "a b")])
            .build();

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/users?page=1&limit=10&q=a+b"
        );

        let request = Request::builder(Method::Get, url("/users"))
            .query_pairs(Vec::<(String, String)>::new())
            .build();
        assert_eq!(request.url().as_str(), "https://api.example.com/users");
    }

    #[test]
    fn headers_ignore_case() {
        let mut request = Request::builder(Method::Get, url("/"))
            .header("Read_Timeout", "100")
            .build();

        request.set_header("read_timeout", "200");
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("READ_TIMEOUT"), Some("200"));

        assert_eq!(request.remove_header("Read_timeout"), Some("200".to_string()));
        assert!(request.headers().is_empty());
        assert_eq!(request.remove_header("read_timeout"), None);
    }

    #[test]
    fn builder_headers_ignore_case() {
        let request = Request::builder(Method::Get, url("/"))
            .header("Accept", "text/plain")
            .headers([("Read_Timeout", "100"), ("accept", "application/json")])
            .headers([("read_timeout", "250")])
            .build();

        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.header("Read_Timeout"), Some("250"));
        assert_eq!(request.header("ACCEPT"), Some("application/json"));
    }

    #[test]
    fn body_can_be_taken_and_replaced() {
        let mut request = Request::builder(Method::Post, url("/users"))
            .body(RawBody::new(Some("text/plain".to_string()), "hello"))
            .build();

        let body = request.take_body().expect("body");
        assert_eq!(body.to_bytes().as_ref(), b"hello");
        assert!(request.body().is_none());

        request.set_body(FormBody::new().add("a", "1"));
        assert!(matches!(request.body(), Some(Body::Form(_))));
    }

    #[test]
    fn request_builder_form() {
        #[derive(serde::Serialize)]
        struct Login {
            username: String,
        }

        let request = Request::builder(Method::Post, url("/login"))
            .form(&Login {
                username: "alice".to_string(),
            })
            .expect("form")
            .build();

        let Some(Body::Form(form)) = request.body() else {
            panic!("expected a form body");
        };
        assert_eq!(form.name(0), Some("username"));
        assert_eq!(form.value(0), Some("alice"));
    }

    #[test]
    fn request_builder_json() {
        let request = Request::builder(Method::Post, url("/users"))
            .json(&serde_json::json!({ "name": "test" }))
            .expect("json")
            .build();

        let body = request.body().expect("body");
        assert_eq!(body.content_type(), Some("application/json; charset=utf-8"));
        assert_eq!(body.to_bytes().as_ref(), br#"{"name":"test"}"#);
    }

    #[test]
    fn into_builder_keeps_everything() {
        let request = Request::builder(Method::Put, url("/users/1"))
            .header("X-Token", "abc")
            .body(FormBody::new().add("a", "1"))
            .build();

        let rebuilt = request.into_builder().header("X-Other", "1").build();
        let (method, url, headers, body) = rebuilt.into_parts();
        assert_eq!(method, Method::Put);
        assert_eq!(url.path(), "/users/1");
        assert_eq!(headers.len(), 2);
        assert!(matches!(body, Some(Body::Form(_))));
    }
}
