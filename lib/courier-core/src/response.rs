//! HTTP response handling.

use std::collections::HashMap;

use bytes::Bytes;

use crate::{Error, Result};

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl Response {
    /// Create a new response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Get the status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Get the headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Get a header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The `Content-Type` header, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response and return its body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Consume the response and return its parts.
    #[must_use]
    pub fn into_parts(self) -> (u16, HashMap<String, String>, Bytes) {
        (self.status, self.headers, self.body)
    }

    /// Returns `true` for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns `true` for a 4xx status.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Returns `true` for a 5xx status.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Turn a non-2xx response into [`Error::Http`], keeping the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the status is not 2xx.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("unexpected status");
        Err(Error::http_with_body(self.status, message, self.body))
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        crate::from_json(&self.body)
    }

    /// Deserialize the body as JSON, an empty body gives `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-empty body fails to deserialize.
    pub fn json_opt<T: serde::de::DeserializeOwned>(self) -> Result<Option<T>> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        crate::from_json(&self.body).map(Some)
    }

    /// Get the body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(self) -> std::result::Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct User {
        id: u64,
        name: String,
    }

    #[test]
    fn response_basic() {
        let headers = HashMap::from([("Content-Type".to_string(), "application/json".to_string())]);
        let response = Response::new(200, headers, r#"{"id":1}"#);

        assert_eq!(response.status(), 200);
        assert_eq!(response.content_type(), Some("application/json"));
        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
    }

    #[test]
    fn error_for_status_keeps_body() {
        let response = Response::new(404, HashMap::new(), r#"{"error":"missing"}"#);
        let err = response.error_for_status().expect_err("404");

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert_eq!(
            err.body().map(Bytes::as_ref),
            Some(br#"{"error":"missing"}"#.as_slice())
        );

        let response = Response::new(204, HashMap::new(), Bytes::new());
        assert!(response.error_for_status().is_ok());
    }

    #[test]
    fn response_json() {
        let response = Response::new(200, HashMap::new(), r#"{"id":1,"name":"test"}"#);
        let user: User = response.json().expect("deserialize");
        assert_eq!(
            user,
            User {
                id: 1,
                name: "test".to_string()
            }
        );
    }

    #[test]
    fn json_opt_empty_body() {
        let response = Response::new(200, HashMap::new(), " \n");
        let user: Option<User> = response.json_opt().expect("empty");
        assert!(user.is_none());

        let response = Response::new(200, HashMap::new(), r#"{"id":2,"name":"b"}"#);
        let user: Option<User> = response.json_opt().expect("user");
        assert_eq!(user.map(|it| it.id), Some(2));

        let response = Response::new(200, HashMap::new(), "oops");
        assert!(response.json_opt::<User>().is_err());
    }

    #[test]
    fn response_text() {
        let response = Response::new(200, HashMap::new(), "Hello, World!");
        assert_eq!(response.text().expect("text"), "Hello, World!");
    }
}
