//! Error types for courier.
//!
//! Errors fall in three groups:
//! - encoding errors ([`Error::InvalidValue`], [`Error::NotFound`], [`Error::FieldConflict`])
//!   are raised by [`crate::ParamStore`] before any network activity,
//! - transport errors ([`Error::Connection`], [`Error::Tls`], [`Error::Timeout`]) are passed
//!   through to the caller unchanged,
//! - malformed timeout overrides are never errors: the chain keeps its current timeout.

use derive_more::{Display, Error, From};

/// Main error type for courier operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// A structured value (array or object) was stored where a scalar is required.
    #[display("invalid value: {_0}")]
    #[from(skip)]
    InvalidValue(#[error(not(source))] String),

    /// A file attachment does not reference an existing regular file.
    #[display("file not found: {path}")]
    #[from(skip)]
    NotFound {
        /// The path that was looked up.
        path: String,
    },

    /// The same field name is used by both a value and a file.
    #[display("field '{name}' is already used by another parameter")]
    #[from(skip)]
    FieldConflict {
        /// The colliding field name.
        name: String,
    },

    /// I/O error while reading an attachment.
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),

    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// The scoped timeout of a call elapsed.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_urlencoded::ser::Error),

    /// Query string serialization error.
    #[display("query serialization error: {_0}")]
    #[from]
    QuerySerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid value error.
    #[must_use]
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    /// Create a not found error for the given path.
    #[must_use]
    pub fn not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::NotFound {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Create a field conflict error.
    #[must_use]
    pub fn field_conflict(name: impl Into<String>) -> Self {
        Self::FieldConflict { name: name.into() }
    }

    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if the error was raised while encoding parameters,
    /// before anything was sent.
    #[must_use]
    pub const fn is_encoding(&self) -> bool {
        matches!(
            self,
            Self::InvalidValue(_)
                | Self::NotFound { .. }
                | Self::FieldConflict { .. }
                | Self::JsonSerialization(_)
                | Self::FormSerialization(_)
                | Self::QuerySerialization(_)
        )
    }

    /// Returns `true` if the underlying transport failed.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Tls(_) | Self::Timeout)
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not an HTTP error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::invalid_value("'tags' is an array");
        assert_eq!(err.to_string(), "invalid value: 'tags' is an array");

        let err = Error::not_found("/no/such/file");
        assert_eq!(err.to_string(), "file not found: /no/such/file");

        let err = Error::field_conflict("avatar");
        assert_eq!(
            err.to_string(),
            "field 'avatar' is already used by another parameter"
        );

        let err = Error::Timeout;
        assert_eq!(err.to_string(), "request timeout");

        let err = Error::http(404, "Not Found");
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
    }

    #[test]
    fn error_groups() {
        assert!(Error::invalid_value("x").is_encoding());
        assert!(Error::not_found("x").is_encoding());
        assert!(Error::field_conflict("x").is_encoding());
        assert!(!Error::Timeout.is_encoding());

        assert!(Error::Timeout.is_transport());
        assert!(Error::connection("refused").is_transport());
        assert!(Error::tls("bad certificate").is_transport());
        assert!(!Error::http(500, "boom").is_transport());
    }

    #[test]
    fn error_status_and_body() {
        let err = Error::http(404, "Not Found");
        assert_eq!(err.status(), Some(404));
        assert!(err.body().is_none());
        assert_eq!(Error::Timeout.status(), None);

        let body = bytes::Bytes::from(r#"{"error": "not found"}"#);
        let err = Error::http_with_body(404, "Not Found", body.clone());
        assert_eq!(err.body(), Some(&body));
    }

    #[test]
    fn error_decode_body() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct ApiError {
            error: String,
        }

        let body = bytes::Bytes::from(r#"{"error": "not found"}"#);
        let err = Error::http_with_body(404, "Not Found", body);

        let decoded = err
            .decode_body::<ApiError>()
            .expect("should have body")
            .expect("should decode");
        assert_eq!(
            decoded,
            ApiError {
                error: "not found".to_string()
            }
        );

        assert!(Error::Timeout.decode_body::<ApiError>().is_none());
    }

    #[test]
    fn io_error_converts() {
        let err: Error = std::io::Error::other("disk").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
