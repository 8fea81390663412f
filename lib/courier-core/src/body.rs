//! Request bodies and serialization utilities.

use bytes::{BufMut, Bytes};
use derive_more::From;

use crate::{Result, TimeoutCarrier};

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json; charset=utf-8`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded; charset=UTF-8`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json; charset=utf-8",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded; charset=UTF-8",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }

    /// Returns `true` if the given header value denotes this media type,
    /// ignoring parameters and case.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        fn essence(value: &str) -> &str {
            value.split(';').next().unwrap_or_default().trim()
        }
        essence(value).eq_ignore_ascii_case(essence(self.as_str()))
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque bytes with an optional content type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBody {
    content_type: Option<String>,
    data: Bytes,
}

impl RawBody {
    /// Create a raw body.
    #[must_use]
    pub fn new(content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            data: data.into(),
        }
    }

    /// Create a JSON body from already serialized bytes.
    #[must_use]
    pub fn json(data: impl Into<Bytes>) -> Self {
        Self::new(Some(ContentType::Json.as_str().to_string()), data)
    }

    /// The content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The body bytes.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the body has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the body, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// An ordered list of form fields, URL-encoded on the wire.
///
/// Field order is preserved and names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
    fields: Vec<(String, String)>,
}

impl FormBody {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style.
    #[must_use]
    pub fn add(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a field.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the form has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Name of the field at `index`.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(name, _)| name.as_str())
    }

    /// Value of the field at `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(_, value)| value.as_str())
    }

    /// Iterate over the fields in order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Consume the form, returning its fields.
    #[must_use]
    pub fn into_fields(self) -> Vec<(String, String)> {
        self.fields
    }

    /// Parse URL-encoded bytes into a form.
    #[must_use]
    pub fn parse(data: &[u8]) -> Self {
        url::form_urlencoded::parse(data).into_owned().collect()
    }

    /// Encode the form.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.fields)
            .finish();
        Bytes::from(encoded)
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for FormBody {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// A request body.
///
/// The variants are the shapes the timeout interceptor knows how to read
/// metadata from. Bodies are not `Clone`: a body is owned by exactly one
/// request as it moves through the chain.
#[derive(Debug, From)]
pub enum Body {
    /// A body carrying timeout and header metadata out of band.
    Timeout(TimeoutCarrier),
    /// A URL-encoded form; may contain sentinel fields.
    Form(FormBody),
    /// Any other body.
    Other(RawBody),
}

impl Body {
    /// Serialize a value into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        to_json(value).map(|data| Self::Other(RawBody::json(data)))
    }

    /// Create a body from bytes and a content type.
    ///
    /// URL-encoded content is parsed into [`Body::Form`].
    #[must_use]
    pub fn raw(content_type: Option<&str>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        match content_type {
            Some(value) if ContentType::FormUrlEncoded.matches(value) => {
                Self::Form(FormBody::parse(&data))
            }
            _ => Self::Other(RawBody::new(content_type.map(str::to_string), data)),
        }
    }

    /// The content type sent with this body.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Timeout(carrier) => carrier.content_type(),
            Self::Form(_) => Some(ContentType::FormUrlEncoded.as_str()),
            Self::Other(raw) => raw.content_type(),
        }
    }

    /// Length of the encoded body in bytes.
    #[must_use]
    pub fn content_length(&self) -> usize {
        match self {
            Self::Timeout(carrier) => carrier.content_length(),
            Self::Form(form) => form.to_bytes().len(),
            Self::Other(raw) => raw.len(),
        }
    }

    /// The encoded body.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Timeout(carrier) => carrier.bytes().clone(),
            Self::Form(form) => form.to_bytes(),
            Self::Other(raw) => raw.data().clone(),
        }
    }

    /// Write the encoded body to a buffer.
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        match self {
            Self::Timeout(carrier) => carrier.write_to(buf),
            Self::Form(form) => buf.put_slice(&form.to_bytes()),
            Self::Other(raw) => buf.put_slice(raw.data()),
        }
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use courier_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// # Errors
///
/// Returns an error if form serialization fails.
///
/// # Example
///
/// ```
/// use courier_core::to_form;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Login { username: String, password: String }
///
/// let login = Login { username: "alice".to_string(), password: "secret".to_string() };
/// let bytes = to_form(&login).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"username=alice&password=secret");
/// ```
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_urlencoded::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Serialize a value to a query string.
///
/// Uses `serde_html_form` which supports `Vec<T>` for repeated query parameters
/// (e.g., `?tags=a&tags=b&tags=c`).
///
/// # Errors
///
/// Returns an error if query serialization fails.
pub fn to_query_string<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_html_form::to_string(value).map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "user.address.city").
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timeouts;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json; charset=utf-8");
        assert_eq!(
            ContentType::FormUrlEncoded.as_str(),
            "application/x-www-form-urlencoded; charset=UTF-8"
        );
        assert_eq!(ContentType::PlainText.to_string(), "text/plain");
    }

    #[test]
    fn content_type_matches_essence() {
        assert!(ContentType::FormUrlEncoded.matches("application/x-www-form-urlencoded"));
        assert!(ContentType::FormUrlEncoded.matches("Application/X-WWW-Form-Urlencoded; charset=utf-8"));
        assert!(ContentType::Json.matches("application/json"));
        assert!(!ContentType::Json.matches("application/jsonl"));
    }

    #[test]
    fn form_body_keeps_order_and_duplicates() {
        let form = FormBody::new().add("b", "2").add("a", "1").add("b", "3");

        assert_eq!(form.len(), 3);
        assert_eq!(form.name(0), Some("b"));
        assert_eq!(form.value(2), Some("3"));
        assert_eq!(form.name(3), None);
        assert_eq!(form.to_bytes().as_ref(), b"b=2&a=1&b=3");
    }

    #[test]
    fn form_body_escapes() {
        let form = FormBody::new().add("q", "a b&c=d").add("é", "ü");
        let encoded = form.to_bytes();
        assert_eq!(encoded.as_ref(), b"q=a+b%26c%3Dd&%C3%A9=%C3%BC");
        assert_eq!(FormBody::parse(&encoded), form);
    }

    #[test]
    fn raw_form_content_is_parsed() {
        let body = Body::raw(
            Some("application/x-www-form-urlencoded"),
            "user=alice&read_timeout=100",
        );
        let Body::Form(form) = body else {
            panic!("expected a form body");
        };
        assert_eq!(form.len(), 2);
        assert_eq!(form.name(1), Some("read_timeout"));

        let body = Body::raw(Some("text/plain"), "hello");
        assert!(matches!(body, Body::Other(_)));
        assert_eq!(body.content_type(), Some("text/plain"));
    }

    #[test]
    fn body_delegates_to_variant() {
        let carrier = TimeoutCarrier::new(RawBody::json(r#"{"a":1}"#))
            .with_timeouts(Timeouts::default());
        let body = Body::from(carrier);
        assert_eq!(body.content_type(), Some("application/json; charset=utf-8"));
        assert_eq!(body.content_length(), 7);
        assert_eq!(body.to_bytes().as_ref(), br#"{"a":1}"#);

        let body = Body::from(FormBody::new().add("a", "1"));
        assert_eq!(
            body.content_type(),
            Some("application/x-www-form-urlencoded; charset=UTF-8")
        );
        let mut buf = Vec::new();
        body.write_to(&mut buf);
        assert_eq!(buf, b"a=1");
        assert_eq!(body.content_length(), 3);
    }

    #[test]
    fn json_body() {
        let body = Body::json(&serde_json::json!({ "name": "Alice" })).expect("serialize");
        assert_eq!(body.to_bytes().as_ref(), br#"{"name":"Alice"}"#);
        assert_eq!(body.content_type(), Some("application/json; charset=utf-8"));
    }

    #[test]
    fn to_form_serialize() {
        #[derive(serde::Serialize)]
        struct Login {
            username: String,
            password: String,
        }

        let login = Login {
            username: "alice".to_string(),
            password: "s3cret&more".to_string(),
        };

        let bytes = to_form(&login).expect("serialize");
        assert_eq!(bytes.as_ref(), b"username=alice&password=s3cret%26more");
    }

    #[test]
    fn to_query_string_with_option() {
        #[derive(serde::Serialize)]
        struct Search {
            q: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            page: Option<u32>,
        }

        let search = Search {
            q: "rust".to_string(),
            page: Some(1),
        };
        assert_eq!(to_query_string(&search).expect("serialize"), "q=rust&page=1");

        let search = Search {
            q: "rust".to_string(),
            page: None,
        };
        assert_eq!(to_query_string(&search).expect("serialize"), "q=rust");
    }

    #[test]
    fn to_query_string_with_repeated_pairs() {
        let pairs = vec![
            ("tag".to_string(), "a b".to_string()),
            ("tag".to_string(), "c&d".to_string()),
            ("page".to_string(), "2".to_string()),
        ];
        assert_eq!(
            to_query_string(&pairs).expect("serialize"),
            "tag=a+b&tag=c%26d&page=2"
        );
    }

    #[test]
    fn from_json_missing_field_error_with_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let result: Result<User> = from_json(br#"{"address":{}}"#);
        let msg = result.expect_err("should fail").to_string();
        assert!(msg.contains("address"), "Expected path 'address' in error: {msg}");
        assert!(msg.contains("city"), "Expected field 'city' in error: {msg}");
    }
}
