//! Reserved names used to carry timeout and header metadata in-band.
//!
//! Form bodies have no slot for out-of-band data, so the encoder appends three
//! timeout fields and one `header_<name>` field per header, and the timeout
//! interceptor strips them again before the request reaches the transport.
//! Bodyless requests use request headers with the same timeout names.
//!
//! A caller field that happens to use one of these names cannot be told apart
//! from metadata: it is consumed by the interceptor and never sent.

use std::time::Duration;

use serde_json::Value;

/// Field (or header) carrying the connect timeout in milliseconds.
pub const CONNECT_TIMEOUT: &str = "connect_timeout";

/// Field (or header) carrying the read timeout in milliseconds.
pub const READ_TIMEOUT: &str = "read_timeout";

/// Field (or header) carrying the write timeout in milliseconds.
pub const WRITE_TIMEOUT: &str = "write_timeout";

/// Prefix of form fields carrying a header; the rest of the name is the header name.
pub const HEADER_PREFIX: &str = "header_";

/// Wire value meaning "no override".
pub const NO_OVERRIDE: &str = "0";

/// Classification of a reserved field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel<'a> {
    /// [`CONNECT_TIMEOUT`]
    ConnectTimeout,
    /// [`READ_TIMEOUT`]
    ReadTimeout,
    /// [`WRITE_TIMEOUT`]
    WriteTimeout,
    /// A [`HEADER_PREFIX`] field, holding the header name.
    Header(&'a str),
}

impl<'a> Sentinel<'a> {
    /// Classify a field name, returning `None` for ordinary fields.
    #[must_use]
    pub fn classify(name: &'a str) -> Option<Self> {
        match name {
            CONNECT_TIMEOUT => Some(Self::ConnectTimeout),
            READ_TIMEOUT => Some(Self::ReadTimeout),
            WRITE_TIMEOUT => Some(Self::WriteTimeout),
            _ => name.strip_prefix(HEADER_PREFIX).map(Self::Header),
        }
    }
}

/// Returns `true` if the name is reserved for metadata.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    Sentinel::classify(name).is_some()
}

/// Field name carrying the given header.
#[must_use]
pub fn header_field(header: &str) -> String {
    format!("{HEADER_PREFIX}{header}")
}

/// Outcome of parsing a timeout override value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOverride {
    /// No override: `"0"`.
    Unset,
    /// A positive override.
    Value(Duration),
    /// Not a non-negative decimal integer.
    Malformed,
}

impl TimeoutOverride {
    /// Parse a decimal millisecond value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<u64>() {
            Ok(0) => Self::Unset,
            Ok(millis) => Self::Value(Duration::from_millis(millis)),
            Err(_) => Self::Malformed,
        }
    }

    /// The override, or `current` when unset or malformed.
    #[must_use]
    pub fn or(self, current: Duration) -> Duration {
        match self {
            Self::Value(timeout) => timeout,
            Self::Unset | Self::Malformed => current,
        }
    }
}

/// Render an optional timeout as decimal milliseconds, unset as [`NO_OVERRIDE`].
#[must_use]
pub fn format_millis(timeout: Option<Duration>) -> String {
    timeout.map_or_else(
        || NO_OVERRIDE.to_string(),
        |timeout| {
            // Saturating conversion to u64
            u64::try_from(timeout.as_millis())
                .unwrap_or(u64::MAX)
                .to_string()
        },
    )
}

/// Canonical string form of a scalar parameter.
///
/// Strings are kept verbatim, numbers are rendered in decimal, booleans as
/// `true`/`false`. `null` (and structured values) have no string form.
#[must_use]
pub fn canonical_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
