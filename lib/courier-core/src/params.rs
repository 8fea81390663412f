//! Parameter accumulation and body encoding.
//!
//! A [`ParamStore`] collects everything a caller wants to send with one
//! request, then [`ParamStore::encode`] turns it into a [`Body`]:
//!
//! | State                      | Body                                       |
//! |----------------------------|--------------------------------------------|
//! | any file attached          | multipart ([`Body::Other`])                |
//! | [`Encoding::Json`]         | JSON wrapped in a [`TimeoutCarrier`]       |
//! | [`Encoding::Form`]         | [`Body::Form`] with sentinel fields        |
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use courier_core::{Body, Encoding, ParamStore};
//!
//! let mut params = ParamStore::new();
//! params.put("user", "alice")?.put("age", 30)?;
//! params
//!     .with_encoding(Encoding::Form)
//!     .read_timeout(Duration::from_millis(5000));
//!
//! let body = params.encode()?;
//! assert_eq!(
//!     body.to_bytes().as_ref(),
//!     b"user=alice&age=30&connect_timeout=0&read_timeout=5000&write_timeout=0"
//! );
//! # Ok::<(), courier_core::Error>(())
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::Value;

use crate::multipart::{Form, Part};
use crate::sentinel::{self, CONNECT_TIMEOUT, READ_TIMEOUT, WRITE_TIMEOUT};
use crate::{Body, Error, FileAttachment, FormBody, Result, TimeoutCarrier, Timeouts, to_json};

/// How values are encoded when no file is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// A single JSON object, carried by a [`TimeoutCarrier`].
    #[default]
    Json,
    /// URL-encoded form fields.
    Form,
}

/// Accumulates the parameters of one request.
///
/// A name is used at most once across values and files. Values must be
/// scalars: strings, numbers, booleans or `null`.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    params: IndexMap<String, Value>,
    files: IndexMap<String, FileAttachment>,
    headers: IndexMap<String, String>,
    raw_body: Option<String>,
    encoding: Encoding,
    timeouts: Timeouts,
}

impl ParamStore {
    /// Create an empty store using JSON encoding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a scalar value; a previous value with the same name is replaced in place.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if `value` is an array or an object.
    /// - [`Error::FieldConflict`] if a file is attached under `name`.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        let name = name.into();
        let value = value.into();
        if value.is_array() || value.is_object() {
            return Err(Error::invalid_value(format!(
                "'{name}' must be a scalar, structured values go through json_params"
            )));
        }
        if self.files.contains_key(&name) {
            return Err(Error::field_conflict(name));
        }
        self.params.insert(name, value);
        Ok(self)
    }

    /// Store every pair of `values`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Same as [`ParamStore::put`].
    pub fn extend<K, V, I>(&mut self, values: I) -> Result<&mut Self>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in values {
            self.put(name, value)?;
        }
        Ok(self)
    }

    /// Attach a file.
    ///
    /// See [`FileAttachment::new`] for the defaults of `content_type` and
    /// `display_name`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `path` is not an existing regular file.
    /// - [`Error::FieldConflict`] if a value is stored under `name`.
    pub fn put_file(
        &mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        content_type: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<&mut Self> {
        let attachment = FileAttachment::new(path, content_type, display_name)?;
        self.attach(name, attachment)
    }

    /// Attach an already validated file; a previous file with the same name is replaced.
    ///
    /// # Errors
    ///
    /// [`Error::FieldConflict`] if a value is stored under `name`.
    pub fn attach(&mut self, name: impl Into<String>, file: FileAttachment) -> Result<&mut Self> {
        let name = name.into();
        if self.params.contains_key(&name) {
            return Err(Error::field_conflict(name));
        }
        self.files.insert(name, file);
        Ok(self)
    }

    /// Add or replace a header.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set a pre-serialized JSON payload, sent instead of the stored values in
    /// JSON mode. An empty payload counts as unset.
    pub fn json_params(&mut self, raw: impl Into<String>) -> &mut Self {
        self.raw_body = Some(raw.into());
        self
    }

    /// Select the encoding used when no file is attached.
    pub fn with_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    /// Set the timeout overrides; `None` (or zero) inherits the chain's timeout.
    pub fn set_timeouts(
        &mut self,
        connect: Option<Duration>,
        read: Option<Duration>,
        write: Option<Duration>,
    ) -> &mut Self {
        self.timeouts = Timeouts::new(connect, read, write);
        self
    }

    /// Override the connect timeout.
    pub fn connect_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeouts = self.timeouts.with_connect(timeout);
        self
    }

    /// Override the read timeout.
    pub fn read_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeouts = self.timeouts.with_read(timeout);
        self
    }

    /// Override the write timeout.
    pub fn write_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeouts = self.timeouts.with_write(timeout);
        self
    }

    /// Remove the value or file stored under `name`.
    ///
    /// Returns `true` if something was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let value = self.params.shift_remove(name).is_some();
        let file = self.files.shift_remove(name).is_some();
        value || file
    }

    /// Returns `true` if a value or file is stored under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name) || self.files.contains_key(name)
    }

    /// Remove every stored value, keeping files, headers and timeouts.
    pub fn clear_params(&mut self) -> &mut Self {
        self.params.clear();
        self
    }

    /// The stored values, in insertion order.
    #[must_use]
    pub const fn params(&self) -> &IndexMap<String, Value> {
        &self.params
    }

    /// The attached files, in insertion order.
    #[must_use]
    pub const fn files(&self) -> &IndexMap<String, FileAttachment> {
        &self.files
    }

    /// The headers, in insertion order.
    #[must_use]
    pub const fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// The pre-serialized JSON payload, if set and non-empty.
    #[must_use]
    pub fn raw_body(&self) -> Option<&str> {
        self.raw_body.as_deref().filter(|raw| !raw.is_empty())
    }

    /// The selected encoding.
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The timeout overrides.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// The stored values as query pairs; `null` values are skipped.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.scalar_fields()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// The timeout overrides as header-channel pairs; unset overrides are skipped.
    #[must_use]
    pub fn timeout_headers(&self) -> Vec<(&'static str, String)> {
        [
            (CONNECT_TIMEOUT, self.timeouts.connect()),
            (READ_TIMEOUT, self.timeouts.read()),
            (WRITE_TIMEOUT, self.timeouts.write()),
        ]
        .into_iter()
        .filter_map(|(name, timeout)| {
            timeout.map(|timeout| (name, sentinel::format_millis(Some(timeout))))
        })
        .collect()
    }

    /// Encode the store into a body, consuming it.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if an attached file vanished since it was attached.
    /// - [`Error::Io`] if an attached file cannot be read.
    /// - [`Error::JsonSerialization`] if the values cannot be serialized.
    pub fn encode(self) -> Result<Body> {
        self.encode_ref()
    }

    /// Encode the store into a body without consuming it.
    ///
    /// Encoding the same state twice yields the same bytes, except for the
    /// boundary of multipart bodies.
    ///
    /// # Errors
    ///
    /// Same as [`ParamStore::encode`].
    pub fn encode_ref(&self) -> Result<Body> {
        if !self.files.is_empty() {
            return self.multipart().map(Body::Other);
        }
        match self.encoding {
            Encoding::Json => self.json().map(Body::Timeout),
            Encoding::Form => Ok(Body::Form(self.form())),
        }
    }

    fn scalar_fields(&self) -> impl Iterator<Item = (&str, String)> {
        self.params.iter().filter_map(|(name, value)| {
            sentinel::canonical_string(value).map(|text| (name.as_str(), text))
        })
    }

    fn json(&self) -> Result<TimeoutCarrier> {
        let data = match self.raw_body() {
            Some(raw) => Bytes::copy_from_slice(raw.as_bytes()),
            None => to_json(&self.params)?,
        };
        let mut carrier = TimeoutCarrier::json(data).with_timeouts(self.timeouts);
        if !self.headers.is_empty() {
            carrier = carrier.with_headers(self.headers.clone());
        }
        Ok(carrier)
    }

    fn form(&self) -> FormBody {
        let mut form = FormBody::new();
        for (name, value) in self.scalar_fields() {
            if sentinel::is_reserved(name) {
                tracing::warn!(
                    field = name,
                    "form field uses a reserved name and will be consumed as request metadata"
                );
            }
            form.push(name, value);
        }
        form.push(CONNECT_TIMEOUT, sentinel::format_millis(self.timeouts.connect()));
        form.push(READ_TIMEOUT, sentinel::format_millis(self.timeouts.read()));
        form.push(WRITE_TIMEOUT, sentinel::format_millis(self.timeouts.write()));
        for (name, value) in &self.headers {
            form.push(sentinel::header_field(name), value.as_str());
        }
        form
    }

    fn multipart(&self) -> Result<crate::RawBody> {
        let mut form = Form::new();
        for (name, value) in self.scalar_fields() {
            form = form.part(Part::text(name, value));
        }
        for (name, file) in &self.files {
            form = form.part(file.to_part(name.as_str())?);
        }
        Ok(form.into_raw_body())
    }
}

impl fmt::Display for ParamStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding={:?}", self.encoding)?;
        if let Some(raw) = self.raw_body() {
            write!(f, "&json_params={raw}")?;
        }
        write!(
            f,
            "&{CONNECT_TIMEOUT}={}&{READ_TIMEOUT}={}&{WRITE_TIMEOUT}={}",
            sentinel::format_millis(self.timeouts.connect()),
            sentinel::format_millis(self.timeouts.read()),
            sentinel::format_millis(self.timeouts.write()),
        )?;
        for (name, value) in &self.params {
            let value = sentinel::canonical_string(value);
            write!(f, "&{name}={}", value.as_deref().unwrap_or("null"))?;
        }
        for (name, file) in &self.files {
            write!(f, "&{name}={}", file.path().display())?;
        }
        for (name, value) in &self.headers {
            write!(f, "&{name}={value}")?;
        }
        Ok(())
    }
}
