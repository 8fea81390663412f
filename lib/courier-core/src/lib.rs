//! Core types for the courier HTTP request pipeline.
//!
//! This crate holds everything that does not need a transport:
//! - [`ParamStore`] - Accumulates values, files, headers and timeouts, then encodes a [`Body`]
//! - [`Body`] - Closed set of body shapes: [`TimeoutCarrier`], [`FormBody`], [`RawBody`]
//! - [`TimeoutCarrier`] - JSON body decorator carrying timeout overrides and headers
//! - [`sentinel`] - Reserved form field and header names used to smuggle metadata
//! - [`Timeouts`] and [`CallTimeouts`] - Optional overrides and resolved per-call values
//! - [`Exchange`] - A request in flight together with its scoped timeouts
//! - [`Request`], [`RequestBuilder`] and [`Response`] - HTTP messages
//! - [`Error`] and [`Result`] - Error handling
//! - [`HttpClient`] - Core client trait for HTTP execution

mod body;
mod carrier;
mod client;
mod error;
mod exchange;
mod file;
mod method;
mod multipart;
mod params;
pub mod prelude;
mod request;
mod response;
pub mod sentinel;
mod timeouts;

pub use body::{
    Body, ContentType, FormBody, RawBody, from_json, to_form, to_json, to_query_string,
};
pub use carrier::TimeoutCarrier;
pub use client::HttpClient;
pub use error::{Error, Result};
pub use exchange::Exchange;
pub use file::FileAttachment;
pub use method::Method;
pub use multipart::{Form, Part};
pub use params::{Encoding, ParamStore};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use timeouts::{CallTimeouts, DEFAULT_TIMEOUT, Timeouts};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
