//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Body, CallTimeouts, ContentType, Encoding, Error, Exchange, FileAttachment, FormBody,
    HttpClient, Method, ParamStore, RawBody, Request, RequestBuilder, Response, Result,
    TimeoutCarrier, Timeouts, from_json, to_json,
};
