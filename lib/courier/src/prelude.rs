//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::middleware::{Chain, Interceptor, InterceptorLayer, TimeoutInterceptor};
pub use crate::{
    Body, Call, Callback, ClientConfig, Dispatcher, Encoding, Error, FileAttachment, HttpClient,
    HyperClient, Method, ParamStore, Request, Response, Result, StatusCode, TimeoutCarrier,
    Timeouts,
};
pub use serde::{Deserialize, Serialize};
