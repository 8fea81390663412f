//! Recovery of per-call timeouts and headers smuggled through the request.
//!
//! Three shapes are recognized:
//!
//! - a [`TimeoutCarrier`] body holds the overrides and headers out of band,
//! - a form body holds them as sentinel fields (see [`courier_core::sentinel`]),
//! - any other request may hold the timeout overrides as headers named after
//!   the sentinel fields.
//!
//! In every case the metadata is removed from the forwarded request and the
//! overrides are applied to the chain for this one call. Unset, zero or
//! malformed overrides keep the chain's current timeout; the interceptor
//! never fails a request.

use std::future::Future;
use std::time::Duration;

use courier_core::sentinel::{
    CONNECT_TIMEOUT, READ_TIMEOUT, Sentinel, TimeoutOverride, WRITE_TIMEOUT,
};
use courier_core::{Body, CallTimeouts, Error, Exchange, FormBody, Request, Response, Result};
use tower::Service;
use tracing::debug;

use super::{Chain, Interceptor};

/// Interceptor applying the timeouts and headers carried by a request.
///
/// Stateless: one value can serve any number of concurrent calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutInterceptor;

impl Interceptor for TimeoutInterceptor {
    fn intercept<S>(&self, mut chain: Chain<S>) -> impl Future<Output = Result<Response>> + Send
    where
        S: Service<Exchange, Response = Response, Error = Error> + Send + 'static,
        S::Future: Send,
    {
        let current = chain.timeouts();
        let resolved = rewrite(chain.request_mut(), current);
        debug!(
            connect = ?resolved.connect,
            read = ?resolved.read,
            write = ?resolved.write,
            "resolved call timeouts"
        );

        chain
            .with_connect_timeout(resolved.connect)
            .with_read_timeout(resolved.read)
            .with_write_timeout(resolved.write)
            .proceed()
    }
}

/// Strip the metadata from `request` and resolve it against `current`.
pub(crate) fn rewrite(request: &mut Request, current: CallTimeouts) -> CallTimeouts {
    match request.take_body() {
        Some(Body::Timeout(mut carrier)) => {
            let resolved = CallTimeouts::new(
                carrier.connect_timeout(current.connect),
                carrier.read_timeout(current.read),
                carrier.write_timeout(current.write),
            );
            for (name, value) in carrier.take_headers().into_iter().flatten() {
                apply_header(request, &name, value);
            }
            request.set_body(carrier);
            resolved
        }
        Some(Body::Form(form)) => {
            let (form, resolved) = strip_form(request, form, current);
            request.set_body(form);
            resolved
        }
        other => {
            if let Some(body) = other {
                request.set_body(body);
            }
            from_headers(request, current)
        }
    }
}

fn strip_form(
    request: &mut Request,
    form: FormBody,
    current: CallTimeouts,
) -> (FormBody, CallTimeouts) {
    let mut resolved = current;
    let mut kept = FormBody::new();

    for (name, value) in form.into_fields() {
        match Sentinel::classify(&name) {
            Some(Sentinel::ConnectTimeout) => {
                resolved.connect = parse_override(&name, &value, current.connect);
            }
            Some(Sentinel::ReadTimeout) => {
                resolved.read = parse_override(&name, &value, current.read);
            }
            Some(Sentinel::WriteTimeout) => {
                resolved.write = parse_override(&name, &value, current.write);
            }
            Some(Sentinel::Header(header)) => apply_header(request, header, value),
            None => kept.push(name, value),
        }
    }

    (kept, resolved)
}

fn from_headers(request: &mut Request, current: CallTimeouts) -> CallTimeouts {
    let mut resolved = current;
    let slots = [
        (CONNECT_TIMEOUT, &mut resolved.connect),
        (READ_TIMEOUT, &mut resolved.read),
        (WRITE_TIMEOUT, &mut resolved.write),
    ];
    for (name, slot) in slots {
        if let Some(value) = request.remove_header(name) {
            *slot = parse_override(name, &value, *slot);
        }
    }
    resolved
}

fn parse_override(name: &str, value: &str, current: Duration) -> Duration {
    let parsed = TimeoutOverride::parse(value);
    if parsed == TimeoutOverride::Malformed {
        debug!(name, value, "ignoring malformed timeout override");
    }
    parsed.or(current)
}

/// Headers are single-valued: a recovered header replaces any header of the
/// same name already on the request, whatever its case.
fn apply_header(request: &mut Request, name: &str, value: String) {
    let valid = http::HeaderName::from_bytes(name.as_bytes()).is_ok()
        && http::HeaderValue::from_str(&value).is_ok();
    if valid {
        debug!(name, "injecting header");
        request.set_header(name, value);
    } else {
        debug!(name, "skipping invalid header");
    }
}
