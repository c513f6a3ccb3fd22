//! Replay executor: send a parsed template, with placeholders resolved, to
//! the gateway it was recorded against.
//!
//! Success means a response was fully read, whatever its status or content.
//! These gateways answer an accepted login with anything from a 200 page to
//! a redirect loop; the only signal that matters is that the round trip
//! completed, which is also all a human checks interactively.

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::placeholder::{substitute_template, SubstitutionContext};
use crate::template::{Method, RequestTemplate};

/// What came back from a completed replay, for logging only. The gateway's
/// response content is never validated.
#[derive(Debug, Clone, Copy)]
pub struct ReplaySummary {
    pub status: u16,
}

/// Resolve placeholders and send the login request.
///
/// The `Host` header names the connection target and may carry a port
/// (`host:port`, default 80). `Host` and `Content-Length` are stripped from
/// the outgoing set: the transport supplies both from the actual connection
/// target and the actual substituted body, and the recorded values would be
/// stale. A missing `Host` is a structural error and is never retried.
pub fn replay(
    client: &Client,
    template: &RequestTemplate,
    ctx: &SubstitutionContext,
) -> Result<ReplaySummary> {
    let resolved = substitute_template(template, ctx);

    let host_value = resolved.headers.get("Host").ok_or(Error::MissingHost)?;
    let (host, port) = split_host_port(host_value);

    // The recorded protocol token (HTTP/1.x) implies plain http, matching
    // how these requests were captured.
    let url = format!("http://{host}:{port}{}", resolved.path);
    debug!("replaying login request to {url}");

    let mut request = match resolved.method {
        Method::Get => client.get(&url),
        Method::Post => client.post(&url),
    };
    for (name, value) in resolved.headers.iter() {
        if name == "Host" || name == "Content-Length" {
            continue;
        }
        request = request.header(name, value);
    }
    if !resolved.body.is_empty() {
        request = request.body(resolved.body.clone());
    }

    let mut response = request.send().map_err(Error::transport)?;
    let status = response.status().as_u16();

    // Drain the body so "success" means a fully read response; the
    // connection is released when `response` drops, on every path.
    std::io::copy(&mut response, &mut std::io::sink()).map_err(Error::transport)?;

    info!("login response received (HTTP {status})");
    Ok(ReplaySummary { status })
}

/// Split a `Host` header value into host and port. A single `host:port`
/// with an integer port is honored; anything else (no colon, several
/// colons, non-numeric port) is treated as a bare host on port 80.
fn split_host_port(value: &str) -> (&str, u16) {
    if let Some((host, port)) = value.split_once(':') {
        if !host.is_empty() {
            if let Ok(port) = port.parse::<u16>() {
                return (host, port);
            }
        }
    }
    (value, 80)
}
