//! Connectivity probe: one GET against a known-good URL, classified as
//! `Clear` (real internet) or `Intercepted` (captive portal in the way).
//!
//! A captive portal characteristically answers the probe with a different
//! status than expected, usually a redirect to its login page, so the HTTP
//! client must not follow redirects (see [`build_client`]).

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect;
use tracing::debug;

use crate::error::{Error, Result};

/// What the probe URL should answer when the connection is clear.
///
/// `body: None` skips the body check entirely. `body: Some("")` is distinct:
/// it requires a zero-length prefix match, which any response satisfies once
/// the status matches, mirroring how the recorded defaults behave.
#[derive(Debug, Clone)]
pub struct ProbeExpectation {
    pub status: u16,
    pub body: Option<String>,
}

impl Default for ProbeExpectation {
    /// The well-known no-content probe: status 204, empty body.
    fn default() -> Self {
        ProbeExpectation {
            status: 204,
            body: Some(String::new()),
        }
    }
}

/// Probe classification. Transport faults are `Err`, not a variant: a fault
/// is a signal to retry the probe, not evidence of interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    Clear,
    Intercepted,
}

/// Build the blocking HTTP client used for probing and replay: redirects
/// disabled so interception redirects stay observable.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .map_err(Error::transport)
}

/// Issue one GET to `url` and compare the response to `expectation`.
///
/// Schemes other than http/https are a configuration error, not a probe
/// result. When a body is expected, only `expected.len()` bytes of the
/// response are read; an intercepted login page can be arbitrarily large
/// and its content is irrelevant past the comparison prefix.
pub fn probe(
    client: &Client,
    url: &str,
    expectation: &ProbeExpectation,
    timeout: Duration,
) -> Result<ProbeResult> {
    let parsed = reqwest::Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(Error::UnsupportedScheme(url.to_string())),
    }

    debug!("probing {url}");
    let response = client
        .get(parsed)
        .timeout(timeout)
        .send()
        .map_err(Error::transport)?;

    let status = response.status().as_u16();
    debug!(
        "probe response status: {status} (expected: {})",
        expectation.status
    );
    if status != expectation.status {
        return Ok(ProbeResult::Intercepted);
    }

    let expected = match &expectation.body {
        None => return Ok(ProbeResult::Clear),
        Some(expected) => expected.as_bytes(),
    };

    let mut body = vec![0u8; expected.len()];
    let mut filled = 0;
    let mut response = response;
    while filled < body.len() {
        match response.read(&mut body[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) => return Err(Error::transport(err)),
        }
    }

    if &body[..filled] == expected {
        Ok(ProbeResult::Clear)
    } else {
        debug!("probe body prefix did not match expectation");
        Ok(ProbeResult::Intercepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_scheme() {
        let client = build_client().unwrap();
        let err = probe(
            &client,
            "ftp://example.com/file",
            &ProbeExpectation::default(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedScheme(_)));
    }

    #[test]
    fn rejects_unparseable_url() {
        let client = build_client().unwrap();
        let err = probe(
            &client,
            "not a url",
            &ProbeExpectation::default(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
