//! Orchestration: resolve which login request applies to the current wifi
//! network, test whether the connection is intercepted, and replay the login
//! if it is.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::placeholder::{substitute_template, FactSource, SubstitutionContext};
use crate::probe::{build_client, probe, ProbeExpectation, ProbeResult};
use crate::registry::Registry;
use crate::replay::replay;
use crate::retry::with_retry;
use crate::store::find_template;
use crate::template::RequestTemplate;

/// Everything a run needs, assembled by the CLI and passed in explicitly.
#[derive(Debug)]
pub struct RunOptions {
    /// Explicit template file; when absent the store and registry are
    /// consulted by SSID.
    pub template: Option<PathBuf>,
    pub request_dir: PathBuf,
    pub registry: Option<PathBuf>,
    pub test_url: String,
    pub expectation: ProbeExpectation,
    pub probe_timeout: Duration,
    pub skip_test: bool,
    pub retries: u32,
    pub retry_pause: Duration,
    pub wait: Duration,
    pub detect: bool,
    pub check_only: bool,
    pub silence_file: PathBuf,
}

/// Live facts, resolved lazily so a run that never uses `${mac}` or `${ip}`
/// never shells out for them. The association snapshot (interface, SSID,
/// AP MAC) is taken once up front since template resolution needs it anyway.
struct LiveFacts {
    interface: Option<String>,
    ssid: Option<String>,
    ap_mac: Option<String>,
}

impl LiveFacts {
    fn gather() -> Self {
        match gatepass_wireless::wifi_info() {
            Ok(info) => LiveFacts {
                interface: Some(info.interface),
                ssid: info.ssid,
                ap_mac: info.ap_mac,
            },
            Err(err) => {
                warn!("could not read wifi state: {err}");
                LiveFacts {
                    interface: None,
                    ssid: None,
                    ap_mac: None,
                }
            }
        }
    }
}

impl FactSource for LiveFacts {
    fn device_mac(&self) -> Option<String> {
        self.interface
            .as_deref()
            .and_then(gatepass_wireless::interface_mac)
    }

    fn device_ip(&self) -> Option<String> {
        self.interface
            .as_deref()
            .and_then(gatepass_wireless::interface_ipv4)
    }

    fn ssid(&self) -> Option<String> {
        self.ssid.clone()
    }

    fn ap_mac(&self) -> Option<String> {
        self.ap_mac.clone()
    }
}

pub fn run(opts: &RunOptions) -> Result<()> {
    if opts.silence_file.exists() {
        warn!(
            "silence file {} exists; exiting instead of creating network traffic",
            opts.silence_file.display()
        );
        return Ok(());
    }

    if !opts.wait.is_zero() {
        debug!("pausing {:?} before starting", opts.wait);
        thread::sleep(opts.wait);
    }

    let facts = LiveFacts::gather();

    let registry = match &opts.registry {
        Some(path) => Some(Registry::load(path)?),
        None => None,
    };

    if opts.detect {
        match facts.ssid.as_deref() {
            Some(ssid) if is_recognized(opts, registry.as_ref(), ssid) => {
                info!("recognized ssid {ssid:?}; proceeding");
            }
            Some(ssid) => {
                info!("unrecognized ssid {ssid:?}; nothing to do");
                return Ok(());
            }
            None => {
                info!("not connected to wifi; nothing to do");
                return Ok(());
            }
        }
    }

    let template = match resolve_template(opts, &facts, registry.as_ref())? {
        Some(template) => template,
        None => return Ok(()),
    };

    // Fresh context every run: the device MAC/IP and SSID may have changed
    // since the last invocation even though the template text is static.
    let ctx = SubstitutionContext::new(&facts);

    if opts.check_only {
        print!("{}", substitute_template(&template, &ctx));
        return Ok(());
    }

    let client = build_client()?;

    if !opts.skip_test {
        let result = with_retry("probe", opts.retries, opts.retry_pause, || {
            probe(&client, &opts.test_url, &opts.expectation, opts.probe_timeout)
        })
        .context("connection test failed")?;
        if result == ProbeResult::Clear {
            info!(
                "looks like you're already connected; response from {} is as expected",
                opts.test_url
            );
            return Ok(());
        }
        info!(
            "connection looks intercepted; response from {} is not as expected",
            opts.test_url
        );
    }

    let summary = with_retry("replay", opts.retries, opts.retry_pause, || {
        replay(&client, &template, &ctx)
    })
    .context("login replay failed")?;
    info!("login looks successful (HTTP {})", summary.status);
    Ok(())
}

fn is_recognized(opts: &RunOptions, registry: Option<&Registry>, ssid: &str) -> bool {
    find_template(&opts.request_dir, ssid).is_some()
        || registry.is_some_and(|registry| registry.knows(ssid))
}

/// Pick the login request for this run: an explicit file beats the store,
/// the store beats the registry. An unrecognized SSID is not an error, just
/// a warning and a clean exit; not being on wifi at all (with no explicit
/// file) is.
fn resolve_template(
    opts: &RunOptions,
    facts: &LiveFacts,
    registry: Option<&Registry>,
) -> Result<Option<RequestTemplate>> {
    if let Some(path) = &opts.template {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading request file {}", path.display()))?;
        let template = RequestTemplate::parse(&raw)
            .with_context(|| format!("request file {} is malformed", path.display()))?;
        return Ok(Some(template));
    }

    let ssid = match facts.ssid.as_deref() {
        Some(ssid) => ssid,
        None => bail!("it doesn't look like you're connected to wifi, and no request file was given"),
    };

    if let Some(path) = find_template(&opts.request_dir, ssid) {
        info!("using stored request {}", path.display());
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading request file {}", path.display()))?;
        let template = RequestTemplate::parse(&raw)
            .with_context(|| format!("request file {} is malformed", path.display()))?;
        return Ok(Some(template));
    }

    if let Some(registry) = registry {
        if let Some(template) = registry.template_for(ssid)? {
            info!("using gateway registry entry for ssid {ssid:?}");
            return Ok(Some(template));
        }
    }

    warn!(
        "unrecognized ssid {ssid:?}: no request record in {} and no registry entry",
        opts.request_dir.display()
    );
    Ok(None)
}
