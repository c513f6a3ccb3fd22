//! Gateway registry: a configuration table mapping SSIDs to known gateway
//! login requests, used when no recorded template file exists for the
//! current network.
//!
//! One `[[network]]` record per SSID/gateway pairing, plus one
//! `[gateway.<id>]` request description each. Several SSIDs can share a
//! gateway (guest and patient networks behind the same portal, say):
//!
//! ```toml
//! [[network]]
//! ssid = "JHGuestnet"
//! login_domain = "1.1.1.1"
//! gateway = "jhguest"
//!
//! [gateway.jhguest]
//! method = "POST"
//! path = "/login.html"
//! headers = [
//!     "Content-Type: application/x-www-form-urlencoded",
//!     "Origin: http://1.1.1.1",
//! ]
//! body = "buttonClicked=4&redirect_url=http%3A%2F%2Fexample.net%2F"
//! ```
//!
//! Entries may use `${placeholder}` tokens anywhere a stored template may.
//! The registry is loaded once at startup and handed to the orchestrator
//! explicitly; nothing here is global.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::template::RequestTemplate;

#[derive(Debug, Default, Deserialize)]
pub struct Registry {
    #[serde(default)]
    network: Vec<NetworkRecord>,
    #[serde(default)]
    gateway: HashMap<String, GatewayEntry>,
}

#[derive(Debug, Deserialize)]
struct NetworkRecord {
    ssid: String,
    login_domain: String,
    gateway: String,
}

#[derive(Debug, Deserialize)]
struct GatewayEntry {
    #[serde(default = "default_method")]
    method: String,
    path: String,
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    body: String,
}

fn default_method() -> String {
    "POST".to_string()
}

impl Registry {
    pub fn load(path: &Path) -> Result<Registry> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading gateway registry {}", path.display()))?;
        let registry: Registry = toml::from_str(&raw)
            .with_context(|| format!("parsing gateway registry {}", path.display()))?;
        for record in &registry.network {
            if !registry.gateway.contains_key(&record.gateway) {
                bail!(
                    "registry network {:?} names unknown gateway {:?}",
                    record.ssid,
                    record.gateway
                );
            }
        }
        debug!(
            "loaded gateway registry: {} networks, {} gateways",
            registry.network.len(),
            registry.gateway.len()
        );
        Ok(registry)
    }

    /// Whether any record matches this SSID.
    pub fn knows(&self, ssid: &str) -> bool {
        self.network.iter().any(|record| record.ssid == ssid)
    }

    /// Synthesize a request template for the given SSID, or `None` when the
    /// registry has no record for it.
    ///
    /// The entry is rendered to template text and run through the normal
    /// parser, so registry-sourced requests obey exactly the same format
    /// rules as stored files (a malformed entry is a configuration error).
    pub fn template_for(&self, ssid: &str) -> Result<Option<RequestTemplate>> {
        let record = match self.network.iter().find(|record| record.ssid == ssid) {
            Some(record) => record,
            None => return Ok(None),
        };
        let entry = self
            .gateway
            .get(&record.gateway)
            .with_context(|| format!("gateway {:?} missing from registry", record.gateway))?;

        let mut text = format!("{} {} HTTP/1.1\n", entry.method, entry.path);
        text.push_str(&format!("Host: {}\n", record.login_domain));
        for header in &entry.headers {
            text.push_str(header);
            text.push('\n');
        }
        text.push('\n');
        if !entry.body.is_empty() {
            text.push_str(&entry.body);
            text.push('\n');
        }

        let template = RequestTemplate::parse(&text).with_context(|| {
            format!("registry entry for gateway {:?} is malformed", record.gateway)
        })?;
        Ok(Some(template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Method;

    const REGISTRY: &str = r#"
[[network]]
ssid = "JHGuestnet"
login_domain = "1.1.1.1"
gateway = "jhguest"

[[network]]
ssid = "Guest-Network"
login_domain = "gw-b12.example.net"
gateway = "b12"

[[network]]
ssid = "Patient-Network"
login_domain = "gw-b12.example.net"
gateway = "b12"

[gateway.jhguest]
path = "/login.html"
headers = [
    "Content-Type: application/x-www-form-urlencoded",
    "Origin: http://1.1.1.1",
]
body = "buttonClicked=4&err_flag=0&redirect_url=http%3A%2F%2Fexample.net%2F"

[gateway.b12]
method = "GET"
path = "/accept?mac=${mac}"
"#;

    #[test]
    fn parses_and_synthesizes() {
        let registry: Registry = toml::from_str(REGISTRY).unwrap();
        assert!(registry.knows("JHGuestnet"));
        assert!(registry.knows("Patient-Network"));
        assert!(!registry.knows("Elsewhere"));

        let template = registry.template_for("JHGuestnet").unwrap().unwrap();
        assert_eq!(template.method, Method::Post);
        assert_eq!(template.path, "/login.html");
        assert_eq!(template.headers.get("Host"), Some("1.1.1.1"));
        assert_eq!(template.headers.get("Origin"), Some("http://1.1.1.1"));
        assert!(template.body.starts_with("buttonClicked=4"));
    }

    #[test]
    fn shared_gateway_keeps_per_network_domain() {
        let registry: Registry = toml::from_str(REGISTRY).unwrap();
        let template = registry.template_for("Patient-Network").unwrap().unwrap();
        assert_eq!(template.method, Method::Get);
        assert_eq!(template.headers.get("Host"), Some("gw-b12.example.net"));
        assert_eq!(template.path, "/accept?mac=${mac}");
        assert_eq!(template.body, "");
    }

    #[test]
    fn unknown_ssid_is_none() {
        let registry: Registry = toml::from_str(REGISTRY).unwrap();
        assert!(registry.template_for("Elsewhere").unwrap().is_none());
    }

    #[test]
    fn load_rejects_dangling_gateway_reference() {
        let dir = std::env::temp_dir().join(format!("gatepass-registry-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(
            &path,
            "[[network]]\nssid = \"X\"\nlogin_domain = \"h\"\ngateway = \"nope\"\n",
        )
        .unwrap();
        assert!(Registry::load(&path).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
