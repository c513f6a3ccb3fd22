//! Wifi facts for gatepass: which wireless interface is up, what SSID it is
//! associated with, the access point's MAC, and the interface's own MAC and
//! IPv4 address.
//!
//! Interface discovery and MAC lookup go through `/sys/class/net`; the
//! association state comes from `iw dev <iface> link` and the address from
//! `ip -o -4 addr show`, both parsed from their plain-text output.

use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::debug;

mod error;

pub use error::{Result, WirelessError};

/// Snapshot of the current wifi association.
///
/// `ssid` of `None` means the interface exists but is not associated with
/// any network.
#[derive(Debug, Clone)]
pub struct WifiInfo {
    pub interface: String,
    pub ssid: Option<String>,
    pub ap_mac: Option<String>,
}

/// List wireless interfaces, i.e. entries under `/sys/class/net` that carry
/// a `wireless` subdirectory. `lo` is skipped.
pub fn wireless_interfaces() -> Vec<String> {
    let mut interfaces = Vec::new();
    if let Ok(entries) = fs::read_dir("/sys/class/net") {
        for entry in entries.flatten() {
            if let Ok(name) = entry.file_name().into_string() {
                if name != "lo" && entry.path().join("wireless").exists() {
                    interfaces.push(name);
                }
            }
        }
    }
    interfaces.sort();
    interfaces
}

/// Current association state: the first associated wireless interface wins;
/// with no association anywhere, the first wireless interface is reported
/// with `ssid: None`.
pub fn wifi_info() -> Result<WifiInfo> {
    let interfaces = wireless_interfaces();
    if interfaces.is_empty() {
        return Err(WirelessError::NoInterface);
    }

    for interface in &interfaces {
        let (ssid, ap_mac) = link_info(interface)?;
        if ssid.is_some() {
            debug!(
                interface = %interface,
                ssid = ssid.as_deref().unwrap_or(""),
                "associated wireless interface"
            );
            return Ok(WifiInfo {
                interface: interface.clone(),
                ssid,
                ap_mac,
            });
        }
    }

    debug!("no associated wireless interface");
    Ok(WifiInfo {
        interface: interfaces[0].clone(),
        ssid: None,
        ap_mac: None,
    })
}

/// MAC address of an interface, lowercased, from
/// `/sys/class/net/<interface>/address`.
pub fn interface_mac(interface: &str) -> Option<String> {
    let path = format!("/sys/class/net/{interface}/address");
    if !Path::new(&path).exists() {
        return None;
    }
    fs::read_to_string(&path)
        .ok()
        .map(|mac| mac.trim().to_lowercase())
        .filter(|mac| !mac.is_empty())
}

/// First IPv4 address assigned to an interface, from `ip -o -4 addr show`.
pub fn interface_ipv4(interface: &str) -> Option<String> {
    let output = Command::new("ip")
        .args(["-o", "-4", "addr", "show", "dev", interface])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_ipv4_output(&String::from_utf8_lossy(&output.stdout))
}

fn link_info(interface: &str) -> Result<(Option<String>, Option<String>)> {
    let output = Command::new("iw").args(["dev", interface, "link"]).output()?;
    if !output.status.success() {
        return Err(WirelessError::Command {
            command: format!("iw dev {interface} link"),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(parse_link_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `iw dev <iface> link` output into `(ssid, ap_mac)`.
///
/// Associated output starts with `Connected to <bssid> (on <iface>)` and
/// carries an indented `SSID: <name>` line; an unassociated interface prints
/// `Not connected.`.
fn parse_link_output(text: &str) -> (Option<String>, Option<String>) {
    let mut ssid = None;
    let mut ap_mac = None;
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Connected to ") {
            ap_mac = rest
                .split_whitespace()
                .next()
                .map(|mac| mac.to_lowercase());
        } else if let Some(rest) = line.strip_prefix("SSID: ") {
            if !rest.is_empty() {
                ssid = Some(rest.to_string());
            }
        }
    }
    (ssid, ap_mac)
}

fn parse_ipv4_output(text: &str) -> Option<String> {
    // "2: wlan0    inet 10.0.0.7/24 brd 10.0.0.255 scope global ..."
    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "inet" {
            let addr = tokens.next()?;
            let ip = addr.split('/').next().unwrap_or(addr);
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{parse_ipv4_output, parse_link_output};

    const LINK_CONNECTED: &str = "\
Connected to D0:17:C2:9B:4A:01 (on wlan0)
\tSSID: Cafe-Net
\tfreq: 2437
\tRX: 12345 bytes (67 packets)
\tTX: 890 bytes (12 packets)
\tsignal: -54 dBm
";

    #[test]
    fn link_output_connected() {
        let (ssid, ap_mac) = parse_link_output(LINK_CONNECTED);
        assert_eq!(ssid.as_deref(), Some("Cafe-Net"));
        assert_eq!(ap_mac.as_deref(), Some("d0:17:c2:9b:4a:01"));
    }

    #[test]
    fn link_output_not_connected() {
        let (ssid, ap_mac) = parse_link_output("Not connected.\n");
        assert_eq!(ssid, None);
        assert_eq!(ap_mac, None);
    }

    #[test]
    fn link_output_ssid_with_spaces() {
        let (ssid, _) = parse_link_output(
            "Connected to aa:bb:cc:dd:ee:ff (on wlan0)\n\tSSID: Guest Wifi Net\n",
        );
        assert_eq!(ssid.as_deref(), Some("Guest Wifi Net"));
    }

    #[test]
    fn ipv4_output_first_address() {
        let text = "3: wlan0    inet 192.168.4.21/24 brd 192.168.4.255 scope global dynamic wlan0\\       valid_lft 86055sec preferred_lft 86055sec\n";
        assert_eq!(parse_ipv4_output(text).as_deref(), Some("192.168.4.21"));
    }

    #[test]
    fn ipv4_output_empty() {
        assert_eq!(parse_ipv4_output(""), None);
    }
}
