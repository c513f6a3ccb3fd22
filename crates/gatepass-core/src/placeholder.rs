//! Placeholder substitution: `${name}` tokens in a template resolve to live
//! facts (device MAC/IP, SSID, AP MAC) at replay time, so a static template
//! keeps working as addresses change between runs.
//!
//! Substitution never fails. Unknown names resolve to the empty string with
//! a warning; a `${` with no closing `}` is passed through verbatim.

use tracing::warn;

use crate::template::RequestTemplate;

/// Supplier of live network facts. Split out as a trait so tests can inject
/// fixed values and the CLI can wire in `gatepass-wireless`.
pub trait FactSource {
    fn device_mac(&self) -> Option<String>;
    fn device_ip(&self) -> Option<String>;
    fn ssid(&self) -> Option<String>;
    fn ap_mac(&self) -> Option<String>;
}

/// Placeholder names the engine recognizes.
pub const SUPPORTED_NAMES: [&str; 5] = ["mac", "MAC", "ip", "ssid", "wifimac"];

/// Per-run binding of placeholder names to a fact source. Built fresh for
/// every run; facts are fetched only when a template actually uses them.
pub struct SubstitutionContext<'a> {
    source: &'a dyn FactSource,
}

impl<'a> SubstitutionContext<'a> {
    pub fn new(source: &'a dyn FactSource) -> Self {
        SubstitutionContext { source }
    }

    fn resolve(&self, name: &str) -> String {
        let value = match name {
            "mac" => self.source.device_mac(),
            "MAC" => self.source.device_mac().map(|mac| mac.to_uppercase()),
            "ip" => self.source.device_ip(),
            "ssid" => self.source.ssid(),
            "wifimac" => self.source.ap_mac(),
            _ => {
                warn!("unknown placeholder ${{{name}}}; substituting empty string");
                return String::new();
            }
        };
        value.unwrap_or_else(|| {
            warn!("placeholder ${{{name}}} could not be resolved; substituting empty string");
            String::new()
        })
    }
}

/// Replace every `${name}` in `text` with its resolved value.
///
/// The scan alternates between two states: outside a placeholder, text is
/// copied through until the next `${`; inside, everything up to the first
/// `}` is the name. A chunk with no closing `}` is not a placeholder and is
/// reproduced as-is, so text that merely contains a literal `${` round-trips.
pub fn substitute(text: &str, ctx: &SubstitutionContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        match rest.find("${") {
            None => {
                out.push_str(rest);
                return out;
            }
            Some(start) => {
                out.push_str(&rest[..start]);
                let inside = &rest[start + 2..];
                match inside.find('}') {
                    None => {
                        // No close anywhere ahead: literal "${" plus the rest.
                        out.push_str(&rest[start..]);
                        return out;
                    }
                    Some(end) => {
                        out.push_str(&ctx.resolve(&inside[..end]));
                        rest = &inside[end + 1..];
                    }
                }
            }
        }
    }
}

/// Apply substitution to the parts of a template where placeholders are
/// legal: the path, each header value, and the body. Header names, method
/// and protocol are never substituted.
pub fn substitute_template(template: &RequestTemplate, ctx: &SubstitutionContext) -> RequestTemplate {
    let mut resolved = RequestTemplate {
        method: template.method,
        path: substitute(&template.path, ctx),
        protocol: template.protocol.clone(),
        headers: Default::default(),
        body: substitute(&template.body, ctx),
    };
    for (name, value) in template.headers.iter() {
        resolved
            .headers
            .insert(name.to_string(), substitute(value, ctx));
    }
    resolved
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fixed facts for tests.
    pub(crate) struct FixedFacts {
        pub mac: Option<&'static str>,
        pub ip: Option<&'static str>,
        pub ssid: Option<&'static str>,
        pub ap_mac: Option<&'static str>,
    }

    impl FixedFacts {
        pub(crate) fn full() -> Self {
            FixedFacts {
                mac: Some("aa:bb:cc:dd:ee:ff"),
                ip: Some("10.0.0.7"),
                ssid: Some("Cafe-Net"),
                ap_mac: Some("d0:17:c2:9b:4a:01"),
            }
        }

        pub(crate) fn empty() -> Self {
            FixedFacts {
                mac: None,
                ip: None,
                ssid: None,
                ap_mac: None,
            }
        }
    }

    impl FactSource for FixedFacts {
        fn device_mac(&self) -> Option<String> {
            self.mac.map(String::from)
        }
        fn device_ip(&self) -> Option<String> {
            self.ip.map(String::from)
        }
        fn ssid(&self) -> Option<String> {
            self.ssid.map(String::from)
        }
        fn ap_mac(&self) -> Option<String> {
            self.ap_mac.map(String::from)
        }
    }

    #[test]
    fn substitutes_in_the_middle() {
        let facts = FixedFacts::full();
        let ctx = SubstitutionContext::new(&facts);
        assert_eq!(
            substitute("prefix${ssid}suffix", &ctx),
            "prefixCafe-Netsuffix"
        );
    }

    #[test]
    fn substitutes_every_supported_name() {
        let facts = FixedFacts::full();
        let ctx = SubstitutionContext::new(&facts);
        assert_eq!(
            substitute("${mac}|${MAC}|${ip}|${ssid}|${wifimac}", &ctx),
            "aa:bb:cc:dd:ee:ff|AA:BB:CC:DD:EE:FF|10.0.0.7|Cafe-Net|d0:17:c2:9b:4a:01"
        );
    }

    #[test]
    fn unknown_name_becomes_empty() {
        let facts = FixedFacts::full();
        let ctx = SubstitutionContext::new(&facts);
        assert_eq!(substitute("${unknown}", &ctx), "");
        assert_eq!(substitute("${}", &ctx), "");
    }

    #[test]
    fn unresolved_fact_becomes_empty() {
        let facts = FixedFacts::empty();
        let ctx = SubstitutionContext::new(&facts);
        assert_eq!(substitute("mac=${mac}&", &ctx), "mac=&");
    }

    #[test]
    fn unclosed_placeholder_passes_through() {
        let facts = FixedFacts::full();
        let ctx = SubstitutionContext::new(&facts);
        assert_eq!(substitute("a${b", &ctx), "a${b");
        assert_eq!(substitute("${", &ctx), "${");
    }

    #[test]
    fn only_first_close_brace_counts() {
        let facts = FixedFacts::full();
        let ctx = SubstitutionContext::new(&facts);
        assert_eq!(substitute("a${ssid}b}c", &ctx), "aCafe-Netb}c");
    }

    #[test]
    fn plain_text_unchanged() {
        let facts = FixedFacts::empty();
        let ctx = SubstitutionContext::new(&facts);
        assert_eq!(substitute("no placeholders here", &ctx), "no placeholders here");
        assert_eq!(substitute("", &ctx), "");
    }

    #[test]
    fn template_substitution_touches_path_headers_body_only() {
        let facts = FixedFacts::full();
        let ctx = SubstitutionContext::new(&facts);
        let template = crate::template::RequestTemplate::parse(
            "POST /login?ssid=${ssid} HTTP/1.1\nHost: gw\nX-Client: ${mac}\n\nip=${ip}\n",
        )
        .unwrap();
        let resolved = substitute_template(&template, &ctx);
        assert_eq!(resolved.path, "/login?ssid=Cafe-Net");
        assert_eq!(resolved.headers.get("X-Client"), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(resolved.body, "ip=10.0.0.7");
        assert_eq!(resolved.protocol, "HTTP/1.1");
    }
}
