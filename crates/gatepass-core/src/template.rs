//! Parser for stored request templates.
//!
//! A template is the hand-saved text of a browser login request:
//!
//! ```text
//! POST /login.html HTTP/1.1
//! Host: gateway.example.net
//! Content-Type: application/x-www-form-urlencoded
//!
//! buttonClicked=4&redirect_url=www.example.com
//! ```
//!
//! Request line, zero or more headers, one blank separator line, at most one
//! body line. Header values may carry `${placeholder}` tokens which are
//! resolved at replay time, never here.

use std::fmt;

use crate::error::ParseError;

/// Request method. Only the two methods captive-portal logins use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Ordered header list. Some gateways care about header order, so insertion
/// order is preserved; re-inserting a name overwrites the value in place.
/// Names are stored in normalized form (see [`normalize_header_name`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn insert(&mut self, name: String, value: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parsed login request, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    pub method: Method,
    pub path: String,
    /// Protocol token from the request line (e.g. `HTTP/1.1`), kept verbatim.
    pub protocol: String,
    pub headers: HeaderMap,
    /// Single-line body; empty string means no body.
    pub body: String,
}

#[derive(Clone, Copy)]
enum Section {
    Headers,
    Body,
    Done,
}

impl RequestTemplate {
    /// Parse template text. Any violation of the format is a hard failure,
    /// never a partial result.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut lines = raw.lines();

        let request_line = lines.next().unwrap_or("");
        let fields: Vec<&str> = request_line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(ParseError::MalformedRequestLine(request_line.to_string()));
        }
        let method = match fields[0] {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => return Err(ParseError::MalformedRequestLine(request_line.to_string())),
        };
        let path = fields[1].to_string();
        let protocol = fields[2].to_string();

        let mut headers = HeaderMap::default();
        let mut body = String::new();
        let mut section = Section::Headers;

        for line in lines {
            match section {
                Section::Headers => {
                    if line.is_empty() {
                        section = Section::Body;
                        continue;
                    }
                    match line.find(':') {
                        Some(0) | None => {
                            return Err(ParseError::MalformedHeader(line.to_string()));
                        }
                        Some(index) => {
                            let name = normalize_header_name(&line[..index]);
                            let raw_value = &line[index + 1..];
                            // Hand-saved templates have one space after the
                            // colon; strip only that one.
                            let value = raw_value.strip_prefix(' ').unwrap_or(raw_value);
                            headers.insert(name, value.to_string());
                        }
                    }
                }
                Section::Body => {
                    body = line.to_string();
                    section = Section::Done;
                }
                Section::Done => {
                    if !line.is_empty() {
                        return Err(ParseError::TrailingContent(line.to_string()));
                    }
                }
            }
        }

        Ok(RequestTemplate {
            method,
            path,
            protocol,
            headers,
            body,
        })
    }
}

impl fmt::Display for RequestTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.method.as_str(), self.path, self.protocol)?;
        for (name, value) in self.headers.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f)?;
        if !self.body.is_empty() {
            writeln!(f, "{}", self.body)?;
        }
        Ok(())
    }
}

/// Standardize capitalization of a header field name: each `-`-delimited
/// segment gets an uppercase first character and lowercase rest, so `HOST`
/// becomes `Host` and `content-type` becomes `Content-Type`. Stored
/// templates are hand-edited and casing is inconsistent, but the replay
/// step needs an exact-cased `Host` key to find and strip.
pub fn normalize_header_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
