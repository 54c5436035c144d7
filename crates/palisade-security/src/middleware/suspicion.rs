//! Suspicious-request heuristic
//!
//! Scans query strings and request bodies for markers that almost never
//! appear in legitimate marketing-site traffic. Detection only logs; the
//! request proceeds either way, so a false positive never breaks a user.

use regex::RegexSet;
use serde_json::Value;

const SUSPICIOUS_PATTERNS: &[&str] = &[
    r"(?i)<script",
    r"(?i)javascript:",
    r"(?i)eval\(",
    r"(?i)expression\(",
    r"(?i)vbscript:",
    r"(?i)onload=",
    r"(?i)onerror=",
];

/// Pattern-based scanner for query strings and request bodies
#[derive(Debug, Clone)]
pub struct SuspicionDetector {
    patterns: RegexSet,
}

impl Default for SuspicionDetector {
    fn default() -> Self {
        Self {
            // static patterns, known valid
            patterns: RegexSet::new(SUSPICIOUS_PATTERNS).unwrap(),
        }
    }
}

impl SuspicionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a single text value trips any pattern
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.is_match(text)
    }

    /// Scan the request's query string and body for suspicious markers.
    ///
    /// Form bodies are scanned per decoded value, JSON bodies recursively
    /// over every string, and anything else as raw text.
    pub fn is_suspicious(
        &self,
        query: Option<&str>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> bool {
        if let Some(query) = query {
            let tripped = url::form_urlencoded::parse(query.as_bytes())
                .any(|(name, value)| self.matches(&name) || self.matches(&value));
            if tripped {
                return true;
            }
        }

        if body.is_empty() {
            return false;
        }

        match content_type {
            Some(ct) if ct.starts_with("application/json") => {
                match serde_json::from_slice::<Value>(body) {
                    Ok(value) => self.json_suspicious(&value),
                    Err(_) => self.raw_suspicious(body),
                }
            }
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
                url::form_urlencoded::parse(body)
                    .any(|(name, value)| self.matches(&name) || self.matches(&value))
            }
            _ => self.raw_suspicious(body),
        }
    }

    fn json_suspicious(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.matches(s),
            Value::Array(items) => items.iter().any(|item| self.json_suspicious(item)),
            Value::Object(map) => map
                .iter()
                .any(|(key, item)| self.matches(key) || self.json_suspicious(item)),
            _ => false,
        }
    }

    fn raw_suspicious(&self, body: &[u8]) -> bool {
        std::str::from_utf8(body).is_ok_and(|text| self.matches(text))
    }
}
