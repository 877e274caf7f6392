//! wa_leak — the leak detector (C5).
//!
//! Refuses to let a reply leave the process if its data recursively
//! contains any string matching a host-path shape. Implemented as a free
//! function over a reply's data tree, wired in at every tool boundary via a
//! thin wrapper -- it must stay a cross-cutting concern, never folded into
//! the resolver or enforcer -- those components stay pure with respect to
//! their inputs.
//!
//! The `RegexSet` first pass keeps the common (clean) path fast; individual
//! patterns are only consulted to attribute which shape matched once the
//! set reports a hit.

use regex::{Regex, RegexSet};
use wa_reply::Reply;

/// `(name, pattern)`. Extensible: additional host-path shapes (cloud
/// volumes, custom mount points) can be added here without touching
/// callers.
const PATTERN_DEFS: &[(&str, &str)] = &[
    ("windows_drive", r"[A-Za-z]:\\"),
    ("unc_path", r"\\\\[A-Za-z0-9_.\-]+"),
    ("macos_home", r"/Users/[^/\s\\\"']+"),
    ("linux_home", r"/home/[^/\s\\\"']+"),
    ("wsl_mount", r"/mnt/[A-Za-z](?:/|$)"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakMatch {
    pub pattern_name: &'static str,
    pub matched_text: String,
    /// Dotted path into the scanned structure, e.g. `data.resolved` or `message`.
    pub location: String,
}

impl std::fmt::Display for LeakMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} matched {} at {}", self.pattern_name, self.matched_text, self.location)
    }
}

pub struct LeakDetector {
    set: RegexSet,
    patterns: Vec<(&'static str, Regex)>,
}

impl LeakDetector {
    pub fn new() -> Self {
        let patterns: Vec<&str> = PATTERN_DEFS.iter().map(|(_, p)| *p).collect();
        let set = RegexSet::new(&patterns).expect("static leak-detector patterns must compile");
        let compiled = PATTERN_DEFS
            .iter()
            .map(|(name, p)| (*name, Regex::new(p).expect("static leak-detector patterns must compile")))
            .collect();
        Self { set, patterns: compiled }
    }

    /// First host-path-shaped match in `text`, if any.
    pub fn scan_str(&self, text: &str, location: &str) -> Option<LeakMatch> {
        let hits = self.set.matches(text);
        for idx in hits.into_iter() {
            let (name, regex) = &self.patterns[idx];
            if let Some(m) = regex.find(text) {
                return Some(LeakMatch {
                    pattern_name: name,
                    matched_text: m.as_str().to_string(),
                    location: location.to_string(),
                });
            }
        }
        None
    }

    /// Recursively scans a JSON value: strings, object keys and values, and
    /// array elements. Non-string scalars are ignored.
    pub fn scan_value(&self, value: &serde_json::Value, location: &str) -> Option<LeakMatch> {
        match value {
            serde_json::Value::String(s) => self.scan_str(s, location),
            serde_json::Value::Array(items) => items
                .iter()
                .enumerate()
                .find_map(|(i, v)| self.scan_value(v, &format!("{location}[{i}]"))),
            serde_json::Value::Object(map) => map.iter().find_map(|(k, v)| {
                self.scan_str(k, &format!("{location}.<key:{k}>"))
                    .or_else(|| self.scan_value(v, &format!("{location}.{k}")))
            }),
            _ => None,
        }
    }

    /// Scans an entire reply (`message` and `data`). This is the function
    /// wired in at every tool boundary.
    pub fn scan_reply(&self, reply: &Reply) -> Option<LeakMatch> {
        self.scan_str(&reply.message, "message")
            .or_else(|| self.scan_value(&serde_json::Value::Object(reply.data.clone()), "data"))
    }
}

impl Default for LeakDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wa_reply::codes;

    fn detector() -> LeakDetector {
        LeakDetector::new()
    }

    #[test]
    fn detects_windows_drive() {
        assert!(detector().scan_str(r"C:\Users\test\file.txt", "x").is_some());
    }

    #[test]
    fn detects_unc_path() {
        assert!(detector().scan_str(r"\\fileserver\share\doc.txt", "x").is_some());
    }

    #[test]
    fn detects_macos_home() {
        assert!(detector().scan_str("/Users/alice/project/file.rs", "x").is_some());
    }

    #[test]
    fn detects_linux_home() {
        assert!(detector().scan_str("/home/bob/project/file.rs", "x").is_some());
    }

    #[test]
    fn detects_wsl_mount() {
        assert!(detector().scan_str("/mnt/c/Users/alice", "x").is_some());
    }

    #[test]
    fn canonical_addresses_never_match() {
        let d = detector();
        assert!(d.scan_str("root:repo/src/server.py", "x").is_none());
        assert!(d.scan_str("mod:TestMod/common", "x").is_none());
    }

    #[test]
    fn scans_nested_structures() {
        let d = detector();
        let v = serde_json::json!({
            "outer": { "inner": ["fine", "C:\\secret\\path.txt"] }
        });
        let hit = d.scan_value(&v, "data").unwrap();
        assert_eq!(hit.pattern_name, "windows_drive");
        assert!(hit.location.contains("inner"));
    }

    #[test]
    fn scan_reply_checks_message_and_data() {
        let d = detector();
        let clean = Reply::new(codes::WA_RES_S_001, "ok").with_data("resolved", "root:repo/x");
        assert!(d.scan_reply(&clean).is_none());

        let tainted = Reply::new(codes::WA_RES_S_001, "ok").with_data("resolved", "/home/alice/x");
        assert!(d.scan_reply(&tainted).is_some());
    }
}
