//! wa_reply — the reply taxonomy (C10).
//!
//! Every observable outcome produced by the resolver, the enforcer, and the
//! leak detector carries a stable `AA-BBB-T-NNN` code: area-kind-type-ordinal.
//! `T` is one of `S` (success), `I` (invalid input, not a denial), `D`
//! (denied by policy), `E` (infrastructure error). This module is the one
//! "wire" between every other component and the agent-facing frontend; it
//! owns no policy logic of its own.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod codes;

/// The `T` segment of a reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyKind {
    /// Call produced its intended effect.
    Success,
    /// Malformed input / structural error; recoverable by reformulating the request.
    Invalid,
    /// Visibility passed but policy refused, or a condition evaluated false.
    Denied,
    /// Infrastructure failure (capacity exhausted, leak detected, mutex poisoned).
    Error,
}

impl ReplyKind {
    fn letter(self) -> char {
        match self {
            ReplyKind::Success => 'S',
            ReplyKind::Invalid => 'I',
            ReplyKind::Denied => 'D',
            ReplyKind::Error => 'E',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c {
            'S' => Some(ReplyKind::Success),
            'I' => Some(ReplyKind::Invalid),
            'D' => Some(ReplyKind::Denied),
            'E' => Some(ReplyKind::Error),
            _ => None,
        }
    }
}

/// Parses the `T` field out of an `AA-BBB-T-NNN` code string.
///
/// Codes are otherwise opaque strings; this crate does not maintain a closed
/// registry (the taxonomy in `codes` is informative, not exhaustive).
pub fn kind_of(code: &str) -> Option<ReplyKind> {
    let parts: Vec<&str> = code.split('-').collect();
    if parts.len() != 4 {
        return None;
    }
    let t = parts[2];
    if t.len() != 1 {
        return None;
    }
    ReplyKind::from_letter(t.chars().next().unwrap())
}

/// A tagged reply envelope: `{code, message, data}`.
///
/// `data` never contains a host path (enforced at the call boundary by the
/// leak detector, not by this type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Reply {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: serde_json::Map::new(),
        }
    }

    /// The `T` field of this reply's code, if the code parses.
    pub fn kind(&self) -> Option<ReplyKind> {
        kind_of(&self.code)
    }

    pub fn is_success(&self) -> bool {
        self.kind() == Some(ReplyKind::Success)
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_data_map(mut self, extra: serde_json::Map<String, serde_json::Value>) -> Self {
        self.data.extend(extra);
        self
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_of_parses_all_four_letters() {
        assert_eq!(kind_of("WA-RES-S-001"), Some(ReplyKind::Success));
        assert_eq!(kind_of("WA-RES-I-001"), Some(ReplyKind::Invalid));
        assert_eq!(kind_of("EN-WRITE-D-001"), Some(ReplyKind::Denied));
        assert_eq!(kind_of("WA-RES-E-001"), Some(ReplyKind::Error));
    }

    #[test]
    fn kind_of_rejects_malformed_codes() {
        assert_eq!(kind_of("WA-RES-001"), None);
        assert_eq!(kind_of("not-a-code"), None);
        assert_eq!(kind_of(""), None);
    }

    #[test]
    fn with_data_accumulates_without_leaking_construction_order() {
        let r = Reply::new(codes::WA_RES_S_001, "ok")
            .with_data("root_key", "repo")
            .with_data("subdirectory", "src");
        assert_eq!(r.data.get("root_key").unwrap(), "repo");
        assert!(r.is_success());
    }

    #[test]
    fn display_includes_code_and_message() {
        let r = Reply::new(codes::WA_RES_I_001, "bad address");
        assert_eq!(r.to_string(), "WA-RES-I-001: bad address");
    }
}
