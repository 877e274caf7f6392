//! wa_address — the canonical address grammar & parser (C1).
//!
//! Canonical form: `("root:" root_key | "mod:" mod_name) "/" relative_path`.
//! Legacy accepted-and-normalized forms: `ROOT_<KEY_UPPER>:/<path>` and
//! `mod:<Name>:/<path>`. Neither legacy form is ever emitted.
//!
//! This module knows nothing about which root keys or mod names actually
//! exist — that's the root & session model's job (`wa_session`). It only
//! validates grammar.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    EmptyInput,
    #[error("missing namespace (expected \"root:\" or \"mod:\")")]
    MissingNamespace,
    #[error("unknown namespace: {0}")]
    UnknownNamespace(String),
    #[error("empty key in address")]
    EmptyKey,
    #[error("path escapes root after normalization")]
    PathEscape,
    #[error("host-absolute path rejected")]
    HostAbsolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Root,
    Mod,
}

impl Namespace {
    fn as_str(self) -> &'static str {
        match self {
            Namespace::Root => "root",
            Namespace::Mod => "mod",
        }
    }
}

/// A parsed, grammar-valid address. Formats back to canonical form via
/// `Display`; emitting then re-parsing is a pure, stable round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub namespace: Namespace,
    pub key: String,
    pub relative_path: String,
}

impl ParsedAddress {
    pub fn canonical_string(&self) -> String {
        if self.relative_path.is_empty() {
            format!("{}:{}", self.namespace.as_str(), self.key)
        } else {
            format!("{}:{}/{}", self.namespace.as_str(), self.key, self.relative_path)
        }
    }
}

impl std::fmt::Display for ParsedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

/// Parse a UTF-8 canonical (or legacy) address string.
pub fn parse(input: &str) -> Result<ParsedAddress, AddressError> {
    if input.is_empty() {
        return Err(AddressError::EmptyInput);
    }
    if is_host_absolute(input) {
        return Err(AddressError::HostAbsolute);
    }

    let (head, rest1) = match input.split_once(':') {
        Some(pair) => pair,
        None => return Err(AddressError::MissingNamespace),
    };

    let (namespace, key, path_raw) = if head.eq_ignore_ascii_case("root") {
        let (key, path_raw) = split_key_path(rest1)?;
        (Namespace::Root, key.to_lowercase(), path_raw)
    } else if head.eq_ignore_ascii_case("mod") {
        let (key, path_raw) = split_key_path(rest1)?;
        (Namespace::Mod, key.to_string(), path_raw)
    } else if let Some(upper_key) = head.strip_prefix("ROOT_") {
        if upper_key.is_empty() {
            return Err(AddressError::EmptyKey);
        }
        let path_raw = rest1.strip_prefix('/').unwrap_or(rest1);
        (Namespace::Root, upper_key.to_lowercase(), path_raw.to_string())
    } else {
        return Err(AddressError::UnknownNamespace(head.to_string()));
    };

    if key.is_empty() {
        return Err(AddressError::EmptyKey);
    }

    let relative_path = normalize_relative_path(&path_raw)?;

    Ok(ParsedAddress { namespace, key, relative_path })
}

/// Splits `"<key>/<path>"` or the legacy `"<key>:/<path>"` into `(key, path_raw)`.
/// A bare key with no path (e.g. `"repo"`) yields `(key, "")`.
fn split_key_path(rest: &str) -> Result<(&str, String), AddressError> {
    match rest.find([':', '/']) {
        None => Ok((rest, String::new())),
        Some(idx) => {
            let key = &rest[..idx];
            let sep = rest.as_bytes()[idx] as char;
            let after = &rest[idx + 1..];
            let path_raw = if sep == ':' {
                after.strip_prefix('/').unwrap_or(after).to_string()
            } else {
                after.to_string()
            };
            Ok((key, path_raw))
        }
    }
}

/// Collapses `./` segments and repeated separators; rejects any remaining
/// `..` component. Never resolves `..` against a root — that's an escape,
/// not a segment to consume.
fn normalize_relative_path(raw: &str) -> Result<String, AddressError> {
    let mut segments = Vec::new();
    for seg in raw.split('/') {
        if seg.is_empty() || seg == "." {
            continue;
        }
        if seg == ".." {
            return Err(AddressError::PathEscape);
        }
        segments.push(seg);
    }
    Ok(segments.join("/"))
}

fn is_host_absolute(input: &str) -> bool {
    if input.starts_with("\\\\") {
        return true;
    }
    let bytes = input.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/') {
        return true;
    }
    for prefix in ["/Users/", "/home/"] {
        if let Some(rest) = input.strip_prefix(prefix) {
            if !rest.is_empty() {
                return true;
            }
        }
    }
    if let Some(rest) = input.strip_prefix("/mnt/") {
        if rest.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_root_address() {
        let p = parse("root:repo/src/server.py").unwrap();
        assert_eq!(p.namespace, Namespace::Root);
        assert_eq!(p.key, "repo");
        assert_eq!(p.relative_path, "src/server.py");
        assert_eq!(p.canonical_string(), "root:repo/src/server.py");
    }

    #[test]
    fn parses_canonical_mod_address() {
        let p = parse("mod:TestMod/common").unwrap();
        assert_eq!(p.namespace, Namespace::Mod);
        assert_eq!(p.key, "TestMod");
        assert_eq!(p.relative_path, "common");
    }

    #[test]
    fn root_only_address_has_empty_relative_path() {
        let p = parse("root:repo").unwrap();
        assert_eq!(p.relative_path, "");
        assert_eq!(p.canonical_string(), "root:repo");
    }

    #[test]
    fn legacy_root_underscore_form_normalizes() {
        let p = parse("ROOT_REPO:/src/server.py").unwrap();
        assert_eq!(p.namespace, Namespace::Root);
        assert_eq!(p.key, "repo");
        assert_eq!(p.canonical_string(), "root:repo/src/server.py");
    }

    #[test]
    fn legacy_mod_colon_slash_form_normalizes() {
        let p = parse("mod:TestMod:/common").unwrap();
        assert_eq!(p.key, "TestMod");
        assert_eq!(p.relative_path, "common");
        assert_eq!(p.canonical_string(), "mod:TestMod/common");
    }

    #[test]
    fn collapses_dot_segments_and_repeated_slashes() {
        let p = parse("root:repo/./src//server.py").unwrap();
        assert_eq!(p.relative_path, "src/server.py");
    }

    #[test]
    fn rejects_dot_dot_after_normalization() {
        assert_eq!(parse("root:repo/../../etc/passwd"), Err(AddressError::PathEscape));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(parse(""), Err(AddressError::EmptyInput));
    }

    #[test]
    fn rejects_bare_relative_path() {
        assert_eq!(parse("src/server.py"), Err(AddressError::MissingNamespace));
    }

    #[test]
    fn rejects_unknown_namespace() {
        assert_eq!(parse("foo:bar/baz"), Err(AddressError::UnknownNamespace("foo".into())));
    }

    #[test]
    fn rejects_windows_drive_absolute() {
        assert_eq!(parse("C:\\Users\\test\\file.txt"), Err(AddressError::HostAbsolute));
    }

    #[test]
    fn rejects_unc_absolute() {
        assert_eq!(parse("\\\\host\\share\\file"), Err(AddressError::HostAbsolute));
    }

    #[test]
    fn rejects_macos_home_absolute() {
        assert_eq!(parse("/Users/alice/secrets.txt"), Err(AddressError::HostAbsolute));
    }

    #[test]
    fn rejects_linux_home_absolute() {
        assert_eq!(parse("/home/alice/secrets.txt"), Err(AddressError::HostAbsolute));
    }

    #[test]
    fn rejects_wsl_mount_absolute() {
        assert_eq!(parse("/mnt/c/Users/alice"), Err(AddressError::HostAbsolute));
    }

    #[test]
    fn emit_then_parse_is_idempotent() {
        for input in [
            "root:repo/src/server.py",
            "ROOT_REPO:/src/server.py",
            "mod:TestMod:/common",
            "root:repo",
        ] {
            let once = parse(input).unwrap();
            let twice = parse(&once.canonical_string()).unwrap();
            assert_eq!(once.canonical_string(), twice.canonical_string());
            let thrice = parse(&twice.canonical_string()).unwrap();
            assert_eq!(twice.canonical_string(), thrice.canonical_string());
        }
    }
}
