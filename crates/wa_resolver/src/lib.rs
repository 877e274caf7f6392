//! wa_resolver — the single entry point (C4) that turns an agent-supplied
//! canonical address into a validated host path and an unforgeable
//! capability reference.
//!
//! This crate composes every other triad crate but adds no policy logic of
//! its own: address grammar lives in `wa_address`, root/session lookups in
//! `wa_session`, visibility gating in `wa_policy`, and token minting in
//! `wa_capability`. `resolve` is the one place all four meet.

use std::path::{Path, PathBuf};

use wa_address::Namespace;
use wa_capability::{CapRef, CapabilityRegistry};
use wa_policy::{CommandWhitelist, Context as PolicyContext, VisibilityMatrix};
use wa_reply::{codes, Reply};
use wa_session::{ModeSource, RootKey, RootMap, SessionMods};

/// Everything `resolve` needs beyond the input string. Borrowed for the
/// duration of the call; nothing here is owned or cached by this crate.
pub struct ResolveContext<'a> {
    pub roots: &'a RootMap,
    pub mods: &'a SessionMods,
    pub visibility: &'a VisibilityMatrix,
    pub registry: &'a CapabilityRegistry,
    pub mode_source: &'a dyn ModeSource,
    pub has_contract: bool,
    pub exec_signed: bool,
    pub raw_command: Option<&'a str>,
    pub whitelist: Option<&'a CommandWhitelist>,
}

/// `mod:` addresses have no root key of their own in the closed `RootKey`
/// set. Root keys are defined independently of the session mod list.
/// Mods are game-content overlays, so for matrix purposes a `mod:` address
/// is keyed as if it were `root_key = game` — the same domain the mod
/// content physically extends. This is a deliberate open-question
/// resolution, not an implied equivalence between the two namespaces:
/// `resolved.namespace` still preserves `mod:` on output (spec invariant,
/// §3 "namespace preservation").
const MOD_NAMESPACE_MATRIX_ROOT: RootKey = RootKey::Game;

fn lexically_normalize(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn first_segment(relative_path: &str) -> Option<String> {
    if relative_path.is_empty() {
        return None;
    }
    relative_path.split('/').next().map(|s| s.to_string())
}

/// Resolve `input` to a capability reference under the current mode.
///
/// Returns `(Reply, Some(CapRef))` on success, `(Reply, None)` otherwise.
/// Never panics on malformed or adversarial input; every failure path
/// returns a typed reply. Errors never unwind across the API boundary.
pub fn resolve(input: &str, require_exists: bool, ctx: &ResolveContext) -> (Reply, Option<CapRef>) {
    let Some(mode) = ctx.mode_source.current_mode() else {
        return (Reply::new(codes::WA_SYS_I_001, "agent mode is not initialized"), None);
    };

    let parsed = match wa_address::parse(input) {
        Ok(p) => p,
        Err(e) => {
            return (
                Reply::new(codes::WA_RES_I_001, "address could not be parsed").with_data("parse_error", e.to_string()),
                None,
            )
        }
    };

    let (root_key, root_host): (RootKey, &Path) = match parsed.namespace {
        Namespace::Root => {
            let Ok(root_key) = parsed.key.parse::<RootKey>() else {
                return (Reply::new(codes::WA_RES_I_001, "unknown root key").with_data("key", parsed.key.clone()), None);
            };
            let Some(host) = ctx.roots.host_path(root_key) else {
                return (
                    Reply::new(codes::WA_RES_I_001, "root key has no configured host path")
                        .with_data("root_key", root_key.as_str()),
                    None,
                );
            };
            (root_key, host)
        }
        Namespace::Mod => {
            let Some(host) = ctx.mods.lookup(&parsed.key) else {
                return (
                    Reply::new(codes::WA_RES_I_001, "mod is not in the active session playset")
                        .with_data("mod_name", parsed.key.clone()),
                    None,
                );
            };
            (MOD_NAMESPACE_MATRIX_ROOT, host)
        }
    };

    let host_abs = lexically_normalize(&root_host.join(&parsed.relative_path));
    let normalized_root = lexically_normalize(root_host);
    if !host_abs.starts_with(&normalized_root) {
        return (Reply::new(codes::WA_RES_I_001, "resolved path escapes its root"), None);
    }

    let subdirectory = first_segment(&parsed.relative_path);

    let policy_ctx = PolicyContext {
        has_contract: ctx.has_contract,
        exec_signed: ctx.exec_signed,
        host_abs: Some(host_abs.as_path()),
        session_mods: Some(ctx.mods),
        raw_command: ctx.raw_command,
        whitelist: ctx.whitelist,
    };

    if !ctx.visibility.is_visible(&mode, root_key, subdirectory.as_deref(), &policy_ctx) {
        return (Reply::new(codes::WA_RES_I_001, "address is not visible under the current mode"), None);
    }

    if require_exists && !host_abs.exists() {
        return (Reply::new(codes::WA_RES_I_001, "resolved path does not exist"), None);
    }

    let resolved = parsed.canonical_string();
    match ctx.registry.mint(host_abs, resolved.clone()) {
        Ok(cap) => {
            let reply = Reply::new(codes::WA_RES_S_001, "address resolved")
                .with_data("resolved", resolved)
                .with_data("root_key", root_key.as_str())
                .with_data(
                    "subdirectory",
                    subdirectory.map(serde_json::Value::String).unwrap_or(serde_json::Value::Null),
                )
                .with_data("relative_path", parsed.relative_path.clone());
            (reply, Some(cap))
        }
        Err(_) => (Reply::new(codes::WA_RES_E_001, "capability registry capacity exceeded — restart"), None),
    }
}
