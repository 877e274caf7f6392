//! wa_session — the root & session model (C2).
//!
//! The root map is an immutable mapping of root keys to host directories,
//! fixed for the lifetime of the process. The session mod list is owned by
//! the caller (typically the agent tool frontend) and is read fresh on
//! every call — this crate never caches or derives a parallel copy.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;
use thiserror::Error;

/// The closed set of root keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RootKey {
    Repo,
    Game,
    Steam,
    UserDocs,
    Ck3ravenData,
    Vscode,
}

impl RootKey {
    pub const ALL: [RootKey; 6] = [
        RootKey::Repo,
        RootKey::Game,
        RootKey::Steam,
        RootKey::UserDocs,
        RootKey::Ck3ravenData,
        RootKey::Vscode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RootKey::Repo => "repo",
            RootKey::Game => "game",
            RootKey::Steam => "steam",
            RootKey::UserDocs => "user_docs",
            RootKey::Ck3ravenData => "ck3raven_data",
            RootKey::Vscode => "vscode",
        }
    }
}

impl std::fmt::Display for RootKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown root key: {0}")]
pub struct UnknownRootKey(pub String);

impl FromStr for RootKey {
    type Err = UnknownRootKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RootKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownRootKey(s.to_string()))
    }
}

/// Immutable mapping of root keys to host directories. Built once at process
/// start; every lookup afterwards is read-only.
#[derive(Debug, Clone)]
pub struct RootMap {
    roots: HashMap<RootKey, PathBuf>,
}

impl RootMap {
    pub fn new(roots: HashMap<RootKey, PathBuf>) -> Self {
        Self { roots }
    }

    pub fn host_path(&self, key: RootKey) -> Option<&Path> {
        self.roots.get(&key).map(PathBuf::as_path)
    }

    pub fn contains(&self, key: RootKey) -> bool {
        self.roots.contains_key(&key)
    }
}

/// A named mod overlay: `(name, host_path)`.
#[derive(Debug, Clone)]
pub struct ModEntry {
    pub name: String,
    pub host_path: PathBuf,
}

/// The session's ordered, authoritative list of active mods ("the playset").
/// Never derived, filtered, or cached elsewhere.
#[derive(Debug, Clone, Default)]
pub struct SessionMods {
    mods: Vec<ModEntry>,
}

impl SessionMods {
    pub fn new(mods: Vec<ModEntry>) -> Self {
        Self { mods }
    }

    pub fn entries(&self) -> &[ModEntry] {
        &self.mods
    }

    /// Host directory of the named mod, or `None` if it is not in the
    /// active list.
    pub fn lookup(&self, name: &str) -> Option<&Path> {
        self.mods
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.host_path.as_path())
    }

    /// First mod (in playset order) whose host root is a segment-aligned
    /// prefix of `host_path`. Used only by the `path_in_active_mods`
    /// condition predicate — never as a general containment test.
    pub fn find_mod_containing(&self, host_path: &Path) -> Option<&str> {
        self.mods
            .iter()
            .find(|m| host_path.starts_with(&m.host_path))
            .map(|m| m.name.as_str())
    }
}

/// Source of the current agent mode, read lazily on every `resolve`/
/// `enforce` call. `None` means the mode is not yet initialized.
pub trait ModeSource: Send + Sync {
    fn current_mode(&self) -> Option<String>;
}

/// An in-memory `ModeSource` backed by a `RwLock`, set once at process
/// start (or updated by whatever owns the agent session) and read on
/// every call thereafter. The default implementation for embedders that
/// don't need an environment- or header-backed source.
#[derive(Debug, Default)]
pub struct StaticModeSource {
    mode: RwLock<Option<String>>,
}

impl StaticModeSource {
    pub fn new(mode: Option<String>) -> Self {
        Self { mode: RwLock::new(mode) }
    }

    pub fn set_mode(&self, mode: Option<String>) {
        // Recover a poisoned lock rather than panicking: `current_mode` feeds
        // directly into `wa_resolver::resolve`'s step-1 mode check, and per
        // spec §7 infrastructure trouble must never unwind across that public
        // entry point.
        *self.mode.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = mode;
    }
}

impl ModeSource for StaticModeSource {
    fn current_mode(&self) -> Option<String> {
        self.mode.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

/// Reads the mode from an environment variable on every call. Useful for
/// CLI-driven or test-harness deployments where the mode is fixed for the
/// lifetime of the process but shouldn't be threaded through explicitly.
#[derive(Debug, Clone)]
pub struct EnvModeSource {
    var_name: String,
}

impl EnvModeSource {
    pub fn new(var_name: impl Into<String>) -> Self {
        Self { var_name: var_name.into() }
    }
}

impl ModeSource for EnvModeSource {
    fn current_mode(&self) -> Option<String> {
        std::env::var(&self.var_name).ok().filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_key_round_trips_through_str() {
        for k in RootKey::ALL {
            assert_eq!(RootKey::from_str(k.as_str()).unwrap(), k);
        }
    }

    #[test]
    fn unknown_root_key_is_rejected() {
        assert_eq!(
            RootKey::from_str("nope"),
            Err(UnknownRootKey("nope".to_string()))
        );
    }

    #[test]
    fn root_map_lookup() {
        let mut m = HashMap::new();
        m.insert(RootKey::Repo, PathBuf::from("/srv/repo"));
        let map = RootMap::new(m);
        assert_eq!(map.host_path(RootKey::Repo), Some(Path::new("/srv/repo")));
        assert_eq!(map.host_path(RootKey::Game), None);
    }

    #[test]
    fn find_mod_containing_is_segment_aligned() {
        let mods = SessionMods::new(vec![
            ModEntry { name: "Foo".into(), host_path: PathBuf::from("/mods/foo") },
            ModEntry { name: "FooBar".into(), host_path: PathBuf::from("/mods/foobar") },
        ]);
        // "/mods/foobar/x" must not match "/mods/foo" (no segment boundary).
        assert_eq!(mods.find_mod_containing(Path::new("/mods/foobar/x")), Some("FooBar"));
        assert_eq!(mods.find_mod_containing(Path::new("/mods/foo/x")), Some("Foo"));
        assert_eq!(mods.find_mod_containing(Path::new("/mods/other/x")), None);
    }

    #[test]
    fn lookup_returns_first_match() {
        let mods = SessionMods::new(vec![ModEntry { name: "A".into(), host_path: PathBuf::from("/a") }]);
        assert_eq!(mods.lookup("A"), Some(Path::new("/a")));
        assert_eq!(mods.lookup("B"), None);
    }

    #[test]
    fn static_mode_source_starts_unset_and_is_updatable() {
        let source = StaticModeSource::default();
        assert_eq!(source.current_mode(), None);
        source.set_mode(Some("ck3lens".to_string()));
        assert_eq!(source.current_mode(), Some("ck3lens".to_string()));
    }

    #[test]
    fn env_mode_source_reads_each_call() {
        // std::env is process-global; use a name unlikely to collide with
        // anything else in the test binary.
        let var = "WA_TEST_MODE_SOURCE_ENV";
        std::env::remove_var(var);
        let source = EnvModeSource::new(var);
        assert_eq!(source.current_mode(), None);
        std::env::set_var(var, "ck3raven-dev");
        assert_eq!(source.current_mode(), Some("ck3raven-dev".to_string()));
        std::env::remove_var(var);
    }
}
