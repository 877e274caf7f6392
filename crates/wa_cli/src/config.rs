//! Process-wide configuration, read once at startup. Mirrors the shape of
//! `PolicyGate::from_env` from the
//! pack's policy-gate example: every field comes from an environment
//! variable, with a `.env` file loaded first on a best-effort basis the
//! same way `pie_control_cli` does it.

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use wa_session::{ModEntry, RootKey, RootMap, SessionMods};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("WA_SESSION_SECRET must be set and non-empty")]
    MissingSessionSecret,
    #[error("WA_SESSION_ID must be set and non-empty")]
    MissingSessionId,
    #[error("failed to read mods file {path}: {source}")]
    ModsFileIo { path: PathBuf, source: std::io::Error },
    #[error("failed to parse mods file {path}: {source}")]
    ModsFileJson { path: PathBuf, source: serde_json::Error },
    #[error(transparent)]
    Approval(#[from] wa_approval::ApprovalError),
}

#[derive(Debug, serde::Deserialize)]
struct ModEntryDoc {
    name: String,
    host_path: PathBuf,
}

/// One environment variable per root key, e.g. `WA_ROOT_REPO`,
/// `WA_ROOT_USER_DOCS`. A root with no variable set is simply absent from
/// the map — callers see it as "no configured host path".
const ROOT_ENV_VARS: &[(RootKey, &str)] = &[
    (RootKey::Repo, "WA_ROOT_REPO"),
    (RootKey::Game, "WA_ROOT_GAME"),
    (RootKey::Steam, "WA_ROOT_STEAM"),
    (RootKey::UserDocs, "WA_ROOT_USER_DOCS"),
    (RootKey::Ck3ravenData, "WA_ROOT_CK3RAVEN_DATA"),
    (RootKey::Vscode, "WA_ROOT_VSCODE"),
];

pub struct Config {
    pub roots: RootMap,
    pub mods: SessionMods,
    pub max_tokens: usize,
    pub whitelist_path: Option<PathBuf>,
    pub session_secret: wa_approval::SessionSecret,
    pub session_id: String,
}

impl Config {
    /// Loads `.env` (if present, best-effort, same search order as
    /// `pie_control_cli`: repo-root-relative then CWD) and reads every
    /// field from the environment exactly once.
    pub fn from_env(repo_root: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        if let Some(root) = repo_root {
            let candidate = root.join(".env");
            if candidate.exists() {
                let _ = dotenvy::from_path(&candidate);
            }
        } else if std::path::Path::new(".env").exists() {
            let _ = dotenvy::from_path(".env");
        }

        let mut roots = HashMap::new();
        for (key, var) in ROOT_ENV_VARS {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    roots.insert(*key, PathBuf::from(value));
                }
            }
        }

        let mods = match std::env::var("WA_MODS_FILE") {
            Ok(path) if !path.is_empty() => Self::load_mods(PathBuf::from(path))?,
            _ => SessionMods::new(Vec::new()),
        };

        let max_tokens = std::env::var("WA_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(wa_capability::DEFAULT_MAX_TOKENS);

        let whitelist_path = std::env::var("WA_WHITELIST_PATH").ok().filter(|v| !v.is_empty()).map(PathBuf::from);

        let secret_raw = std::env::var("WA_SESSION_SECRET").unwrap_or_default();
        if secret_raw.is_empty() {
            return Err(ConfigError::MissingSessionSecret);
        }
        let session_secret = wa_approval::SessionSecret::new(secret_raw.into_bytes())?;

        let session_id = std::env::var("WA_SESSION_ID").unwrap_or_default();
        if session_id.is_empty() {
            return Err(ConfigError::MissingSessionId);
        }

        Ok(Self { roots: RootMap::new(roots), mods, max_tokens, whitelist_path, session_secret, session_id })
    }

    fn load_mods(path: PathBuf) -> Result<SessionMods, ConfigError> {
        let text =
            std::fs::read_to_string(&path).map_err(|source| ConfigError::ModsFileIo { path: path.clone(), source })?;
        let docs: Vec<ModEntryDoc> =
            serde_json::from_str(&text).map_err(|source| ConfigError::ModsFileJson { path, source })?;
        Ok(SessionMods::new(docs.into_iter().map(|d| ModEntry { name: d.name, host_path: d.host_path }).collect()))
    }

    pub fn load_whitelist(&self) -> wa_policy::CommandWhitelist {
        let Some(path) = &self.whitelist_path else {
            return wa_policy::CommandWhitelist::empty();
        };
        match std::fs::read_to_string(path) {
            Ok(text) => wa_policy::CommandWhitelist::from_json(&text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, path = %path.display(), "failed to parse command whitelist, treating as empty");
                wa_policy::CommandWhitelist::empty()
            }),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to read command whitelist, treating as empty");
                wa_policy::CommandWhitelist::empty()
            }
        }
    }
}
