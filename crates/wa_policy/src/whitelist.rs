//! Loader for `policy/command_whitelist.json` — the table `exec`
//! consults when a contract carries no signed script.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SUPPORTED_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Error)]
pub enum WhitelistError {
    #[error("failed to parse command whitelist: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported command whitelist schema_version {found:?}, expected {SUPPORTED_SCHEMA_VERSION:?}")]
    UnsupportedSchema { found: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WhitelistDoc {
    schema_version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    commands: Vec<String>,
}

/// A closed list of allowed command prefixes. Missing or empty means
/// nothing is whitelisted — there is no implicit allow.
#[derive(Debug, Clone, Default)]
pub struct CommandWhitelist {
    patterns: Vec<String>,
}

impl CommandWhitelist {
    pub fn empty() -> Self {
        Self { patterns: Vec::new() }
    }

    pub fn from_json(text: &str) -> Result<Self, WhitelistError> {
        let doc: WhitelistDoc = serde_json::from_str(text)?;
        if doc.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(WhitelistError::UnsupportedSchema { found: doc.schema_version });
        }
        Ok(Self { patterns: doc.commands })
    }

    /// A command is whitelisted when it exactly equals a listed pattern, or
    /// when the pattern is a whitespace-delimited prefix of it
    /// (`pattern == cmd || cmd.starts_with(pattern + " ")`). A pattern that
    /// merely shares a character prefix (`"git"` vs `"github"`) does not
    /// match.
    pub fn is_whitelisted(&self, cmd: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern == cmd || cmd.starts_with(&format!("{pattern} ")))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
