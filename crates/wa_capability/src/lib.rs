//! wa_capability — the capability registry (C3) and capability reference
//! value type.
//!
//! The registry is the only mutable shared state in the whole triad. All
//! access is serialized through one mutex, held only across the map
//! operation itself — never across filesystem I/O.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_MAX_TOKENS: usize = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("capability registry capacity exceeded — restart")]
pub struct CapacityExceeded;

/// The agent's only handle to a resolved target. Exposes exactly two
/// read-only fields; there is no way to recover a host path from this type.
/// `Display` yields the canonical address, never the host path — `Debug`
/// likewise never touches a host path because this struct doesn't hold one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapRef {
    token: Uuid,
    session_abs: String,
}

impl CapRef {
    fn new(token: Uuid, session_abs: String) -> Self {
        Self { token, session_abs }
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn session_abs(&self) -> &str {
        &self.session_abs
    }
}

impl std::fmt::Display for CapRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.session_abs)
    }
}

/// `token -> host_path`, guarded by a single mutex. Minted entries live
/// until process exit; there is no eviction.
pub struct CapabilityRegistry {
    max_tokens: usize,
    entries: Mutex<HashMap<Uuid, PathBuf>>,
}

impl CapabilityRegistry {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens, entries: Mutex::new(HashMap::new()) }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }

    /// Mint a fresh capability for `host_path`, bound to `session_abs` (the
    /// canonical address string the agent will see). Fails once the
    /// registry is at capacity; mints nothing on failure.
    pub fn mint(&self, host_path: PathBuf, session_abs: String) -> Result<CapRef, CapacityExceeded> {
        // A poisoned lock means some other holder panicked mid-access, not that
        // this map's invariants are broken (no I/O ever happens under the
        // lock). Recover the guard rather than propagating the panic across
        // this call -- per spec §7, infrastructure trouble here must degrade
        // to a typed reply upstream, never unwind.
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if entries.len() >= self.max_tokens {
            return Err(CapacityExceeded);
        }
        let token = Uuid::new_v4();
        entries.insert(token, host_path);
        Ok(CapRef::new(token, session_abs))
    }

    /// Resolve a capability back to its host path. Only legitimate
    /// host-path consumers (the I/O layer behind the frontend) call this.
    /// A fabricated or revoked token yields `None`, never a panic.
    pub fn resolve(&self, token: Uuid) -> Option<PathBuf> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(&token).cloned()
    }

    pub fn resolve_cap(&self, cap: &CapRef) -> Option<PathBuf> {
        self.resolve(cap.token())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
