//! The visibility matrix (C6): governs whether a resolved address is
//! allowed to exist from the agent's point of view at all.

use crate::condition::{all_true, Condition, Context};
use std::collections::HashMap;
use wa_session::RootKey;

/// `(mode, root_key, subdir)`. `subdir` is the first path segment under
/// the root, or `None` for the root itself / an entry with no
/// subdir-specific override.
pub type MatrixKey = (String, RootKey, Option<String>);

#[derive(Debug, Clone, Default)]
pub struct VisibilityRule {
    pub conditions: Vec<Condition>,
}

impl VisibilityRule {
    pub fn always_visible() -> Self {
        Self { conditions: Vec::new() }
    }

    pub fn gated_on(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    pub fn is_satisfied(&self, ctx: &Context) -> bool {
        all_true(&self.conditions, ctx)
    }
}

/// Keyed rule table. Lookup prefers an exact `(mode, root_key, Some(subdir))`
/// entry and falls back to the subdir-agnostic `(mode, root_key, None)`
/// entry when no exact match exists. An address with no
/// matching entry at all is invisible by default.
#[derive(Debug, Clone, Default)]
pub struct VisibilityMatrix {
    rules: HashMap<MatrixKey, VisibilityRule>,
}

impl VisibilityMatrix {
    pub fn new() -> Self {
        Self { rules: HashMap::new() }
    }

    pub fn insert(&mut self, mode: impl Into<String>, root_key: RootKey, subdir: Option<&str>, rule: VisibilityRule) {
        self.rules.insert((mode.into(), root_key, subdir.map(|s| s.to_string())), rule);
    }

    fn lookup(&self, mode: &str, root_key: RootKey, subdir: Option<&str>) -> Option<&VisibilityRule> {
        if let Some(subdir) = subdir {
            if let Some(rule) = self.rules.get(&(mode.to_string(), root_key, Some(subdir.to_string()))) {
                return Some(rule);
            }
        }
        self.rules.get(&(mode.to_string(), root_key, None))
    }

    /// Whether the given root/subdir is visible under `mode`, evaluated
    /// against `ctx`. No matching entry means not visible.
    pub fn is_visible(&self, mode: &str, root_key: RootKey, subdir: Option<&str>, ctx: &Context) -> bool {
        match self.lookup(mode, root_key, subdir) {
            Some(rule) => rule.is_satisfied(ctx),
            None => false,
        }
    }
}
