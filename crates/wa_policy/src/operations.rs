//! The operations matrix (C7): governs which operations (read, write,
//! delete, exec with a particular command) are permitted against a given
//! root/subdir under a given mode.

use crate::condition::{all_true, any_true, Condition, Context};
use std::collections::{HashMap, HashSet};
use wa_session::RootKey;

/// How a rule's condition tuple combines. Ordinary mutation rules require
/// every condition (`All`); the exec sentinel's illustrative policy
/// ("exec iff `command_whitelisted ∨ exec_signed`") requires only one
/// (`Any`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionGate {
    #[default]
    All,
    Any,
}

pub type MatrixKey = (String, RootKey, Option<String>);

/// What an operation rule matches against. `Set` covers ordinary
/// `(tool, command)` pairs such as `("file", "write")` or `("git", "mutate")`;
/// `Exec` is its own variant rather than a sentinel tuple so matching never
/// relies on magic-string comparisons against the command set.
#[derive(Debug, Clone)]
pub enum CommandMatch {
    Set(HashSet<(String, String)>),
    Exec,
}

impl CommandMatch {
    pub fn set(entries: impl IntoIterator<Item = (&'static str, &'static str)>) -> Self {
        CommandMatch::Set(entries.into_iter().map(|(v, p)| (v.to_string(), p.to_string())).collect())
    }

    fn matches(&self, verb: &str, pattern: &str) -> bool {
        match self {
            CommandMatch::Set(set) => {
                set.contains(&(verb.to_string(), pattern.to_string()))
                    || set.contains(&(verb.to_string(), "*".to_string()))
            }
            CommandMatch::Exec => verb == "exec",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperationRule {
    pub commands: CommandMatch,
    pub conditions: Vec<Condition>,
    pub gate: ConditionGate,
}

impl Default for CommandMatch {
    fn default() -> Self {
        CommandMatch::Set(HashSet::new())
    }
}

impl OperationRule {
    pub fn all(commands: CommandMatch, conditions: Vec<Condition>) -> Self {
        Self { commands, conditions, gate: ConditionGate::All }
    }

    pub fn any(commands: CommandMatch, conditions: Vec<Condition>) -> Self {
        Self { commands, conditions, gate: ConditionGate::Any }
    }

    pub fn is_satisfied(&self, ctx: &Context) -> bool {
        match self.gate {
            ConditionGate::All => all_true(&self.conditions, ctx),
            ConditionGate::Any => any_true(&self.conditions, ctx),
        }
    }
}

/// Keyed the same way as the visibility matrix, with the identical
/// exact-then-fallback-to-subdir-agnostic lookup strategy: both matrices
/// share the `(mode, root_key, subdir)` key shape, and the resolver's
/// visibility lookup only spells this fallback out for the visibility
/// matrix. Applying it
/// uniformly here avoids a root that is visible under a subdir but whose
/// operations silently fall through to "no rule configured" instead of
/// inheriting the root-level rule an operator clearly intended to cover it.
#[derive(Debug, Clone, Default)]
pub struct OperationsMatrix {
    rules: HashMap<MatrixKey, Vec<OperationRule>>,
}

impl OperationsMatrix {
    pub fn new() -> Self {
        Self { rules: HashMap::new() }
    }

    pub fn insert(
        &mut self,
        mode: impl Into<String>,
        root_key: RootKey,
        subdir: Option<&str>,
        rules: Vec<OperationRule>,
    ) {
        self.rules.insert((mode.into(), root_key, subdir.map(|s| s.to_string())), rules);
    }

    fn lookup(&self, mode: &str, root_key: RootKey, subdir: Option<&str>) -> Option<&[OperationRule]> {
        if let Some(subdir) = subdir {
            if let Some(rules) = self.rules.get(&(mode.to_string(), root_key, Some(subdir.to_string()))) {
                return Some(rules);
            }
        }
        self.rules.get(&(mode.to_string(), root_key, None)).map(Vec::as_slice)
    }

    /// The first rule (in declaration order) whose command set matches
    /// `(verb, pattern)`, scoped to the entry selected by the usual
    /// exact-then-fallback key lookup. `None` when no entry, or no rule
    /// within it, matches — the enforcer treats both as `EN-GATE-D-001`.
    pub fn select_rule(
        &self,
        mode: &str,
        root_key: RootKey,
        subdir: Option<&str>,
        verb: &str,
        pattern: &str,
    ) -> Option<&OperationRule> {
        self.lookup(mode, root_key, subdir)?.iter().find(|r| r.commands.matches(verb, pattern))
    }

    /// Whether `verb` (and, for non-exec verbs, `pattern`) is permitted,
    /// evaluated against `ctx`. No matching rule at all, or a matching rule
    /// whose conditions are unsatisfied, means denied.
    pub fn is_permitted(
        &self,
        mode: &str,
        root_key: RootKey,
        subdir: Option<&str>,
        verb: &str,
        pattern: &str,
        ctx: &Context,
    ) -> bool {
        match self.lookup(mode, root_key, subdir) {
            Some(rules) => rules
                .iter()
                .filter(|r| r.commands.matches(verb, pattern))
                .any(|r| r.is_satisfied(ctx)),
            None => false,
        }
    }

    /// Names of the conditions that failed on the first matching rule, for
    /// denial diagnostics. Empty if no rule matched at all.
    pub fn failed_condition_names(
        &self,
        mode: &str,
        root_key: RootKey,
        subdir: Option<&str>,
        verb: &str,
        pattern: &str,
        ctx: &Context,
    ) -> Vec<&'static str> {
        match self.lookup(mode, root_key, subdir) {
            Some(rules) => rules
                .iter()
                .find(|r| r.commands.matches(verb, pattern))
                .map(|r| crate::condition::failed_names(&r.conditions, ctx))
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }
}
