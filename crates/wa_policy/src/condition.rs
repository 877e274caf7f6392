//! Condition predicates (C8): independently named predicates evaluated
//! against a context bag. Conditions are pure and never raise -- an
//! internal error is a `false` (deny-by-default), never a panic or an
//! exception. Conditions do not own denial codes; the enforcer does.

use crate::whitelist::CommandWhitelist;
use std::path::Path;
use wa_session::SessionMods;

/// Everything a condition might need to consult. Fields that require an
/// external call (contract lookup, HMAC verification) are precomputed by
/// the caller before evaluation -- conditions themselves never reach out.
#[derive(Default)]
pub struct Context<'a> {
    pub has_contract: bool,
    /// Result of verifying the active contract's script signature
    /// (delegates to the script-approval verifier, C11) -- precomputed.
    pub exec_signed: bool,
    pub host_abs: Option<&'a Path>,
    pub session_mods: Option<&'a SessionMods>,
    pub raw_command: Option<&'a str>,
    pub whitelist: Option<&'a CommandWhitelist>,
}

/// A named predicate: `{name, check}`. Callers evaluate by calling `check`;
/// the name alone is what gets surfaced in a denial reply's
/// `failed_conditions` diagnostic field.
#[derive(Clone, Copy)]
pub struct Condition {
    pub name: &'static str,
    pub check: fn(&Context) -> bool,
}

impl Condition {
    pub fn evaluate(&self, ctx: &Context) -> bool {
        (self.check)(ctx)
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition").field("name", &self.name).finish()
    }
}

fn check_has_contract(ctx: &Context) -> bool {
    ctx.has_contract
}

fn check_exec_signed(ctx: &Context) -> bool {
    ctx.exec_signed
}

fn check_path_in_active_mods(ctx: &Context) -> bool {
    match (ctx.host_abs, ctx.session_mods) {
        (Some(path), Some(mods)) => mods.find_mod_containing(path).is_some(),
        _ => false,
    }
}

fn check_command_whitelisted(ctx: &Context) -> bool {
    match (ctx.raw_command, ctx.whitelist) {
        (Some(cmd), Some(wl)) => wl.is_whitelisted(cmd),
        _ => false,
    }
}

pub const HAS_CONTRACT: Condition = Condition { name: "has_contract", check: check_has_contract };
pub const EXEC_SIGNED: Condition = Condition { name: "exec_signed", check: check_exec_signed };
pub const PATH_IN_ACTIVE_MODS: Condition =
    Condition { name: "path_in_active_mods", check: check_path_in_active_mods };
pub const COMMAND_WHITELISTED: Condition =
    Condition { name: "command_whitelisted", check: check_command_whitelisted };

/// All conditions false -> false. Any true -> true. Used for the exec
/// `command_whitelisted ∨ exec_signed` gate used by the exec rule.
pub fn any_true(conditions: &[Condition], ctx: &Context) -> bool {
    conditions.iter().any(|c| c.evaluate(ctx))
}

/// All conditions must be true. Used for ordinary mutation rules.
pub fn all_true(conditions: &[Condition], ctx: &Context) -> bool {
    conditions.iter().all(|c| c.evaluate(ctx))
}

/// Names of the conditions in `conditions` that evaluated false, in
/// declaration order -- used to populate a denial reply's diagnostics.
pub fn failed_names(conditions: &[Condition], ctx: &Context) -> Vec<&'static str> {
    conditions.iter().filter(|c| !c.evaluate(ctx)).map(|c| c.name).collect()
}
