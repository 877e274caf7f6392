//! wa_enforcer — the enforcer (C9): decides whether a specific
//! `(tool, command)` invocation against an already-resolved
//! `(root_key, subdir)` is permitted under the operations matrix.
//!
//! The enforcer never touches the filesystem or the capability registry —
//! it operates purely on the coordinates the resolver already produced
//! plus the caller's context bag, which keeps it deterministic and
//! hermetic to test.

use std::path::Path;

use wa_policy::operations::CommandMatch;
use wa_policy::{CommandWhitelist, Context as PolicyContext, OperationsMatrix};
use wa_reply::{codes, Reply};
use wa_session::{RootKey, SessionMods};

pub struct EnforceContext<'a> {
    pub operations: &'a OperationsMatrix,
    pub has_contract: bool,
    pub exec_signed: bool,
    pub host_abs: Option<&'a Path>,
    pub session_mods: Option<&'a SessionMods>,
    pub raw_command: Option<&'a str>,
    pub whitelist: Option<&'a CommandWhitelist>,
}

/// Decide whether `tool` executing `command` is permitted against
/// `(root_key, subdir)` under `mode`.
pub fn enforce(
    mode: &str,
    tool: &str,
    command: &str,
    root_key: RootKey,
    subdir: Option<&str>,
    ctx: &EnforceContext,
) -> Reply {
    let Some(rule) = ctx.operations.select_rule(mode, root_key, subdir, tool, command) else {
        return Reply::new(codes::EN_GATE_D_001, "no matching rule in the operations matrix");
    };

    if rule.conditions.is_empty() {
        return Reply::new(codes::EN_READ_S_001, "read permitted");
    }

    let policy_ctx = PolicyContext {
        has_contract: ctx.has_contract,
        exec_signed: ctx.exec_signed,
        host_abs: ctx.host_abs,
        session_mods: ctx.session_mods,
        raw_command: ctx.raw_command,
        whitelist: ctx.whitelist,
    };

    let failed = wa_policy::condition::failed_names(&rule.conditions, &policy_ctx);
    if !failed.is_empty() {
        let denial_code = if matches!(rule.commands, CommandMatch::Exec) {
            codes::EN_EXEC_D_001
        } else {
            codes::EN_WRITE_D_001
        };
        let message = if matches!(rule.commands, CommandMatch::Exec) {
            "exec denied: unsigned and not whitelisted"
        } else {
            "mutation denied by policy"
        };
        return Reply::new(denial_code, message)
            .with_data("failed_conditions", serde_json::Value::Array(failed.into_iter().map(Into::into).collect()));
    }

    Reply::new(codes::EN_WRITE_S_001, "mutation permitted")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wa_policy::condition::{EXEC_SIGNED, HAS_CONTRACT};
    use wa_policy::operations::OperationRule;

    fn base_ctx(operations: &OperationsMatrix) -> EnforceContext<'_> {
        EnforceContext {
            operations,
            has_contract: false,
            exec_signed: false,
            host_abs: None,
            session_mods: None,
            raw_command: None,
            whitelist: None,
        }
    }

    #[test]
    fn missing_entry_denies_with_gate_code() {
        let matrix = OperationsMatrix::new();
        let ctx = base_ctx(&matrix);
        let reply = enforce("ck3raven-dev", "file", "read", RootKey::Repo, Some("src"), &ctx);
        assert_eq!(reply.code, codes::EN_GATE_D_001);
    }

    #[test]
    fn read_rule_with_no_conditions_is_immediate_success() {
        let mut matrix = OperationsMatrix::new();
        matrix.insert(
            "ck3raven-dev",
            RootKey::Repo,
            None,
            vec![OperationRule::all(CommandMatch::set([("file", "read")]), vec![])],
        );
        let ctx = base_ctx(&matrix);
        let reply = enforce("ck3raven-dev", "file", "read", RootKey::Repo, Some("src"), &ctx);
        assert_eq!(reply.code, codes::EN_READ_S_001);
    }

    #[test]
    fn write_without_contract_is_denied_with_failed_conditions() {
        let mut matrix = OperationsMatrix::new();
        matrix.insert(
            "ck3raven-dev",
            RootKey::Repo,
            None,
            vec![OperationRule::all(CommandMatch::set([("file", "write")]), vec![HAS_CONTRACT])],
        );
        let mut ctx = base_ctx(&matrix);
        ctx.has_contract = false;
        let reply = enforce("ck3raven-dev", "file", "write", RootKey::Repo, Some("src"), &ctx);
        assert_eq!(reply.code, codes::EN_WRITE_D_001);
        assert_eq!(
            reply.data.get("failed_conditions").unwrap(),
            &serde_json::json!(["has_contract"])
        );
    }

    #[test]
    fn write_with_contract_succeeds() {
        let mut matrix = OperationsMatrix::new();
        matrix.insert(
            "ck3raven-dev",
            RootKey::Repo,
            None,
            vec![OperationRule::all(CommandMatch::set([("file", "write")]), vec![HAS_CONTRACT])],
        );
        let mut ctx = base_ctx(&matrix);
        ctx.has_contract = true;
        let reply = enforce("ck3raven-dev", "file", "write", RootKey::Repo, Some("src"), &ctx);
        assert_eq!(reply.code, codes::EN_WRITE_S_001);
    }

    #[test]
    fn exec_denial_uses_exec_specific_code() {
        let mut matrix = OperationsMatrix::new();
        matrix.insert(
            "ck3raven-dev",
            RootKey::Ck3ravenData,
            Some("wip"),
            vec![OperationRule::all(CommandMatch::Exec, vec![EXEC_SIGNED])],
        );
        let ctx = base_ctx(&matrix);
        let reply = enforce("ck3raven-dev", "exec", "git status --short", RootKey::Ck3ravenData, Some("wip"), &ctx);
        assert_eq!(reply.code, codes::EN_EXEC_D_001);
    }

    #[test]
    fn exec_whitelisted_command_succeeds_without_signature() {
        let whitelist = CommandWhitelist::from_json(
            r#"{"schema_version":"1","description":"ok","commands":["git status"]}"#,
        )
        .unwrap();
        let mut matrix = OperationsMatrix::new();
        matrix.insert(
            "ck3raven-dev",
            RootKey::Ck3ravenData,
            Some("wip"),
            vec![OperationRule::all(CommandMatch::Exec, vec![wa_policy::condition::COMMAND_WHITELISTED])],
        );
        let mut ctx = base_ctx(&matrix);
        ctx.raw_command = Some("git status --short");
        ctx.whitelist = Some(&whitelist);
        let reply = enforce("ck3raven-dev", "exec", "git status --short", RootKey::Ck3ravenData, Some("wip"), &ctx);
        assert_eq!(reply.code, codes::EN_WRITE_S_001);
    }

    #[test]
    fn denied_storage_daemon_subdir_has_no_rules_at_all() {
        let mut matrix = OperationsMatrix::new();
        matrix.insert("ck3raven-dev", RootKey::Ck3ravenData, Some("db"), vec![]);
        let ctx = base_ctx(&matrix);
        let reply = enforce("ck3raven-dev", "exec", "git status", RootKey::Ck3ravenData, Some("db"), &ctx);
        assert_eq!(reply.code, codes::EN_GATE_D_001);
    }
}
