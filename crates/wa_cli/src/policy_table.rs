//! The illustrative visibility/operations policy, concretized as the CLI's
//! shipped default tables. A real deployment would load these from its own
//! config store; this crate stands in for the agent tool frontend, so it
//! ships the example policy verbatim rather than inventing a config-file
//! loader format.

use wa_policy::condition::{COMMAND_WHITELISTED, EXEC_SIGNED, HAS_CONTRACT, PATH_IN_ACTIVE_MODS};
use wa_policy::operations::{CommandMatch, OperationRule};
use wa_policy::visibility::VisibilityRule;
use wa_policy::{OperationsMatrix, VisibilityMatrix};
use wa_session::RootKey;

const CK3LENS: &str = "ck3lens";
const CK3RAVEN_DEV: &str = "ck3raven-dev";
/// Both shipped modes — used to approximate the illustrative policy's `*`
/// ("any mode") wildcard, since the matrices here are keyed on concrete
/// mode strings.
const ALL_MODES: &[&str] = &[CK3LENS, CK3RAVEN_DEV];

pub fn default_visibility_matrix() -> VisibilityMatrix {
    let mut m = VisibilityMatrix::new();

    m.insert(CK3LENS, RootKey::Game, None, VisibilityRule::always_visible());
    m.insert(CK3LENS, RootKey::Ck3ravenData, None, VisibilityRule::always_visible());
    m.insert(CK3LENS, RootKey::Vscode, None, VisibilityRule::always_visible());
    m.insert(CK3LENS, RootKey::Repo, None, VisibilityRule::always_visible());
    m.insert(CK3LENS, RootKey::Steam, None, VisibilityRule::gated_on(vec![PATH_IN_ACTIVE_MODS]));
    m.insert(CK3LENS, RootKey::UserDocs, Some("mod"), VisibilityRule::gated_on(vec![PATH_IN_ACTIVE_MODS]));

    for key in RootKey::ALL {
        m.insert(CK3RAVEN_DEV, key, None, VisibilityRule::always_visible());
    }

    m
}

pub fn default_operations_matrix() -> OperationsMatrix {
    let mut m = OperationsMatrix::new();

    m.insert(
        CK3LENS,
        RootKey::Game,
        None,
        vec![OperationRule::all(CommandMatch::set([("dir", "read"), ("file", "read")]), vec![])],
    );

    m.insert(
        CK3LENS,
        RootKey::UserDocs,
        Some("mod"),
        vec![
            OperationRule::all(CommandMatch::set([("dir", "read"), ("file", "read")]), vec![]),
            OperationRule::all(CommandMatch::set([("file", "write")]), vec![HAS_CONTRACT]),
        ],
    );

    m.insert(
        CK3RAVEN_DEV,
        RootKey::Repo,
        None,
        vec![
            OperationRule::all(CommandMatch::set([("dir", "read"), ("file", "read")]), vec![]),
            OperationRule::all(CommandMatch::set([("file", "write")]), vec![HAS_CONTRACT]),
            OperationRule::all(CommandMatch::set([("git", "mutate")]), vec![HAS_CONTRACT]),
        ],
    );

    for mode in ALL_MODES {
        m.insert(
            *mode,
            RootKey::Ck3ravenData,
            Some("wip"),
            vec![OperationRule::any(CommandMatch::Exec, vec![COMMAND_WHITELISTED, EXEC_SIGNED])],
        );
        // root_key/subdir = ck3raven_data/db: no entry at all — every
        // operation denies -- the storage daemon owns this subdirectory.
    }

    m
}
