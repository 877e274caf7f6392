//! Named reply codes. Non-exhaustive: callers are free to mint additional
//! `AA-BBB-T-NNN` codes (e.g. area-specific denial codes) as long as they
//! parse under [`crate::kind_of`].

pub const WA_RES_S_001: &str = "WA-RES-S-001"; // address resolved
pub const WA_RES_I_001: &str = "WA-RES-I-001"; // address invalid / not visible / not found
pub const WA_RES_E_001: &str = "WA-RES-E-001"; // capability registry capacity exceeded
pub const WA_SYS_I_001: &str = "WA-SYS-I-001"; // agent mode uninitialized
pub const WA_DIR_E_001: &str = "WA-DIR-E-001"; // leak detected in outgoing reply

pub const EN_READ_S_001: &str = "EN-READ-S-001"; // read permitted
pub const EN_WRITE_S_001: &str = "EN-WRITE-S-001"; // mutation permitted
pub const EN_WRITE_D_001: &str = "EN-WRITE-D-001"; // mutation denied by policy
pub const EN_EXEC_D_001: &str = "EN-EXEC-D-001"; // exec denied (unsigned and not whitelisted)
pub const EN_GATE_D_001: &str = "EN-GATE-D-001"; // no matching rule in operations matrix
