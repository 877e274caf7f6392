//! wa_policy — the condition predicates (C8), visibility matrix (C6),
//! operations matrix (C7), and command whitelist that the resolver and
//! enforcer consult. This crate owns no mutable state and performs no I/O
//! of its own; every function here is a pure lookup over tables its caller
//! built once at startup.

pub mod condition;
pub mod operations;
pub mod visibility;
pub mod whitelist;

pub use condition::{Condition, Context};
pub use operations::{CommandMatch, OperationRule, OperationsMatrix};
pub use visibility::{VisibilityMatrix, VisibilityRule};
pub use whitelist::{CommandWhitelist, WhitelistError};
