//! Branch Resolver (C4): if/else and switch/case routing (spec §4.4).

mod resolver;

pub use resolver::{resolve_branch, BranchDefinition, SwitchCase};
