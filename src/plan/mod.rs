//! Pure planning: change classification, branch naming and message generation.
//!
//! Nothing in here runs a process; the workflow feeds parsed git output in and
//! gets plans back.

pub mod branch;
pub mod classify;
pub mod message;

pub use branch::{branch_name, branch_slug, unique_branch_name, BranchPlan};
pub use classify::{classify, Category};
pub use message::{
    strategy_for, CommitPlan, ConventionalStrategy, MessageStrategy, PlainStrategy,
    PullRequestPlan,
};
