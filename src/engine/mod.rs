//! Provisioning engine
//!
//! The engine orchestrates:
//! 1. Planning - List the commands each order will run
//! 2. Provisioning - Create-or-skip each board, list, label and card
//! 3. Reporting - Tally results into an [`outcome::ExecuteSummary`]

pub mod interpreter;
pub mod outcome;
pub mod provision;

pub use interpreter::{OrderInterpreter, PlanStep, plan};

/// Options for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Look everything up but send no changes
    pub dry_run: bool,
}
