//! Results of applying orders

use colored::Colorize;
use std::fmt;

/// Result of provisioning one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// Already present, nothing sent
    NoChange,
    /// Entity was created
    Created,
    /// Existing entity was changed (labels attached)
    Modified,
    /// Apply failed but the run continued
    Failed { error: String },
    /// Not applied (dry run, unnamed card, board not created yet)
    Skipped { reason: String },
}

impl ApplyResult {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// Status glyph used in progress output
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::NoChange => "○",
            Self::Created | Self::Modified => "✓",
            Self::Failed { .. } => "✗",
            Self::Skipped { .. } => "⊘",
        }
    }
}

impl fmt::Display for ApplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChange => write!(f, "unchanged"),
            Self::Created => write!(f, "created"),
            Self::Modified => write!(f, "modified"),
            Self::Failed { error } => write!(f, "failed: {error}"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Summary of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Check if the run was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of entities processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.skipped + self.failed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Print final summary
    pub fn print(&self, dry_run: bool) {
        println!();
        if dry_run {
            println!(
                "  {} Dry run - no changes made ({} entries checked)",
                "ℹ".blue(),
                self.total()
            );
        } else if self.is_success() && self.total_changes() == 0 {
            println!("  {} Trello already matches the orders", "✓".green().bold());
        } else if self.is_success() {
            println!("  {} Orders applied successfully!", "✓".green().bold());
        } else {
            println!("  {} Orders applied with errors", "⚠".yellow().bold());
        }

        if self.created > 0 {
            println!("    • {} created", self.created);
        }
        if self.modified > 0 {
            println!("    • {} modified", self.modified);
        }
        if self.no_change > 0 {
            println!("    • {} already present", self.no_change);
        }
        if self.skipped > 0 {
            println!("    • {} skipped", self.skipped);
        }
        if self.failed > 0 {
            println!("    • {} {}", self.failed, "failed".red());
        }
    }
}
