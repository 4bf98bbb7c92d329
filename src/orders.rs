//! Orders file schema
//!
//! An orders file is a JSON document with a single `orders` array. Each
//! order names the board it targets and carries any of the command keys
//! listed in [`Command::ALL`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use trellokit::{LabelColor, PermissionLevel, ShortId};

// ============================================================================
// Commands
// ============================================================================

/// Commands an order can carry, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CreateBoards,
    CreateLists,
    CreateLabels,
    CreateCards,
    SetLabels,
}

impl Command {
    /// Fixed execution order, independent of key order in the file.
    pub const ALL: [Command; 5] = [
        Self::CreateBoards,
        Self::CreateLists,
        Self::CreateLabels,
        Self::CreateCards,
        Self::SetLabels,
    ];

    /// Key used in the orders file.
    pub fn key(&self) -> &'static str {
        match self {
            Self::CreateBoards => "create_boards",
            Self::CreateLists => "create_lists",
            Self::CreateLabels => "create_labels",
            Self::CreateCards => "create_cards",
            Self::SetLabels => "set_labels",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Top-level document.
#[derive(Debug, Clone, Deserialize)]
pub struct Orders {
    pub orders: Vec<Order>,
}

/// One order descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Order {
    /// Target board. Optional here so validation can report it by position.
    #[serde(default)]
    pub board: Option<String>,

    /// Card prefix for numbering new cards. Carries over to later orders.
    #[serde(default)]
    pub prefix: Option<String>,

    #[serde(default)]
    pub create_boards: Option<Vec<BoardSpec>>,

    #[serde(default)]
    pub create_lists: Option<Vec<String>>,

    #[serde(default)]
    pub create_labels: Option<Vec<LabelSpec>>,

    #[serde(default)]
    pub create_cards: Option<Vec<CardSpec>>,

    #[serde(default)]
    pub set_labels: Option<Vec<LabelAssignment>>,

    /// Keys this version does not understand.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl Order {
    /// Whether the order carries `command`.
    pub fn has(&self, command: Command) -> bool {
        match command {
            Command::CreateBoards => self.create_boards.is_some(),
            Command::CreateLists => self.create_lists.is_some(),
            Command::CreateLabels => self.create_labels.is_some(),
            Command::CreateCards => self.create_cards.is_some(),
            Command::SetLabels => self.set_labels.is_some(),
        }
    }

    /// Commands present on this order, in execution order.
    pub fn commands(&self) -> Vec<Command> {
        Command::ALL.into_iter().filter(|c| self.has(*c)).collect()
    }

    /// Number of entries the command would process.
    pub fn entry_count(&self, command: Command) -> usize {
        match command {
            Command::CreateBoards => self.create_boards.as_ref().map_or(0, Vec::len),
            Command::CreateLists => self.create_lists.as_ref().map_or(0, Vec::len),
            Command::CreateLabels => self.create_labels.as_ref().map_or(0, Vec::len),
            Command::CreateCards => self.create_cards.as_ref().map_or(0, Vec::len),
            Command::SetLabels => self.set_labels.as_ref().map_or(0, Vec::len),
        }
    }
}

/// A board to create.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardSpec {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub permission_level: PermissionLevel,

    /// Delete the labels Trello adds to every new board
    #[serde(default = "default_true")]
    pub remove_labels: bool,

    #[serde(default)]
    pub lists: Vec<String>,
}

/// A label to create on the current board.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelSpec {
    #[serde(default)]
    pub name: Option<String>,

    /// Defaults to green
    #[serde(default)]
    pub color: Option<LabelColor>,
}

/// A card to create on the current board.
#[derive(Debug, Clone, Deserialize)]
pub struct CardSpec {
    #[serde(default)]
    pub name: Option<String>,

    /// Destination list name (substring match)
    #[serde(default)]
    pub list: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub labels: Vec<String>,
}

/// Labels to attach to an existing card.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelAssignment {
    pub card: CardRef,

    #[serde(default)]
    pub labels: Vec<String>,
}

/// A card short id written as a number (`42`) or text (`"PX0042"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CardRef {
    Number(u32),
    Text(String),
}

impl CardRef {
    pub fn short_id(&self) -> trellokit::Result<ShortId> {
        match self {
            Self::Number(0) => Err(trellokit::Error::InvalidShortId("0".to_string())),
            Self::Number(n) => Ok(ShortId::new(*n)),
            Self::Text(text) => text.parse(),
        }
    }
}

impl fmt::Display for CardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Loading and validation
// ============================================================================

impl Orders {
    /// Read and parse an orders file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read orders file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid orders file: {}", path.display()))
    }

    /// Parse orders from JSON text.
    pub fn parse(content: &str) -> Result<Self> {
        let orders: Orders =
            serde_json::from_str(content).context("Invalid JSON format in orders")?;

        for (i, order) in orders.orders.iter().enumerate() {
            for key in order.unknown.keys() {
                log::warn!("Order #{}: ignoring unknown key '{}'", i + 1, key);
            }
        }

        Ok(orders)
    }

    /// Check everything that can be checked without talking to Trello.
    ///
    /// All problems are reported together.
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            return Ok(());
        }

        let mut message = format!("{} problem(s) in orders:", problems.len());
        for problem in &problems {
            message.push_str("\n  - ");
            message.push_str(problem);
        }
        anyhow::bail!(message)
    }

    /// Human-readable validation problems, empty when the orders are valid.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (i, order) in self.orders.iter().enumerate() {
            let n = i + 1;

            if order.board.as_deref().is_none_or(|b| b.trim().is_empty()) {
                problems.push(format!(
                    "order #{n}: There is an order descriptor without the 'board' key"
                ));
            }

            for spec in order.create_boards.iter().flatten() {
                if spec.name.as_deref().is_none_or(|b| b.trim().is_empty()) {
                    problems.push(format!(
                        "order #{n}: You can not create an unnamed board"
                    ));
                }
            }

            for spec in order.create_labels.iter().flatten() {
                if spec.name.is_none() {
                    problems.push(format!("order #{n}: label must set a 'name'"));
                }
            }

            for spec in order.create_cards.iter().flatten() {
                if spec.list.as_deref().is_none_or(|l| l.trim().is_empty()) {
                    let card = spec.name.as_deref().unwrap_or("<unnamed>");
                    problems.push(format!(
                        "order #{n}: card '{card}' needs a destination 'list'"
                    ));
                }
            }

            for assignment in order.set_labels.iter().flatten() {
                if let Err(e) = assignment.card.short_id() {
                    problems.push(format!("order #{n}: {e}"));
                }
            }
        }

        problems
    }

    /// Number of orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// True when the file holds no orders at all.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
