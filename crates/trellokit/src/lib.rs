//! # trellokit
//!
//! Minimal blocking client for the Trello API.
//!
//! This crate provides functionality for:
//! - Listing and creating boards, lists, labels and cards
//! - Looking entities up by (partial) name or by id
//! - Running the same code against an in-memory backend in tests
//!
//! It deliberately covers only what declarative board provisioning needs;
//! it is not a full Trello SDK.
//!
//! ## Example
//!
//! ```no_run
//! use trellokit::{Client, Credentials};
//!
//! let client = Client::connect(Credentials::new("key", "token"));
//!
//! if let Some(board) = client.board_by_name("roadmap").unwrap() {
//!     for list in client.lists(&board).unwrap() {
//!         println!("{}", list.name);
//!     }
//! }
//! ```
//!
//! ## Testing
//!
//! ```
//! use trellokit::{Client, MockBackend};
//!
//! let mock = MockBackend::new();
//! mock.seed_board("Roadmap 2025");
//!
//! let client = Client::with_backend(Box::new(mock));
//! assert!(client.board_by_name("roadmap").unwrap().is_some());
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod lookup;
pub mod types;

pub use backend::MockBackend;
pub use error::{Error, ErrorCategory, Result};
pub use lookup::LabelIndex;
pub use types::{
    Board, BoardList, Card, Credentials, Label, LabelColor, NewCard, PermissionLevel, ShortId,
    card_title,
};

use backend::Backend;
use backend::rest::RestBackend;

/// High-level client over a [`Backend`].
///
/// Lookups always re-read the remote collection; nothing is cached between
/// calls.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Client for the public Trello API.
    #[must_use]
    pub fn connect(credentials: Credentials) -> Self {
        Self::with_backend(Box::new(RestBackend::new(credentials)))
    }

    /// Client for a Trello-compatible API at another base URL.
    #[must_use]
    pub fn connect_to(credentials: Credentials, api_base: &str) -> Self {
        Self::with_backend(Box::new(RestBackend::with_api_base(credentials, api_base)))
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn boards(&self) -> Result<Vec<Board>> {
        self.backend.boards()
    }

    pub fn lists(&self, board: &Board) -> Result<Vec<BoardList>> {
        self.backend.lists(&board.id)
    }

    pub fn labels(&self, board: &Board) -> Result<Vec<Label>> {
        self.backend.labels(&board.id)
    }

    pub fn cards(&self, board: &Board) -> Result<Vec<Card>> {
        self.backend.cards(&board.id)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Last board whose name contains `name` (case-insensitive).
    pub fn board_by_name(&self, name: &str) -> Result<Option<Board>> {
        Ok(lookup::last_containing(self.boards()?, name))
    }

    /// Last list on the board whose name contains `name` (case-insensitive).
    pub fn list_by_name(&self, board: &Board, name: &str) -> Result<Option<BoardList>> {
        Ok(lookup::last_containing(self.lists(board)?, name))
    }

    /// Last card on the board whose name contains `name` (case-insensitive).
    pub fn card_by_name(&self, board: &Board, name: &str) -> Result<Option<Card>> {
        Ok(lookup::last_containing(self.cards(board)?, name))
    }

    /// Card with the given board-local short id.
    pub fn card_by_short_id(&self, board: &Board, short_id: ShortId) -> Result<Option<Card>> {
        Ok(self
            .cards(board)?
            .into_iter()
            .rev()
            .find(|c| c.id_short == short_id.value()))
    }

    /// Last label whose name equals `name` (case-insensitive).
    pub fn label_by_name(&self, board: &Board, name: &str) -> Result<Option<Label>> {
        Ok(lookup::last_named(self.labels(board)?, name))
    }

    /// Label with exactly this id.
    pub fn label_by_id(&self, board: &Board, id: &str) -> Result<Option<Label>> {
        Ok(self.labels(board)?.into_iter().find(|l| l.id == id))
    }

    /// Labels on the board keyed by upper-cased name.
    pub fn label_index(&self, board: &Board) -> Result<LabelIndex> {
        Ok(LabelIndex::new(&self.labels(board)?))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub fn create_board(&self, name: &str, permission: PermissionLevel) -> Result<Board> {
        self.backend.create_board(name, permission)
    }

    pub fn create_list(&self, board: &Board, name: &str, pos: u32) -> Result<BoardList> {
        self.backend.create_list(&board.id, name, pos)
    }

    pub fn create_label(&self, board: &Board, name: &str, color: LabelColor) -> Result<Label> {
        self.backend.create_label(&board.id, name, color)
    }

    pub fn delete_label(&self, label: &Label) -> Result<()> {
        self.backend.delete_label(&label.id)
    }

    pub fn create_card(&self, list: &BoardList, card: &NewCard) -> Result<Card> {
        self.backend.create_card(&list.id, card)
    }

    pub fn rename_card(&self, card: &Card, name: &str) -> Result<Card> {
        self.backend.rename_card(&card.id, name)
    }

    pub fn add_card_label(&self, card: &Card, label: &Label) -> Result<()> {
        self.backend.add_card_label(&card.id, &label.id)
    }

    /// Add a label by id, for callers that only hold a [`LabelIndex`].
    pub fn add_card_label_id(&self, card: &Card, label_id: &str) -> Result<()> {
        self.backend.add_card_label(&card.id, label_id)
    }
}
