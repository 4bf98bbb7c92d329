//! Backend abstraction for the Trello API.
//!
//! The [`Backend`] trait covers exactly the calls the provisioning engine
//! makes. [`rest::RestBackend`] talks to the real service; [`MockBackend`]
//! keeps everything in memory for tests.
//!
//! ```
//! use trellokit::backend::{Backend, MockBackend};
//! use trellokit::PermissionLevel;
//!
//! let mock = MockBackend::new();
//! let board = mock.create_board("Roadmap", PermissionLevel::Private).unwrap();
//! assert_eq!(mock.boards().unwrap().len(), 1);
//! assert_eq!(mock.labels(&board.id).unwrap().len(), 6);
//! ```

pub mod rest;

use crate::error::{Error, Result};
use crate::types::{Board, BoardList, Card, Label, LabelColor, NewCard, PermissionLevel};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Blocking access to the Trello resources boardsmith manages.
pub trait Backend: Send + Sync {
    /// All boards visible to the token, open and closed.
    fn boards(&self) -> Result<Vec<Board>>;

    /// Create a board without Trello's default lists.
    fn create_board(&self, name: &str, permission: PermissionLevel) -> Result<Board>;

    /// Lists on a board, in position order.
    fn lists(&self, board_id: &str) -> Result<Vec<BoardList>>;

    fn create_list(&self, board_id: &str, name: &str, pos: u32) -> Result<BoardList>;

    fn labels(&self, board_id: &str) -> Result<Vec<Label>>;

    fn create_label(&self, board_id: &str, name: &str, color: LabelColor) -> Result<Label>;

    fn delete_label(&self, label_id: &str) -> Result<()>;

    /// Cards on a board, open and archived.
    fn cards(&self, board_id: &str) -> Result<Vec<Card>>;

    fn create_card(&self, list_id: &str, card: &NewCard) -> Result<Card>;

    fn rename_card(&self, card_id: &str, name: &str) -> Result<Card>;

    fn add_card_label(&self, card_id: &str, label_id: &str) -> Result<()>;
}

/// Colours of the six unnamed labels Trello puts on every new board.
const DEFAULT_LABEL_COLORS: [LabelColor; 6] = [
    LabelColor::Green,
    LabelColor::Yellow,
    LabelColor::Orange,
    LabelColor::Red,
    LabelColor::Purple,
    LabelColor::Blue,
];

#[derive(Debug, Default)]
struct MockState {
    boards: Vec<Board>,
    lists: Vec<BoardList>,
    labels: Vec<Label>,
    cards: Vec<Card>,
    next_id: u64,
    next_short_id: HashMap<String, u32>,
    calls: Vec<String>,
}

impl MockState {
    fn id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}{:04}", self.next_id)
    }

    fn board_exists(&self, board_id: &str) -> Result<()> {
        if self.boards.iter().any(|b| b.id == board_id) {
            Ok(())
        } else {
            Err(Error::not_found(format!("board {board_id}")))
        }
    }
}

/// In-memory backend for tests.
///
/// Mirrors the Trello behaviour the engine depends on: new boards come with
/// six unnamed labels, card short ids count from 1 per board, and every
/// mutating call is recorded in [`MockBackend::calls`].
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add an existing board (no default labels) and return it.
    pub fn seed_board(&self, name: &str) -> Board {
        let mut state = self.state();
        let board = Board {
            id: state.id("board"),
            name: name.to_string(),
            closed: false,
            url: None,
        };
        state.boards.push(board.clone());
        board
    }

    /// Add an existing list to a board.
    pub fn seed_list(&self, board_id: &str, name: &str) -> BoardList {
        let mut state = self.state();
        let pos = state.lists.iter().filter(|l| l.id_board == board_id).count() as f64 + 1.0;
        let list = BoardList {
            id: state.id("list"),
            name: name.to_string(),
            id_board: board_id.to_string(),
            pos,
            closed: false,
        };
        state.lists.push(list.clone());
        list
    }

    /// Add an existing label to a board.
    pub fn seed_label(&self, board_id: &str, name: &str, color: LabelColor) -> Label {
        let mut state = self.state();
        let label = Label {
            id: state.id("label"),
            name: name.to_string(),
            color: Some(color.as_str().to_string()),
            id_board: board_id.to_string(),
        };
        state.labels.push(label.clone());
        label
    }

    /// Add an existing card to a list, allocating the next short id.
    pub fn seed_card(&self, board_id: &str, list_id: &str, name: &str) -> Card {
        let mut state = self.state();
        let id = state.id("card");
        let counter = state.next_short_id.entry(board_id.to_string()).or_insert(0);
        *counter += 1;
        let card = Card {
            id,
            id_short: *counter,
            name: name.to_string(),
            desc: String::new(),
            id_list: list_id.to_string(),
            id_labels: Vec::new(),
        };
        state.cards.push(card.clone());
        card
    }

    /// Mutating calls made so far, e.g. `"create_card Write docs"`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of mutating calls made so far.
    pub fn mutation_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Lists on a board sorted by position (convenience for assertions).
    pub fn list_names(&self, board_id: &str) -> Vec<String> {
        let mut lists: Vec<BoardList> = self
            .state()
            .lists
            .iter()
            .filter(|l| l.id_board == board_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| a.pos.total_cmp(&b.pos));
        lists.into_iter().map(|l| l.name).collect()
    }

    /// Card by id, if it exists.
    pub fn card(&self, card_id: &str) -> Option<Card> {
        self.state().cards.iter().find(|c| c.id == card_id).cloned()
    }
}

impl Backend for MockBackend {
    fn boards(&self) -> Result<Vec<Board>> {
        Ok(self.state().boards.clone())
    }

    fn create_board(&self, name: &str, permission: PermissionLevel) -> Result<Board> {
        let mut state = self.state();
        state.calls.push(format!("create_board {name} ({permission})"));

        let board = Board {
            id: state.id("board"),
            name: name.to_string(),
            closed: false,
            url: None,
        };
        for color in DEFAULT_LABEL_COLORS {
            let label = Label {
                id: state.id("label"),
                name: String::new(),
                color: Some(color.as_str().to_string()),
                id_board: board.id.clone(),
            };
            state.labels.push(label);
        }
        state.boards.push(board.clone());
        Ok(board)
    }

    fn lists(&self, board_id: &str) -> Result<Vec<BoardList>> {
        let state = self.state();
        state.board_exists(board_id)?;
        let mut lists: Vec<BoardList> = state
            .lists
            .iter()
            .filter(|l| l.id_board == board_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| a.pos.total_cmp(&b.pos));
        Ok(lists)
    }

    fn create_list(&self, board_id: &str, name: &str, pos: u32) -> Result<BoardList> {
        let mut state = self.state();
        state.board_exists(board_id)?;
        state.calls.push(format!("create_list {name} @{pos}"));

        let list = BoardList {
            id: state.id("list"),
            name: name.to_string(),
            id_board: board_id.to_string(),
            pos: f64::from(pos),
            closed: false,
        };
        state.lists.push(list.clone());
        Ok(list)
    }

    fn labels(&self, board_id: &str) -> Result<Vec<Label>> {
        let state = self.state();
        state.board_exists(board_id)?;
        Ok(state
            .labels
            .iter()
            .filter(|l| l.id_board == board_id)
            .cloned()
            .collect())
    }

    fn create_label(&self, board_id: &str, name: &str, color: LabelColor) -> Result<Label> {
        let mut state = self.state();
        state.board_exists(board_id)?;
        state.calls.push(format!("create_label {name} ({color})"));

        let label = Label {
            id: state.id("label"),
            name: name.to_string(),
            color: Some(color.as_str().to_string()),
            id_board: board_id.to_string(),
        };
        state.labels.push(label.clone());
        Ok(label)
    }

    fn delete_label(&self, label_id: &str) -> Result<()> {
        let mut state = self.state();
        let before = state.labels.len();
        state.labels.retain(|l| l.id != label_id);
        if state.labels.len() == before {
            return Err(Error::not_found(format!("label {label_id}")));
        }
        state.calls.push(format!("delete_label {label_id}"));
        for card in &mut state.cards {
            card.id_labels.retain(|id| id != label_id);
        }
        Ok(())
    }

    fn cards(&self, board_id: &str) -> Result<Vec<Card>> {
        let state = self.state();
        state.board_exists(board_id)?;
        let list_ids: Vec<&str> = state
            .lists
            .iter()
            .filter(|l| l.id_board == board_id)
            .map(|l| l.id.as_str())
            .collect();
        Ok(state
            .cards
            .iter()
            .filter(|c| list_ids.contains(&c.id_list.as_str()))
            .cloned()
            .collect())
    }

    fn create_card(&self, list_id: &str, card: &NewCard) -> Result<Card> {
        let mut state = self.state();
        let board_id = state
            .lists
            .iter()
            .find(|l| l.id == list_id)
            .map(|l| l.id_board.clone())
            .ok_or_else(|| Error::not_found(format!("list {list_id}")))?;
        state.calls.push(format!("create_card {}", card.name));

        let id = state.id("card");
        let counter = state.next_short_id.entry(board_id).or_insert(0);
        *counter += 1;
        let created = Card {
            id,
            id_short: *counter,
            name: card.name.clone(),
            desc: card.desc.clone().unwrap_or_default(),
            id_list: list_id.to_string(),
            id_labels: Vec::new(),
        };
        state.cards.push(created.clone());
        Ok(created)
    }

    fn rename_card(&self, card_id: &str, name: &str) -> Result<Card> {
        let mut state = self.state();
        state.calls.push(format!("rename_card {name}"));
        let card = state
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| Error::not_found(format!("card {card_id}")))?;
        card.name = name.to_string();
        Ok(card.clone())
    }

    fn add_card_label(&self, card_id: &str, label_id: &str) -> Result<()> {
        let mut state = self.state();
        if !state.labels.iter().any(|l| l.id == label_id) {
            return Err(Error::not_found(format!("label {label_id}")));
        }
        state.calls.push(format!("add_card_label {card_id} {label_id}"));
        let card = state
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| Error::not_found(format!("card {card_id}")))?;
        if card.has_label(label_id) {
            return Err(Error::http("that label is already on the card", Some(400)));
        }
        card.id_labels.push(label_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_new() {
        let mock = MockBackend::new();
        assert!(mock.boards().unwrap().is_empty());
        assert_eq!(mock.mutation_count(), 0);
    }

    #[test]
    fn test_new_board_gets_default_labels() {
        let mock = MockBackend::new();
        let board = mock.create_board("Roadmap", PermissionLevel::Public).unwrap();

        let labels = mock.labels(&board.id).unwrap();
        assert_eq!(labels.len(), 6);
        assert!(labels.iter().all(|l| l.name.is_empty()));
        assert_eq!(mock.calls(), vec!["create_board Roadmap (public)"]);
    }

    #[test]
    fn test_seeded_board_has_no_labels() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        assert!(mock.labels(&board.id).unwrap().is_empty());
        assert_eq!(mock.mutation_count(), 0);
    }

    #[test]
    fn test_short_ids_are_per_board() {
        let mock = MockBackend::new();
        let a = mock.seed_board("A");
        let b = mock.seed_board("B");
        let list_a = mock.seed_list(&a.id, "Todo");
        let list_b = mock.seed_list(&b.id, "Todo");

        let first = mock.create_card(&list_a.id, &NewCard::new("one")).unwrap();
        let second = mock.create_card(&list_a.id, &NewCard::new("two")).unwrap();
        let other = mock.create_card(&list_b.id, &NewCard::new("three")).unwrap();

        assert_eq!(first.id_short, 1);
        assert_eq!(second.id_short, 2);
        assert_eq!(other.id_short, 1);
        assert_eq!(mock.cards(&a.id).unwrap().len(), 2);
    }

    #[test]
    fn test_lists_are_sorted_by_position() {
        let mock = MockBackend::new();
        let board = mock.seed_board("A");
        mock.create_list(&board.id, "Later", 3).unwrap();
        mock.create_list(&board.id, "First", 1).unwrap();

        let names: Vec<String> = mock
            .lists(&board.id)
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["First", "Later"]);
    }

    #[test]
    fn test_delete_unknown_label() {
        let mock = MockBackend::new();
        assert!(mock.delete_label("nope").is_err());
    }

    #[test]
    fn test_add_card_label_twice_is_rejected() {
        let mock = MockBackend::new();
        let board = mock.seed_board("A");
        let list = mock.seed_list(&board.id, "Todo");
        let label = mock.seed_label(&board.id, "Bug", LabelColor::Red);
        let card = mock.seed_card(&board.id, &list.id, "Task");

        mock.add_card_label(&card.id, &label.id).unwrap();
        let err = mock.add_card_label(&card.id, &label.id).unwrap_err();
        assert!(matches!(err, Error::Http { status: Some(400), .. }));
        assert_eq!(mock.card(&card.id).unwrap().id_labels, vec![label.id]);
    }

    #[test]
    fn test_unknown_board_is_not_found() {
        let mock = MockBackend::new();
        let err = mock.lists("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
