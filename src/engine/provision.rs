//! Create-or-skip helpers for boards, lists, labels and cards
//!
//! Every helper looks the entity up first and only creates it when nothing
//! matches. Lookups always go back to Trello; nothing is cached between
//! calls. A board or destination list that cannot be found is an error,
//! except in dry-run mode where it may simply not have been created yet.

use anyhow::{Context, Result};
use std::collections::HashSet;
use trellokit::{
    Board, BoardList, Card, Client, LabelColor, LabelIndex, NewCard, card_title,
};

use super::outcome::ApplyResult;
use crate::orders::{BoardSpec, CardSpec, LabelAssignment, LabelSpec};
use crate::ui;

/// Applies single provisioning steps against a Trello client
pub struct Provisioner<'a> {
    client: &'a Client,
    dry_run: bool,
}

impl<'a> Provisioner<'a> {
    pub fn new(client: &'a Client, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// Find the board an order targets.
    ///
    /// `Ok(None)` only happens in dry-run mode, where the board may be one
    /// the same run would have created.
    fn resolve_board(&self, name: &str) -> Result<Option<Board>> {
        let board = self
            .client
            .board_by_name(name)
            .with_context(|| format!("Failed to look up board '{name}'"))?;

        match board {
            Some(board) => Ok(Some(board)),
            None if self.dry_run => Ok(None),
            None => anyhow::bail!("Board '{name}' not found"),
        }
    }

    fn board_pending(name: &str) -> ApplyResult {
        ApplyResult::skipped(format!("board '{name}' does not exist yet"))
    }

    // ========================================================================
    // Boards
    // ========================================================================

    /// Create a board unless one already matches its name.
    ///
    /// The board's result comes first, followed by one result per list
    /// created with it.
    pub fn create_board(&self, spec: &BoardSpec) -> Result<Vec<ApplyResult>> {
        let name = match spec.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => anyhow::bail!("You can not create an unnamed board"),
        };

        if self
            .client
            .board_by_name(name)
            .with_context(|| format!("Failed to look up board '{name}'"))?
            .is_some()
        {
            ui::dim(&format!("Board '{name}' already exists"));
            return Ok(vec![ApplyResult::NoChange]);
        }

        if self.dry_run {
            return Ok(vec![ApplyResult::skipped(format!(
                "dry run: would create board '{name}' ({}) with {} list(s)",
                spec.permission_level,
                spec.lists.len()
            ))]);
        }

        ui::info(&format!("Creating board '{name}'..."));
        let board = self
            .client
            .create_board(name, spec.permission_level)
            .with_context(|| format!("Failed to create board '{name}'"))?;

        let mut results = vec![ApplyResult::Created];
        if !spec.lists.is_empty() {
            results.extend(self.add_lists(&board, &spec.lists, 1)?);
        }

        if spec.remove_labels {
            let labels = self
                .client
                .labels(&board)
                .with_context(|| format!("Failed to read labels of board '{name}'"))?;
            for label in labels {
                ui::dim(&format!("Removing default label '{}'", label.id));
                self.client
                    .delete_label(&label)
                    .with_context(|| format!("Failed to remove label '{}'", label.id))?;
            }
        }

        ui::success(&format!("Created board '{name}'"));
        Ok(results)
    }

    // ========================================================================
    // Lists
    // ========================================================================

    /// Append lists to the right of the board's existing lists.
    pub fn create_lists(&self, board_name: &str, names: &[String]) -> Result<Vec<ApplyResult>> {
        let Some(board) = self.resolve_board(board_name)? else {
            return Ok(names.iter().map(|_| Self::board_pending(board_name)).collect());
        };

        let existing: Vec<BoardList> = self
            .client
            .lists(&board)
            .with_context(|| format!("Failed to read lists of board '{}'", board.name))?;

        let next = u32::try_from(existing.len()).unwrap_or(u32::MAX).saturating_add(1);
        self.add_lists(&board, names, next)
    }

    /// Create missing lists left to right starting at `pos`.
    fn add_lists(&self, board: &Board, names: &[String], pos: u32) -> Result<Vec<ApplyResult>> {
        let mut pos = pos.max(1);
        let mut results = Vec::with_capacity(names.len());

        for name in names {
            let found: Option<BoardList> = self
                .client
                .list_by_name(board, name)
                .with_context(|| format!("Failed to look up list '{name}'"))?;

            if found.is_some() {
                log::debug!("List '{name}' already on board '{}'", board.name);
                results.push(ApplyResult::NoChange);
                continue;
            }

            if self.dry_run {
                results.push(ApplyResult::skipped(format!(
                    "dry run: would create list '{name}' at position {pos}"
                )));
            } else {
                ui::success(&format!("Creating list: '{name}'"));
                self.client
                    .create_list(board, name, pos)
                    .with_context(|| format!("Failed to create list '{name}'"))?;
                results.push(ApplyResult::Created);
            }
            pos += 1;
        }

        Ok(results)
    }

    // ========================================================================
    // Labels
    // ========================================================================

    /// Create labels whose name is not on the board yet.
    pub fn create_labels(&self, board_name: &str, specs: &[LabelSpec]) -> Result<Vec<ApplyResult>> {
        let Some(board) = self.resolve_board(board_name)? else {
            return Ok(specs.iter().map(|_| Self::board_pending(board_name)).collect());
        };

        let mut index = self
            .client
            .label_index(&board)
            .with_context(|| format!("Failed to read labels of board '{}'", board.name))?;

        specs
            .iter()
            .map(|spec| self.create_label(&board, spec, &mut index))
            .collect()
    }

    fn create_label(
        &self,
        board: &Board,
        spec: &LabelSpec,
        index: &mut LabelIndex,
    ) -> Result<ApplyResult> {
        let Some(name) = spec.name.as_deref() else {
            anyhow::bail!("label must set a 'name'");
        };

        if let Some(id) = index.get(name) {
            ui::dim(&format!("Label named '{name}' already exists with id '{id}'"));
            return Ok(ApplyResult::NoChange);
        }

        let color = spec.color.unwrap_or_else(|| {
            ui::warn(&format!("Label '{name}' has no color, using 'green'"));
            LabelColor::default()
        });

        if self.dry_run {
            index.insert(name, "<pending>");
            return Ok(ApplyResult::skipped(format!(
                "dry run: would create label '{name}' ({color})"
            )));
        }

        let label = self
            .client
            .create_label(board, name, color)
            .with_context(|| format!("Failed to create label '{name}'"))?;
        index.insert(&label.name, &label.id);

        ui::success(&format!("Created label '{}' with id: '{}'", label.name, label.id));
        Ok(ApplyResult::Created)
    }

    // ========================================================================
    // Cards
    // ========================================================================

    /// Create a card unless one already matches its name.
    ///
    /// New cards are renamed to `[{prefix}{idShort:04}] {name}`.
    pub fn create_card(
        &self,
        board_name: &str,
        prefix: Option<&str>,
        spec: &CardSpec,
    ) -> Result<ApplyResult> {
        let Some(board) = self.resolve_board(board_name)? else {
            return Ok(Self::board_pending(board_name));
        };

        let Some(name) = spec.name.as_deref() else {
            ui::warn("Card must have a 'name'");
            return Ok(ApplyResult::skipped("card has no name"));
        };

        let list_name = match spec.list.as_deref() {
            Some(list) if !list.trim().is_empty() => list,
            _ => anyhow::bail!("Card '{name}' needs a destination 'list'"),
        };

        let list = self
            .client
            .list_by_name(&board, list_name)
            .with_context(|| format!("Failed to look up list '{list_name}'"))?;
        let list = match list {
            Some(list) => list,
            None if self.dry_run => {
                return Ok(ApplyResult::skipped(format!(
                    "list '{list_name}' does not exist yet"
                )));
            }
            None => anyhow::bail!("List '{list_name}' not found on board '{}'", board.name),
        };

        if let Some(existing) = self
            .client
            .card_by_name(&board, name)
            .with_context(|| format!("Failed to look up card '{name}'"))?
        {
            ui::dim(&format!("Card already exists with id: {}", existing.id_short));
            return Ok(ApplyResult::NoChange);
        }

        if self.dry_run {
            return Ok(ApplyResult::skipped(format!(
                "dry run: would create card '{name}' in '{}'",
                list.name
            )));
        }

        let new_card = NewCard::new(name).with_desc(spec.description.clone());
        let card = self
            .client
            .create_card(&list, &new_card)
            .with_context(|| format!("Failed to create card '{name}'"))?;

        let title = card_title(prefix.unwrap_or_default(), card.id_short, &card.name);
        let card = self
            .client
            .rename_card(&card, &title)
            .with_context(|| format!("Failed to rename card '{name}'"))?;
        ui::success(&format!("Created card {}", card.name));

        if !spec.labels.is_empty() {
            self.attach_named_labels(&board, &card, &spec.labels)?;
        }

        Ok(ApplyResult::Created)
    }

    fn attach_named_labels(&self, board: &Board, card: &Card, labels: &[String]) -> Result<()> {
        let index = self
            .client
            .label_index(board)
            .with_context(|| format!("Failed to read labels of board '{}'", board.name))?;

        let mut attached: HashSet<&str> = card.id_labels.iter().map(String::as_str).collect();
        for label in labels {
            let Some(label_id) = index.get(label) else {
                ui::warn(&format!("Label '{label}' does not exist"));
                continue;
            };
            if !attached.insert(label_id) {
                continue;
            }
            self.client
                .add_card_label_id(card, label_id)
                .with_context(|| format!("Failed to add label '{label}'"))?;
        }

        Ok(())
    }

    // ========================================================================
    // Label assignment
    // ========================================================================

    /// Attach labels to existing cards referenced by short id.
    pub fn set_labels(
        &self,
        board_name: &str,
        assignments: &[LabelAssignment],
    ) -> Result<Vec<ApplyResult>> {
        let Some(board) = self.resolve_board(board_name)? else {
            return Ok(assignments
                .iter()
                .map(|_| Self::board_pending(board_name))
                .collect());
        };

        assignments
            .iter()
            .map(|assignment| self.assign_labels(&board, assignment))
            .collect()
    }

    fn assign_labels(&self, board: &Board, assignment: &LabelAssignment) -> Result<ApplyResult> {
        let short_id = assignment
            .card
            .short_id()
            .with_context(|| format!("Bad card reference '{}'", assignment.card))?;

        let card = self
            .client
            .card_by_short_id(board, short_id)
            .with_context(|| format!("Failed to look up card {short_id}"))?;
        let Some(card) = card else {
            ui::warn(&format!("Card '{}' not found", assignment.card));
            return Ok(ApplyResult::failed(format!(
                "card '{}' not found on board '{}'",
                assignment.card, board.name
            )));
        };

        let mut present: HashSet<String> = card.id_labels.iter().cloned().collect();
        let mut attached = 0;
        for wanted in &assignment.labels {
            let label = match self.client.label_by_name(board, wanted)? {
                Some(label) => Some(label),
                None => self.client.label_by_id(board, wanted)?,
            };
            let Some(label) = label else {
                ui::warn(&format!("Label '{wanted}' does not exist"));
                continue;
            };

            if !present.insert(label.id.clone()) {
                continue;
            }

            if !self.dry_run {
                self.client
                    .add_card_label(&card, &label)
                    .with_context(|| format!("Failed to add label '{wanted}'"))?;
            }
            attached += 1;
        }

        match attached {
            0 => Ok(ApplyResult::NoChange),
            n if self.dry_run => Ok(ApplyResult::skipped(format!(
                "dry run: would attach {n} label(s) to card {short_id}"
            ))),
            n => {
                ui::success(&format!("Attached {n} label(s) to {}", card.name));
                Ok(ApplyResult::Modified)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::CardRef;
    use trellokit::{MockBackend, PermissionLevel};

    fn client(mock: &MockBackend) -> Client {
        Client::with_backend(Box::new(mock.clone()))
    }

    fn board_spec(name: &str, lists: &[&str]) -> BoardSpec {
        BoardSpec {
            name: Some(name.to_string()),
            permission_level: PermissionLevel::Private,
            remove_labels: true,
            lists: lists.iter().map(ToString::to_string).collect(),
        }
    }

    fn card_spec(name: &str, list: &str, labels: &[&str]) -> CardSpec {
        CardSpec {
            name: Some(name.to_string()),
            list: Some(list.to_string()),
            description: Some("desc".to_string()),
            labels: labels.iter().map(ToString::to_string).collect(),
        }
    }

    fn label_spec(name: &str, color: Option<LabelColor>) -> LabelSpec {
        LabelSpec {
            name: Some(name.to_string()),
            color,
        }
    }

    #[test]
    fn test_create_board_with_lists_and_no_default_labels() {
        let mock = MockBackend::new();
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let results = p.create_board(&board_spec("Roadmap", &["Todo", "Doing"])).unwrap();
        assert_eq!(results, vec![ApplyResult::Created; 3]);

        let board = client.board_by_name("Roadmap").unwrap().unwrap();
        assert_eq!(mock.list_names(&board.id), vec!["Todo", "Doing"]);
        assert!(client.labels(&board).unwrap().is_empty());
    }

    #[test]
    fn test_create_board_keeps_default_labels_when_asked() {
        let mock = MockBackend::new();
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let mut spec = board_spec("Roadmap", &[]);
        spec.remove_labels = false;
        p.create_board(&spec).unwrap();

        let board = client.board_by_name("Roadmap").unwrap().unwrap();
        assert_eq!(client.labels(&board).unwrap().len(), 6);
    }

    #[test]
    fn test_existing_board_is_not_recreated() {
        let mock = MockBackend::new();
        mock.seed_board("Roadmap 2025");
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let results = p.create_board(&board_spec("roadmap", &["Todo"])).unwrap();
        assert_eq!(results, vec![ApplyResult::NoChange]);
        assert_eq!(mock.mutation_count(), 0);
    }

    #[test]
    fn test_unnamed_board_is_an_error() {
        let mock = MockBackend::new();
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let spec = BoardSpec {
            name: None,
            ..board_spec("x", &[])
        };
        assert!(p.create_board(&spec).is_err());
    }

    #[test]
    fn test_lists_are_appended_after_existing() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        mock.seed_list(&board.id, "Todo");
        mock.seed_list(&board.id, "Done");
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let names = vec!["Todo".to_string(), "Blocked".to_string(), "Review".to_string()];
        let results = p.create_lists("Ops", &names).unwrap();

        assert_eq!(
            results,
            vec![ApplyResult::NoChange, ApplyResult::Created, ApplyResult::Created]
        );
        assert_eq!(mock.calls(), vec!["create_list Blocked @3", "create_list Review @4"]);
    }

    #[test]
    fn test_lists_on_missing_board_fail() {
        let mock = MockBackend::new();
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let err = p.create_lists("Nope", &["Todo".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Board 'Nope' not found"));
    }

    #[test]
    fn test_labels_skip_existing_and_dedupe_within_command() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        mock.seed_label(&board.id, "Bug", LabelColor::Red);
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let specs = vec![
            label_spec("BUG", Some(LabelColor::Orange)),
            label_spec("Chore", None),
            label_spec("chore", Some(LabelColor::Blue)),
        ];
        let results = p.create_labels("Ops", &specs).unwrap();

        assert_eq!(
            results,
            vec![ApplyResult::NoChange, ApplyResult::Created, ApplyResult::NoChange]
        );
        assert_eq!(mock.calls(), vec!["create_label Chore (green)"]);
    }

    #[test]
    fn test_card_is_created_numbered_and_labelled() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        mock.seed_list(&board.id, "Backlog");
        let bug = mock.seed_label(&board.id, "Bug", LabelColor::Red);
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let result = p
            .create_card("Ops", Some("OPS"), &card_spec("Rotate keys", "back", &["bug", "Nope"]))
            .unwrap();
        assert_eq!(result, ApplyResult::Created);

        let card = client.card_by_name(&board, "Rotate keys").unwrap().unwrap();
        assert_eq!(card.name, "[OPS0001] Rotate keys");
        assert_eq!(card.desc, "desc");
        assert_eq!(card.id_labels, vec![bug.id]);
    }

    #[test]
    fn test_card_label_named_twice_is_attached_once() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        mock.seed_list(&board.id, "Backlog");
        let bug = mock.seed_label(&board.id, "Bug", LabelColor::Red);
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let result = p
            .create_card("Ops", None, &card_spec("Task", "Backlog", &["Bug", "bug"]))
            .unwrap();
        assert_eq!(result, ApplyResult::Created);

        let attaches = mock
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("add_card_label"))
            .count();
        assert_eq!(attaches, 1);
        let card = client.card_by_name(&board, "Task").unwrap().unwrap();
        assert_eq!(card.id_labels, vec![bug.id]);
    }

    #[test]
    fn test_card_without_prefix() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        mock.seed_list(&board.id, "Backlog");
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        p.create_card("Ops", None, &card_spec("Task", "Backlog", &[])).unwrap();
        let card = client.card_by_name(&board, "Task").unwrap().unwrap();
        assert_eq!(card.name, "[0001] Task");
    }

    #[test]
    fn test_existing_card_is_skipped() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        let list = mock.seed_list(&board.id, "Backlog");
        mock.seed_card(&board.id, &list.id, "[OPS0001] Rotate keys");
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let result = p
            .create_card("Ops", Some("OPS"), &card_spec("Rotate keys", "Backlog", &[]))
            .unwrap();
        assert_eq!(result, ApplyResult::NoChange);
        assert_eq!(mock.mutation_count(), 0);
    }

    #[test]
    fn test_unnamed_card_is_skipped() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        mock.seed_list(&board.id, "Backlog");
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let spec = CardSpec {
            name: None,
            ..card_spec("x", "Backlog", &[])
        };
        let result = p.create_card("Ops", None, &spec).unwrap();
        assert!(matches!(result, ApplyResult::Skipped { .. }));
    }

    #[test]
    fn test_card_into_missing_list_fails() {
        let mock = MockBackend::new();
        mock.seed_board("Ops");
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let err = p
            .create_card("Ops", None, &card_spec("Task", "Backlog", &[]))
            .unwrap_err();
        assert!(err.to_string().contains("List 'Backlog' not found"));
    }

    #[test]
    fn test_set_labels_by_name_and_id() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        let list = mock.seed_list(&board.id, "Backlog");
        let bug = mock.seed_label(&board.id, "Bug", LabelColor::Red);
        let ux = mock.seed_label(&board.id, "UX", LabelColor::Sky);
        let card = mock.seed_card(&board.id, &list.id, "[OPS0001] Task");
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let assignments = vec![LabelAssignment {
            card: CardRef::Text("OPS0001".into()),
            labels: vec!["bug".into(), ux.id.clone(), "missing".into()],
        }];
        let results = p.set_labels("Ops", &assignments).unwrap();
        assert_eq!(results, vec![ApplyResult::Modified]);
        assert_eq!(mock.card(&card.id).unwrap().id_labels, vec![bug.id, ux.id]);

        // Second pass changes nothing
        let results = p.set_labels("Ops", &assignments).unwrap();
        assert_eq!(results, vec![ApplyResult::NoChange]);
    }

    #[test]
    fn test_set_labels_same_label_by_name_and_id_is_attached_once() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        let list = mock.seed_list(&board.id, "Backlog");
        let bug = mock.seed_label(&board.id, "Bug", LabelColor::Red);
        let card = mock.seed_card(&board.id, &list.id, "[OPS0001] Task");
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let assignments = vec![LabelAssignment {
            card: CardRef::Number(1),
            labels: vec!["Bug".into(), bug.id.clone(), "BUG".into()],
        }];
        let results = p.set_labels("Ops", &assignments).unwrap();

        assert_eq!(results, vec![ApplyResult::Modified]);
        assert_eq!(mock.calls(), vec![format!("add_card_label {} {}", card.id, bug.id)]);
        assert_eq!(mock.card(&card.id).unwrap().id_labels, vec![bug.id]);

        let results = p.set_labels("Ops", &assignments).unwrap();
        assert_eq!(results, vec![ApplyResult::NoChange]);
    }

    #[test]
    fn test_set_labels_unknown_card_fails_softly() {
        let mock = MockBackend::new();
        mock.seed_board("Ops");
        let client = client(&mock);
        let p = Provisioner::new(&client, false);

        let assignments = vec![LabelAssignment {
            card: CardRef::Number(9),
            labels: vec!["Bug".into()],
        }];
        let results = p.set_labels("Ops", &assignments).unwrap();
        assert!(matches!(results[0], ApplyResult::Failed { .. }));
    }

    #[test]
    fn test_dry_run_sends_nothing() {
        let mock = MockBackend::new();
        let board = mock.seed_board("Ops");
        mock.seed_list(&board.id, "Backlog");
        let client = client(&mock);
        let p = Provisioner::new(&client, true);

        let boards = p.create_board(&board_spec("New", &["Todo"])).unwrap();
        assert_eq!(boards.len(), 1);
        assert!(matches!(boards[0], ApplyResult::Skipped { .. }));
        let lists = p.create_lists("New", &["Todo".to_string()]).unwrap();
        assert!(matches!(lists[0], ApplyResult::Skipped { .. }));
        p.create_lists("Ops", &["Doing".to_string()]).unwrap();
        p.create_labels("Ops", &[label_spec("Bug", None)]).unwrap();
        p.create_card("Ops", None, &card_spec("Task", "Backlog", &[])).unwrap();

        assert_eq!(mock.mutation_count(), 0);
    }
}
