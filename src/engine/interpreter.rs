//! Order interpreter
//!
//! Walks the orders top to bottom and runs each order's commands in the
//! fixed [`Command::ALL`] order. The card prefix set by one order stays in
//! effect for later orders until another order sets a new one.

use anyhow::{Context, Result};
use trellokit::Client;

use super::ApplyOptions;
use super::outcome::{ApplyResult, ExecuteSummary};
use super::provision::Provisioner;
use crate::orders::{Command, Order, Orders};
use crate::ui;

/// One command of one order, as it will be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    /// 1-based order number
    pub order: usize,
    pub board: String,
    pub command: Command,
    pub entries: usize,
}

/// Steps `orders` would run, in execution order.
pub fn plan(orders: &Orders) -> Vec<PlanStep> {
    orders
        .orders
        .iter()
        .enumerate()
        .flat_map(|(i, order)| {
            let board = order.board.clone().unwrap_or_default();
            order.commands().into_iter().map(move |command| PlanStep {
                order: i + 1,
                board: board.clone(),
                command,
                entries: order.entry_count(command),
            })
        })
        .collect()
}

/// Runs orders against a Trello client.
pub struct OrderInterpreter<'a> {
    provisioner: Provisioner<'a>,
    board: Option<String>,
    prefix: Option<String>,
}

impl<'a> OrderInterpreter<'a> {
    pub fn new(client: &'a Client, options: ApplyOptions) -> Self {
        Self {
            provisioner: Provisioner::new(client, options.dry_run),
            board: None,
            prefix: None,
        }
    }

    /// Board of the order being run (or last run).
    pub fn board(&self) -> Option<&str> {
        self.board.as_deref()
    }

    /// Card prefix currently in effect.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Validate, then run every order.
    ///
    /// Nothing is sent to Trello when validation fails. A missing board or
    /// destination list stops the run; results gathered so far are lost
    /// with it.
    pub fn run(&mut self, orders: &Orders) -> Result<ExecuteSummary> {
        orders.validate()?;

        let mut summary = ExecuteSummary::default();
        for (i, order) in orders.orders.iter().enumerate() {
            let results = self
                .run_order(order)
                .with_context(|| {
                    format!("Order #{} for board '{}' failed", i + 1, self.board().unwrap_or("?"))
                })?;
            for result in &results {
                summary.add_result(result);
            }
        }

        Ok(summary)
    }

    fn run_order(&mut self, order: &Order) -> Result<Vec<ApplyResult>> {
        let board = order
            .board
            .clone()
            .context("There is an order descriptor without the 'board' key")?;
        self.board = Some(board.clone());

        if let Some(prefix) = &order.prefix {
            log::debug!("Card prefix is now '{prefix}'");
            self.prefix = Some(prefix.clone());
        }

        let mut results = Vec::new();
        for command in order.commands() {
            println!();
            ui::info(&announcement(command, &board));
            let outcome = self.run_command(command, &board, order)?;
            report(&outcome);
            results.extend(outcome);
        }

        Ok(results)
    }

    fn run_command(
        &self,
        command: Command,
        board: &str,
        order: &Order,
    ) -> Result<Vec<ApplyResult>> {
        let p = &self.provisioner;

        match command {
            Command::CreateBoards => {
                let mut results = Vec::new();
                for spec in order.create_boards.iter().flatten() {
                    results.extend(p.create_board(spec)?);
                }
                Ok(results)
            }
            Command::CreateLists => {
                p.create_lists(board, order.create_lists.as_deref().unwrap_or_default())
            }
            Command::CreateLabels => {
                p.create_labels(board, order.create_labels.as_deref().unwrap_or_default())
            }
            Command::CreateCards => order
                .create_cards
                .iter()
                .flatten()
                .map(|spec| p.create_card(board, self.prefix(), spec))
                .collect(),
            Command::SetLabels => {
                p.set_labels(board, order.set_labels.as_deref().unwrap_or_default())
            }
        }
    }
}

fn announcement(command: Command, board: &str) -> String {
    format!("Will run command '{command}' for board '{board}'")
}

/// Show the results the provisioner did not already announce.
fn report(results: &[ApplyResult]) {
    for result in results {
        match result {
            ApplyResult::Skipped { reason } => ui::dim(&format!("{} {reason}", result.symbol())),
            ApplyResult::Failed { error } => ui::warn(error),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellokit::MockBackend;

    const ROADMAP: &str = r#"{
        "orders": [
            {
                "board": "Roadmap",
                "prefix": "RM",
                "create_cards": [
                    { "name": "Plan Q3", "list": "Backlog", "labels": ["Feature"] }
                ],
                "create_labels": [
                    { "name": "Feature", "color": "sky" },
                    { "name": "Bug", "color": "red" }
                ],
                "create_boards": [
                    { "name": "Roadmap", "lists": ["Backlog", "Doing", "Done"] }
                ]
            },
            {
                "board": "Roadmap",
                "create_lists": ["Blocked"],
                "create_cards": [ { "name": "Ship it", "list": "Doing" } ],
                "set_labels": [ { "card": "RM0001", "labels": ["Bug"] } ]
            }
        ]
    }"#;

    fn apply(mock: &MockBackend, json: &str, dry_run: bool) -> Result<ExecuteSummary> {
        let client = Client::with_backend(Box::new(mock.clone()));
        let orders = Orders::parse(json)?;
        OrderInterpreter::new(&client, ApplyOptions { dry_run }).run(&orders)
    }

    #[test]
    fn test_full_run_builds_the_board() {
        let mock = MockBackend::new();
        let summary = apply(&mock, ROADMAP, false).unwrap();

        // board + 3 board lists + 2 labels + 2 cards + 1 list created,
        // 1 card relabelled
        assert_eq!(summary.created, 9);
        assert_eq!(summary.modified, 1);
        assert!(summary.is_success());

        let client = Client::with_backend(Box::new(mock.clone()));
        let board = client.board_by_name("Roadmap").unwrap().unwrap();
        assert_eq!(
            mock.list_names(&board.id),
            vec!["Backlog", "Doing", "Done", "Blocked"]
        );

        let labels = client.label_index(&board).unwrap();
        assert_eq!(labels.len(), 2);

        let plan_card = client.card_by_name(&board, "Plan Q3").unwrap().unwrap();
        assert_eq!(plan_card.name, "[RM0001] Plan Q3");
        assert_eq!(plan_card.id_labels.len(), 2);

        // prefix carried into the second order
        let ship = client.card_by_name(&board, "Ship it").unwrap().unwrap();
        assert_eq!(ship.name, "[RM0002] Ship it");
    }

    #[test]
    fn test_board_lists_count_as_created() {
        let mock = MockBackend::new();
        let summary = apply(
            &mock,
            r#"{"orders": [{"board": "B", "create_boards": [{"name": "B", "lists": ["x", "y"]}]}]}"#,
            false,
        )
        .unwrap();

        assert_eq!(summary.created, 3);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_announcement_names_command_and_board() {
        assert_eq!(
            announcement(Command::CreateLists, "Roadmap"),
            "Will run command 'create_lists' for board 'Roadmap'"
        );
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let mock = MockBackend::new();
        apply(&mock, ROADMAP, false).unwrap();
        let before = mock.mutation_count();

        let summary = apply(&mock, ROADMAP, false).unwrap();
        assert_eq!(summary.total_changes(), 0);
        assert_eq!(mock.mutation_count(), before);
    }

    #[test]
    fn test_commands_run_in_fixed_order() {
        let mock = MockBackend::new();
        apply(&mock, ROADMAP, false).unwrap();

        let calls = mock.calls();
        let first_label = calls.iter().position(|c| c.starts_with("create_label")).unwrap();
        let first_card = calls.iter().position(|c| c.starts_with("create_card")).unwrap();
        assert!(calls[0].starts_with("create_board Roadmap"));
        assert!(first_label < first_card);
    }

    #[test]
    fn test_prefix_is_kept_until_overridden() {
        let mock = MockBackend::new();
        let client = Client::with_backend(Box::new(mock.clone()));
        let orders = Orders::parse(
            r#"{"orders": [
                {"board": "A", "prefix": "AA", "create_boards": [{"name": "A", "lists": ["L"]}]},
                {"board": "A", "create_cards": [{"name": "one", "list": "L"}]},
                {"board": "A", "prefix": "BB", "create_cards": [{"name": "two", "list": "L"}]}
            ]}"#,
        )
        .unwrap();

        let mut interpreter = OrderInterpreter::new(&client, ApplyOptions::default());
        interpreter.run(&orders).unwrap();
        assert_eq!(interpreter.prefix(), Some("BB"));
        assert_eq!(interpreter.board(), Some("A"));

        let board = client.board_by_name("A").unwrap().unwrap();
        assert_eq!(client.card_by_name(&board, "one").unwrap().unwrap().name, "[AA0001] one");
        assert_eq!(client.card_by_name(&board, "two").unwrap().unwrap().name, "[BB0002] two");
    }

    #[test]
    fn test_invalid_orders_send_nothing() {
        let mock = MockBackend::new();
        let err = apply(
            &mock,
            r#"{"orders": [
                {"board": "A", "create_boards": [{"name": "A"}]},
                {"create_lists": ["x"]}
            ]}"#,
            false,
        )
        .unwrap_err();

        assert!(err.to_string().contains("problem(s) in orders"));
        assert_eq!(mock.mutation_count(), 0);
    }

    #[test]
    fn test_missing_board_aborts_the_run() {
        let mock = MockBackend::new();
        let err = apply(
            &mock,
            r#"{"orders": [{"board": "Ghost", "create_lists": ["Todo"]}]}"#,
            false,
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("Board 'Ghost' not found"));
    }

    #[test]
    fn test_dry_run_of_new_board() {
        let mock = MockBackend::new();
        let summary = apply(&mock, ROADMAP, true).unwrap();

        assert_eq!(mock.mutation_count(), 0);
        assert_eq!(summary.total_changes(), 0);
        assert_eq!(summary.skipped, summary.total());
    }

    #[test]
    fn test_plan_lists_steps_in_execution_order() {
        let orders = Orders::parse(ROADMAP).unwrap();
        let steps = plan(&orders);

        let commands: Vec<Command> = steps.iter().map(|s| s.command).collect();
        assert_eq!(
            commands,
            vec![
                Command::CreateBoards,
                Command::CreateLabels,
                Command::CreateCards,
                Command::CreateLists,
                Command::CreateCards,
                Command::SetLabels,
            ]
        );
        assert_eq!(steps[1].entries, 2);
        assert_eq!(steps[3].order, 2);
        assert!(steps.iter().all(|s| s.board == "Roadmap"));
    }
}
