//! `boardsmith apply` - make Trello match an orders file

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use std::path::Path;
use trellokit::Client;

use crate::Context;
use crate::cli::ApplyArgs;
use crate::config::Connection;
use crate::engine::{ApplyOptions, OrderInterpreter, PlanStep, plan};
use crate::orders::Orders;
use crate::{progress, ui};

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let orders = Orders::load(&args.orders)?;
    if orders.is_empty() {
        ui::info(&format!("Nothing to do: {} holds no orders", args.orders.display()));
        return Ok(());
    }
    orders.validate()?;

    let steps = plan(&orders);
    if steps.is_empty() {
        ui::info("Nothing to do: no order carries a known command");
        return Ok(());
    }

    if !ctx.quiet {
        display_plan(&args.orders, &orders, &steps);
    }

    let connection = Connection::resolve(
        args.auth.api_key,
        args.auth.api_token,
        ctx.config.as_deref(),
    )?;

    if !args.yes && !args.dry_run && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let client = connection.client();
    check_connection(&client)?;

    let mut interpreter = OrderInterpreter::new(
        &client,
        ApplyOptions {
            dry_run: args.dry_run,
        },
    );
    let summary = interpreter.run(&orders)?;
    summary.print(args.dry_run);

    if !summary.is_success() {
        anyhow::bail!("{} order entries failed", summary.failed);
    }

    Ok(())
}

/// Make sure Trello answers with these credentials before any order runs.
fn check_connection(client: &Client) -> Result<usize> {
    let pb = progress::spinner("Connecting to Trello...");
    let boards = match client.boards() {
        Ok(boards) => boards,
        Err(e) => {
            progress::finish_clear(&pb);
            let advice = e.category().advice();
            return Err(e).context(format!("Failed to reach Trello ({advice})"));
        }
    };
    progress::finish_success(
        &pb,
        &format!("Connected, {} visible", ui::plural(boards.len(), "board")),
    );
    Ok(boards.len())
}

fn display_plan(path: &Path, orders: &Orders, steps: &[PlanStep]) {
    ui::header(&format!("Orders: {}", path.display()));
    ui::kv("orders", &ui::plural(orders.len(), "order"));
    ui::kv("commands", &ui::plural(steps.len(), "command"));
    println!();

    for step in steps {
        println!(
            "  {} {:<14} {} {}",
            format!("#{}", step.order).dimmed(),
            step.command.key(),
            step.board.cyan(),
            format!(
                "({} {})",
                step.entries,
                if step.entries == 1 { "entry" } else { "entries" }
            )
            .dimmed()
        );
    }
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    println!();
    let confirmed = Confirm::new()
        .with_prompt("Apply these orders to Trello?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}
