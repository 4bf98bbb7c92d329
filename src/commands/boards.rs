//! `boardsmith boards` - list boards visible to the token

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use trellokit::Board;

use crate::Context;
use crate::cli::AuthArgs;
use crate::config::Connection;
use crate::progress;
use crate::ui;

pub fn run(ctx: &Context, auth: AuthArgs, all: bool) -> Result<()> {
    let connection = Connection::resolve(auth.api_key, auth.api_token, ctx.config.as_deref())?;
    let client = connection.client();

    let pb = progress::spinner("Fetching boards from Trello...");
    let boards = match client.boards() {
        Ok(boards) => boards,
        Err(e) => {
            progress::finish_clear(&pb);
            let advice = e.category().advice();
            return Err(e).context(format!("Failed to list boards ({advice})"));
        }
    };

    let boards = visible(boards, all);
    progress::finish_success(&pb, &format!("Found {}", ui::plural(boards.len(), "board")));

    if ctx.quiet {
        for board in &boards {
            println!("{}", board.name);
        }
        return Ok(());
    }

    println!();
    for board in &boards {
        if board.closed {
            println!("  {} {}", board.name.dimmed(), "(closed)".dimmed());
        } else {
            println!("  {}", board.name.bold());
        }
        if ctx.verbose > 0 {
            ui::kv("id", &board.id);
            if let Some(url) = &board.url {
                ui::kv("url", url);
            }
        }
    }

    Ok(())
}

/// Boards to show, open ones only unless `all`.
fn visible(boards: Vec<Board>, all: bool) -> Vec<Board> {
    boards.into_iter().filter(|b| all || !b.closed).collect()
}
