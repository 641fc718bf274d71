//! Interactive watch mode
//!
//! Runs the background scheduler and answers searches typed on stdin.
//!
//! ## Input
//!
//! - any text: search links
//! - `:reload`: refresh now
//! - `:status`: show cache size and last refresh time
//! - `:token <value>`: replace the API token (empty clears it)
//! - `:show <id>`: list actions for a link
//! - `:copy <id>`, `:open <id>`, `:toggle <id>`: run an action
//! - `:q` / `:quit`: exit

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use savvylinks_core::{LinkAction, LinksEngine, RefreshOutcome, SchedulerEvent};

use crate::output::Output;

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
enum WatchInput {
    Search(String),
    Reload,
    Status,
    Token(String),
    Show(String),
    Action(LinkAction, String),
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> WatchInput {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return WatchInput::Search(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim().to_string()),
        None => (command, String::new()),
    };

    match name {
        "q" | "quit" => WatchInput::Quit,
        "reload" | "r" => WatchInput::Reload,
        "status" => WatchInput::Status,
        "token" => WatchInput::Token(arg),
        "show" if !arg.is_empty() => WatchInput::Show(arg),
        "copy" if !arg.is_empty() => WatchInput::Action(LinkAction::CopyLink, arg),
        "open" if !arg.is_empty() => WatchInput::Action(LinkAction::OpenLink, arg),
        "toggle" if !arg.is_empty() => WatchInput::Action(LinkAction::ToggleAvailability, arg),
        _ => WatchInput::Unknown(line.to_string()),
    }
}

/// Run watch mode until EOF or `:quit`
pub async fn run(mut engine: LinksEngine, output: &Output) -> Result<()> {
    engine.start();
    let mut events = engine
        .take_events()
        .context("Refresh scheduler did not start")?;

    output.message(
        "Watching links. Type to search; :reload, :status, :token <value>, :show/:copy/:open/:toggle <id>, :q to quit.",
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(SchedulerEvent::Completed(outcome)) => report(&outcome, output),
                    None => break,
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if !handle_input(&engine, parse_input(&line), output).await {
                    break;
                }
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}

/// Returns false when the user asked to quit
async fn handle_input(engine: &LinksEngine, input: WatchInput, output: &Output) -> bool {
    match input {
        WatchInput::Quit => return false,
        WatchInput::Search(search) => output.print_results(&engine.query(&search)),
        WatchInput::Reload => engine.reload(),
        WatchInput::Status => output.print_snapshot_summary(&engine.snapshot()),
        WatchInput::Token(token) => engine.set_token(&token),
        WatchInput::Show(id) => match engine.find(&id) {
            Some(record) => output.print_menu(&engine.context_menu(&record)),
            None => output.failure(&format!("Link not found: {}", id)),
        },
        WatchInput::Action(action, id) => match engine.find(&id) {
            Some(record) => {
                engine.dispatch(action, &record).await;
            }
            None => output.failure(&format!("Link not found: {}", id)),
        },
        WatchInput::Unknown(line) => output.failure(&format!("Unknown command: {}", line)),
    }
    true
}

/// Refresh failures are only logged; the cache keeps its last good data
fn report(outcome: &RefreshOutcome, output: &Output) {
    match outcome {
        RefreshOutcome::Updated(count) => {
            output.message(&format!("Refreshed: {} link(s)", count));
        }
        RefreshOutcome::Cleared => {
            output.message("No API token set, link list cleared");
        }
        RefreshOutcome::Failed(e) => debug!("Refresh skipped: {}", e),
        RefreshOutcome::Coalesced => {}
    }
}
