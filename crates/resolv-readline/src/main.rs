use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use resolv_application::{GeminiSessionFactory, TurnController};
use resolv_core::resolution::{Resolution, ResolutionStore, StoreEvent};
use resolv_interaction::config;

const COMMANDS: [&str; 4] = ["/board", "/chart", "/remove", "/help"];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_coach(text: &str) {
    println!("{}", "[Resolv]".bright_magenta());
    for line in text.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
}

fn print_resolution(resolution: &Resolution) {
    let short_id: String = resolution.id.chars().take(8).collect();
    println!(
        "  {} {} {}",
        format!("[{short_id}]").bright_black(),
        resolution.title.bold(),
        format!("({})", resolution.category).yellow()
    );
    println!("      {} {}", "Why:".bright_black(), resolution.motivation);
    println!("      {} {}", "First step:".bright_black(), resolution.first_step);
}

fn print_board(store: &ResolutionStore) {
    let resolutions = store.snapshot();
    if resolutions.is_empty() {
        println!("{}", "Your board is empty. Let's find your first resolution!".bright_black());
        return;
    }
    println!("{}", "=== Your Vision ===".bright_magenta().bold());
    for resolution in &resolutions {
        print_resolution(resolution);
    }
}

fn print_chart(store: &ResolutionStore) {
    println!("{}", "=== Balance ===".bright_magenta().bold());
    for tally in store.category_tallies() {
        let filled = tally.count.min(tally.full_mark) as usize;
        let empty = tally.full_mark as usize - filled;
        println!(
            "  {:<16} {}{} {}",
            tally.subject,
            "#".repeat(filled).green(),
            ".".repeat(empty).bright_black(),
            tally.count
        );
    }
}

/// Removes the single resolution whose id starts with `prefix`.
fn remove_by_prefix(controller: &TurnController, prefix: &str) {
    if prefix.is_empty() {
        println!("{}", "Usage: /remove <id>".yellow());
        return;
    }

    let matches: Vec<Resolution> = controller
        .store()
        .snapshot()
        .into_iter()
        .filter(|r| r.id.starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => println!("{}", format!("No resolution with id {prefix}").yellow()),
        [only] => {
            controller.remove_resolution(&only.id);
        }
        _ => println!(
            "{}",
            format!("Id prefix {prefix} is ambiguous ({} matches)", matches.len()).yellow()
        ),
    }
}

fn print_help() {
    println!("{}", "Just type to talk with your coach.".bright_black());
    println!("{}", "  /board         show your resolutions".bright_black());
    println!("{}", "  /chart         resolutions per category".bright_black());
    println!("{}", "  /remove <id>   remove a resolution from the board".bright_black());
    println!("{}", "  quit           leave".bright_black());
}

/// Hands an accepted reply to the printer task. Returns `false` when the
/// controller rejected the message.
async fn forward_reply(reply: Option<String>, tx: &mpsc::Sender<String>) -> bool {
    match reply {
        Some(reply) => {
            let _ = tx.send(reply).await;
            true
        }
        None => false,
    }
}

/// The main entry point for the Resolv readline REPL application.
///
/// Sets up the resolution store and turn controller, forwards board changes
/// and coach replies to the terminal from background tasks, and keeps the
/// prompt responsive while a message is being processed.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // ===== Backend Initialization =====
    let settings = config::load_settings().context("Failed to load Resolv configuration")?;
    let request_timeout = settings.dialogue.request_timeout();
    let store = ResolutionStore::new();
    let factory = Arc::new(GeminiSessionFactory::new(settings));
    let controller = Arc::new(
        TurnController::new(factory, store.clone()).with_request_timeout(request_timeout),
    );

    // Board change notifications
    let mut events = store.subscribe();
    let board_watcher = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StoreEvent::Added(resolution)) => {
                    println!("{}", "Added to your board:".bright_green());
                    print_resolution(&resolution);
                }
                Ok(StoreEvent::Removed { id }) => {
                    let short_id: String = id.chars().take(8).collect();
                    println!("{}", format!("Removed {short_id} from your board").bright_green());
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Board] Missed {} board notifications", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Coach replies from background tasks
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(32);
    let reply_printer = tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            print_coach(&reply);
        }
    });

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Resolv ===".bright_magenta().bold());
    println!("{}", "Type '/help' for commands, or 'quit' to exit.".bright_black());
    println!();
    print_coach(controller.greeting());

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye! Good luck with your resolutions.".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match trimmed.split_once(' ').unwrap_or((trimmed, "")) {
                    ("/board", _) => print_board(controller.store()),
                    ("/chart", _) => print_chart(controller.store()),
                    ("/remove", prefix) => remove_by_prefix(&controller, prefix.trim()),
                    ("/help", _) => print_help(),
                    _ => {
                        if controller.is_busy() {
                            println!(
                                "{}",
                                "Still thinking about your last message...".yellow()
                            );
                            continue;
                        }

                        println!("{}", format!("> {}", trimmed).green());

                        let tx = reply_tx.clone();
                        let controller = Arc::clone(&controller);
                        let input = trimmed.to_string();
                        tokio::spawn(async move {
                            let reply = controller.send_user_message(&input).await;
                            // Lost the race for the busy flag after the check above.
                            if !forward_reply(reply, &tx).await {
                                println!(
                                    "{}",
                                    "Still thinking about your last message...".yellow()
                                );
                            }
                        });
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    // Drop senders to signal shutdown
    drop(reply_tx);
    let _ = reply_printer.await;
    board_watcher.abort();

    Ok(())
}
