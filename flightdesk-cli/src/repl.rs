// flightdesk-cli/src/repl.rs

//! Terminal front-end: a rustyline loop over an in-memory conversation.

use crate::rendering::print_formatted;
use anyhow::{Context, Result};
use colored::*;
use flightdesk_core::{Conversation, FlightAssistant};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const INPUT_HISTORY_FILE: &str = "repl_history.txt";

const EXAMPLE_QUERIES: [&str; 3] = [
    "Flights from JFK to LAX today",
    "Status of flight AA100",
    "Delta flights from Atlanta to Chicago",
];

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Exit,
    NewConversation,
    Ask(&'a str),
}

fn parse_line(line: &str) -> ReplCommand<'_> {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" | "exit" | "quit" => ReplCommand::Exit,
        "new" => ReplCommand::NewConversation,
        _ => ReplCommand::Ask(trimmed),
    }
}

fn print_welcome_message(conversation: &Conversation, model: &str) {
    println!("\n{}", "Flightdesk - AI Flight Assistant".cyan().bold());
    println!("{}: {}", "Model".cyan(), model);
    println!("{}: {}", "Session".cyan(), conversation.id());
    println!("{}", "Try asking:".dimmed());
    for example in EXAMPLE_QUERIES {
        println!("  {}", example.dimmed());
    }
    println!(
        "{}\n{}",
        "Type 'exit', 'quit', Ctrl-D, or press Enter on an empty line to quit.".dimmed(),
        "Type 'new' to start a fresh conversation.".dimmed()
    );
    println!();
}

fn thinking_spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "-"]),
    );
    pb.set_message("Searching flights...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn input_history_path() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("flightdesk");
    match fs::create_dir_all(&dir) {
        Ok(()) => Some(dir.join(INPUT_HISTORY_FILE)),
        Err(e) => {
            warn!(
                path = %dir.display(),
                error = %e,
                "Could not create cache directory; input history disabled."
            );
            None
        }
    }
}

/// Runs one turn and prints the raw reply.
pub async fn run_single_turn(assistant: &FlightAssistant, question: &str) -> Result<()> {
    let conversation = Conversation::new();
    info!(session_id = %conversation.id(), "Running non-interactive turn.");

    let pb = thinking_spinner()?;
    let (_conversation, reply) = assistant.chat(conversation, question).await;
    pb.finish_and_clear();

    println!("{}", reply);
    Ok(())
}

pub async fn run_interactive(assistant: &FlightAssistant) -> Result<()> {
    let mut conversation = Conversation::new();
    print_welcome_message(&conversation, assistant.model_name());

    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl = DefaultEditor::with_config(rl_config).context("Failed to initialize line editor")?;

    let history_path = input_history_path();
    if let Some(path) = &history_path {
        if rl.load_history(path).is_err() {
            debug!(path = %path.display(), "No previous input history found.");
        }
    }

    let prompt = format!("{} ", ">".green().bold());

    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => {
                info!("EOF detected, exiting interactive mode.");
                break;
            }
            Err(err) => {
                error!("Readline error: {:?}", err);
                eprintln!("Error reading input: {}", err.to_string().red());
                break;
            }
        };

        match parse_line(&line) {
            ReplCommand::Exit => {
                info!("Exit command or empty line entered, exiting interactive mode.");
                break;
            }
            ReplCommand::NewConversation => {
                println!("\n{}", "Starting a new conversation...".cyan());
                conversation = Conversation::new();
                info!(session_id = %conversation.id(), "Started new conversation.");
                print_welcome_message(&conversation, assistant.model_name());
            }
            ReplCommand::Ask(question) => {
                let pb = thinking_spinner()?;
                let (updated, reply) = assistant.chat(conversation, question).await;
                conversation = updated;
                pb.finish_and_clear();

                println!("\n{}\n", "--- Assistant ---".bold());
                if let Err(e) = print_formatted(&reply) {
                    error!("Failed to render reply markdown: {}. Printing raw.", e);
                    println!("{}", reply);
                }
                println!("\n-----------------");
            }
        }
    }

    if let Some(path) = &history_path {
        if let Err(e) = rl.save_history(path) {
            warn!(path = %path.display(), error = %e, "Failed to save input history.");
        }
    }
    println!("\n{}\n", "Goodbye. Safe travels!".cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words_and_blank_line_quit() {
        for line in ["", "   ", "exit", "QUIT", " Exit \n"] {
            assert_eq!(parse_line(line), ReplCommand::Exit, "{:?}", line);
        }
    }

    #[test]
    fn test_new_starts_conversation() {
        assert_eq!(parse_line("new"), ReplCommand::NewConversation);
        assert_eq!(parse_line(" NEW "), ReplCommand::NewConversation);
    }

    #[test]
    fn test_questions_are_trimmed() {
        assert_eq!(
            parse_line("  Status of flight AA100 \n"),
            ReplCommand::Ask("Status of flight AA100")
        );
        assert_eq!(parse_line("newark flights"), ReplCommand::Ask("newark flights"));
    }
}
