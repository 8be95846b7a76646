use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Flightdesk: a conversational flight search assistant.
/// Starts an interactive terminal session by default.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase message verbosity.
    ///
    /// Specify multiple times for more verbose output:
    ///  -v:  INFO level
    ///  -vv: DEBUG level
    ///  -vvv: TRACE level (most verbose)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a Flightdesk.toml. Searched for upward from the current
    /// directory when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ask a single question non-interactively and print the reply.
    #[arg(short, long)]
    pub ask: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the web chat page.
    Serve {
        /// Address to listen on. Overrides `server.bind` from config.
        #[arg(short, long)]
        bind: Option<String>,
    },
}
