//! Command-line interface definition for Chatty
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the session-management commands over the conversation store.

use clap::{Parser, Subcommand};

/// Chatty - terminal chat client
///
/// Manage saved conversations: list, inspect, rename, extend and delete
/// sessions in the local history database.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatty")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the conversation database location
    #[arg(long, global = true)]
    pub storage_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatty
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage conversation history
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// Conversation history subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List saved sessions, most recent first
    List {
        /// Maximum number of sessions to show (0 = all; defaults to config)
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Start a new, empty session
    New {
        /// Session name (generated from the current time when omitted)
        name: Option<String>,
    },

    /// Show a session transcript
    Show {
        /// Session ID
        id: i64,

        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename a session
    Rename {
        /// Session ID
        id: i64,

        /// New session name
        name: String,
    },

    /// Append a message to a session
    Append {
        /// Session ID
        id: i64,

        /// Message role (user, assistant, system)
        #[arg(short, long, default_value = "user")]
        role: String,

        /// Message content
        #[arg(short, long)]
        content: String,
    },

    /// Delete a session and all of its messages
    Delete {
        /// Session ID
        id: i64,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            storage_path: None,
            verbose: false,
            command: Commands::History {
                command: HistoryCommand::List { limit: None },
            },
        }
    }
}
