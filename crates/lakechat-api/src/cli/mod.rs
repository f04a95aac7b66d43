//! CLI command definitions for the `lakechat` binary.
//!
//! Uses clap derive macros for argument parsing. Room arguments accept a
//! full room id or any unique prefix of one.

pub mod chat;
pub mod rooms;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Ask questions about your data lake from the terminal.
#[derive(Parser)]
#[command(name = "lakechat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List chat rooms, most recently active first.
    #[command(alias = "ls")]
    Rooms,

    /// Create a new chat room.
    New {
        /// Room title (defaults to the creation timestamp).
        #[arg(long)]
        title: Option<String>,
    },

    /// Delete a chat room and its messages.
    #[command(alias = "rm")]
    Delete {
        /// Room id or unique id prefix.
        room: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },

    /// Print a room's message history.
    History {
        /// Room id or unique id prefix.
        room: String,
    },

    /// Start an interactive chat (most recent room unless one is given).
    Chat {
        /// Room id or unique id prefix.
        room: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
