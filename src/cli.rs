//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `cardno`.
#[derive(Debug, Parser)]
#[command(name = "cardno", version, about = "Assign unique member card numbers to CRM contacts")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute the workflow action for a single event.
    Run {
        /// Path to the workflow event JSON; reads stdin when omitted.
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Ask the uniqueness oracle whether a card number is already taken.
    Probe {
        /// The card number value to look up.
        value: String,
    },
}
