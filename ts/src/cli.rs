//! CLI argument parsing for templatestore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tpl")]
#[command(author, version, about = "Manage built-in and user-defined editor templates", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the user template file
    #[arg(long)]
    pub override_file: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List templates
    List {
        /// Only templates for this context
        #[arg(short, long)]
        context: Option<String>,

        /// Include disabled templates
        #[arg(short, long)]
        all: bool,
    },

    /// Show a template
    Show {
        #[arg(required = true)]
        id: String,
    },

    /// Add a user template
    Add {
        /// Template id (default: generated)
        #[arg(long)]
        id: Option<String>,

        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long)]
        context: String,

        #[arg(short, long)]
        body: String,
    },

    /// Change fields of an existing template
    Update {
        #[arg(required = true)]
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        context: Option<String>,

        #[arg(short, long)]
        body: Option<String>,
    },

    /// Delete a template
    Remove {
        #[arg(required = true)]
        id: String,
    },

    /// Enable a template
    Enable {
        #[arg(required = true)]
        id: String,
    },

    /// Disable a template
    Disable {
        #[arg(required = true)]
        id: String,
    },

    /// Drop the user override of a template
    Revert {
        #[arg(required = true)]
        id: String,
    },

    /// Bring back deleted built-in templates
    RestoreDeleted,

    /// Drop every user template and override
    RestoreDefaults,

    /// List known contexts
    Contexts,

    /// Print the stored user templates
    Export,
}
