//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use reviewdesk_domain::{RecordId, RecordStatus, RecordType};
use std::path::PathBuf;

/// reviewdesk - review machine-extracted records from the command line.
#[derive(Debug, Parser)]
#[command(name = "reviewdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "REVIEWDESK_CLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Log client internals to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List records
    List(ListArgs),

    /// Show record counts per status
    Stats,

    /// Show one record and its review history
    Show {
        /// Record ID
        id: RecordId,
    },

    /// Approve one or more records
    Approve(ApproveArgs),

    /// Reject one or more records
    Reject(RejectArgs),

    /// Replace the extracted data of a record
    Edit(EditArgs),

    /// Mark approved records exported and print the selection
    Export(ExportArgs),

    /// Stream live notifications
    Watch(WatchArgs),

    /// Manage configuration profiles
    Profile(ProfileArgs),
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Filter by status
    #[arg(short, long)]
    pub status: Option<RecordStatus>,

    /// Filter by record type (form, email, invoice)
    #[arg(short = 't', long = "type")]
    pub record_type: Option<RecordType>,

    /// Number of records to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Maximum number of records
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the approve command.
#[derive(Debug, Parser)]
pub struct ApproveArgs {
    /// Record IDs; more than one runs a batch
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<RecordId>,

    /// Approval notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Arguments for the reject command.
#[derive(Debug, Parser)]
pub struct RejectArgs {
    /// Record IDs; more than one runs a batch
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<RecordId>,

    /// Rejection reason
    #[arg(short, long)]
    pub reason: String,
}

/// Arguments for the edit command.
#[derive(Debug, Parser)]
pub struct EditArgs {
    /// Record ID
    pub id: RecordId,

    /// Replacement data as a JSON object
    #[arg(short, long)]
    pub data: String,

    /// Edit notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Arguments for the export command.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// Export only these records (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<RecordId>,

    /// Include rejected records
    #[arg(long)]
    pub include_rejected: bool,

    /// Target file format (csv, xlsx, json)
    #[arg(long, default_value = "csv")]
    pub export_format: String,

    /// Write the selected records as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Reload and print statistics after each change
    #[arg(long)]
    pub stats: bool,

    /// Give up after this many reconnect attempts
    #[arg(long)]
    pub max_reconnects: Option<u32>,
}

/// Arguments for profile management.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List all profiles
    List,

    /// Show active profile
    Show,

    /// Switch to a different profile
    Switch {
        /// Profile name
        name: String,
    },

    /// Create or update a profile
    Set {
        /// Profile name
        name: String,
        /// Server URL
        #[arg(short, long)]
        url: String,
        /// Reviewer name sent with every change
        #[arg(short, long)]
        reviewer: Option<String>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
