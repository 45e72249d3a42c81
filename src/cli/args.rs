//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::clear::ClearArgs;
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::history::HistoryArgs;
use crate::cli::commands::record::RecordArgs;
use crate::cli::commands::rollback::RollbackArgs;
use crate::cli::commands::show::ShowArgs;
use crate::core::SlotBackend;

#[derive(Parser, Debug)]
#[command(
    name = "freshline",
    version,
    about = "Auditable state history and rollback for the supply-chain admin console",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Directory holding the history slot (overrides config)
    #[arg(long, global = true, env = "FRESHLINE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Storage backend for the history slot (overrides config)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<SlotBackend>,

    /// Act as this user id (overrides config)
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    /// Display name for --user-id
    #[arg(long, global = true, requires = "user_id")]
    pub user_name: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "auto")]
    pub output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a change to an entity
    Record(RecordArgs),

    /// List recorded changes, newest first
    #[command(visible_alias = "log")]
    History(HistoryArgs),

    /// Show one entry with its snapshots
    Show(ShowArgs),

    /// Undo a recorded change by restoring its previous snapshot
    Rollback(RollbackArgs),

    /// Clear history, entirely or for one entity type
    Clear(ClearArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output formats
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, YAML for single entries
    #[default]
    Auto,
    Table,
    Json,
    Yaml,
    Csv,
    /// Markdown table
    Md,
    /// Entry ids only, one per line
    Id,
}
