//! `freshline history` command - List recorded changes, newest first

use console::style;
use miette::Result;
use tracing::warn;

use crate::cli::output::render_entries;
use crate::cli::{AppContext, GlobalOpts};
use crate::core::HistoryFilter;

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Only entries of this entity type
    #[arg(long = "type", short = 't')]
    pub entity_type: Option<String>,

    /// Only entries of this entity (requires --type)
    #[arg(long = "id", short = 'i', requires = "entity_type")]
    pub entity_id: Option<String>,

    /// Limit to the newest N entries
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

pub fn run(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::from_global(global)?;
    let filter = HistoryFilter::from_parts(args.entity_type.as_deref(), args.entity_id.as_deref());
    let mut entries = ctx.coordinator.get_history(&filter);
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    if args.count {
        println!("{}", entries.len());
        return Ok(());
    }

    if entries.is_empty() {
        println!("No history found.");
        return Ok(());
    }

    // Assign @N aliases in display order
    let mut short_ids = ctx.short_ids();
    short_ids.rebuild(entries.iter().map(|e| e.id()));
    if let Err(e) = short_ids.save(&ctx.data_dir) {
        warn!(error = %e, "cannot save short ids");
    }

    print!("{}", render_entries(&entries, &short_ids, global.output)?);

    if matches!(
        global.output,
        crate::cli::OutputFormat::Auto | crate::cli::OutputFormat::Table
    ) {
        println!(
            "Use {} to undo an entry.",
            style("freshline rollback @N").cyan()
        );
    }

    Ok(())
}
