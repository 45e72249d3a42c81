//! `freshline show` command - Show one entry with its snapshots

use miette::{miette, Result};

use crate::cli::output::render_entry;
use crate::cli::{AppContext, GlobalOpts};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Entry reference: @N, N, CHG-<ULID> or a bare ULID (default: newest)
    pub entry: Option<String>,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::from_global(global)?;
    let short_ids = ctx.short_ids();

    let entry = match &args.entry {
        Some(reference) => {
            let id = short_ids
                .resolve(reference)
                .ok_or_else(|| miette!("Unknown entry reference: {}", reference))?;
            ctx.coordinator
                .entry(&id)
                .ok_or_else(|| miette!("No history entry {}", id))?
        }
        None => ctx
            .coordinator
            .latest()
            .ok_or_else(|| miette!("No history found."))?,
    };

    let short = short_ids.get_short_id(entry.id());
    print!("{}", render_entry(&entry, short.as_deref(), global.output)?);
    Ok(())
}
