//! `freshline rollback` command - Undo a recorded change

use console::style;
use miette::{miette, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::cli::{AppContext, GlobalOpts, OutputFormat};
use crate::core::RollbackOutcome;

#[derive(clap::Args, Debug)]
pub struct RollbackArgs {
    /// Entry reference: @N, N, CHG-<ULID> or a bare ULID
    pub entry: String,

    /// Write the restored state to FILE instead of stdout
    #[arg(long, short = 'w', value_name = "FILE")]
    pub write: Option<PathBuf>,
}

fn restore_to(target: Option<&Path>, state: &Value) -> std::io::Result<()> {
    let text = serde_json::to_string_pretty(state)?;
    match target {
        Some(path) => std::fs::write(path, format!("{}\n", text)),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

pub fn run(args: RollbackArgs, global: &GlobalOpts) -> Result<()> {
    // With `-o id` stdout carries only the audit id, so the state needs a file
    if global.output == OutputFormat::Id && args.write.is_none() {
        return Err(miette!("--output id requires --write FILE for the restored state"));
    }

    let ctx = AppContext::from_global(global)?;
    let short_ids = ctx.short_ids();

    let id = short_ids
        .resolve(&args.entry)
        .ok_or_else(|| miette!("Unknown entry reference: {}", args.entry))?;

    let outcome = ctx
        .coordinator
        .rollback(&id, |state| restore_to(args.write.as_deref(), state));

    match outcome {
        RollbackOutcome::Completed { original, audit_id } => {
            if global.output == OutputFormat::Id {
                println!("{}", audit_id);
            } else {
                eprintln!(
                    "{} Rolled back {} on {} (audit entry {})",
                    style("✓").green(),
                    style(original.action()).bold(),
                    style(original.entity()).cyan(),
                    audit_id
                );
                if let Some(path) = &args.write {
                    eprintln!("   Previous state written to {}", path.display());
                }
            }
            Ok(())
        }
        RollbackOutcome::NotFound => Err(miette!("No history entry {}", id)),
        RollbackOutcome::RestoreFailed {
            original,
            audit_id,
            reason,
        } => {
            eprintln!(
                "{} Rollback of {} was recorded as {} but the state could not be restored",
                style("!").yellow(),
                style(original.action()).bold(),
                audit_id
            );
            Err(miette!("Restore failed: {}", reason))
        }
    }
}
