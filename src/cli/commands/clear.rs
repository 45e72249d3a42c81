//! `freshline clear` command - Clear history

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{bail, IntoDiagnostic, Result};

use crate::cli::helpers::stdin_is_interactive;
use crate::cli::{AppContext, GlobalOpts};

#[derive(clap::Args, Debug)]
pub struct ClearArgs {
    /// Only clear entries of this entity type
    #[arg(long = "type", short = 't')]
    pub entity_type: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: ClearArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::from_global(global)?;

    let scope = match &args.entity_type {
        Some(t) => format!("all {} history", t),
        None => "the entire history".to_string(),
    };

    // Confirm if not --yes
    if !args.yes {
        if !stdin_is_interactive() {
            bail!("Refusing to clear {} without --yes", scope);
        }
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Clear {}?", scope))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !proceed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = ctx.coordinator.clear_history(args.entity_type.as_deref());
    println!(
        "{} Removed {} entr{}",
        style("✓").green(),
        removed,
        if removed == 1 { "y" } else { "ies" }
    );
    Ok(())
}
