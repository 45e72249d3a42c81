//! `freshline record` command - Record a change to an entity

use console::style;
use miette::Result;

use crate::cli::helpers::parse_state_arg;
use crate::cli::{AppContext, GlobalOpts, OutputFormat};
use crate::core::EntityRef;

#[derive(clap::Args, Debug)]
pub struct RecordArgs {
    /// Label of what changed (e.g. "Update price")
    #[arg(long, short = 'a')]
    pub action: String,

    /// Entity type (e.g. product, lot, label, system)
    #[arg(long = "type", short = 't')]
    pub entity_type: String,

    /// Entity id within its type
    #[arg(long = "id", short = 'i')]
    pub entity_id: String,

    /// State before the change: inline JSON or @file (default: null)
    #[arg(long)]
    pub before: Option<String>,

    /// State after the change: inline JSON or @file (default: null)
    #[arg(long)]
    pub after: Option<String>,
}

pub fn run(args: RecordArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = AppContext::from_global(global)?;
    let previous = parse_state_arg(args.before.as_deref())?;
    let current = parse_state_arg(args.after.as_deref())?;
    let entity = EntityRef::new(args.entity_type, args.entity_id);

    let saved = ctx
        .coordinator
        .save_state(&args.action, &entity, &previous, &current)?;

    match saved {
        Some(id) => match global.output {
            OutputFormat::Id | OutputFormat::Json | OutputFormat::Yaml | OutputFormat::Csv => {
                println!("{}", id)
            }
            _ => println!(
                "{} Recorded {} for {} as {}",
                style("✓").green(),
                style(&args.action).bold(),
                style(&entity).cyan(),
                id
            ),
        },
        None => {
            eprintln!(
                "{} No user signed in; change not recorded (unauthenticated: {}). Use --user-id or set user.id in config.",
                style("!").yellow(),
                ctx.coordinator.policy()
            );
        }
    }

    Ok(())
}
