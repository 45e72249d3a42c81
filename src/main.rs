use clap::Parser;
use freshline::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    freshline::logging::init(cli.global.verbose);

    let global = &cli.global;
    match cli.command {
        Commands::Record(args) => freshline::cli::commands::record::run(args, global),
        Commands::History(args) => freshline::cli::commands::history::run(args, global),
        Commands::Show(args) => freshline::cli::commands::show::run(args, global),
        Commands::Rollback(args) => freshline::cli::commands::rollback::run(args, global),
        Commands::Clear(args) => freshline::cli::commands::clear::run(args, global),
        Commands::Completions(args) => freshline::cli::commands::completions::run(args),
    }
}
