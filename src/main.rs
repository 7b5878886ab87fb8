use bdt::cli::{Cli, Commands};
use clap::Parser;
use miette::{IntoDiagnostic, Result};

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

    if let Some(dir) = &cli.global.directory {
        std::env::set_current_dir(dir).into_diagnostic()?;
    }

    match cli.command {
        Commands::Init(args) => bdt::cli::commands::init::run(args),
        Commands::Session(cmd) => bdt::cli::commands::session::run(cmd, &cli.global),
        Commands::Building(cmd) => bdt::cli::commands::building::run(cmd),
        Commands::Weather(cmd) => bdt::cli::commands::weather::run(cmd),
        Commands::Point(cmd) => bdt::cli::commands::point::run(cmd, &cli.global),
        Commands::Calc(args) => bdt::cli::commands::calc::run(args, &cli.global),
        Commands::Rings(args) => bdt::cli::commands::rings::run(args),
        Commands::Validate(args) => bdt::cli::commands::validate::run(args),
        Commands::Completions(args) => bdt::cli::commands::completions::run(args),
    }
}
