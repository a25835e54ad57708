mod cli;
mod commands;
mod logging;

use clap::Parser;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(logging::level_for(cli.verbose, cli.quiet));

    let settings = cli.encoding.export_settings();
    match cli.command {
        Commands::Init(args) => commands::init(args),
        Commands::Script(args) => commands::script(args, &settings),
        Commands::Clip(args) => commands::clip(args, &settings),
        Commands::Scene(args) => commands::scene(args, &settings),
        Commands::Check(args) => commands::check(args),
    }
}
