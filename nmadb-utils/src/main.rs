use anyhow::Result;
use clap::Parser;
use colored::*;

mod cli;

use cli::{Cli, Commands};
use nmadb_utils::Config;

fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config_path = Config::resolve_path(cli.config.as_deref())?;
    let config = Config::load(&config_path)?;

    match cli.command {
        Commands::Export(args) => cli::commands::export::handle_export_command(args, &config),
        Commands::FillMissing(args) => cli::commands::fill::handle_fill_command(args, &config),
        Commands::Selections { command } => {
            cli::commands::selections::handle_selections_command(command, &config)
        }
        Commands::Actions { command } => {
            cli::commands::actions::handle_actions_command(command, &config)
        }
        Commands::Mail { command } => cli::commands::mail::handle_mail_command(command, &config),
    }
}
