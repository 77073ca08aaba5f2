use anyhow::Result;
use colored::*;

use super::ActionsCommands;
use nmadb_utils::Config;
use nmadb_utils::admin::DownloadAction;

/// Handle the actions subcommands
pub fn handle_actions_command(command: ActionsCommands, config: &Config) -> Result<()> {
    match command {
        ActionsCommands::List { downloads } => {
            let registry = config.action_registry()?;

            if registry.is_empty() {
                println!("{}", "No actions registered".yellow());
            } else {
                println!("{}", "Actions:".bold());
                for action in registry.actions() {
                    println!(
                        "  {} {} {}",
                        action.gid.bold(),
                        action.short_description,
                        format!("({})", action.url_name).dimmed()
                    );
                }
            }

            if downloads {
                println!("{}", "Download actions:".bold());
                for action in DownloadAction::all() {
                    println!("  {} {}", action.name().cyan(), action.short_description());
                }
            }

            Ok(())
        }
    }
}
