pub mod handler;

pub use handler::handle_actions_command;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ActionsCommands {
    /// List registered actions in registration order
    List {
        /// Also list the download actions every model gets
        #[arg(long)]
        downloads: bool,
    },
}
