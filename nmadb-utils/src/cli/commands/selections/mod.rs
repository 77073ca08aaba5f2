pub mod handler;

pub use handler::handle_selections_command;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum SelectionsCommands {
    /// List stored selections, ordered by title
    List {
        /// Only selections usable for this model
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Show the columns of a selection
    Show {
        /// Selection title
        title: String,
    },
}
