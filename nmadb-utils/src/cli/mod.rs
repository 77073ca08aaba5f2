pub mod commands;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use commands::actions::ActionsCommands;
use commands::export::ExportCommands;
use commands::fill::FillCommands;
use commands::mail::MailCommands;
use commands::selections::SelectionsCommands;

#[derive(Parser, Debug)]
#[command(
    name = "nmadb-utils",
    version,
    about = "Export records to spreadsheets and fill missing spreadsheet columns"
)]
pub struct Cli {
    /// Config file (defaults to $NMADB_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export records of a model
    Export(ExportCommands),
    /// Fill an uploaded spreadsheet with values from stored records
    FillMissing(FillCommands),
    /// Inspect stored download selections
    Selections {
        #[command(subcommand)]
        command: SelectionsCommands,
    },
    /// Inspect registered actions
    Actions {
        #[command(subcommand)]
        command: ActionsCommands,
    },
    /// Send mass mail
    Mail {
        #[command(subcommand)]
        command: MailCommands,
    },
}
