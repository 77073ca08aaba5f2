pub mod handler;

pub use handler::handle_fill_command;

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FillCommands {
    /// Stored download selection whose columns are filled in
    #[arg(short, long)]
    pub selection: String,

    /// Uploaded spreadsheet (.ods, .xlsx or .csv)
    #[arg(short, long)]
    pub upload: PathBuf,

    /// Model to look records up in (defaults to the selection's model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "ODS")]
    pub format: String,

    /// Output file (defaults to data.<ext> in the working directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
