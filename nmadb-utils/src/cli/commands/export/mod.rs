pub mod handler;

pub use handler::handle_export_command;

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportCommands {
    /// Model to export (defaults to the selection's model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Export with a stored download selection
    #[arg(short, long, conflicts_with = "format")]
    pub selection: Option<String>,

    /// Output format: CSV, ODS, XLSX or UTF16CSV
    #[arg(short, long, default_value = "CSV")]
    pub format: String,

    /// Only export records with these ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<String>,

    /// Output file (defaults to data.<ext> in the working directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
