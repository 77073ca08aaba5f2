pub mod handler;

pub use handler::handle_mail_command;

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum MailCommands {
    /// Send one message to every recipient
    Send(SendArgs),
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// File with one recipient address per line
    #[arg(short, long)]
    pub recipients: PathBuf,

    /// Message subject
    #[arg(short, long)]
    pub subject: String,

    /// File holding the message body
    #[arg(short, long)]
    pub body_file: PathBuf,

    /// Attachment as PATH or PATH=LABEL (up to three)
    #[arg(short, long = "attach")]
    pub attachments: Vec<String>,

    /// Outbox directory (overrides mail.outbox)
    #[arg(long)]
    pub outbox: Option<PathBuf>,

    /// Messages per connection (overrides mail.batch_size)
    #[arg(long)]
    pub batch_size: Option<usize>,
}
