use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use super::{MailCommands, SendArgs};
use nmadb_utils::Config;
use nmadb_utils::mail::{Attachment, OutboxBackend, send_mass_mail};

/// Handle the mail subcommands
pub fn handle_mail_command(command: MailCommands, config: &Config) -> Result<()> {
    match command {
        MailCommands::Send(args) => send(args, config),
    }
}

fn send(args: SendArgs, config: &Config) -> Result<()> {
    let mut settings = config.mail.clone();
    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size;
    }

    // mail.outbox is relative to the config file
    let outbox = match (args.outbox, &settings.outbox) {
        (Some(dir), _) => dir,
        (None, Some(dir)) => config.base_dir().join(dir),
        (None, None) => anyhow::bail!("No outbox directory: pass --outbox or set mail.outbox"),
    };

    let recipients = read_recipients(&args.recipients)?;
    if recipients.is_empty() {
        anyhow::bail!("No recipients in {}", args.recipients.display());
    }

    let body = fs::read_to_string(&args.body_file)
        .with_context(|| format!("Failed to read body file: {}", args.body_file.display()))?;

    let attachments = args
        .attachments
        .iter()
        .map(|arg| {
            let (path, label) = parse_attachment(arg);
            Attachment::from_file(&path, label)
        })
        .collect::<Result<Vec<_>>>()?;

    let backend = OutboxBackend::new(&outbox);
    let sent = send_mass_mail(
        &backend,
        &settings,
        &recipients,
        &args.subject,
        &body,
        &attachments,
    )?;

    println!(
        "{} {} {} messages in batches of {} to {}",
        "✓".green(),
        "Queued".bold(),
        sent,
        settings.batch_size,
        outbox.display().to_string().cyan()
    );

    Ok(())
}

/// Recipient addresses, skipping blank lines and `#` comments
fn read_recipients(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read recipients file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Split `PATH=LABEL`; without `=` the whole argument is the path
fn parse_attachment(arg: &str) -> (PathBuf, Option<String>) {
    match arg.split_once('=') {
        Some((path, label)) if !label.trim().is_empty() => {
            (PathBuf::from(path), Some(label.trim().to_string()))
        }
        Some((path, _)) => (PathBuf::from(path), None),
        None => (PathBuf::from(arg), None),
    }
}
