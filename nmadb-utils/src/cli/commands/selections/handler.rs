use anyhow::{Context, Result};
use colored::*;

use super::SelectionsCommands;
use nmadb_utils::Config;
use nmadb_utils::selection;

/// Handle the selections subcommands
pub fn handle_selections_command(command: SelectionsCommands, config: &Config) -> Result<()> {
    match command {
        SelectionsCommands::List { model } => list_selections(config, model.as_deref()),
        SelectionsCommands::Show { title } => show_selection(config, &title),
    }
}

fn list_selections(config: &Config, model: Option<&str>) -> Result<()> {
    let selections: Vec<_> = selection::ordered(&config.selections)
        .into_iter()
        .filter(|s| model.is_none_or(|m| s.applies_to(m)))
        .collect();

    if selections.is_empty() {
        println!("{}", "No download selections configured".yellow());
        return Ok(());
    }

    println!("{}", "Download selections:".bold());
    for selection in selections {
        let model = if selection.model.is_empty() {
            "any model".dimmed().to_string()
        } else {
            selection.model.cyan().to_string()
        };
        println!(
            "  {} [{}] {} {} columns",
            selection.title.bold(),
            selection.writer.code().green(),
            model,
            selection.mapping().len()
        );
    }

    Ok(())
}

fn show_selection(config: &Config, title: &str) -> Result<()> {
    let selection = config
        .selection(title)
        .with_context(|| format!("Unknown selection '{}'", title))?;
    let mapping = selection.mapping();

    println!("{} {}", "Selection:".bold(), selection.title);
    println!(
        "{} {}",
        "Model:".bold(),
        if selection.model.is_empty() {
            "any"
        } else {
            selection.model.as_str()
        }
    );
    println!(
        "{} {} ({})",
        "Writer:".bold(),
        selection.writer.code(),
        selection.writer.description()
    );
    println!("{}", "Columns:".bold());
    for entry in &mapping {
        println!("  {} {} {}", entry.caption, "←".dimmed(), entry.path.to_string().cyan());
    }

    let related = mapping.related();
    if !related.is_empty() {
        let joins: Vec<_> = related.into_iter().collect();
        println!("{} {}", "Related:".bold(), joins.join(", ").dimmed());
    }

    for (entry, problem) in mapping.problems() {
        println!(
            "{} column '{}': {}",
            "Warning:".yellow().bold(),
            entry.caption,
            problem
        );
    }

    Ok(())
}
