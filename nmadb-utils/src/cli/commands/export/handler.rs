use anyhow::{Context, Result};
use colored::*;

use super::ExportCommands;
use crate::cli::commands::{load_queryset, record_ids};
use nmadb_utils::Config;
use nmadb_utils::admin::{DownloadAction, ModelAdmin};
use nmadb_utils::export::formats::WriterKind;
use nmadb_utils::selection::DownloadSelectionForm;

/// Handle the export command
pub fn handle_export_command(args: ExportCommands, config: &Config) -> Result<()> {
    let model_name = match (&args.model, &args.selection) {
        (Some(model), _) => model.clone(),
        (None, Some(title)) => {
            let selection = config
                .selection(title)
                .with_context(|| format!("Unknown selection '{}'", title))?;
            if selection.model.is_empty() {
                anyhow::bail!(
                    "Selection '{}' is not tied to a model; pass --model",
                    selection.title
                );
            }
            selection.model.clone()
        }
        (None, None) => anyhow::bail!("Either --model or --selection is required"),
    };

    let admin = ModelAdmin::from_config(config, &model_name)?;
    let model = config.model(&model_name)?;
    let mut queryset = load_queryset(config, model, &args.ids)?;

    if queryset.is_empty() {
        log::warn!("No {} records to export", model_name);
    }

    let download = match &args.selection {
        Some(title) => {
            let form = DownloadSelectionForm {
                selected: record_ids(&queryset)?,
                selection: Some(title.clone()),
            };
            admin.run_action(DownloadAction::CustomSelected, &mut queryset, Some(&form))?
        }
        None => {
            let kind = WriterKind::from_code(&args.format)?;
            match DownloadAction::for_writer(kind) {
                Some(action) => admin.run_action(action, &mut queryset, None)?,
                None => admin.download_as(kind, &mut queryset)?,
            }
        }
    };

    let path = download.save(args.output.as_deref())?;

    println!(
        "{} {} {} records to {} ({})",
        "✓".green(),
        "Exported".bold(),
        queryset.len(),
        path.display().to_string().cyan(),
        download.mime_type.dimmed()
    );

    Ok(())
}
