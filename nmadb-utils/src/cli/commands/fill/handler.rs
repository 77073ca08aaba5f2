use anyhow::{Context, Result};
use colored::*;

use super::FillCommands;
use crate::cli::commands::load_queryset;
use nmadb_utils::Config;
use nmadb_utils::admin::ModelAdmin;
use nmadb_utils::export::formats::{WriterKind, read_upload_file};
use nmadb_utils::export::ERROR_PREFIX;
use nmadb_utils::selection::FillMissingForm;

/// Handle the fill-missing command
pub fn handle_fill_command(args: FillCommands, config: &Config) -> Result<()> {
    let kind = WriterKind::from_code(&args.format)?;

    let selection = config
        .selection(&args.selection)
        .with_context(|| format!("Unknown selection '{}'", args.selection))?;
    let model_name = match (&args.model, selection.model.is_empty()) {
        (Some(model), _) => model.clone(),
        (None, false) => selection.model.clone(),
        (None, true) => anyhow::bail!(
            "Selection '{}' is not tied to a model; pass --model",
            selection.title
        ),
    };

    if !args.upload.exists() {
        anyhow::bail!("Upload file does not exist: {}", args.upload.display());
    }
    let upload = read_upload_file(&args.upload)?;
    if kind.is_sheet_format() && upload.len() > 1 {
        println!(
            "{} {} keeps only the first of {} sheets",
            "!".yellow(),
            kind,
            upload.len()
        );
    }

    let admin = ModelAdmin::from_config(config, &model_name)?;
    let mut queryset = load_queryset(config, config.model(&model_name)?, &[])?;

    let form = FillMissingForm {
        selection: Some(selection.title.clone()),
        upload: Some(upload),
    };
    let download = admin.fill_missing(&form, &mut queryset, kind)?;
    let path = download.save(args.output.as_deref())?;

    let rows: usize = form
        .upload
        .as_ref()
        .map(|book| book.sheets().iter().map(|s| s.len()).sum())
        .unwrap_or(0);

    println!(
        "{} {} {} rows from {} into {}",
        "✓".green(),
        "Filled".bold(),
        rows,
        args.upload.display().to_string().cyan(),
        path.display().to_string().cyan()
    );
    println!(
        "  {}",
        format!(
            "Cells starting with \"{}\" could not be filled",
            ERROR_PREFIX.trim_end()
        )
        .dimmed()
    );

    Ok(())
}
