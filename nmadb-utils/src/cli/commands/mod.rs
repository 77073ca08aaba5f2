pub mod actions;
pub mod export;
pub mod fill;
pub mod mail;
pub mod selections;

use anyhow::Result;

use nmadb_utils::Config;
use nmadb_utils::config::ModelConfig;
use nmadb_utils::export::{FieldPath, MemoryQuerySet, QuerySet, resolve_cell};

/// Field the `--ids` option is matched against
pub const ID_FIELD: &str = "id";

/// Load the records of `model`, keeping only `ids` when any are given
pub fn load_queryset(config: &Config, model: &ModelConfig, ids: &[String]) -> Result<MemoryQuerySet> {
    let path = config.records_path(model);
    let queryset = MemoryQuerySet::load(&path)?;

    if ids.is_empty() {
        return Ok(queryset);
    }

    let total = queryset.len();
    let queryset = queryset.filter_in(ID_FIELD, ids);
    if queryset.len() < ids.len() {
        log::warn!(
            "{} of {} requested ids matched no record",
            ids.len() - queryset.len(),
            ids.len()
        );
    }
    log::debug!("Selected {} of {} {} records", queryset.len(), total, model.name);
    Ok(queryset)
}

/// Ids of every record in `queryset`
pub fn record_ids(queryset: &dyn QuerySet) -> Result<Vec<String>> {
    let path = FieldPath::simple(ID_FIELD);
    Ok(queryset
        .records()?
        .iter()
        .map(|record| resolve_cell(record.as_ref(), &path))
        .collect())
}
