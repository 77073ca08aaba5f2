//! Download actions offered on a model's changelist
//!
//! [`ModelAdmin`] ties a configured model to the stored selections and runs
//! the download actions against a query set of the chosen records.

use anyhow::Result;

use crate::config::{Config, ModelConfig};
use crate::export::formats::WriterKind;
use crate::export::{
    Download, QuerySet, SheetMapping, download_selected, download_spreadsheet, fill_missing,
};
use crate::selection::{self, DownloadSelection, DownloadSelectionForm, FillMissingForm};

/// The download actions every exportable model gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadAction {
    /// Export with a stored selection
    CustomSelected,
    Csv,
    Ods,
    Utf16Csv,
}

impl DownloadAction {
    pub fn all() -> &'static [DownloadAction] {
        &[
            DownloadAction::CustomSelected,
            DownloadAction::Csv,
            DownloadAction::Ods,
            DownloadAction::Utf16Csv,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            DownloadAction::CustomSelected => "download_custom_selected",
            DownloadAction::Csv => "download_selected_as_csv",
            DownloadAction::Ods => "download_selected_as_ods",
            DownloadAction::Utf16Csv => "download_selected_as_utf16_csv",
        }
    }

    pub fn short_description(&self) -> &'static str {
        match self {
            DownloadAction::CustomSelected => "Download selected",
            DownloadAction::Csv => "Download as CSV.",
            DownloadAction::Ods => "Download as ODS.",
            DownloadAction::Utf16Csv => "Download as UTF16 CSV.",
        }
    }

    /// Fixed output format; the custom action takes it from the selection
    pub fn writer(&self) -> Option<WriterKind> {
        match self {
            DownloadAction::CustomSelected => None,
            DownloadAction::Csv => Some(WriterKind::Csv),
            DownloadAction::Ods => Some(WriterKind::Ods),
            DownloadAction::Utf16Csv => Some(WriterKind::Utf16TabCsv),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        DownloadAction::all().iter().copied().find(|a| a.name() == name)
    }

    /// Action exporting in `kind` with the model's default mapping
    pub fn for_writer(kind: WriterKind) -> Option<Self> {
        DownloadAction::all()
            .iter()
            .copied()
            .find(|a| a.writer() == Some(kind))
    }
}

impl std::fmt::Display for DownloadAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Export profile of one model
#[derive(Debug, Clone)]
pub struct ModelAdmin<'a> {
    model: &'a ModelConfig,
    selections: &'a [DownloadSelection],
    sheet_name: &'a str,
}

impl<'a> ModelAdmin<'a> {
    pub fn new(
        model: &'a ModelConfig,
        selections: &'a [DownloadSelection],
        sheet_name: &'a str,
    ) -> Self {
        ModelAdmin {
            model,
            selections,
            sheet_name,
        }
    }

    pub fn from_config(config: &'a Config, model: &str) -> Result<Self> {
        Ok(ModelAdmin::new(
            config.model(model)?,
            &config.selections,
            &config.export.sheet_name,
        ))
    }

    pub fn model_name(&self) -> &str {
        &self.model.name
    }

    /// Mapping of the plain download actions
    ///
    /// The configured `sheet_mapping` wins; otherwise the changelist columns
    /// minus the leading link column.
    pub fn sheet_mapping(&self) -> SheetMapping {
        match &self.model.sheet_mapping {
            Some(text) => SheetMapping::parse(text),
            None => SheetMapping::from_list_display(&self.model.list_display),
        }
    }

    /// Stored selections usable for this model, by title
    pub fn selections(&self) -> Vec<&'a DownloadSelection> {
        selection::ordered(self.selections)
            .into_iter()
            .filter(|s| s.applies_to(&self.model.name))
            .collect()
    }

    /// Run a download action over `queryset`
    ///
    /// The custom action needs a form naming the selected records and the
    /// stored selection.
    pub fn run_action(
        &self,
        action: DownloadAction,
        queryset: &mut dyn QuerySet,
        form: Option<&DownloadSelectionForm>,
    ) -> Result<Download> {
        log::info!("Running {} on model {}", action, self.model.name);

        match action.writer() {
            Some(kind) => self.download_as(kind, queryset),
            None => {
                let form = form.ok_or(selection::SelectionError::MissingSelection)?;
                let selection = form.clean(self.selections, &self.model.name)?;
                self.download_with(selection, queryset)
            }
        }
    }

    /// Export `queryset` in `kind` with the default mapping
    pub fn download_as(&self, kind: WriterKind, queryset: &mut dyn QuerySet) -> Result<Download> {
        let mapping = self.sheet_mapping();
        download_selected(queryset, kind.code(), &mapping, self.sheet_name)
    }

    /// Export `queryset` with a stored selection
    pub fn download_with(
        &self,
        selection: &DownloadSelection,
        queryset: &mut dyn QuerySet,
    ) -> Result<Download> {
        log::debug!(
            "Exporting {} with selection '{}' as {}",
            self.model.name,
            selection.title,
            selection.writer
        );
        download_selected(
            queryset,
            selection.writer.code(),
            &selection.mapping(),
            self.sheet_name,
        )
    }

    /// Fill the uploaded spreadsheet with values from `queryset`
    pub fn fill_missing(
        &self,
        form: &FillMissingForm,
        queryset: &mut dyn QuerySet,
        writer: WriterKind,
    ) -> Result<Download> {
        let (selection, upload) = form.clean(self.selections, &self.model.name)?;
        log::info!(
            "Filling {} uploaded sheet(s) with selection '{}'",
            upload.len(),
            selection.title
        );
        let filled = fill_missing(upload, queryset, &selection.mapping());
        download_spreadsheet(&filled, writer.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::formats::read_upload;
    use crate::export::{MemoryQuerySet, Sheet, Spreadsheet};
    use crate::selection::SelectionError;
    use serde_json::json;

    fn pupil_model() -> ModelConfig {
        ModelConfig {
            name: "pupil".into(),
            records: "pupils.json".into(),
            list_display: vec!["id".into(), "first_name".into(), "school__title".into()],
            sheet_mapping: None,
        }
    }

    fn selections() -> Vec<DownloadSelection> {
        vec![
            DownloadSelection::new("Names", "pupil", WriterKind::Csv, "Id: id\nName: first_name"),
            DownloadSelection::new("Schools", "school", WriterKind::Ods, "Title: title"),
            DownloadSelection::new("Any", "", WriterKind::Csv, "Id: id"),
        ]
    }

    fn pupils() -> MemoryQuerySet {
        MemoryQuerySet::from_json(json!([
            {"id": 1, "first_name": "Ona", "school": {"title": "KTU"}},
            {"id": 2, "first_name": "Jonas", "school": null},
        ]))
        .unwrap()
    }

    #[test]
    fn test_action_names() {
        assert_eq!(
            DownloadAction::from_name("download_selected_as_utf16_csv"),
            Some(DownloadAction::Utf16Csv)
        );
        assert_eq!(DownloadAction::CustomSelected.short_description(), "Download selected");
        assert_eq!(DownloadAction::for_writer(WriterKind::Ods), Some(DownloadAction::Ods));
        assert_eq!(DownloadAction::for_writer(WriterKind::Xlsx), None);
    }

    #[test]
    fn test_default_mapping_from_list_display() {
        let model = pupil_model();
        let admin = ModelAdmin::new(&model, &[], "Duomenys");
        let mapping = admin.sheet_mapping();
        assert_eq!(mapping.captions(), vec!["first_name", "school:title"]);
    }

    #[test]
    fn test_configured_mapping_wins() {
        let mut model = pupil_model();
        model.sheet_mapping = Some("Vardas: first_name".into());
        let admin = ModelAdmin::new(&model, &[], "Duomenys");
        assert_eq!(admin.sheet_mapping().captions(), vec!["Vardas"]);
    }

    #[test]
    fn test_csv_action_degrades_missing_relation() {
        let model = pupil_model();
        let admin = ModelAdmin::new(&model, &[], "Duomenys");
        let download = admin
            .run_action(DownloadAction::Csv, &mut pupils(), None)
            .unwrap();

        let mut rdr = csv::Reader::from_reader(download.body.as_slice());
        assert_eq!(
            rdr.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["first_name", "school:title"]
        );
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][0], "Ona");
        assert_eq!(&rows[0][1], "KTU");
        assert_eq!(&rows[1][0], "Jonas");
        assert!(rows[1][1].starts_with("Error: "));
        assert!(rows[1][1].contains("'school' is empty"));
    }

    #[test]
    fn test_utf16_action() {
        let model = pupil_model();
        let admin = ModelAdmin::new(&model, &[], "Duomenys");
        let download = admin
            .run_action(DownloadAction::Utf16Csv, &mut pupils(), None)
            .unwrap();
        assert_eq!(download.filename, "data.csv");
        assert_eq!(&download.body[..2], &[0xFF, 0xFE]);
    }

    #[test]
    fn test_download_as_xlsx() {
        let model = pupil_model();
        let admin = ModelAdmin::new(&model, &[], "Mokiniai");
        let download = admin.download_as(WriterKind::Xlsx, &mut pupils()).unwrap();
        assert_eq!(download.filename, "data.xlsx");

        let book = read_upload(&download.filename, download.body).unwrap();
        assert_eq!(book.sheet("Mokiniai").unwrap().cell(0, "first_name"), "Ona");
    }

    #[test]
    fn test_custom_action_uses_selection() {
        let model = pupil_model();
        let selections = selections();
        let admin = ModelAdmin::new(&model, &selections, "Duomenys");
        let form = DownloadSelectionForm {
            selected: vec!["1".into(), "2".into()],
            selection: Some("Names".into()),
        };

        let download = admin
            .run_action(DownloadAction::CustomSelected, &mut pupils(), Some(&form))
            .unwrap();
        assert_eq!(
            String::from_utf8(download.body).unwrap(),
            "Id,Name\n1,Ona\n2,Jonas\n"
        );
    }

    #[test]
    fn test_custom_action_rejects_other_model() {
        let model = pupil_model();
        let selections = selections();
        let admin = ModelAdmin::new(&model, &selections, "Duomenys");
        let form = DownloadSelectionForm {
            selected: vec!["1".into()],
            selection: Some("Schools".into()),
        };

        let err = admin
            .run_action(DownloadAction::CustomSelected, &mut pupils(), Some(&form))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SelectionError>(),
            Some(SelectionError::ModelMismatch { .. })
        ));

        let err = admin
            .run_action(DownloadAction::CustomSelected, &mut pupils(), None)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SelectionError>(),
            Some(&SelectionError::MissingSelection)
        );
    }

    #[test]
    fn test_selections_for_model() {
        let model = pupil_model();
        let selections = selections();
        let admin = ModelAdmin::new(&model, &selections, "Duomenys");
        let titles: Vec<_> = admin.selections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Any", "Names"]);
    }

    #[test]
    fn test_fill_missing_writes_spreadsheet() {
        let model = pupil_model();
        let selections = selections();
        let admin = ModelAdmin::new(&model, &selections, "Duomenys");

        let mut sheet = Sheet::named("Upload");
        sheet.add_columns(["Id"]);
        sheet.append_row([("Id".to_string(), "2".to_string())].into_iter().collect());

        let form = FillMissingForm {
            selection: Some("Names".into()),
            upload: Some(Spreadsheet::from(sheet)),
        };
        let download = admin
            .fill_missing(&form, &mut pupils(), WriterKind::Ods)
            .unwrap();

        let book = read_upload(&download.filename, download.body).unwrap();
        let sheet = book.sheet("Upload").unwrap();
        assert_eq!(sheet.columns(), &["Id (provided)", "Id", "Name"]);
        assert_eq!(sheet.cell(0, "Name"), "Jonas");
    }

    #[test]
    fn test_fill_missing_requires_upload() {
        let model = pupil_model();
        let selections = selections();
        let admin = ModelAdmin::new(&model, &selections, "Duomenys");
        let form = FillMissingForm {
            selection: Some("Names".into()),
            upload: None,
        };
        let err = admin
            .fill_missing(&form, &mut pupils(), WriterKind::Ods)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SelectionError>(),
            Some(&SelectionError::MissingUpload)
        );
    }
}
