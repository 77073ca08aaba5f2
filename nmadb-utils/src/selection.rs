//! Stored download selections
//!
//! A selection names a model, an output format and a textual column mapping,
//! so an export can be repeated without retyping the columns.

use serde::{Deserialize, Serialize};

use crate::export::{SheetMapping, Spreadsheet};
use crate::export::formats::WriterKind;

/// Maximum length of a selection title and model name
pub const MAX_NAME_LEN: usize = 80;

/// Formats a stored selection may use
pub const AVAILABLE_WRITERS: &[WriterKind] = &[WriterKind::Csv, WriterKind::Ods, WriterKind::Xlsx];

/// Export settings stored under a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSelection {
    pub title: String,
    /// Model the selection is meant for; blank means any
    #[serde(default)]
    pub model: String,
    pub writer: WriterKind,
    /// One column per line, in the form `caption: field__path`
    pub query: String,
}

/// Invalid selection data or a rejected selection form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Title is empty
    EmptyTitle,
    /// Title or model is longer than allowed
    TooLong { field: &'static str, len: usize },
    /// Two selections share a title
    DuplicateTitle { title: String },
    /// Writer is not one of the stored-selection choices
    WriterNotAllowed { title: String, writer: WriterKind },
    /// Query has no columns
    EmptyQuery { title: String },
    /// No selection with this title
    UnknownSelection { title: String },
    /// The form named no selection
    MissingSelection,
    /// Selection belongs to another model
    ModelMismatch {
        title: String,
        expected: String,
        actual: String,
    },
    /// No records were selected
    NothingSelected,
    /// The form requires an uploaded file
    MissingUpload,
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::EmptyTitle => write!(f, "selection title cannot be empty"),
            SelectionError::TooLong { field, len } => write!(
                f,
                "selection {} has {} characters, maximum is {}",
                field, len, MAX_NAME_LEN
            ),
            SelectionError::DuplicateTitle { title } => {
                write!(f, "selection '{}' is defined more than once", title)
            }
            SelectionError::WriterNotAllowed { title, writer } => {
                let allowed: Vec<_> = AVAILABLE_WRITERS.iter().map(|w| w.code()).collect();
                write!(
                    f,
                    "selection '{}' uses writer {}, expected one of {}",
                    title,
                    writer,
                    allowed.join(", ")
                )
            }
            SelectionError::EmptyQuery { title } => {
                write!(f, "selection '{}' has no columns", title)
            }
            SelectionError::UnknownSelection { title } => {
                write!(f, "select a valid choice: '{}' is not one of the available selections", title)
            }
            SelectionError::MissingSelection => write!(f, "a download selection is required"),
            SelectionError::ModelMismatch {
                title,
                expected,
                actual,
            } => write!(
                f,
                "selection '{}' is for model '{}', not '{}'",
                title, expected, actual
            ),
            SelectionError::NothingSelected => write!(f, "no records selected"),
            SelectionError::MissingUpload => write!(f, "an uploaded spreadsheet is required"),
        }
    }
}

impl std::error::Error for SelectionError {}

impl DownloadSelection {
    pub fn new(
        title: impl Into<String>,
        model: impl Into<String>,
        writer: WriterKind,
        query: impl Into<String>,
    ) -> Self {
        DownloadSelection {
            title: title.into(),
            model: model.into(),
            writer,
            query: query.into(),
        }
    }

    /// Parsed column mapping
    pub fn mapping(&self) -> SheetMapping {
        SheetMapping::parse(&self.query)
    }

    /// Check field constraints
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.title.trim().is_empty() {
            return Err(SelectionError::EmptyTitle);
        }
        let title_len = self.title.chars().count();
        if title_len > MAX_NAME_LEN {
            return Err(SelectionError::TooLong {
                field: "title",
                len: title_len,
            });
        }
        let model_len = self.model.chars().count();
        if model_len > MAX_NAME_LEN {
            return Err(SelectionError::TooLong {
                field: "model",
                len: model_len,
            });
        }
        if !AVAILABLE_WRITERS.contains(&self.writer) {
            return Err(SelectionError::WriterNotAllowed {
                title: self.title.clone(),
                writer: self.writer,
            });
        }
        if self.mapping().is_empty() {
            return Err(SelectionError::EmptyQuery {
                title: self.title.clone(),
            });
        }
        Ok(())
    }

    /// Whether this selection may be used for `model`
    pub fn applies_to(&self, model: &str) -> bool {
        self.model.is_empty() || self.model == model
    }
}

impl std::fmt::Display for DownloadSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Validate a list of selections, including title uniqueness
pub fn validate_selections(selections: &[DownloadSelection]) -> Result<(), SelectionError> {
    let mut seen = std::collections::HashSet::new();
    for selection in selections {
        selection.validate()?;
        if !seen.insert(selection.title.as_str()) {
            return Err(SelectionError::DuplicateTitle {
                title: selection.title.clone(),
            });
        }
    }
    Ok(())
}

/// Selections ordered by title
pub fn ordered(selections: &[DownloadSelection]) -> Vec<&DownloadSelection> {
    let mut ordered: Vec<_> = selections.iter().collect();
    ordered.sort_by(|a, b| a.title.cmp(&b.title));
    ordered
}

/// The "download selected" form: which records, and which stored selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSelectionForm {
    /// Ids of the selected records
    pub selected: Vec<String>,
    /// Title of the chosen selection
    pub selection: Option<String>,
}

impl DownloadSelectionForm {
    /// Validate against the stored selections for `model`
    pub fn clean<'a>(
        &self,
        selections: &'a [DownloadSelection],
        model: &str,
    ) -> Result<&'a DownloadSelection, SelectionError> {
        if self.selected.is_empty() {
            return Err(SelectionError::NothingSelected);
        }

        find_selection(selections, self.selection.as_deref(), model)
    }
}

/// The "fill missing" form: a stored selection plus an uploaded spreadsheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillMissingForm {
    pub selection: Option<String>,
    pub upload: Option<Spreadsheet>,
}

impl FillMissingForm {
    /// Validate against the stored selections for `model`
    pub fn clean<'s, 'f>(
        &'f self,
        selections: &'s [DownloadSelection],
        model: &str,
    ) -> Result<(&'s DownloadSelection, &'f Spreadsheet), SelectionError> {
        let selection = find_selection(selections, self.selection.as_deref(), model)?;
        let upload = self.upload.as_ref().ok_or(SelectionError::MissingUpload)?;
        Ok((selection, upload))
    }
}

/// Find the selection titled `title` and check it applies to `model`
pub fn find_selection<'a>(
    selections: &'a [DownloadSelection],
    title: Option<&str>,
    model: &str,
) -> Result<&'a DownloadSelection, SelectionError> {
    let title = title.ok_or(SelectionError::MissingSelection)?;

    let selection = selections
        .iter()
        .find(|s| s.title == title)
        .ok_or_else(|| SelectionError::UnknownSelection {
            title: title.to_string(),
        })?;

    if !selection.applies_to(model) {
        return Err(SelectionError::ModelMismatch {
            title: selection.title.clone(),
            expected: selection.model.clone(),
            actual: model.to_string(),
        });
    }

    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> DownloadSelection {
        DownloadSelection::new("Basic", "pupil", WriterKind::Ods, "Name: name\nSchool: school__title")
    }

    #[test]
    fn test_mapping_from_query() {
        assert_eq!(basic().mapping().captions(), vec!["Name", "School"]);
    }

    #[test]
    fn test_validate() {
        assert!(basic().validate().is_ok());

        let mut long = basic();
        long.title = "x".repeat(81);
        assert_eq!(
            long.validate(),
            Err(SelectionError::TooLong { field: "title", len: 81 })
        );

        let mut utf16 = basic();
        utf16.writer = WriterKind::Utf16TabCsv;
        assert!(matches!(
            utf16.validate(),
            Err(SelectionError::WriterNotAllowed { .. })
        ));

        let mut empty = basic();
        empty.query = "\n  \n".into();
        assert!(matches!(empty.validate(), Err(SelectionError::EmptyQuery { .. })));
    }

    #[test]
    fn test_duplicate_titles() {
        let result = validate_selections(&[basic(), basic()]);
        assert_eq!(
            result,
            Err(SelectionError::DuplicateTitle { title: "Basic".into() })
        );
    }

    #[test]
    fn test_ordered_by_title() {
        let mut b = basic();
        b.title = "A first".into();
        let selections = [basic(), b];
        let titles: Vec<_> = ordered(&selections).iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A first", "Basic"]);
    }

    #[test]
    fn test_form_clean() {
        let selections = [basic()];
        let form = DownloadSelectionForm {
            selected: vec!["1".into()],
            selection: Some("Basic".into()),
        };
        assert_eq!(form.clean(&selections, "pupil").unwrap().title, "Basic");

        assert!(matches!(
            form.clean(&selections, "school"),
            Err(SelectionError::ModelMismatch { .. })
        ));

        let unknown = DownloadSelectionForm {
            selection: Some("Nope".into()),
            ..form.clone()
        };
        assert!(matches!(
            unknown.clean(&selections, "pupil"),
            Err(SelectionError::UnknownSelection { .. })
        ));

        let missing = DownloadSelectionForm {
            selection: None,
            ..form.clone()
        };
        assert_eq!(
            missing.clean(&selections, "pupil"),
            Err(SelectionError::MissingSelection)
        );

        assert_eq!(
            DownloadSelectionForm::default().clean(&selections, "pupil"),
            Err(SelectionError::NothingSelected)
        );
    }

    #[test]
    fn test_fill_missing_form_requires_upload() {
        let selections = [basic()];
        let form = FillMissingForm {
            selection: Some("Basic".into()),
            upload: None,
        };
        assert_eq!(
            form.clean(&selections, "pupil").unwrap_err(),
            SelectionError::MissingUpload
        );

        let form = FillMissingForm {
            upload: Some(Spreadsheet::new()),
            ..form
        };
        let (selection, upload) = form.clean(&selections, "pupil").unwrap();
        assert_eq!(selection.title, "Basic");
        assert!(upload.is_empty());
    }

    #[test]
    fn test_blank_model_applies_everywhere() {
        let mut any = basic();
        any.model.clear();
        assert!(any.applies_to("school"));
    }
}
