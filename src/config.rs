use std::path::PathBuf;

use miette::{Context, IntoDiagnostic};
use serde::{Deserialize, Serialize};

use crate::sheet::{CellRef, ColumnId};

/// Fixed positions of the timetable layout.
///
/// The source spreadsheets follow one convention: the day label sits in
/// `A1`, grade headers fill the first row, columns `A` and `B` carry the day
/// and the time ranges, and every other column is one grade section. A
/// different layout is supported by substituting this value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
  /// Only sheets whose name starts with this are timetable sheets.
  pub sheet_prefix:     String,
  pub day_cell:         CellRef,
  /// Zero-based. Every later row is a data row.
  pub header_row:       u32,
  /// Skipped by both the header and the data pass.
  pub metadata_columns: Vec<ColumnId>,
  pub time_column:      ColumnId,
  /// Everything from this glyph onward in a lesson name is a subgroup label.
  pub subgroup_marker:  char,
}

impl Default for SheetLayout {
  fn default() -> Self {
    Self {
      sheet_prefix:     "12".to_owned(),
      day_cell:         CellRef::new(0, 0),
      header_row:       0,
      metadata_columns: vec![ColumnId(0), ColumnId(1)],
      time_column:      ColumnId(1),
      subgroup_marker:  '№',
    }
  }
}

impl SheetLayout {
  pub fn from_toml_str(input: &str) -> miette::Result<Self> {
    toml::from_str(input)
      .into_diagnostic()
      .context("failed to parse sheet layout as TOML")
  }

  pub fn is_timetable_sheet(&self, sheet_name: &str) -> bool {
    sheet_name.starts_with(&self.sheet_prefix)
  }

  pub fn is_metadata_column(&self, column: ColumnId) -> bool {
    self.metadata_columns.contains(&column)
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkbookSource {
  File(PathBuf),
  GoogleSheets { spreadsheet_id: String },
}

#[derive(Debug)]
pub struct Config {
  pub source:         WorkbookSource,
  pub layout:         SheetLayout,
  pub lessons_output: PathBuf,
}

impl Config {
  pub fn from_env() -> miette::Result<Self> {
    let source = match std::env::var("TIMETABLE_SPREADSHEET_ID") {
      Ok(spreadsheet_id) if !spreadsheet_id.trim().is_empty() => {
        WorkbookSource::GoogleSheets {
          spreadsheet_id: spreadsheet_id.trim().to_owned(),
        }
      }
      _ => WorkbookSource::File(
        std::env::var("TIMETABLE_PATH")
          .unwrap_or_else(|_| "sheet.xlsx".to_owned())
          .into(),
      ),
    };

    let mut layout = match std::env::var("TIMETABLE_LAYOUT") {
      Ok(path) => {
        let contents = std::fs::read_to_string(&path)
          .into_diagnostic()
          .context(format!("failed to read sheet layout file {path:?}"))?;
        SheetLayout::from_toml_str(&contents)
          .context(format!("invalid sheet layout file {path:?}"))?
      }
      Err(_) => SheetLayout::default(),
    };
    if let Ok(prefix) = std::env::var("TIMETABLE_SHEET_PREFIX") {
      layout.sheet_prefix = prefix;
    }

    let lessons_output = std::env::var("LESSONS_OUTPUT")
      .unwrap_or_else(|_| "lessons.json".to_owned())
      .into();

    Ok(Self {
      source,
      layout,
      lessons_output,
    })
  }
}
