//! Failures that abort an extraction run.
//!
//! Cell-level problems are never errors; they are reported as
//! [`CellOutcome`](crate::parse_timetable::parse_model::CellOutcome) values
//! and counted by the sheet extractor. Everything in this module unwinds to
//! the caller and means nothing was persisted.

use std::path::PathBuf;

pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structural failure while reading the workbook or one of its sheets.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ExtractError {
  #[error("failed to read timetable workbook")]
  #[diagnostic(code(timetable::workbook_unreadable))]
  WorkbookUnreadable {
    #[source]
    source: BoxedSource,
  },
  #[error("sheet \"{sheet}\" is not present in the workbook")]
  #[diagnostic(code(timetable::sheet_missing))]
  SheetMissing { sheet: String },
  #[error("failed to read cells of sheet \"{sheet}\"")]
  #[diagnostic(code(timetable::sheet_unreadable))]
  SheetUnreadable {
    sheet:  String,
    #[source]
    source: BoxedSource,
  },
  #[error("failed to enumerate merged ranges of sheet \"{sheet}\"")]
  #[diagnostic(code(timetable::merged_ranges_unreadable))]
  MergedRangesUnreadable {
    sheet:  String,
    #[source]
    source: BoxedSource,
  },
}

/// Failure of the lesson store after parsing succeeded.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum SinkError {
  #[error("failed to write lesson store at {}", path.display())]
  #[diagnostic(code(timetable::sink_io))]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to serialize lessons for the lesson store")]
  #[diagnostic(code(timetable::sink_serialize))]
  Serialize(#[from] serde_json::Error),
  #[error("lesson store rejected the update: {0}")]
  #[diagnostic(code(timetable::sink_rejected))]
  Rejected(String),
}

/// Outcome of a full extract-then-store run, split so callers can tell bad
/// input apart from an unavailable store.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RunError {
  #[error(transparent)]
  #[diagnostic(transparent)]
  Extraction(#[from] ExtractError),
  #[error("lessons were extracted but could not be stored")]
  #[diagnostic(
    code(timetable::persistence),
    help("no lessons were updated; the previous lesson set is unchanged")
  )]
  Persistence(#[source] SinkError),
}
