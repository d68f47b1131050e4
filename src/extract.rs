use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
  config::SheetLayout,
  error::{ExtractError, RunError},
  parse_timetable::{
    parse_model::{InvalidCell, Lesson, SheetExtraction},
    parse_sheet::parse_lessons_from_worksheet,
  },
  persist::LessonSink,
  sheet::SheetSource,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
  pub sheet:   String,
  pub lessons: usize,
  pub skipped: usize,
  pub invalid: usize,
}

/// Lessons of every timetable sheet, in workbook order, with diagnostics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractionReport {
  pub lessons:       Vec<Lesson>,
  pub sheets:        Vec<SheetSummary>,
  pub invalid_cells: Vec<InvalidCell>,
}

impl ExtractionReport {
  fn absorb(&mut self, extraction: SheetExtraction) {
    self.sheets.push(SheetSummary {
      sheet:   extraction.sheet,
      lessons: extraction.lessons.len(),
      skipped: extraction.skipped,
      invalid: extraction.invalid.len(),
    });
    self.lessons.extend(extraction.lessons);
    self.invalid_cells.extend(extraction.invalid);
  }

  pub fn lesson_count(&self) -> usize { self.lessons.len() }

  /// Cells that produced no lesson, invalid ones included.
  pub fn skipped_count(&self) -> usize {
    self.sheets.iter().map(|s| s.skipped + s.invalid).sum()
  }

  pub fn invalid_count(&self) -> usize { self.invalid_cells.len() }
}

impl fmt::Display for ExtractionReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} lessons extracted, {} cells skipped ({} invalid)",
      self.lesson_count(),
      self.skipped_count(),
      self.invalid_count()
    )
  }
}

/// Extracts the lessons of every sheet whose name carries the layout's
/// sheet prefix.
///
/// Any sheet that cannot be read fails the whole run; no partial result is
/// returned.
#[instrument(skip_all, fields(prefix = %layout.sheet_prefix))]
pub fn extract<S: SheetSource + ?Sized>(
  source: &mut S,
  layout: &SheetLayout,
) -> Result<ExtractionReport, ExtractError> {
  let mut report = ExtractionReport::default();

  let sheet_names = source.sheet_names();
  let timetable_sheets = sheet_names
    .iter()
    .filter(|name| layout.is_timetable_sheet(name))
    .collect::<Vec<_>>();
  debug!(
    total = sheet_names.len(),
    selected = timetable_sheets.len(),
    "selected timetable sheets"
  );

  for name in timetable_sheets {
    info!(sheet = %name, "parsing sheet");
    let worksheet = source.worksheet(name)?;
    report.absorb(parse_lessons_from_worksheet(&worksheet, layout));
  }

  info!(
    lessons = report.lesson_count(),
    skipped = report.skipped_count(),
    invalid = report.invalid_count(),
    "finished extraction"
  );

  Ok(report)
}

/// Extracts every timetable sheet and, only if all of them were read, hands
/// the complete lesson set to `sink` in one replacement.
pub fn extract_and_replace<S, K>(
  source: &mut S,
  layout: &SheetLayout,
  sink: &mut K,
) -> Result<ExtractionReport, RunError>
where
  S: SheetSource + ?Sized,
  K: LessonSink + ?Sized,
{
  let report = extract(source, layout)?;
  sink
    .replace_all(&report.lessons)
    .map_err(RunError::Persistence)?;
  info!(lessons = report.lesson_count(), "stored extracted lessons");
  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    error::SinkError,
    persist::InMemorySink,
    sheet::{CellRef, DecodedWorksheet, InMemoryWorkbook, worksheet_from_rows},
  };

  fn monday_sheet() -> DecodedWorksheet {
    worksheet_from_rows("12 Понедельник", &[
      &["Понедельник", "Время", "12А", "12Б"],
      &["", "08:30-09:15", "Алгебра\nИванова\n301", "Физика№1\nКозлов"],
      &["", "09:25-10:10", "История", "Литература\nОрлова\n204"],
      &["", "10:20-11:05", "Химия", ""],
      &["", "11:15-12:00", "", ""],
    ])
    // Химия in C4 runs through C5
    .with_merged(CellRef::new(3, 2), CellRef::new(4, 2))
  }

  #[test]
  fn extracts_row_and_merged_lessons_of_a_timetable_sheet() {
    let mut workbook = InMemoryWorkbook::new(vec![monday_sheet()]);

    let report = extract(&mut workbook, &SheetLayout::default()).unwrap();

    // five non-empty cells, one of them the anchor of a two-row merge
    assert_eq!(report.lesson_count(), 6);
    // D4, C5 and D5 are blank
    assert_eq!(report.skipped_count(), 3);
    assert_eq!(report.invalid_count(), 0);
    assert_eq!(report.sheets, vec![SheetSummary {
      sheet:   "12 Понедельник".to_owned(),
      lessons: 6,
      skipped: 3,
      invalid: 0,
    }]);
    assert!(report.lessons.iter().all(|l| l.day == 1));

    let merged = report.lessons.last().unwrap();
    assert_eq!(merged.name, "Химия");
    assert_eq!(merged.start_time().to_string(), "11:15:00");

    let physics = &report.lessons[1];
    assert_eq!(physics.group(), Some("№1"));
    assert_eq!(physics.grade_letter(), None);
    assert_eq!(
      report.to_string(),
      "6 lessons extracted, 3 cells skipped (0 invalid)"
    );
  }

  #[test]
  fn only_prefixed_sheets_are_extracted() {
    let mut other = monday_sheet();
    other.name = "11 Понедельник".to_owned();
    let mut workbook = InMemoryWorkbook::new(vec![
      other,
      monday_sheet(),
      worksheet_from_rows("Notes", &[&["x"]]),
    ]);

    let report = extract(&mut workbook, &SheetLayout::default()).unwrap();
    assert_eq!(report.sheets.len(), 1);
    assert_eq!(report.sheets[0].sheet, "12 Понедельник");
  }

  #[test]
  fn workbook_without_timetable_sheets_is_empty_not_an_error() {
    let mut workbook =
      InMemoryWorkbook::new(vec![worksheet_from_rows("Лист1", &[&["x"]])]);
    let mut sink = InMemorySink::default();

    let report =
      extract_and_replace(&mut workbook, &SheetLayout::default(), &mut sink)
        .unwrap();

    assert!(report.lessons.is_empty());
    assert!(report.sheets.is_empty());
    assert_eq!(sink.replacements, 1);
  }

  #[test]
  fn successful_run_stores_every_sheet_at_once() {
    let mut tuesday = monday_sheet();
    tuesday.name = "12 Вторник".to_owned();
    let mut workbook = InMemoryWorkbook::new(vec![monday_sheet(), tuesday]);
    let mut sink = InMemorySink::default();

    let report =
      extract_and_replace(&mut workbook, &SheetLayout::default(), &mut sink)
        .unwrap();

    assert_eq!(report.lesson_count(), 12);
    assert_eq!(sink.lessons, report.lessons);
    assert_eq!(sink.replacements, 1);
  }

  struct UnreadableSecondSheet {
    inner: InMemoryWorkbook,
  }

  impl SheetSource for UnreadableSecondSheet {
    fn sheet_names(&self) -> Vec<String> {
      vec!["12 Понедельник".to_owned(), "12 Вторник".to_owned()]
    }

    fn worksheet(
      &mut self,
      name: &str,
    ) -> Result<DecodedWorksheet, ExtractError> {
      if name == "12 Вторник" {
        return Err(ExtractError::MergedRangesUnreadable {
          sheet:  name.to_owned(),
          source: "corrupt mergeCells element".into(),
        });
      }
      self.inner.worksheet(name)
    }
  }

  #[test]
  fn structural_failure_on_any_sheet_stores_nothing() {
    let mut workbook = UnreadableSecondSheet {
      inner: InMemoryWorkbook::new(vec![monday_sheet()]),
    };
    let mut sink = InMemorySink::default();

    let result =
      extract_and_replace(&mut workbook, &SheetLayout::default(), &mut sink);

    assert!(matches!(
      result,
      Err(RunError::Extraction(ExtractError::MergedRangesUnreadable { .. }))
    ));
    assert_eq!(sink.replacements, 0);
    assert!(sink.lessons.is_empty());
  }

  struct RejectingSink;

  impl LessonSink for RejectingSink {
    fn replace_all(&mut self, _: &[Lesson]) -> Result<(), SinkError> {
      Err(SinkError::Rejected("database is read-only".to_owned()))
    }
  }

  #[test]
  fn storage_failure_is_reported_apart_from_parse_failures() {
    let mut workbook = InMemoryWorkbook::new(vec![monday_sheet()]);

    let result = extract_and_replace(
      &mut workbook,
      &SheetLayout::default(),
      &mut RejectingSink,
    );

    assert!(matches!(
      result,
      Err(RunError::Persistence(SinkError::Rejected(_)))
    ));
  }
}
