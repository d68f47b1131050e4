use tracing::{debug, info, instrument};

use super::{
  day::day_index,
  grade_header::GradeHeader,
  parse_lessons::SheetContext,
  parse_model::{CellLocation, CellOutcome, SheetExtraction, SkipReason},
};
use crate::{
  config::SheetLayout,
  sheet::{CellRef, CellValueMode, DecodedWorksheet},
};

/// Extracts every lesson of one day's sheet.
///
/// Runs a row pass over every data cell outside the metadata columns, then a
/// pass over the merged ranges, and concatenates the two in that order. The
/// passes are not deduplicated against each other: a merged range's
/// top-left cell is also seen by the row pass.
#[instrument(skip_all, fields(sheet = %worksheet.name))]
pub fn parse_lessons_from_worksheet(
  worksheet: &DecodedWorksheet,
  layout: &SheetLayout,
) -> SheetExtraction {
  let day_label = worksheet.cell_text(layout.day_cell, CellValueMode::Formatted);
  let day = day_index(&day_label);
  debug!(day_label, day, "resolved lesson day");

  let header = GradeHeader::from_row(worksheet.row(layout.header_row), layout);
  debug!(columns = header.len(), "mapped grade header");

  let context = SheetContext {
    worksheet,
    layout,
    header: &header,
    day,
  };
  let mut extraction = SheetExtraction::new(&worksheet.name);

  let data_rows = worksheet.rows().filter(|(row, _)| *row > layout.header_row);
  for (row, cells) in data_rows {
    for (column, text) in cells {
      if layout.is_metadata_column(column) {
        continue;
      }
      let outcome = context.build_cell_lesson(row, column, &text);
      let location = CellLocation::Cell(CellRef { row, column });
      extraction.record(location, &text, outcome);
    }
  }
  let row_lessons = extraction.lessons.len();

  for range in &worksheet.merged {
    let outcome = if range.text.trim().is_empty() {
      CellOutcome::Skipped(SkipReason::NoContent)
    } else {
      context.build_merged_lesson(range)
    };
    extraction.record(CellLocation::from(range), &range.text, outcome);
  }

  info!(
    day,
    row_lessons,
    merged_lessons = extraction.lessons.len() - row_lessons,
    skipped = extraction.skipped,
    invalid = extraction.invalid.len(),
    "parsed sheet"
  );

  extraction
}
