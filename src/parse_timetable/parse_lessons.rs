use super::{
  grade_header::GradeHeader,
  lesson_text::decode_lesson_text,
  parse_model::{CellOutcome, InvalidReason, Lesson, SkipReason},
  time_range::decode_time_range,
};
use crate::{
  config::SheetLayout,
  sheet::{CellRef, CellValueMode, ColumnId, DecodedWorksheet, MergedRange},
};

/// Everything a lesson builder reads besides the cell itself. Built once per
/// sheet and never mutated.
pub struct SheetContext<'a> {
  pub worksheet: &'a DecodedWorksheet,
  pub layout:    &'a SheetLayout,
  pub header:    &'a GradeHeader,
  pub day:       u8,
}

impl SheetContext<'_> {
  /// Builds the lesson of an ordinary cell, timed by its own row.
  pub fn build_cell_lesson(
    &self,
    row: u32,
    column: ColumnId,
    text: &str,
  ) -> CellOutcome {
    self.build_lesson(text, row, column)
  }

  /// Builds the lesson of a merged range. The range's last row carries the
  /// time slot and its first column the grade section.
  pub fn build_merged_lesson(&self, range: &MergedRange) -> CellOutcome {
    self.build_lesson(&range.text, range.end.row, range.start.column)
  }

  fn build_lesson(
    &self,
    text: &str,
    time_row: u32,
    grade_column: ColumnId,
  ) -> CellOutcome {
    let lesson_text =
      match decode_lesson_text(text, self.layout.subgroup_marker) {
        Ok(Some(lesson_text)) => lesson_text,
        Ok(None) => return CellOutcome::Skipped(SkipReason::NoContent),
        Err(reason) => return CellOutcome::Invalid(reason),
      };

    // time cells are read raw so a formatted display can't round them
    let time_cell = self.worksheet.cell_text(
      CellRef {
        row:    time_row,
        column: self.layout.time_column,
      },
      CellValueMode::Raw,
    );
    if time_cell.trim().is_empty() {
      return CellOutcome::Skipped(SkipReason::NoTimeSlot);
    }
    let Some(time_range) = decode_time_range(&time_cell) else {
      return CellOutcome::Invalid(InvalidReason::MalformedTimeRange {
        text: time_cell,
      });
    };

    let Some(grade_column) = self.header.get(grade_column) else {
      return CellOutcome::Skipped(SkipReason::UnmappedColumn);
    };
    let Some(grade) = grade_column.grade() else {
      return CellOutcome::Invalid(InvalidReason::InvalidGradeNumber {
        header: format!("{}{}", grade_column.number, grade_column.letter),
      });
    };

    if !time_range.is_increasing() {
      return CellOutcome::Invalid(InvalidReason::NonIncreasingTimeRange {
        start: time_range.start.time(),
        end:   time_range.end.time(),
      });
    }

    CellOutcome::Lesson(Lesson::from_parts(
      grade,
      grade_column.letter,
      self.day,
      time_range,
      lesson_text,
    ))
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveTime;

  use super::*;
  use crate::{
    parse_timetable::{
      parse_model::LessonAudience, time_range::REFERENCE_DATE,
    },
    sheet::worksheet_from_rows,
  };

  fn at(h: u32, m: u32) -> chrono::NaiveDateTime {
    REFERENCE_DATE.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
  }

  fn lesson(outcome: CellOutcome) -> Lesson {
    match outcome {
      CellOutcome::Lesson(lesson) => lesson,
      other => panic!("expected a lesson, got {other:?}"),
    }
  }

  fn with_context<T>(
    worksheet: &DecodedWorksheet,
    f: impl FnOnce(&SheetContext) -> T,
  ) -> T {
    let layout = SheetLayout::default();
    let header = GradeHeader::from_row(worksheet.row(0), &layout);
    let context = SheetContext {
      worksheet,
      layout: &layout,
      header: &header,
      day: 2,
    };
    f(&context)
  }

  #[test]
  fn builds_a_lesson_from_a_timed_cell() {
    let sheet = worksheet_from_rows("12 Вторник", &[
      &["Вторник", "", "12А", "12Б"],
      &["", "09:00-09:45", "Алгебра\nИванова\n301", ""],
    ]);

    let lesson = with_context(&sheet, |ctx| {
      lesson(ctx.build_cell_lesson(1, ColumnId(2), "Алгебра\nИванова\n301"))
    });

    assert_eq!(lesson, Lesson {
      grade:    12,
      audience: LessonAudience::Section { letter: 'А' },
      day:      2,
      start:    at(9, 0),
      end:      at(9, 45),
      name:     "Алгебра".to_owned(),
      teacher:  Some("Иванова".to_owned()),
      room:     Some("301".to_owned()),
    });
  }

  #[test]
  fn subgroup_lessons_drop_the_section_letter() {
    let sheet = worksheet_from_rows("12", &[&["", "", "12Б"], &[
      "",
      "10:00-10:45",
      "Math№2\nSmith\nRoom 4",
    ]]);

    let lesson = with_context(&sheet, |ctx| {
      lesson(ctx.build_cell_lesson(1, ColumnId(2), "Math№2\nSmith\nRoom 4"))
    });

    assert_eq!(lesson.name, "Math");
    assert_eq!(lesson.group(), Some("№2"));
    assert_eq!(lesson.grade_letter(), None);
    assert_eq!(lesson.grade, 12);
    assert_eq!(lesson.teacher.as_deref(), Some("Smith"));
    assert_eq!(lesson.room.as_deref(), Some("Room 4"));
  }

  #[test]
  fn empty_time_cell_is_an_ordinary_skip() {
    let sheet =
      worksheet_from_rows("12", &[&["", "", "12А"], &["", "", "Алгебра"]]);

    let outcome =
      with_context(&sheet, |ctx| ctx.build_cell_lesson(1, ColumnId(2), "Алгебра"));
    assert_eq!(outcome, CellOutcome::Skipped(SkipReason::NoTimeSlot));
  }

  #[test]
  fn malformed_data_is_diagnosed_not_dropped() {
    let sheet = worksheet_from_rows("12", &[
      &["", "", "12А", "XБ"],
      &["", "после уроков", "Хор", ""],
      &["", "11:00-10:15", "Хор", ""],
      &["", "09:00-09:45", "", "Хор"],
    ]);

    with_context(&sheet, |ctx| {
      assert_eq!(
        ctx.build_cell_lesson(1, ColumnId(2), "Хор"),
        CellOutcome::Invalid(InvalidReason::MalformedTimeRange {
          text: "после уроков".to_owned(),
        })
      );
      assert!(matches!(
        ctx.build_cell_lesson(2, ColumnId(2), "Хор"),
        CellOutcome::Invalid(InvalidReason::NonIncreasingTimeRange { .. })
      ));
      assert_eq!(
        ctx.build_cell_lesson(3, ColumnId(3), "Хор"),
        CellOutcome::Invalid(InvalidReason::InvalidGradeNumber {
          header: "XБ".to_owned(),
        })
      );
      assert_eq!(
        ctx.build_cell_lesson(3, ColumnId(4), "Хор"),
        CellOutcome::Skipped(SkipReason::UnmappedColumn)
      );
      assert_eq!(
        ctx.build_cell_lesson(3, ColumnId(2), "  "),
        CellOutcome::Skipped(SkipReason::NoContent)
      );
    });
  }

  #[test]
  fn merged_range_takes_its_time_from_the_last_row() {
    let sheet = worksheet_from_rows("12", &[
      &["", "", "12А"],
      &["", "09:00-09:45", "Физкультура\nПетров"],
      &["", "09:50-10:35", ""],
      &["", "10:30-11:15", ""],
    ])
    .with_merged(CellRef::new(1, 2), CellRef::new(3, 2));

    let lesson =
      with_context(&sheet, |ctx| lesson(ctx.build_merged_lesson(&sheet.merged[0])));

    assert_eq!(lesson.start, at(10, 30));
    assert_eq!(lesson.end, at(11, 15));
    assert_eq!(lesson.name, "Физкультура");
    assert_eq!(lesson.grade_letter(), Some('А'));
  }

  #[test]
  fn merged_range_uses_its_first_column_for_the_grade() {
    let sheet = worksheet_from_rows("12", &[
      &["", "", "11А", "12Б"],
      &["", "09:00-09:45", "Информатика№1", ""],
    ])
    .with_merged(CellRef::new(1, 2), CellRef::new(1, 3));

    let lesson =
      with_context(&sheet, |ctx| lesson(ctx.build_merged_lesson(&sheet.merged[0])));

    assert_eq!(lesson.grade, 11);
    assert_eq!(lesson.group(), Some("№1"));
  }
}
