use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::time_range::TimeRange;
use crate::sheet::{CellRef, MergedRange};

/// Who attends a lesson.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonAudience {
  /// One lettered section of the grade.
  Section { letter: char },
  /// A subgroup drawn from every section of the grade.
  Subgroup { group: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
  pub grade:    u32,
  pub audience: LessonAudience,
  /// 1 = Monday .. 7 = Sunday, 0 when the sheet's day label was not
  /// recognized.
  pub day:      u8,
  pub start:    NaiveDateTime,
  pub end:      NaiveDateTime,
  pub name:     String,
  pub teacher:  Option<String>,
  pub room:     Option<String>,
}

impl Lesson {
  pub fn from_parts(
    grade: u32,
    section_letter: char,
    day: u8,
    time: TimeRange,
    text: LessonText,
  ) -> Self {
    let (details, audience) = match text {
      LessonText::WholeClass(details) => {
        (details, LessonAudience::Section {
          letter: section_letter,
        })
      }
      LessonText::Subgroup { details, group } => {
        (details, LessonAudience::Subgroup { group })
      }
    };

    Self {
      grade,
      audience,
      day,
      start: time.start,
      end: time.end,
      name: details.name,
      teacher: details.teacher,
      room: details.room,
    }
  }

  pub fn grade_letter(&self) -> Option<char> {
    match &self.audience {
      LessonAudience::Section { letter } => Some(*letter),
      LessonAudience::Subgroup { .. } => None,
    }
  }

  pub fn group(&self) -> Option<&str> {
    match &self.audience {
      LessonAudience::Section { .. } => None,
      LessonAudience::Subgroup { group } => Some(group),
    }
  }

  pub fn start_time(&self) -> NaiveTime {
    self.start.time()
  }

  pub fn end_time(&self) -> NaiveTime {
    self.end.time()
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonDetails {
  pub name:    String,
  pub teacher: Option<String>,
  pub room:    Option<String>,
}

/// Decoded contents of one lesson cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LessonText {
  WholeClass(LessonDetails),
  Subgroup {
    details: LessonDetails,
    group:   String,
  },
}

impl LessonText {
  pub fn details(&self) -> &LessonDetails {
    match self {
      LessonText::WholeClass(details) => details,
      LessonText::Subgroup { details, .. } => details,
    }
  }
}

/// Ordinary reasons a visited cell yields no lesson.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
  NoContent,
  NoTimeSlot,
  UnmappedColumn,
}

/// Content was present but could not be turned into a lesson.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReason {
  #[error("time cell {text:?} is not an HH:MM-HH:MM range")]
  MalformedTimeRange { text: String },
  #[error("grade header {header:?} does not start with a grade number")]
  InvalidGradeNumber { header: String },
  #[error("lesson ends at {end} but starts at {start}")]
  NonIncreasingTimeRange { start: NaiveTime, end: NaiveTime },
  #[error("subgroup {group:?} has no lesson name before it")]
  MissingLessonName { group: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellOutcome {
  Lesson(Lesson),
  Skipped(SkipReason),
  Invalid(InvalidReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellLocation {
  Cell(CellRef),
  Merged { start: CellRef, end: CellRef },
}

impl From<&MergedRange> for CellLocation {
  fn from(range: &MergedRange) -> Self {
    CellLocation::Merged {
      start: range.start,
      end:   range.end,
    }
  }
}

impl fmt::Display for CellLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CellLocation::Cell(cell) => write!(f, "{cell}"),
      CellLocation::Merged { start, end } => write!(f, "{start}:{end}"),
    }
  }
}

/// A diagnosed cell, with enough context to find it in the workbook.
#[derive(Clone, Debug, PartialEq)]
pub struct InvalidCell {
  pub sheet:    String,
  pub location: CellLocation,
  pub raw:      String,
  pub reason:   InvalidReason,
}

/// Lessons and diagnostics of one sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetExtraction {
  pub sheet:   String,
  pub lessons: Vec<Lesson>,
  pub skipped: usize,
  pub invalid: Vec<InvalidCell>,
}

impl SheetExtraction {
  pub fn new(sheet: &str) -> Self {
    Self {
      sheet:   sheet.to_owned(),
      lessons: Vec::new(),
      skipped: 0,
      invalid: Vec::new(),
    }
  }

  pub fn record(
    &mut self,
    location: CellLocation,
    raw: &str,
    outcome: CellOutcome,
  ) {
    match outcome {
      CellOutcome::Lesson(lesson) => {
        debug!(
          sheet = self.sheet,
          cell = %location,
          grade = lesson.grade,
          letter = ?lesson.grade_letter(),
          day = lesson.day,
          name = lesson.name,
          group = ?lesson.group(),
          teacher = ?lesson.teacher,
          room = ?lesson.room,
          start = %lesson.start_time(),
          end = %lesson.end_time(),
          "parsed lesson"
        );
        self.lessons.push(lesson);
      }
      CellOutcome::Skipped(reason) => {
        self.skipped += 1;
        if raw.trim().is_empty() {
          trace!(sheet = self.sheet, cell = %location, "skipped empty cell");
        } else {
          warn!(
            sheet = self.sheet,
            cell = %location,
            ?reason,
            raw,
            "skipped non-empty cell"
          );
        }
      }
      CellOutcome::Invalid(reason) => {
        warn!(
          sheet = self.sheet,
          cell = %location,
          raw,
          %reason,
          "invalid lesson cell"
        );
        self.invalid.push(InvalidCell {
          sheet: self.sheet.clone(),
          location,
          raw: raw.to_owned(),
          reason,
        });
      }
    }
  }
}
