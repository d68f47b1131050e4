use std::{fmt, str::FromStr};

use calamine::{Data, Range};
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Zero-based spreadsheet column, written in A1 letters (`A`, `B`, `AA`).
#[derive(
  Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnId(pub u32);

impl fmt::Display for ColumnId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // bijective base-26: A..Z, AA..AZ, ...
    let mut letters = Vec::new();
    let mut n = self.0 + 1;
    while n > 0 {
      let rem = (n - 1) % 26;
      letters.push(char::from(b'A' + rem as u8));
      n = (n - 1) / 26;
    }
    letters.iter().rev().try_for_each(|c| write!(f, "{c}"))
  }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid column letters: {0:?}")]
pub struct InvalidColumn(String);

impl FromStr for ColumnId {
  type Err = InvalidColumn;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let letters = s.trim();
    if letters.is_empty() {
      return Err(InvalidColumn(s.to_owned()));
    }
    let mut n: u32 = 0;
    for c in letters.chars() {
      if !c.is_ascii_alphabetic() {
        return Err(InvalidColumn(s.to_owned()));
      }
      let digit = u32::from(c.to_ascii_uppercase() as u8 - b'A') + 1;
      n = n
        .checked_mul(26)
        .and_then(|n| n.checked_add(digit))
        .ok_or_else(|| InvalidColumn(s.to_owned()))?;
    }
    Ok(ColumnId(n - 1))
  }
}

impl TryFrom<String> for ColumnId {
  type Error = InvalidColumn;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<ColumnId> for String {
  fn from(value: ColumnId) -> Self {
    value.to_string()
  }
}

/// Absolute, zero-based cell address. Displays as A1 notation.
#[derive(
  Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
  pub row:    u32,
  pub column: ColumnId,
}

impl CellRef {
  pub const fn new(row: u32, column: u32) -> Self {
    Self {
      row,
      column: ColumnId(column),
    }
  }
}

impl fmt::Display for CellRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.column, self.row + 1)
  }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid cell reference: {0:?}")]
pub struct InvalidCellRef(String);

impl FromStr for CellRef {
  type Err = InvalidCellRef;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    let split = s
      .find(|c: char| c.is_ascii_digit())
      .ok_or_else(|| InvalidCellRef(s.to_owned()))?;
    let (letters, digits) = s.split_at(split);
    let column = letters
      .parse::<ColumnId>()
      .map_err(|_| InvalidCellRef(s.to_owned()))?;
    let row = digits
      .parse::<u32>()
      .ok()
      .and_then(|r| r.checked_sub(1))
      .ok_or_else(|| InvalidCellRef(s.to_owned()))?;
    Ok(CellRef { row, column })
  }
}

impl TryFrom<String> for CellRef {
  type Error = InvalidCellRef;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<CellRef> for String {
  fn from(value: CellRef) -> Self {
    value.to_string()
  }
}

/// A rectangular block presented as one logical cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedRange {
  pub start: CellRef,
  pub end:   CellRef,
  /// Combined value; XLSX keeps it in the top-left cell only.
  pub text:  String,
}

impl fmt::Display for MergedRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.start, self.end)
  }
}

/// How a cell's value is rendered as text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellValueMode {
  /// The literal stored value. Date/times come back as their serial number.
  Raw,
  /// Date/times rendered as wall-clock text.
  Formatted,
}

pub fn data_to_text(data: &Data, mode: CellValueMode) -> String {
  match (data, mode) {
    (Data::Empty, _) => String::new(),
    (Data::String(s), _) => s.clone(),
    (Data::DateTime(dt), CellValueMode::Raw) => dt.as_f64().to_string(),
    (Data::DateTime(dt), CellValueMode::Formatted) => {
      let (y, m, d, h, min, ..) = dt.to_ymd_hms_milli();
      // serials below 1.0 carry no date, only a time of day
      if dt.as_f64() < 1.0 {
        format!("{h:02}:{min:02}")
      } else {
        format!("{y:04}-{m:02}-{d:02} {h:02}:{min:02}")
      }
    }
    (other, _) => other.to_string(),
  }
}

/// An already-resident snapshot of one sheet.
#[derive(Clone, Debug)]
pub struct DecodedWorksheet {
  pub name:   String,
  pub main:   Range<Data>,
  pub merged: Vec<MergedRange>,
}

impl DecodedWorksheet {
  pub fn new(name: impl Into<String>, main: Range<Data>) -> Self {
    Self {
      name: name.into(),
      main,
      merged: Vec::new(),
    }
  }

  /// Registers a merged range, taking its text from the range's top-left
  /// cell.
  pub fn with_merged(mut self, start: CellRef, end: CellRef) -> Self {
    let text = self.cell_text(start, CellValueMode::Formatted);
    self.merged.push(MergedRange { start, end, text });
    self
  }

  pub fn cell_text(&self, at: CellRef, mode: CellValueMode) -> String {
    self
      .main
      .get_value((at.row, at.column.0))
      .map(|d| data_to_text(d, mode))
      .unwrap_or_default()
  }

  /// Every row of the used range with absolute addresses, cells rendered
  /// in [`CellValueMode::Formatted`].
  pub fn rows(&self) -> impl Iterator<Item = (u32, Vec<(ColumnId, String)>)> {
    let (first_row, first_col) = self.main.start().unwrap_or((0, 0));
    self.main.rows().enumerate().map(move |(i, row)| {
      let cells = row
        .iter()
        .enumerate()
        .map(|(j, d)| {
          (
            ColumnId(first_col + j as u32),
            data_to_text(d, CellValueMode::Formatted),
          )
        })
        .collect();
      (first_row + i as u32, cells)
    })
  }

  /// The cells of one absolute row, empty if the row lies outside the used
  /// range.
  pub fn row(&self, row: u32) -> Vec<(ColumnId, String)> {
    self
      .rows()
      .find(|(r, _)| *r == row)
      .map(|(_, cells)| cells)
      .unwrap_or_default()
  }
}

/// Read access to a workbook's sheets.
pub trait SheetSource {
  fn sheet_names(&self) -> Vec<String>;
  fn worksheet(&mut self, name: &str) -> Result<DecodedWorksheet, ExtractError>;
}

/// Workbook whose sheets are already decoded, kept in workbook order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryWorkbook {
  sheets: Vec<DecodedWorksheet>,
}

impl InMemoryWorkbook {
  pub fn new(sheets: Vec<DecodedWorksheet>) -> Self {
    Self { sheets }
  }
}

impl SheetSource for InMemoryWorkbook {
  fn sheet_names(&self) -> Vec<String> {
    self.sheets.iter().map(|s| s.name.clone()).collect()
  }

  fn worksheet(&mut self, name: &str) -> Result<DecodedWorksheet, ExtractError> {
    self
      .sheets
      .iter()
      .find(|s| s.name == name)
      .cloned()
      .ok_or_else(|| ExtractError::SheetMissing {
        sheet: name.to_owned(),
      })
  }
}

/// Builds a worksheet from string rows starting at `A1`; empty strings stay
/// empty cells.
pub fn worksheet_from_rows(name: &str, rows: &[&[&str]]) -> DecodedWorksheet {
  let height = rows.len().max(1) as u32;
  let width = rows.iter().map(|r| r.len()).max().unwrap_or(0).max(1) as u32;
  let mut range = Range::new((0, 0), (height - 1, width - 1));
  for (r, row) in rows.iter().enumerate() {
    for (c, text) in row.iter().enumerate() {
      if !text.is_empty() {
        range.set_value((r as u32, c as u32), Data::String((*text).to_owned()));
      }
    }
  }
  DecodedWorksheet::new(name, range)
}
