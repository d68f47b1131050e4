use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::{config::SheetLayout, sheet::ColumnId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GradeColumn {
  /// Everything before the section letter. Not validated until a lesson
  /// needs it.
  pub number: String,
  pub letter: char,
}

impl GradeColumn {
  /// The grade number, if the header starts with a positive integer.
  pub fn grade(&self) -> Option<u32> {
    self.number.trim().parse::<u32>().ok().filter(|g| *g > 0)
  }
}

/// Column-to-section mapping read from a sheet's header row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GradeHeader {
  columns: BTreeMap<ColumnId, GradeColumn>,
}

impl GradeHeader {
  /// Maps every non-empty, non-metadata header cell `"<number><letter>"`.
  pub fn from_row(
    cells: impl IntoIterator<Item = (ColumnId, String)>,
    layout: &SheetLayout,
  ) -> Self {
    let mut columns = BTreeMap::new();

    for (column, text) in cells {
      if layout.is_metadata_column(column) {
        trace!(%column, "skipping metadata column in header");
        continue;
      }
      let text = text.trim();
      let Some(letter) = text.chars().last() else {
        continue;
      };
      let number = text[..text.len() - letter.len_utf8()].to_owned();

      debug!(%column, number, %letter, "found grade header");
      columns.insert(column, GradeColumn { number, letter });
    }

    Self { columns }
  }

  pub fn get(&self, column: ColumnId) -> Option<&GradeColumn> {
    self.columns.get(&column)
  }

  pub fn len(&self) -> usize {
    self.columns.len()
  }

  pub fn is_empty(&self) -> bool {
    self.columns.is_empty()
  }
}
