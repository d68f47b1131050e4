use std::{io::Cursor, path::Path, sync::LazyLock};

use bytes::Bytes;
use calamine::{Reader, Xlsx};
use miette::{Context, IntoDiagnostic};
use tracing::{debug, instrument};

use crate::{
  error::ExtractError,
  sheet::{CellRef, CellValueMode, DecodedWorksheet, MergedRange, SheetSource},
};

static HTTP_CLIENT: LazyLock<reqwest::Client> =
  LazyLock::new(reqwest::Client::new);

pub struct DecodedSpreadsheet {
  pub main: Xlsx<Cursor<Bytes>>,
}

impl DecodedSpreadsheet {
  pub fn from_bytes(payload: Bytes) -> Result<Self, ExtractError> {
    let main = Xlsx::new(Cursor::new(payload)).map_err(|e| {
      ExtractError::WorkbookUnreadable {
        source: Box::new(e),
      }
    })?;
    Ok(Self { main })
  }
}

impl SheetSource for DecodedSpreadsheet {
  fn sheet_names(&self) -> Vec<String> {
    self.main.sheet_names()
  }

  fn worksheet(&mut self, name: &str) -> Result<DecodedWorksheet, ExtractError> {
    let main = self.main.worksheet_range(name).map_err(|e| {
      ExtractError::SheetUnreadable {
        sheet:  name.to_owned(),
        source: Box::new(e),
      }
    })?;
    let regions = self
      .main
      .worksheet_merge_cells(name)
      .ok_or_else(|| ExtractError::SheetMissing {
        sheet: name.to_owned(),
      })?
      .map_err(|e| ExtractError::MergedRangesUnreadable {
        sheet:  name.to_owned(),
        source: Box::new(e),
      })?;

    let mut worksheet = DecodedWorksheet::new(name, main);
    worksheet.merged = regions
      .into_iter()
      .map(|dim| {
        let start = CellRef::new(dim.start.0, dim.start.1);
        let end = CellRef::new(dim.end.0, dim.end.1);
        MergedRange {
          start,
          end,
          text: worksheet.cell_text(start, CellValueMode::Formatted),
        }
      })
      .collect();
    debug!(
      sheet = name,
      merged_ranges = worksheet.merged.len(),
      "decoded worksheet"
    );

    Ok(worksheet)
  }
}

#[instrument]
pub(crate) async fn fetch_xlsx_from_google_sheets(
  sheet_id: &str,
) -> miette::Result<DecodedSpreadsheet> {
  let url = format!(
    "https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=xlsx"
  );

  debug!("requesting XLSX sheet export");
  let req = HTTP_CLIENT.get(url);
  let resp = req
    .send()
    .await
    .into_diagnostic()
    .context("failed to send request for XLSX export")?
    .error_for_status()
    .into_diagnostic()
    .context("got error response from google for XLSX export")?;
  let body = resp
    .bytes()
    .await
    .into_diagnostic()
    .context("failed to read full body of XLSX export response")?;
  debug!(bytes = body.len(), "received XLSX sheet export");

  let spreadsheet = DecodedSpreadsheet::from_bytes(body)
    .context("failed to decode XLSX export as XLSX")?;
  debug!("decoded XLSX export");

  Ok(spreadsheet)
}

#[instrument]
pub(crate) async fn read_xlsx_from_file(
  path: &Path,
) -> miette::Result<DecodedSpreadsheet> {
  let body = tokio::fs::read(path)
    .await
    .into_diagnostic()
    .context(format!("failed to read timetable file {}", path.display()))?;
  debug!(bytes = body.len(), "read XLSX file");

  DecodedSpreadsheet::from_bytes(Bytes::from(body))
    .context(format!("failed to decode {} as XLSX", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn garbage_bytes_are_a_structural_failure() {
    let result =
      DecodedSpreadsheet::from_bytes(Bytes::from_static(b"not a zip archive"));
    assert!(matches!(
      result,
      Err(ExtractError::WorkbookUnreadable { .. })
    ));
  }
}
