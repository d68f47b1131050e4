use kinded::Kinded;
use miette::Context;
use tracing::info;

use crate::{
  config::{Config, WorkbookSource},
  extract::{ExtractionReport, extract_and_replace},
  fetch_sheet::{
    DecodedSpreadsheet, fetch_xlsx_from_google_sheets, read_xlsx_from_file,
  },
  persist::JsonFileSink,
};

#[derive(Kinded)]
#[kinded(kind = RunStep)]
pub enum RunState {
  Start,
  LoadedWorkbook { workbook: DecodedSpreadsheet },
  Completed { report: ExtractionReport },
}

impl RunState {
  pub fn completed(&self) -> bool { matches!(self, Self::Completed { .. }) }

  pub fn report(&self) -> Option<&ExtractionReport> {
    match self {
      Self::Completed { report } => Some(report),
      _ => None,
    }
  }

  pub async fn step(self, config: &Config) -> miette::Result<Self> {
    let old_state_step = self.kind();
    let new_state = match self {
      RunState::Start => RunState::LoadedWorkbook {
        workbook: match &config.source {
          WorkbookSource::File(path) => read_xlsx_from_file(path).await?,
          WorkbookSource::GoogleSheets { spreadsheet_id } => {
            fetch_xlsx_from_google_sheets(spreadsheet_id).await?
          }
        },
      },
      RunState::LoadedWorkbook { mut workbook } => {
        let mut sink = JsonFileSink::new(&config.lessons_output);
        RunState::Completed {
          report: extract_and_replace(&mut workbook, &config.layout, &mut sink)
            .context("failed to extract and store lessons")?,
        }
      }
      RunState::Completed { .. } => {
        miette::bail!("run already completed")
      }
    };

    info!(
      old_state = ?old_state_step,
      new_state = ?(new_state.kind()),
      "successfully transitioned state"
    );
    Ok(new_state)
  }
}
