use miette::Context;
use timetable_extract::{config::Config, state::RunState};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> miette::Result<()> {
  tracing_subscriber::registry()
    .with(fmt::layer())
    .with(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .init();

  let config =
    Config::from_env().context("failed to gather config from env")?;

  // drive state machine
  let mut state = RunState::Start;
  while !state.completed() {
    state = match state.step(&config).await {
      Ok(next) => next,
      Err(e) => {
        error!("no lessons updated, see error");
        return Err(e);
      }
    };
  }

  if let Some(report) = state.report() {
    info!(
      lessons = report.lesson_count(),
      skipped = report.skipped_count(),
      invalid = report.invalid_count(),
      "{report}"
    );
    for cell in &report.invalid_cells {
      info!(
        sheet = %cell.sheet,
        location = %cell.location,
        reason = %cell.reason,
        "invalid cell"
      );
    }
  }

  Ok(())
}
