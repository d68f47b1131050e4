//! Extracts school lessons from a multi-sheet timetable workbook and stores
//! them as a fresh, complete lesson set.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch_sheet;
pub mod parse_timetable;
pub mod persist;
pub mod sheet;
pub mod state;

pub use self::extract::{ExtractionReport, extract, extract_and_replace};
