use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::trace;

/// Every decoded time of day is placed on this date so that only the clock
/// component matters for ordering and durations.
pub const REFERENCE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2000, 1, 1)
{
  Some(date) => date,
  None => panic!("reference date is a valid calendar date"),
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
  pub start: NaiveDateTime,
  pub end:   NaiveDateTime,
}

impl TimeRange {
  pub fn from_clock(start: NaiveTime, end: NaiveTime) -> Self {
    Self {
      start: REFERENCE_DATE.and_time(start),
      end:   REFERENCE_DATE.and_time(end),
    }
  }

  pub fn is_increasing(&self) -> bool {
    self.start < self.end
  }

  pub fn duration(&self) -> TimeDelta {
    self.end - self.start
  }
}

/// Decodes `"HH:MM-HH:MM"`, tolerating whitespace around either token.
///
/// Returns `None` unless the text splits on `-` into exactly two parts that
/// both parse as a strict `HH:MM` clock time. Ordering of the two times is
/// left to the caller.
pub fn decode_time_range(text: &str) -> Option<TimeRange> {
  let mut parts = text.split('-');
  let (start, end) = match (parts.next(), parts.next(), parts.next()) {
    (Some(start), Some(end), None) => (start.trim(), end.trim()),
    _ => return None,
  };

  let start = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
  let end = NaiveTime::parse_from_str(end, "%H:%M").ok()?;
  trace!(%start, %end, "decoded time range");

  Some(TimeRange::from_clock(start, end))
}
