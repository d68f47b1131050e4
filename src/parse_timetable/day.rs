use chrono::Weekday;
use tracing::warn;

/// Day index for labels that name no recognized weekday.
pub const UNKNOWN_DAY: u8 = 0;

// checked in order, first match wins
const WEEKDAY_TOKENS: [(Weekday, &[&str]); 7] = [
  (Weekday::Mon, &["понедельник", "mon"]),
  (Weekday::Tue, &["вторник", "tue"]),
  (Weekday::Wed, &["среда", "wed"]),
  (Weekday::Thu, &["четверг", "thu"]),
  (Weekday::Fri, &["пятница", "fri"]),
  (Weekday::Sat, &["суббота", "sat"]),
  (Weekday::Sun, &["воскресенье", "sun"]),
];

/// Finds the weekday named anywhere in `label`, in Russian or English,
/// ignoring case.
pub fn resolve_weekday(label: &str) -> Option<Weekday> {
  let label = label.trim().to_lowercase();
  WEEKDAY_TOKENS
    .iter()
    .find(|(_, tokens)| tokens.iter().any(|t| label.contains(t)))
    .map(|(day, _)| *day)
}

/// 1 (Monday) through 7 (Sunday), or [`UNKNOWN_DAY`].
pub fn day_index(label: &str) -> u8 {
  match resolve_weekday(label) {
    Some(day) => day.number_from_monday() as u8,
    None => {
      warn!(label, "unknown day label, using day 0");
      UNKNOWN_DAY
    }
  }
}
