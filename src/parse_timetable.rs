pub mod day;
pub mod grade_header;
pub mod lesson_text;
pub mod parse_lessons;
pub mod parse_model;
pub mod parse_sheet;
pub mod time_range;
