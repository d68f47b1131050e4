use tracing::trace;

use super::parse_model::{InvalidReason, LessonDetails, LessonText};

fn non_blank(line: Option<&str>) -> Option<String> {
  line
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(ToOwned::to_owned)
}

/// Decodes a lesson cell laid out as `name\nteacher\nroom`.
///
/// `Ok(None)` means the cell holds no lesson (blank first line). A name
/// containing `marker` is split there: the tail, marker included, becomes
/// the subgroup label.
pub fn decode_lesson_text(
  raw: &str,
  marker: char,
) -> Result<Option<LessonText>, InvalidReason> {
  let mut lines = raw.split('\n');
  let Some(name) = non_blank(lines.next()) else {
    return Ok(None);
  };
  let teacher = non_blank(lines.next());
  let room = non_blank(lines.next());

  let text = match name.find(marker) {
    Some(idx) => {
      let group = name[idx..].trim().to_owned();
      let name = name[..idx].trim().to_owned();
      if name.is_empty() {
        return Err(InvalidReason::MissingLessonName { group });
      }
      LessonText::Subgroup {
        details: LessonDetails {
          name,
          teacher,
          room,
        },
        group,
      }
    }
    None => LessonText::WholeClass(LessonDetails {
      name,
      teacher,
      room,
    }),
  };
  trace!(?text, "decoded lesson text");

  Ok(Some(text))
}

#[cfg(test)]
mod tests {
  use super::*;

  const MARKER: char = '№';

  #[test]
  fn splits_subgroup_marker_off_the_name() {
    let text = decode_lesson_text("Math№2\nSmith\nRoom 4", MARKER)
      .unwrap()
      .unwrap();
    assert_eq!(text, LessonText::Subgroup {
      details: LessonDetails {
        name:    "Math".to_owned(),
        teacher: Some("Smith".to_owned()),
        room:    Some("Room 4".to_owned()),
      },
      group:   "№2".to_owned(),
    });
  }

  #[test]
  fn whole_class_lessons_may_omit_teacher_and_room() {
    let text = decode_lesson_text("  Физика  ", MARKER).unwrap().unwrap();
    assert_eq!(text, LessonText::WholeClass(LessonDetails {
      name:    "Физика".to_owned(),
      teacher: None,
      room:    None,
    }));

    let text = decode_lesson_text("Химия\r\n\r\n204\r\n", MARKER)
      .unwrap()
      .unwrap();
    assert_eq!(text.details().teacher, None);
    assert_eq!(text.details().room.as_deref(), Some("204"));
  }

  #[test]
  fn lines_past_the_room_are_ignored() {
    let text = decode_lesson_text("Art\nLee\n12\nbring paints", MARKER)
      .unwrap()
      .unwrap();
    assert_eq!(text.details().room.as_deref(), Some("12"));
  }

  #[test]
  fn blank_first_line_is_no_lesson() {
    assert_eq!(decode_lesson_text("", MARKER), Ok(None));
    assert_eq!(decode_lesson_text("   \nSmith\n4", MARKER), Ok(None));
  }

  #[test]
  fn marker_without_a_name_is_invalid() {
    assert_eq!(
      decode_lesson_text(" № 3 \nSmith", MARKER),
      Err(InvalidReason::MissingLessonName {
        group: "№ 3".to_owned(),
      })
    );
  }
}
