use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{error::SinkError, parse_timetable::parse_model::Lesson};

/// Destination of a completed extraction run.
pub trait LessonSink {
  /// Clears every stored lesson and stores `lessons` in their place.
  fn replace_all(&mut self, lessons: &[Lesson]) -> Result<(), SinkError>;
}

/// Flat, storage-shaped form of a [`Lesson`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRecord {
  pub grade:          u32,
  /// Empty for subgroup lessons.
  pub grade_letter:   String,
  /// 1 = Monday .. 7 = Sunday, 0 = unknown.
  pub lesson_day:     u8,
  /// `HH:MM`
  pub lesson_start:   String,
  /// `HH:MM`
  pub lesson_end:     String,
  pub lesson_name:    String,
  pub lesson_teacher: String,
  pub lesson_class:   String,
  /// Empty for whole-class lessons.
  pub lesson_group:   String,
}

impl From<&Lesson> for LessonRecord {
  fn from(lesson: &Lesson) -> Self {
    Self {
      grade:          lesson.grade,
      grade_letter:   lesson
        .grade_letter()
        .map(String::from)
        .unwrap_or_default(),
      lesson_day:     lesson.day,
      lesson_start:   lesson.start.format("%H:%M").to_string(),
      lesson_end:     lesson.end.format("%H:%M").to_string(),
      lesson_name:    lesson.name.clone(),
      lesson_teacher: lesson.teacher.clone().unwrap_or_default(),
      lesson_class:   lesson.room.clone().unwrap_or_default(),
      lesson_group:   lesson.group().unwrap_or_default().to_owned(),
    }
  }
}

/// Stores lessons as a JSON array of [`LessonRecord`]s in one file.
#[derive(Clone, Debug)]
pub struct JsonFileSink {
  path: PathBuf,
}

impl JsonFileSink {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Reads back the stored records. A missing file holds no lessons.
  pub fn load(&self) -> Result<Vec<LessonRecord>, SinkError> {
    let contents = match std::fs::read(&self.path) {
      Ok(contents) => contents,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Ok(Vec::new());
      }
      Err(source) => {
        return Err(SinkError::Io {
          path: self.path.clone(),
          source,
        });
      }
    };
    Ok(serde_json::from_slice(&contents)?)
  }

  fn staging_path(&self) -> PathBuf {
    let mut file_name = self
      .path
      .file_name()
      .map(|n| n.to_os_string())
      .unwrap_or_else(|| "lessons".into());
    file_name.push(".tmp");
    self.path.with_file_name(file_name)
  }
}

impl LessonSink for JsonFileSink {
  #[instrument(
    skip_all,
    fields(path = %self.path.display(), count = lessons.len())
  )]
  fn replace_all(&mut self, lessons: &[Lesson]) -> Result<(), SinkError> {
    let records = lessons.iter().map(LessonRecord::from).collect::<Vec<_>>();
    let payload = serde_json::to_vec_pretty(&records)?;

    // written aside first so a failed write leaves the previous set intact
    let staging = self.staging_path();
    std::fs::write(&staging, payload).map_err(|source| SinkError::Io {
      path: staging.clone(),
      source,
    })?;
    std::fs::rename(&staging, &self.path).map_err(|source| SinkError::Io {
      path: self.path.clone(),
      source,
    })?;

    debug!("replaced stored lessons");
    Ok(())
  }
}

/// Keeps the most recently stored lesson set in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemorySink {
  pub lessons:      Vec<Lesson>,
  pub replacements: usize,
}

impl LessonSink for InMemorySink {
  fn replace_all(&mut self, lessons: &[Lesson]) -> Result<(), SinkError> {
    self.lessons = lessons.to_vec();
    self.replacements += 1;
    Ok(())
  }
}
