use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use course_core::model::{LessonId, LessonProgress, SectionKey};

use crate::repository::StorageError;

/// Current persisted schema version. Decoders reject anything else.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Key holding the per-lesson progress mapping.
pub const COURSE_PROGRESS_KEY: &str = "course_progress";

/// Key holding the completed-section set.
pub const COMPLETED_SECTIONS_KEY: &str = "completed_sections";

fn corrupt(key: &str, reason: impl ToString) -> StorageError {
    StorageError::CorruptSnapshot {
        key: key.to_owned(),
        reason: reason.to_string(),
    }
}

//
// ─── LESSON PROGRESS RECORD ────────────────────────────────────────────────────
//

/// Persisted shape of one lesson's progress.
///
/// Mirrors the domain `LessonProgress` so the codec can evolve without
/// leaking storage concerns into the domain layer. The redundant `completed`
/// flag is kept in the payload for readability but renormalized from
/// `progress` on load, so a hand-edited snapshot cannot desynchronize the
/// two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgressRecord {
    pub completed: bool,
    pub progress: u8,
}

impl LessonProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &LessonProgress) -> Self {
        Self {
            completed: progress.is_completed(),
            progress: progress.percent(),
        }
    }

    /// Convert the record back into a domain `LessonProgress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CorruptSnapshot` if the percent is out of range.
    pub fn into_progress(self) -> Result<LessonProgress, StorageError> {
        LessonProgress::from_percent(self.progress).map_err(|e| corrupt(COURSE_PROGRESS_KEY, e))
    }
}

//
// ─── SNAPSHOTS ─────────────────────────────────────────────────────────────────
//

/// Full snapshot of the per-lesson progress mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub lessons: BTreeMap<String, LessonProgressRecord>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn capture(
        lessons: &BTreeMap<LessonId, LessonProgress>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            lessons: lessons
                .iter()
                .map(|(id, progress)| {
                    (
                        id.as_str().to_owned(),
                        LessonProgressRecord::from_progress(progress),
                    )
                })
                .collect(),
        }
    }

    /// Encode to the persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Decode and validate a persisted payload into domain progress values.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CorruptSnapshot` on parse failure, an
    /// unsupported version, or an out-of-range percent.
    pub fn decode(raw: &str) -> Result<BTreeMap<LessonId, LessonProgress>, StorageError> {
        let snapshot: Self =
            serde_json::from_str(raw).map_err(|e| corrupt(COURSE_PROGRESS_KEY, e))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(corrupt(
                COURSE_PROGRESS_KEY,
                format!("unsupported version {}", snapshot.version),
            ));
        }
        snapshot
            .lessons
            .into_iter()
            .map(|(id, record)| Ok((LessonId::new(id), record.into_progress()?)))
            .collect()
    }
}

/// Full snapshot of the completed-section set.
///
/// Sections are stored in their string encoding (`<lesson>#<index>`); the
/// decoder parses them back into structured keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSectionsSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub sections: Vec<String>,
}

impl CompletedSectionsSnapshot {
    #[must_use]
    pub fn capture(sections: &BTreeSet<SectionKey>, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            sections: sections.iter().map(SectionKey::to_string).collect(),
        }
    }

    /// Encode to the persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Decode and validate a persisted payload into section keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CorruptSnapshot` on parse failure, an
    /// unsupported version, or an entry that is not a valid section key.
    pub fn decode(raw: &str) -> Result<BTreeSet<SectionKey>, StorageError> {
        let snapshot: Self =
            serde_json::from_str(raw).map_err(|e| corrupt(COMPLETED_SECTIONS_KEY, e))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(corrupt(
                COMPLETED_SECTIONS_KEY,
                format!("unsupported version {}", snapshot.version),
            ));
        }
        snapshot
            .sections
            .iter()
            .map(|entry| {
                entry
                    .parse::<SectionKey>()
                    .map_err(|e| corrupt(COMPLETED_SECTIONS_KEY, format!("`{entry}`: {e}")))
            })
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
