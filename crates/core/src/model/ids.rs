use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable identifier for a lesson, assigned by the content author.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(String);

impl LessonId {
    /// Creates a new `LessonId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifies one completable section within a lesson.
///
/// Keys order lesson-major, so every key of one lesson is contiguous and a
/// lesson's recorded sections can be scanned as a range.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionKey {
    lesson: LessonId,
    index: u32,
}

impl SectionKey {
    /// Creates a key for the section at `index` (0-indexed) of `lesson`.
    #[must_use]
    pub fn new(lesson: LessonId, index: u32) -> Self {
        Self { lesson, index }
    }

    /// The lesson this section belongs to.
    #[must_use]
    pub fn lesson(&self) -> &LessonId {
        &self.lesson
    }

    /// The section's 0-indexed position within its lesson.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Debug for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectionKey({}#{})", self.lesson, self.index)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The persisted v1 encoding: `<lesson>#<index>`.
impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.lesson, self.index)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing a `SectionKey` from its persisted string form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseSectionKeyError {
    #[error("section key is missing the `#` separator")]
    MissingSeparator,

    #[error("section key has an empty lesson id")]
    EmptyLesson,

    #[error("section key has a non-numeric index")]
    InvalidIndex,
}

impl FromStr for SectionKey {
    type Err = ParseSectionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split on the last separator so lesson ids containing `#` round-trip.
        let (lesson, index) = s
            .rsplit_once('#')
            .ok_or(ParseSectionKeyError::MissingSeparator)?;
        if lesson.is_empty() {
            return Err(ParseSectionKeyError::EmptyLesson);
        }
        let index = index
            .parse::<u32>()
            .map_err(|_| ParseSectionKeyError::InvalidIndex)?;
        Ok(Self::new(LessonId::new(lesson), index))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
