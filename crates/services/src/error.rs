//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::LessonId;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressTracker`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("unknown lesson `{0}`")]
    UnknownLesson(LessonId),

    #[error("section index {index} is out of range for {total} sections")]
    SectionIndexOutOfRange { index: u32, total: u32 },

    #[error("caller supplied {given} sections for lesson `{lesson}` but the catalog has {expected}")]
    SectionCountMismatch {
        lesson: LessonId,
        given: u32,
        expected: u32,
    },
}

/// Errors emitted by content providers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("no content registered for lesson `{0}`")]
    UnknownLesson(LessonId),

    #[error("content provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by `NavigationController`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("unknown navigation target `{0}`")]
    UnknownTarget(LessonId),

    #[error("no adjacent lesson in that direction")]
    NoAdjacentLesson,

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted while bootstrapping course services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
