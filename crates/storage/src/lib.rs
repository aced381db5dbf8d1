#![forbid(unsafe_code)]

pub mod repository;
pub mod snapshot;
pub mod sqlite;

pub use repository::{InMemoryStore, PersistentStore, StorageError};
pub use snapshot::{
    COMPLETED_SECTIONS_KEY, COURSE_PROGRESS_KEY, CompletedSectionsSnapshot, LessonProgressRecord,
    ProgressSnapshot, SNAPSHOT_VERSION,
};
pub use sqlite::{SqliteInitError, SqliteStore};
