mod catalog;
mod ids;
mod progress;
mod section;

pub use catalog::{CatalogEntry, CatalogError, LessonCatalog};
pub use ids::{LessonId, ParseSectionKeyError, SectionKey};
pub use progress::{LessonProgress, ProgressValueError, completion_percent, fraction_percent};
pub use section::{Section, SectionError};
