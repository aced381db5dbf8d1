use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use course_core::model::{LessonId, Section};

use crate::error::ContentError;

/// Supplies lesson content on demand.
///
/// Materialization is the moment a lesson's sections are prepared for
/// display. It happens at most once per session; `is_materialized` guards
/// repeats.
pub trait ContentProvider: Send + Sync {
    /// Ordered sections for a lesson.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnknownLesson` when no content is registered.
    fn sections(&self, lesson: &LessonId) -> Result<Vec<Section>, ContentError>;

    /// Whether the lesson's content has been materialized this session.
    fn is_materialized(&self, lesson: &LessonId) -> bool;

    /// Prepare the lesson's content. Materializing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnknownLesson` when no content is registered.
    fn materialize(&self, lesson: &LessonId) -> Result<(), ContentError>;
}

/// In-memory provider over sections registered up front.
#[derive(Default)]
pub struct StaticContentProvider {
    lessons: HashMap<LessonId, Vec<Section>>,
    materialized: Mutex<HashSet<LessonId>>,
}

impl StaticContentProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content for a lesson, replacing any previous registration.
    #[must_use]
    pub fn with_lesson(mut self, lesson: LessonId, sections: Vec<Section>) -> Self {
        self.lessons.insert(lesson, sections);
        self
    }
}

impl ContentProvider for StaticContentProvider {
    fn sections(&self, lesson: &LessonId) -> Result<Vec<Section>, ContentError> {
        self.lessons
            .get(lesson)
            .cloned()
            .ok_or_else(|| ContentError::UnknownLesson(lesson.clone()))
    }

    fn is_materialized(&self, lesson: &LessonId) -> bool {
        self.materialized
            .lock()
            .map(|set| set.contains(lesson))
            .unwrap_or(false)
    }

    fn materialize(&self, lesson: &LessonId) -> Result<(), ContentError> {
        if !self.lessons.contains_key(lesson) {
            return Err(ContentError::UnknownLesson(lesson.clone()));
        }
        let mut set = self
            .materialized
            .lock()
            .map_err(|e| ContentError::Unavailable(e.to_string()))?;
        set.insert(lesson.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> StaticContentProvider {
        let sections = vec![
            Section::new("Theory", "What a database is.").unwrap(),
            Section::new("Practice", "Create one.")
                .unwrap()
                .with_practical_activity("Install SQLite locally."),
        ];
        StaticContentProvider::new().with_lesson(LessonId::new("db-fundamentals"), sections)
    }

    #[test]
    fn serves_registered_sections() {
        let provider = provider();
        let sections = provider.sections(&LessonId::new("db-fundamentals")).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title(), "Theory");
    }

    #[test]
    fn unknown_lesson_is_an_error() {
        let provider = provider();
        let err = provider.sections(&LessonId::new("missing")).unwrap_err();
        assert_eq!(err, ContentError::UnknownLesson(LessonId::new("missing")));
    }

    #[test]
    fn materialize_flips_the_flag_once() {
        let provider = provider();
        let lesson = LessonId::new("db-fundamentals");
        assert!(!provider.is_materialized(&lesson));
        provider.materialize(&lesson).unwrap();
        assert!(provider.is_materialized(&lesson));
        // Repeating is a no-op.
        provider.materialize(&lesson).unwrap();
        assert!(provider.is_materialized(&lesson));
    }

    #[test]
    fn materialize_rejects_unknown_lesson() {
        let provider = provider();
        let err = provider.materialize(&LessonId::new("missing")).unwrap_err();
        assert_eq!(err, ContentError::UnknownLesson(LessonId::new("missing")));
    }
}
