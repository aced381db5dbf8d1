use std::path::Path;
use std::sync::Arc;

use course_core::model::{LessonCatalog, LessonId, LessonProgress, SectionKey};
use course_core::time::Clock;
use storage::repository::PersistentStore;
use storage::sqlite::SqliteStore;

use crate::content::ContentProvider;
use crate::error::{CourseServicesError, NavigationError, ProgressError};
use crate::events::PresentationSink;
use crate::navigation::{NavigationController, View};
use crate::progress::{AggregateProgress, ProgressTracker};

/// Assembles the course's state machines over shared collaborators.
///
/// This is the single context object a caller holds; nothing in the
/// workspace is reachable through a process-wide singleton.
#[derive(Debug)]
pub struct CourseServices {
    catalog: Arc<LessonCatalog>,
    tracker: ProgressTracker,
    navigation: NavigationController,
}

impl CourseServices {
    /// Build services over an injected store, content provider, and sink.
    #[must_use]
    pub fn new(
        catalog: LessonCatalog,
        store: Arc<dyn PersistentStore>,
        content: Arc<dyn ContentProvider>,
        sink: Arc<dyn PresentationSink>,
        clock: Clock,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let tracker = ProgressTracker::initialize(
            Arc::clone(&catalog),
            store,
            Arc::clone(&sink),
            clock,
        );
        let navigation = NavigationController::new(Arc::clone(&catalog), content, sink);
        Self {
            catalog,
            tracker,
            navigation,
        }
    }

    /// Build services backed by `SQLite` storage at `path`.
    ///
    /// # Errors
    ///
    /// Returns `CourseServicesError` if the database cannot be opened.
    pub fn with_sqlite_store(
        path: impl AsRef<Path>,
        catalog: LessonCatalog,
        content: Arc<dyn ContentProvider>,
        sink: Arc<dyn PresentationSink>,
        clock: Clock,
    ) -> Result<Self, CourseServicesError> {
        let store = Arc::new(SqliteStore::open(path)?);
        Ok(Self::new(catalog, store, content, sink, clock))
    }

    #[must_use]
    pub fn catalog(&self) -> &LessonCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    #[must_use]
    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    #[must_use]
    pub fn current_view(&self) -> &View {
        self.navigation.current_view()
    }

    /// Move to `target`. See [`NavigationController::navigate_to`].
    ///
    /// # Errors
    ///
    /// Propagates `NavigationError` from the controller.
    pub fn navigate(&mut self, target: View) -> Result<&View, NavigationError> {
        self.navigation.navigate_to(target, &self.tracker)
    }

    /// Enter the next lesson in course order.
    ///
    /// # Errors
    ///
    /// Propagates `NavigationError` from the controller.
    pub fn navigate_next(&mut self) -> Result<&View, NavigationError> {
        self.navigation.navigate_next(&self.tracker)
    }

    /// Enter the previous lesson in course order.
    ///
    /// # Errors
    ///
    /// Propagates `NavigationError` from the controller.
    pub fn navigate_previous(&mut self) -> Result<&View, NavigationError> {
        self.navigation.navigate_previous(&self.tracker)
    }

    /// Credit sections `0..=section_index` of a lesson.
    /// See [`ProgressTracker::mark_section_complete`].
    ///
    /// # Errors
    ///
    /// Propagates `ProgressError` from the tracker.
    pub fn mark_section_complete(
        &mut self,
        lesson: &LessonId,
        section_index: u32,
        total_sections: u32,
    ) -> Result<LessonProgress, ProgressError> {
        self.tracker
            .mark_section_complete(lesson, section_index, total_sections)
    }

    /// Record a single completed section.
    /// See [`ProgressTracker::record_section_completion`].
    ///
    /// # Errors
    ///
    /// Propagates `ProgressError` from the tracker.
    pub fn record_section_completion(
        &mut self,
        key: SectionKey,
    ) -> Result<AggregateProgress, ProgressError> {
        self.tracker.record_section_completion(key)
    }

    /// Current progress for one lesson.
    ///
    /// # Errors
    ///
    /// Propagates `ProgressError` from the tracker.
    pub fn lesson_progress(&self, lesson: &LessonId) -> Result<LessonProgress, ProgressError> {
        self.tracker.lesson_progress(lesson)
    }

    #[must_use]
    pub fn aggregate_progress(&self) -> AggregateProgress {
        self.tracker.aggregate_progress()
    }

    /// Flip the compact navigation panel and return its new state.
    pub fn toggle_panel(&mut self) -> bool {
        self.navigation.toggle_panel()
    }
}
