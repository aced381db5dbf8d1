use std::fmt;
use std::sync::Arc;

use course_core::model::{LessonCatalog, LessonId};

use crate::content::ContentProvider;
use crate::error::NavigationError;
use crate::events::PresentationSink;
use crate::progress::ProgressTracker;

//
// ─── VIEW ──────────────────────────────────────────────────────────────────────
//

/// The view the learner is currently looking at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Home,
    Lesson(LessonId),
}

impl View {
    /// The lesson shown by this view, if it is a lesson view.
    #[must_use]
    pub fn lesson(&self) -> Option<&LessonId> {
        match self {
            View::Lesson(id) => Some(id),
            View::Home => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Home => write!(f, "home"),
            View::Lesson(id) => write!(f, "{id}"),
        }
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives which view is visible and the side effects of moving between views.
///
/// Transitions run to completion in order: view state, content
/// materialization, display refresh, panel close. The refresh therefore
/// never shows a lesson whose sections have not been enumerated yet.
pub struct NavigationController {
    catalog: Arc<LessonCatalog>,
    content: Arc<dyn ContentProvider>,
    sink: Arc<dyn PresentationSink>,
    current_view: View,
    panel_open: bool,
}

impl NavigationController {
    #[must_use]
    pub fn new(
        catalog: Arc<LessonCatalog>,
        content: Arc<dyn ContentProvider>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            catalog,
            content,
            sink,
            current_view: View::Home,
            panel_open: false,
        }
    }

    #[must_use]
    pub fn current_view(&self) -> &View {
        &self.current_view
    }

    /// Whether the compact navigation panel is open.
    #[must_use]
    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// Open or close the compact navigation panel.
    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    /// Flip the compact navigation panel and return its new state.
    pub fn toggle_panel(&mut self) -> bool {
        self.panel_open = !self.panel_open;
        self.panel_open
    }

    /// Move to `target`.
    ///
    /// Entering a lesson materializes its content at most once per session
    /// (guarded by the provider's `is_materialized`) and refreshes that
    /// lesson's progress display; entering home refreshes the overview for
    /// every lesson. Any successful transition closes the compact panel.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::UnknownTarget` for a lesson outside the
    /// catalog, leaving the current view untouched. Content and progress
    /// failures propagate transparently.
    pub fn navigate_to(
        &mut self,
        target: View,
        tracker: &ProgressTracker,
    ) -> Result<&View, NavigationError> {
        match &target {
            View::Home => {
                self.current_view = View::Home;
            }
            View::Lesson(id) => {
                if !self.catalog.contains(id) {
                    return Err(NavigationError::UnknownTarget(id.clone()));
                }
                self.current_view = target.clone();
                if !self.content.is_materialized(id) {
                    self.content.materialize(id)?;
                }
            }
        }

        self.sink.on_view_changed(&self.current_view);
        match self.current_view.clone() {
            View::Home => tracker.refresh_overview_display(),
            View::Lesson(id) => tracker.refresh_lesson_display(&id)?,
        }
        self.panel_open = false;

        Ok(&self.current_view)
    }

    /// Enter the next lesson in course order; from home, the first lesson.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NoAdjacentLesson` on the last lesson.
    pub fn navigate_next(
        &mut self,
        tracker: &ProgressTracker,
    ) -> Result<&View, NavigationError> {
        let next = match &self.current_view {
            View::Home => self.catalog.first(),
            View::Lesson(id) => self.catalog.next_after(id),
        }
        .ok_or(NavigationError::NoAdjacentLesson)?
        .id()
        .clone();
        self.navigate_to(View::Lesson(next), tracker)
    }

    /// Enter the previous lesson in course order.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NoAdjacentLesson` from home or the first
    /// lesson.
    pub fn navigate_previous(
        &mut self,
        tracker: &ProgressTracker,
    ) -> Result<&View, NavigationError> {
        let previous = match &self.current_view {
            View::Home => None,
            View::Lesson(id) => self.catalog.previous_before(id),
        }
        .ok_or(NavigationError::NoAdjacentLesson)?
        .id()
        .clone();
        self.navigate_to(View::Lesson(previous), tracker)
    }
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("current_view", &self.current_view)
            .field("panel_open", &self.panel_open)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
