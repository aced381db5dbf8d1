use std::sync::Mutex;

use course_core::model::LessonId;

use crate::navigation::View;
use crate::progress::AggregateProgress;

/// Callbacks the presentation layer implements to mirror core state.
///
/// The core never renders. It reports transitions through this trait and the
/// presentation layer decides what an "active tab" or a "progress bar" looks
/// like. Implementations must not call back into the emitting service.
pub trait PresentationSink: Send + Sync {
    /// The current view changed.
    fn on_view_changed(&self, view: &View);

    /// One lesson's completion percent changed or was refreshed.
    fn on_lesson_progress_changed(&self, lesson: &LessonId, percent: u8);

    /// The course-wide aggregate changed or was refreshed.
    fn on_global_progress_changed(&self, aggregate: &AggregateProgress);
}

/// Sink that ignores every signal, for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn on_view_changed(&self, _view: &View) {}

    fn on_lesson_progress_changed(&self, _lesson: &LessonId, _percent: u8) {}

    fn on_global_progress_changed(&self, _aggregate: &AggregateProgress) {}
}

/// One recorded presentation signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    ViewChanged(View),
    LessonProgress(LessonId, u8),
    GlobalProgress(AggregateProgress),
}

/// Sink that records every signal it receives, for testing and prototyping.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded signals, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Drain and return the recorded signals.
    #[must_use]
    pub fn take(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    fn push(&self, event: SinkEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl PresentationSink for RecordingSink {
    fn on_view_changed(&self, view: &View) {
        self.push(SinkEvent::ViewChanged(view.clone()));
    }

    fn on_lesson_progress_changed(&self, lesson: &LessonId, percent: u8) {
        self.push(SinkEvent::LessonProgress(lesson.clone(), percent));
    }

    fn on_global_progress_changed(&self, aggregate: &AggregateProgress) {
        self.push(SinkEvent::GlobalProgress(aggregate.clone()));
    }
}
