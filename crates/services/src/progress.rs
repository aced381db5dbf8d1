use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use course_core::model::{LessonCatalog, LessonId, LessonProgress, SectionKey, fraction_percent};
use course_core::time::Clock;
use storage::repository::{PersistentStore, StorageError};
use storage::snapshot::{
    COMPLETED_SECTIONS_KEY, COURSE_PROGRESS_KEY, CompletedSectionsSnapshot, ProgressSnapshot,
};

use crate::error::ProgressError;
use crate::events::PresentationSink;

//
// ─── AGGREGATE VIEW ────────────────────────────────────────────────────────────
//

/// Aggregated course-wide progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Owns completion state for the whole course and keeps it persisted.
///
/// The recorded-section set is the source of truth; each lesson's percent is
/// derived from it and only ever ratchets upward. Every mutation rewrites
/// both snapshots in the store (full snapshot, no diffing) and signals the
/// presentation sink.
pub struct ProgressTracker {
    catalog: Arc<LessonCatalog>,
    store: Arc<dyn PersistentStore>,
    sink: Arc<dyn PresentationSink>,
    clock: Clock,
    lessons: BTreeMap<LessonId, LessonProgress>,
    completed_sections: BTreeSet<SectionKey>,
}

impl ProgressTracker {
    /// Build the tracker: seed one default entry per catalog lesson, then
    /// overlay whatever the store holds.
    ///
    /// Never fails outward. A missing snapshot means a fresh start; a
    /// corrupt or unreadable one falls back to defaults and is reported once
    /// through `tracing`. Lesson keys a stale snapshot knows but the catalog
    /// does not are retained and re-persisted, not discarded.
    #[must_use]
    pub fn initialize(
        catalog: Arc<LessonCatalog>,
        store: Arc<dyn PersistentStore>,
        sink: Arc<dyn PresentationSink>,
        clock: Clock,
    ) -> Self {
        let mut lessons: BTreeMap<LessonId, LessonProgress> = catalog
            .lessons()
            .map(|entry| (entry.id().clone(), LessonProgress::default()))
            .collect();

        for (id, restored) in load_lessons(store.as_ref()) {
            lessons
                .entry(id)
                .and_modify(|progress| {
                    progress.advance_to(restored.percent());
                })
                .or_insert(restored);
        }

        let completed_sections = load_sections(store.as_ref());

        let mut tracker = Self {
            catalog,
            store,
            sink,
            clock,
            lessons,
            completed_sections,
        };

        // The recorded set is authoritative: lift any lesson whose derived
        // percent outruns the persisted mapping.
        let catalog = Arc::clone(&tracker.catalog);
        for entry in catalog.lessons() {
            let derived = tracker.derived_percent(entry.id(), entry.section_count());
            if let Some(progress) = tracker.lessons.get_mut(entry.id()) {
                progress.advance_to(derived);
            }
        }

        tracker
    }

    /// Credit the learner with sections `0..=section_index` of a lesson.
    ///
    /// This is position-based completion: finishing the section at index `k`
    /// counts everything before it as done too, so a fresh mark yields
    /// `round(100 * (k + 1) / total)`. Marking a lower index later can only
    /// re-record sections already counted; the percent never drops.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` for ids outside the catalog,
    /// `SectionCountMismatch` when `total_sections` disagrees with the
    /// catalog, and `SectionIndexOutOfRange` for an invalid index.
    pub fn mark_section_complete(
        &mut self,
        lesson: &LessonId,
        section_index: u32,
        total_sections: u32,
    ) -> Result<LessonProgress, ProgressError> {
        let expected = self
            .catalog
            .section_count(lesson)
            .ok_or_else(|| ProgressError::UnknownLesson(lesson.clone()))?;
        if total_sections != expected {
            return Err(ProgressError::SectionCountMismatch {
                lesson: lesson.clone(),
                given: total_sections,
                expected,
            });
        }
        if section_index >= total_sections {
            return Err(ProgressError::SectionIndexOutOfRange {
                index: section_index,
                total: total_sections,
            });
        }

        let mut changed = false;
        for index in 0..=section_index {
            changed |= self
                .completed_sections
                .insert(SectionKey::new(lesson.clone(), index));
        }

        let percent = self.derived_percent(lesson, expected);
        let entry = self.lessons.entry(lesson.clone()).or_default();
        entry.advance_to(percent);
        let progress = *entry;

        if changed {
            self.persist();
        }
        self.sink.on_lesson_progress_changed(lesson, progress.percent());
        self.sink.on_global_progress_changed(&self.aggregate_progress());

        Ok(progress)
    }

    /// Record a single completed section.
    ///
    /// Set semantics: recording the same section twice is a no-op and leaves
    /// the set size unchanged. A first-time record persists the set, lifts
    /// the owning lesson's derived percent, and signals the sink.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` or `SectionIndexOutOfRange`
    /// for keys that do not name a catalog section.
    pub fn record_section_completion(
        &mut self,
        key: SectionKey,
    ) -> Result<AggregateProgress, ProgressError> {
        let expected = self
            .catalog
            .section_count(key.lesson())
            .ok_or_else(|| ProgressError::UnknownLesson(key.lesson().clone()))?;
        if key.index() >= expected {
            return Err(ProgressError::SectionIndexOutOfRange {
                index: key.index(),
                total: expected,
            });
        }

        let lesson = key.lesson().clone();
        if self.completed_sections.insert(key) {
            let percent = self.derived_percent(&lesson, expected);
            let entry = self.lessons.entry(lesson.clone()).or_default();
            let advanced = entry.advance_to(percent);
            let lesson_percent = entry.percent();

            self.persist();
            if advanced {
                self.sink.on_lesson_progress_changed(&lesson, lesson_percent);
            }
            self.sink.on_global_progress_changed(&self.aggregate_progress());
        }

        Ok(self.aggregate_progress())
    }

    /// Current progress for one lesson. Pure read.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` for ids outside the catalog.
    pub fn lesson_progress(&self, lesson: &LessonId) -> Result<LessonProgress, ProgressError> {
        if !self.catalog.contains(lesson) {
            return Err(ProgressError::UnknownLesson(lesson.clone()));
        }
        Ok(self.lessons.get(lesson).copied().unwrap_or_default())
    }

    /// Course-wide aggregate over every catalog section. Pure read.
    ///
    /// Recorded sections that no longer match the catalog (stale snapshot
    /// keys) are kept in the set but excluded here.
    #[must_use]
    pub fn aggregate_progress(&self) -> AggregateProgress {
        let total = self.catalog.total_sections();
        let completed: usize = self
            .catalog
            .lessons()
            .map(|entry| self.completed_in_lesson(entry.id(), entry.section_count()))
            .sum();
        AggregateProgress {
            completed,
            total: total as usize,
            percent: fraction_percent(completed as u32, total),
        }
    }

    /// Re-emit one lesson's progress through the sink.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` for ids outside the catalog.
    pub fn refresh_lesson_display(&self, lesson: &LessonId) -> Result<(), ProgressError> {
        let progress = self.lesson_progress(lesson)?;
        self.sink.on_lesson_progress_changed(lesson, progress.percent());
        Ok(())
    }

    /// Re-emit every lesson's progress and the aggregate, for overview views.
    pub fn refresh_overview_display(&self) {
        for entry in self.catalog.lessons() {
            let percent = self
                .lessons
                .get(entry.id())
                .copied()
                .unwrap_or_default()
                .percent();
            self.sink.on_lesson_progress_changed(entry.id(), percent);
        }
        self.sink.on_global_progress_changed(&self.aggregate_progress());
    }

    /// Persist both snapshots now, surfacing any failure.
    ///
    /// The mutation paths degrade gracefully on storage trouble (state stays
    /// correct in memory, the failure is logged); this is the explicit way
    /// to find out whether the store actually has the current state.
    ///
    /// # Errors
    ///
    /// Returns the first `StorageError` hit while encoding or writing.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.persist_snapshots()
    }

    fn completed_in_lesson(&self, lesson: &LessonId, section_count: u32) -> usize {
        if section_count == 0 {
            return 0;
        }
        let start = SectionKey::new(lesson.clone(), 0);
        let end = SectionKey::new(lesson.clone(), section_count - 1);
        self.completed_sections.range(start..=end).count()
    }

    fn derived_percent(&self, lesson: &LessonId, section_count: u32) -> u8 {
        let done = self.completed_in_lesson(lesson, section_count);
        fraction_percent(done as u32, section_count)
    }

    // Write failures must not block the in-memory update; report and move on.
    fn persist(&self) {
        if let Err(err) = self.persist_snapshots() {
            warn!(%err, "progress persistence failed; state kept in memory");
        }
    }

    fn persist_snapshots(&self) -> Result<(), StorageError> {
        let now = self.clock.now();
        let progress = ProgressSnapshot::capture(&self.lessons, now).encode()?;
        self.store.write(COURSE_PROGRESS_KEY, &progress)?;
        let sections = CompletedSectionsSnapshot::capture(&self.completed_sections, now).encode()?;
        self.store.write(COMPLETED_SECTIONS_KEY, &sections)?;
        Ok(())
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("lessons", &self.lessons.len())
            .field("completed_sections", &self.completed_sections.len())
            .finish_non_exhaustive()
    }
}

fn load_lessons(store: &dyn PersistentStore) -> BTreeMap<LessonId, LessonProgress> {
    match store.read(COURSE_PROGRESS_KEY) {
        Ok(Some(raw)) => match ProgressSnapshot::decode(&raw) {
            Ok(lessons) => lessons,
            Err(err) => {
                warn!(%err, "discarding unreadable progress snapshot");
                BTreeMap::new()
            }
        },
        Ok(None) => BTreeMap::new(),
        Err(err) => {
            warn!(%err, "progress snapshot could not be read");
            BTreeMap::new()
        }
    }
}

fn load_sections(store: &dyn PersistentStore) -> BTreeSet<SectionKey> {
    match store.read(COMPLETED_SECTIONS_KEY) {
        Ok(Some(raw)) => match CompletedSectionsSnapshot::decode(&raw) {
            Ok(sections) => sections,
            Err(err) => {
                warn!(%err, "discarding unreadable completed-sections snapshot");
                BTreeSet::new()
            }
        },
        Ok(None) => BTreeSet::new(),
        Err(err) => {
            warn!(%err, "completed-sections snapshot could not be read");
            BTreeSet::new()
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::CatalogEntry;
    use course_core::time::fixed_clock;
    use storage::repository::InMemoryStore;

    use crate::events::NullSink;

    fn build_catalog() -> Arc<LessonCatalog> {
        Arc::new(
            LessonCatalog::new(vec![
                CatalogEntry::new(LessonId::new("db-fundamentals"), "Database Fundamentals", 7)
                    .unwrap(),
                CatalogEntry::new(LessonId::new("backend-setup"), "Backend Setup", 7).unwrap(),
                CatalogEntry::new(LessonId::new("data-modeling"), "Data Modeling", 5).unwrap(),
                CatalogEntry::new(LessonId::new("advanced-sql"), "Advanced SQL", 5).unwrap(),
            ])
            .unwrap(),
        )
    }

    fn build_tracker(store: InMemoryStore) -> ProgressTracker {
        ProgressTracker::initialize(
            build_catalog(),
            Arc::new(store),
            Arc::new(NullSink),
            fixed_clock(),
        )
    }

    #[test]
    fn seeds_defaults_from_catalog() {
        let tracker = build_tracker(InMemoryStore::new());
        let lesson = LessonId::new("db-fundamentals");
        assert_eq!(tracker.lesson_progress(&lesson).unwrap().percent(), 0);
        assert_eq!(
            tracker.aggregate_progress(),
            AggregateProgress {
                completed: 0,
                total: 24,
                percent: 0
            }
        );
    }

    #[test]
    fn position_mark_rounds_like_the_course_ui() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let lesson = LessonId::new("db-fundamentals");

        let progress = tracker.mark_section_complete(&lesson, 2, 7).unwrap();
        assert_eq!(progress.percent(), 43);
        assert!(!progress.is_completed());

        let progress = tracker.mark_section_complete(&lesson, 6, 7).unwrap();
        assert_eq!(progress.percent(), 100);
        assert!(progress.is_completed());
    }

    #[test]
    fn marking_final_section_always_completes() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let lesson = LessonId::new("data-modeling");
        let progress = tracker.mark_section_complete(&lesson, 4, 5).unwrap();
        assert_eq!(progress.percent(), 100);
        assert!(progress.is_completed());
    }

    #[test]
    fn marks_never_lower_the_percent() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let lesson = LessonId::new("db-fundamentals");
        tracker.mark_section_complete(&lesson, 6, 7).unwrap();
        let progress = tracker.mark_section_complete(&lesson, 2, 7).unwrap();
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn repeated_marks_are_idempotent() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let lesson = LessonId::new("db-fundamentals");
        let first = tracker.mark_section_complete(&lesson, 2, 7).unwrap();
        let second = tracker.mark_section_complete(&lesson, 2, 7).unwrap();
        assert_eq!(first, second);
        assert_eq!(tracker.aggregate_progress().completed, 3);
    }

    #[test]
    fn rejects_unknown_lesson() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let err = tracker
            .mark_section_complete(&LessonId::new("missing"), 0, 7)
            .unwrap_err();
        assert_eq!(err, ProgressError::UnknownLesson(LessonId::new("missing")));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let err = tracker
            .mark_section_complete(&LessonId::new("db-fundamentals"), 7, 7)
            .unwrap_err();
        assert_eq!(
            err,
            ProgressError::SectionIndexOutOfRange { index: 7, total: 7 }
        );
    }

    #[test]
    fn rejects_mismatched_section_count() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let err = tracker
            .mark_section_complete(&LessonId::new("db-fundamentals"), 0, 9)
            .unwrap_err();
        assert_eq!(
            err,
            ProgressError::SectionCountMismatch {
                lesson: LessonId::new("db-fundamentals"),
                given: 9,
                expected: 7,
            }
        );
    }

    #[test]
    fn recording_sections_is_idempotent() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let key = SectionKey::new(LessonId::new("db-fundamentals"), 3);

        let first = tracker.record_section_completion(key.clone()).unwrap();
        assert_eq!(first.completed, 1);
        let second = tracker.record_section_completion(key).unwrap();
        assert_eq!(second.completed, 1);
    }

    #[test]
    fn recording_distinct_sections_accumulates() {
        let mut tracker = build_tracker(InMemoryStore::new());
        for index in 0..3 {
            tracker
                .record_section_completion(SectionKey::new(LessonId::new("db-fundamentals"), index))
                .unwrap();
        }
        for index in 0..3 {
            tracker
                .record_section_completion(SectionKey::new(LessonId::new("advanced-sql"), index))
                .unwrap();
        }

        let aggregate = tracker.aggregate_progress();
        assert_eq!(aggregate, AggregateProgress { completed: 6, total: 24, percent: 25 });
    }

    #[test]
    fn recording_lifts_the_owning_lesson() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let lesson = LessonId::new("db-fundamentals");
        tracker
            .record_section_completion(SectionKey::new(lesson.clone(), 0))
            .unwrap();
        // round(100 * 1 / 7) = 14
        assert_eq!(tracker.lesson_progress(&lesson).unwrap().percent(), 14);
    }

    #[test]
    fn recording_rejects_keys_outside_the_catalog() {
        let mut tracker = build_tracker(InMemoryStore::new());
        let err = tracker
            .record_section_completion(SectionKey::new(LessonId::new("db-fundamentals"), 7))
            .unwrap_err();
        assert_eq!(
            err,
            ProgressError::SectionIndexOutOfRange { index: 7, total: 7 }
        );
    }

    #[test]
    fn restores_state_from_the_store() {
        let store = InMemoryStore::new();
        {
            let mut tracker = build_tracker(store.clone());
            tracker
                .mark_section_complete(&LessonId::new("db-fundamentals"), 2, 7)
                .unwrap();
            tracker
                .record_section_completion(SectionKey::new(LessonId::new("advanced-sql"), 1))
                .unwrap();
        }

        let restored = build_tracker(store);
        assert_eq!(
            restored
                .lesson_progress(&LessonId::new("db-fundamentals"))
                .unwrap()
                .percent(),
            43
        );
        assert_eq!(restored.aggregate_progress().completed, 4);
    }

    #[test]
    fn corrupt_snapshot_falls_back_to_defaults() {
        let store = InMemoryStore::new();
        store.write(COURSE_PROGRESS_KEY, "{ not json").unwrap();
        store.write(COMPLETED_SECTIONS_KEY, "[]").unwrap();

        let tracker = build_tracker(store);
        assert_eq!(tracker.aggregate_progress().completed, 0);
        assert_eq!(
            tracker
                .lesson_progress(&LessonId::new("db-fundamentals"))
                .unwrap()
                .percent(),
            0
        );
    }

    #[test]
    fn stale_lesson_keys_are_retained() {
        let store = InMemoryStore::new();
        {
            let mut tracker = build_tracker(store.clone());
            tracker
                .mark_section_complete(&LessonId::new("db-fundamentals"), 6, 7)
                .unwrap();
        }

        // Restart with a catalog that no longer offers the lesson.
        let catalog = Arc::new(
            LessonCatalog::new(vec![
                CatalogEntry::new(LessonId::new("data-modeling"), "Data Modeling", 5).unwrap(),
            ])
            .unwrap(),
        );
        let tracker = ProgressTracker::initialize(
            catalog,
            Arc::new(store.clone()),
            Arc::new(NullSink),
            fixed_clock(),
        );

        // The stale entry is invisible to reads but survives the next write.
        assert_eq!(tracker.aggregate_progress().total, 5);
        tracker.flush().unwrap();
        let raw = store.read(COURSE_PROGRESS_KEY).unwrap().unwrap();
        let persisted = ProgressSnapshot::decode(&raw).unwrap();
        assert_eq!(
            persisted
                .get(&LessonId::new("db-fundamentals"))
                .map(LessonProgress::percent),
            Some(100)
        );
    }
}
