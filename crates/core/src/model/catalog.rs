use thiserror::Error;

use crate::model::ids::LessonId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("lesson id cannot be empty")]
    EmptyLessonId,

    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson `{0}` must have at least one section")]
    ZeroSections(LessonId),

    #[error("duplicate lesson `{0}`")]
    DuplicateLesson(LessonId),
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Descriptive data for one lesson: identity, display title, section count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    id: LessonId,
    title: String,
    section_count: u32,
}

impl CatalogEntry {
    /// Creates a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the id or title is empty, or the section
    /// count is zero.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        section_count: u32,
    ) -> Result<Self, CatalogError> {
        let title = title.into();
        if id.as_str().trim().is_empty() {
            return Err(CatalogError::EmptyLessonId);
        }
        if title.trim().is_empty() {
            return Err(CatalogError::EmptyTitle);
        }
        if section_count == 0 {
            return Err(CatalogError::ZeroSections(id));
        }
        Ok(Self {
            id,
            title,
            section_count,
        })
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn section_count(&self) -> u32 {
        self.section_count
    }
}

/// Ordered, read-only set of the lessons a course offers.
///
/// Supplied at startup and trusted from then on; the trackers validate
/// incoming lesson references against it but never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LessonCatalog {
    entries: Vec<CatalogEntry>,
}

impl LessonCatalog {
    /// Builds a catalog from ordered entries.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateLesson` if two entries share an id.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id().clone()) {
                return Err(CatalogError::DuplicateLesson(entry.id().clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Lessons in course order.
    pub fn lessons(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn entry(&self, id: &LessonId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &LessonId) -> bool {
        self.entry(id).is_some()
    }

    /// Number of sections in a lesson, if the lesson is known.
    #[must_use]
    pub fn section_count(&self, id: &LessonId) -> Option<u32> {
        self.entry(id).map(CatalogEntry::section_count)
    }

    /// Total number of sections across all lessons.
    #[must_use]
    pub fn total_sections(&self) -> u32 {
        self.entries.iter().map(CatalogEntry::section_count).sum()
    }

    #[must_use]
    pub fn first(&self) -> Option<&CatalogEntry> {
        self.entries.first()
    }

    /// The lesson after `id` in course order.
    #[must_use]
    pub fn next_after(&self, id: &LessonId) -> Option<&CatalogEntry> {
        let position = self.entries.iter().position(|entry| entry.id() == id)?;
        self.entries.get(position + 1)
    }

    /// The lesson before `id` in course order.
    #[must_use]
    pub fn previous_before(&self, id: &LessonId) -> Option<&CatalogEntry> {
        let position = self.entries.iter().position(|entry| entry.id() == id)?;
        position.checked_sub(1).and_then(|p| self.entries.get(p))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, sections: u32) -> CatalogEntry {
        CatalogEntry::new(LessonId::new(id), format!("Lesson {id}"), sections).unwrap()
    }

    fn build_catalog() -> LessonCatalog {
        LessonCatalog::new(vec![
            entry("db-fundamentals", 7),
            entry("data-modeling", 5),
            entry("advanced-sql", 12),
        ])
        .unwrap()
    }

    #[test]
    fn preserves_course_order() {
        let catalog = build_catalog();
        let ids: Vec<&str> = catalog.lessons().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, ["db-fundamentals", "data-modeling", "advanced-sql"]);
    }

    #[test]
    fn sums_total_sections() {
        assert_eq!(build_catalog().total_sections(), 24);
    }

    #[test]
    fn looks_up_section_counts() {
        let catalog = build_catalog();
        assert_eq!(catalog.section_count(&LessonId::new("data-modeling")), Some(5));
        assert_eq!(catalog.section_count(&LessonId::new("missing")), None);
    }

    #[test]
    fn walks_neighbors_in_order() {
        let catalog = build_catalog();
        let mid = LessonId::new("data-modeling");
        assert_eq!(
            catalog.next_after(&mid).map(|e| e.id().as_str()),
            Some("advanced-sql")
        );
        assert_eq!(
            catalog.previous_before(&mid).map(|e| e.id().as_str()),
            Some("db-fundamentals")
        );
        assert!(catalog
            .previous_before(&LessonId::new("db-fundamentals"))
            .is_none());
        assert!(catalog.next_after(&LessonId::new("advanced-sql")).is_none());
    }

    #[test]
    fn rejects_zero_section_lessons() {
        let err = CatalogEntry::new(LessonId::new("empty"), "Empty", 0).unwrap_err();
        assert_eq!(err, CatalogError::ZeroSections(LessonId::new("empty")));
    }

    #[test]
    fn rejects_duplicate_lessons() {
        let err = LessonCatalog::new(vec![entry("a", 1), entry("a", 2)]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateLesson(LessonId::new("a")));
    }
}
