use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SectionError {
    #[error("section title cannot be empty")]
    EmptyTitle,

    #[error("section body cannot be empty")]
    EmptyBody,
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// An atomic content unit within a lesson.
///
/// The body is opaque to the core; rendering it is the presentation layer's
/// concern. Sections may carry an optional practical-activity prompt shown
/// alongside the main content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    title: String,
    body: String,
    practical_activity: Option<String>,
}

impl Section {
    /// Creates a section with a title and body.
    ///
    /// # Errors
    ///
    /// Returns `SectionError` if the title or body is empty or whitespace.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Result<Self, SectionError> {
        let title = title.into();
        let body = body.into();
        if title.trim().is_empty() {
            return Err(SectionError::EmptyTitle);
        }
        if body.trim().is_empty() {
            return Err(SectionError::EmptyBody);
        }
        Ok(Self {
            title,
            body,
            practical_activity: None,
        })
    }

    /// Attach a practical-activity prompt to this section.
    #[must_use]
    pub fn with_practical_activity(mut self, text: impl Into<String>) -> Self {
        self.practical_activity = Some(text.into());
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn practical_activity(&self) -> Option<&str> {
        self.practical_activity.as_deref()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
