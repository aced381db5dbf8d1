use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressValueError {
    #[error("progress percent {0} is out of range (0-100)")]
    PercentOutOfRange(u8),
}

//
// ─── PERCENT MATH ──────────────────────────────────────────────────────────────
//

/// Percent of `total` covered by `count`, rounded to the nearest integer.
///
/// A zero total yields 0 rather than dividing.
#[must_use]
pub fn fraction_percent(count: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (f64::from(count) * 100.0 / f64::from(total)).round();
    // count may exceed total only through caller misuse; clamp either way.
    percent.min(100.0) as u8
}

/// Percent credited once the section at `position` (0-indexed) of a lesson
/// with `total` sections is complete: `round(100 * (position + 1) / total)`.
#[must_use]
pub fn completion_percent(position: u32, total: u32) -> u8 {
    fraction_percent(position.saturating_add(1), total)
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// Completion state of one lesson.
///
/// Only the percent is stored; `completed` is always derived as
/// `percent == 100`, so the two can never disagree. Percent moves only
/// upward: completion is a ratchet with no un-marking operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LessonProgress {
    percent: u8,
}

impl LessonProgress {
    /// Restores progress from a persisted percent.
    ///
    /// # Errors
    ///
    /// Returns `ProgressValueError` if the percent exceeds 100.
    pub fn from_percent(percent: u8) -> Result<Self, ProgressValueError> {
        if percent > 100 {
            return Err(ProgressValueError::PercentOutOfRange(percent));
        }
        Ok(Self { percent })
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.percent == 100
    }

    /// Raise the percent; lower or equal values are ignored.
    ///
    /// Returns true when the percent actually moved.
    pub fn advance_to(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        if percent > self.percent {
            self.percent = percent;
            true
        } else {
            false
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_position_percent() {
        // Third of seven sections: round(100 * 3 / 7) = 43.
        assert_eq!(completion_percent(2, 7), 43);
        assert_eq!(completion_percent(6, 7), 100);
        assert_eq!(completion_percent(0, 3), 33);
    }

    #[test]
    fn rounds_fraction_percent() {
        assert_eq!(fraction_percent(6, 24), 25);
        assert_eq!(fraction_percent(0, 24), 0);
        assert_eq!(fraction_percent(24, 24), 100);
    }

    #[test]
    fn zero_total_is_zero_percent() {
        assert_eq!(fraction_percent(0, 0), 0);
    }

    #[test]
    fn percent_ratchets_upward_only() {
        let mut progress = LessonProgress::default();
        assert!(progress.advance_to(43));
        assert!(!progress.advance_to(14));
        assert_eq!(progress.percent(), 43);
        assert!(progress.advance_to(100));
        assert!(progress.is_completed());
        assert!(!progress.advance_to(43));
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn completed_tracks_percent() {
        let progress = LessonProgress::from_percent(99).unwrap();
        assert!(!progress.is_completed());
        let progress = LessonProgress::from_percent(100).unwrap();
        assert!(progress.is_completed());
    }

    #[test]
    fn rejects_out_of_range_percent() {
        let err = LessonProgress::from_percent(150).unwrap_err();
        assert_eq!(err, ProgressValueError::PercentOutOfRange(150));
    }
}
