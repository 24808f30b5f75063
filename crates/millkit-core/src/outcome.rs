//! Non-fatal workflow outcomes
//!
//! Planners report expected "nothing to do" situations as values rather than
//! errors so callers can show a message and carry on.

use serde::{Deserialize, Serialize};

/// Why a stage produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degenerate {
    /// The loaded or generated path has no points
    EmptyPath,
    /// Polylines never cross, so no contour can be stitched
    NoIntersectionsFound,
    /// Not enough surfaces contributed geometry
    TooFewSurfaces { found: usize, required: usize },
    /// The model already covers the whole base area
    NoGapsToFill,
}

impl std::fmt::Display for Degenerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "Path is empty"),
            Self::NoIntersectionsFound => write!(f, "No intersections found"),
            Self::TooFewSurfaces { found, required } => write!(
                f,
                "Too few surfaces: found {}, need at least {}",
                found, required
            ),
            Self::NoGapsToFill => write!(f, "No gaps to fill"),
        }
    }
}

/// Result of a stage that may legitimately produce nothing
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Produced(T),
    Skipped(Degenerate),
}

impl<T> Outcome<T> {
    pub fn is_produced(&self) -> bool {
        matches!(self, Self::Produced(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// The produced value, if any
    pub fn produced(self) -> Option<T> {
        match self {
            Self::Produced(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }

    pub fn degenerate(&self) -> Option<Degenerate> {
        match self {
            Self::Produced(_) => None,
            Self::Skipped(reason) => Some(*reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Produced(value) => Outcome::Produced(f(value)),
            Self::Skipped(reason) => Outcome::Skipped(reason),
        }
    }

    /// Chain another stage that may also skip
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Produced(value) => f(value),
            Self::Skipped(reason) => Outcome::Skipped(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_combinators() {
        let produced: Outcome<u32> = Outcome::Produced(2);
        assert_eq!(produced.clone().map(|v| v * 3), Outcome::Produced(6));
        assert_eq!(
            produced.and_then(|_| Outcome::<u32>::Skipped(Degenerate::EmptyPath)),
            Outcome::Skipped(Degenerate::EmptyPath)
        );

        let skipped: Outcome<u32> = Outcome::Skipped(Degenerate::NoGapsToFill);
        assert!(skipped.is_skipped());
        assert_eq!(skipped.degenerate(), Some(Degenerate::NoGapsToFill));
        assert_eq!(skipped.produced(), None);
    }

    #[test]
    fn test_degenerate_display() {
        let reason = Degenerate::TooFewSurfaces {
            found: 0,
            required: 1,
        };
        assert_eq!(
            reason.to_string(),
            "Too few surfaces: found 0, need at least 1"
        );
    }
}
