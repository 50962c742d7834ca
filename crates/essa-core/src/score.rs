//! # Scores and Exact Means
//!
//! A [`Score`] is one cell of the scoring grid: 1 (Much Better) to
//! 5 (Much Worse). Lower is better.
//!
//! Averages are kept as exact rationals ([`Mean`]) so that comparisons,
//! tie detection and export round-trips never depend on floating-point
//! rounding. Display values are rounded half-up to hundredths using
//! integer arithmetic only.

use crate::primitives::{MAX_SCORE, MIN_SCORE};
use crate::types::EssaError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// SCORE
// =============================================================================

/// A validated score on the 1..=5 legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Create a score, rejecting anything outside 1..=5.
    pub fn new(value: u8) -> Result<Self, EssaError> {
        if (MIN_SCORE..=MAX_SCORE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EssaError::InvalidScore(value))
        }
    }

    /// Get the raw score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Legend entry for this score.
    #[must_use]
    pub fn label(self) -> ScoreLabel {
        ScoreLabel::for_whole(self.0)
    }
}

impl TryFrom<u8> for Score {
    type Error = EssaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// LEGEND
// =============================================================================

/// The fixed score legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScoreLabel {
    MuchBetter,
    Better,
    Equal,
    Worse,
    MuchWorse,
}

impl ScoreLabel {
    /// All legend rows from best to worst.
    pub const ALL: [ScoreLabel; 5] = [
        ScoreLabel::MuchBetter,
        ScoreLabel::Better,
        ScoreLabel::Equal,
        ScoreLabel::Worse,
        ScoreLabel::MuchWorse,
    ];

    /// Upper bound of the score range this label covers.
    #[must_use]
    pub fn upper(&self) -> u8 {
        match self {
            ScoreLabel::MuchBetter => 1,
            ScoreLabel::Better => 2,
            ScoreLabel::Equal => 3,
            ScoreLabel::Worse => 4,
            ScoreLabel::MuchWorse => 5,
        }
    }

    /// Short label shown next to a score.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ScoreLabel::MuchBetter => "Much Better",
            ScoreLabel::Better => "Better",
            ScoreLabel::Equal => "Equal",
            ScoreLabel::Worse => "Worse",
            ScoreLabel::MuchWorse => "Much Worse",
        }
    }

    /// What the label means for the new material.
    #[must_use]
    pub fn explanation(&self) -> &'static str {
        match self {
            ScoreLabel::MuchBetter => "Leads to a measurable improvement",
            ScoreLabel::Better => "Might lead to a measurable improvement",
            ScoreLabel::Equal => "No measurable change",
            ScoreLabel::Worse => "Might lead to a measurable worsening",
            ScoreLabel::MuchWorse => "Leads to a measurable worsening",
        }
    }

    /// First label whose upper bound is at least `whole`, saturating at
    /// the ends of the scale.
    fn for_whole(whole: u8) -> Self {
        Self::ALL
            .into_iter()
            .find(|label| whole <= label.upper())
            .unwrap_or(ScoreLabel::MuchWorse)
    }
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// EXACT MEAN
// =============================================================================

/// Exact arithmetic mean of a non-empty set of scores.
///
/// Stored as `sum / count` with `count > 0`. Two means compare equal when
/// they denote the same rational (2/1 == 4/2). Only serialized, never
/// deserialized; use [`Mean::from_parts`] to rebuild one.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Mean {
    sum: u32,
    count: u32,
}

impl Mean {
    /// Mean of the given scores, or `None` if there are none.
    pub fn of<I>(scores: I) -> Option<Self>
    where
        I: IntoIterator<Item = Score>,
    {
        let (sum, count) = scores.into_iter().fold((0u32, 0u32), |(s, c), score| {
            (
                s.saturating_add(score.value() as u32),
                c.saturating_add(1),
            )
        });
        (count > 0).then_some(Self { sum, count })
    }

    /// Rebuild a mean from its parts.
    ///
    /// Rejects an empty count and sums that could not come from scores on
    /// the 1..=5 scale.
    pub fn from_parts(sum: u32, count: u32) -> Result<Self, EssaError> {
        if count == 0 {
            return Err(EssaError::DeserializationError(
                "Mean count must be positive".to_string(),
            ));
        }
        let min = (count as u64).saturating_mul(MIN_SCORE as u64);
        let max = (count as u64).saturating_mul(MAX_SCORE as u64);
        if !(min..=max).contains(&(sum as u64)) {
            return Err(EssaError::DeserializationError(format!(
                "Mean sum {} is outside the score range for {} entries",
                sum, count
            )));
        }
        Ok(Self { sum, count })
    }

    /// Sum of the underlying scores.
    #[must_use]
    pub const fn sum(&self) -> u32 {
        self.sum
    }

    /// Number of underlying scores.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Value in hundredths, rounded half-up (2.345 -> 235).
    #[must_use]
    pub fn hundredths(&self) -> u64 {
        let numerator = (self.sum as u64).saturating_mul(200) + self.count as u64;
        numerator / (2 * self.count as u64)
    }

    /// Smallest whole score not below the mean.
    #[must_use]
    pub fn ceiling(&self) -> u32 {
        self.sum.div_ceil(self.count)
    }

    /// Legend label for this mean (2.3 reads as "Equal", 2.0 as "Better").
    #[must_use]
    pub fn label(&self) -> ScoreLabel {
        ScoreLabel::for_whole(self.ceiling().min(u8::MAX as u32) as u8)
    }

    /// Whether the mean lies within the legend scale [1, 5].
    #[must_use]
    pub fn within_scale(&self) -> bool {
        let sum = self.sum as u64;
        let count = self.count as u64;
        sum >= count * MIN_SCORE as u64 && sum <= count * MAX_SCORE as u64
    }

    /// Combine the scores behind two means.
    #[must_use]
    pub fn merge(self, other: Mean) -> Mean {
        Mean {
            sum: self.sum.saturating_add(other.sum),
            count: self.count.saturating_add(other.count),
        }
    }
}

impl PartialEq for Mean {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Mean {}

impl PartialOrd for Mean {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mean {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = (self.sum as u64) * (other.count as u64);
        let right = (other.sum as u64) * (self.count as u64);
        left.cmp(&right)
    }
}

impl fmt::Display for Mean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hundredths = self.hundredths();
        write!(f, "{}.{:02}", hundredths / 100, hundredths % 100)
    }
}

// =============================================================================
// TESTS
// =============================================================================
