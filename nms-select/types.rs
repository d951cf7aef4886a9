use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a candidate interacts with accepted keypoints it overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SuppressionPolicy {
    /// Replace the first overlapping keypoint that is strictly weaker, then
    /// stop. Overlaps with stronger keypoints earlier in the set do not
    /// prevent the replacement, so the output may still contain overlapping
    /// pairs. This is the reference Harris NMS behavior.
    #[default]
    FirstOverlapReplacement,
    /// Accept the candidate only if it is strictly stronger than every
    /// keypoint it overlaps; it takes the slot of the first and the rest are
    /// removed. The output never contains an overlapping pair.
    BestOverlap,
}

impl SuppressionPolicy {
    pub const ALL: [SuppressionPolicy; 2] = [
        SuppressionPolicy::FirstOverlapReplacement,
        SuppressionPolicy::BestOverlap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressionPolicy::FirstOverlapReplacement => "first_overlap_replacement",
            SuppressionPolicy::BestOverlap => "best_overlap",
        }
    }
}

impl fmt::Display for SuppressionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuppressionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "first" | "first_overlap" | "first_overlap_replacement" => {
                Ok(SuppressionPolicy::FirstOverlapReplacement)
            }
            "best" | "best_overlap" => Ok(SuppressionPolicy::BestOverlap),
            other => Err(format!("invalid policy '{other}', expected first|best")),
        }
    }
}

/// What happened to a single candidate during the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Appended,
    /// Took the slot of one keypoint and removed `removed` others
    Replaced { removed: usize },
    Discarded,
}

/// Per-call counters, useful for tuning thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectionStats {
    /// Cells above the threshold
    pub candidates: usize,
    pub appended: usize,
    pub replaced: usize,
    /// Keypoints dropped by best-overlap replacement beyond the replaced slot
    pub removed: usize,
    pub discarded: usize,
}

impl SelectionStats {
    pub(crate) fn record(&mut self, outcome: Outcome) {
        self.candidates += 1;
        match outcome {
            Outcome::Appended => self.appended += 1,
            Outcome::Replaced { removed } => {
                self.replaced += 1;
                self.removed += removed;
            }
            Outcome::Discarded => self.discarded += 1,
        }
    }

    /// Number of keypoints left at the end of the scan
    pub fn kept(&self) -> usize {
        self.appended - self.removed
    }

    pub fn merge(&mut self, other: &SelectionStats) {
        self.candidates += other.candidates;
        self.appended += other.appended;
        self.replaced += other.replaced;
        self.removed += other.removed;
        self.discarded += other.discarded;
    }
}
