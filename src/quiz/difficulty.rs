use std::fmt;

use serde::{Deserialize, Serialize};

pub const INTERMEDIATE_THRESHOLD: f64 = 0.3;
pub const HARD_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Intermediate,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a mastery score to a question difficulty.
///
/// Boundaries belong to the higher bucket. NaN and negative scores land in
/// `Easy`, scores above 1.0 in `Hard`.
pub fn classify(mastery: f64) -> Difficulty {
    if mastery >= HARD_THRESHOLD {
        Difficulty::Hard
    } else if mastery >= INTERMEDIATE_THRESHOLD {
        Difficulty::Intermediate
    } else {
        Difficulty::Easy
    }
}

/// Learner-facing proficiency label, same thresholds as [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasteryLabel {
    Beginner,
    Intermediate,
    Advanced,
}

impl MasteryLabel {
    pub fn from_score(mastery: f64) -> Self {
        match classify(mastery) {
            Difficulty::Easy => MasteryLabel::Beginner,
            Difficulty::Intermediate => MasteryLabel::Intermediate,
            Difficulty::Hard => MasteryLabel::Advanced,
        }
    }
}
