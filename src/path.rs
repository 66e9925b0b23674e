//! Victory paths and final scoring.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Participant, ScoreEntry, ScoreSource};
use crate::rules::{ScaledPath, Threshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTier {
    None,
    Small,
    Full,
}

impl fmt::Display for PathTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PathTier::None => "none",
            PathTier::Small => "small",
            PathTier::Full => "full",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStatus {
    pub tier: PathTier,
    pub bonus: u32,
}

/// An empty condition is always met.
pub fn condition_met(thresholds: &[Threshold], participant: &Participant) -> bool {
    thresholds.iter().all(|t| t.met_by(participant))
}

/// Full is checked first, then small, both against the current state.
/// Meeting either sets the small-path latch, which only gates secondary
/// unlocks and never stands in for the small condition itself.
pub fn evaluate(participant: &mut Participant, path: &ScaledPath) -> PathStatus {
    if condition_met(&path.full, participant) {
        participant.small_path_latched = true;
        return PathStatus {
            tier: PathTier::Full,
            bonus: path.full_bonus,
        };
    }
    if condition_met(&path.small, participant) {
        participant.small_path_latched = true;
        return PathStatus {
            tier: PathTier::Small,
            bonus: path.small_bonus,
        };
    }
    PathStatus {
        tier: PathTier::None,
        bonus: 0,
    }
}

pub fn final_score(participant: &Participant, status: &PathStatus) -> u32 {
    participant.resources.base_score().saturating_add(status.bonus)
}

/// Records the path bonus under [`ScoreSource::PathBonus`] and returns the
/// final score.
pub fn award(participant: &mut Participant, status: &PathStatus) -> u32 {
    participant
        .ledger
        .record(ScoreEntry::new(ScoreSource::PathBonus, f64::from(status.bonus)));
    final_score(participant, status)
}

/// Highest score wins; ties go to the lowest id.
pub fn winner(scores: impl IntoIterator<Item = (usize, u32)>) -> Option<usize> {
    scores
        .into_iter()
        .min_by_key(|&(id, score)| (std::cmp::Reverse(score), id))
        .map(|(id, _)| id)
}
