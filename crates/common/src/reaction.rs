//! Reaction data model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user's reaction to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

impl std::fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a reaction kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown reaction kind: {0}")]
pub struct UnknownReactionKind(pub String);

impl std::str::FromStr for ReactionKind {
    type Err = UnknownReactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            other => Err(UnknownReactionKind(other.to_string())),
        }
    }
}

/// Aggregate like/dislike counters of one target.
///
/// This is a projection of the per-user reaction records and is only ever
/// written in the same commit as those records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ReactionTally {
    pub likes: u64,
    pub dislikes: u64,
}

impl ReactionTally {
    pub fn new(likes: u64, dislikes: u64) -> Self {
        Self { likes, dislikes }
    }

    pub fn total(&self) -> u64 {
        self.likes + self.dislikes
    }

    /// Adds signed deltas to both counters.
    ///
    /// Returns None instead of clamping when a counter would go negative.
    pub fn apply_delta(&self, likes_delta: i64, dislikes_delta: i64) -> Option<Self> {
        Some(Self {
            likes: self.likes.checked_add_signed(likes_delta)?,
            dislikes: self.dislikes.checked_add_signed(dislikes_delta)?,
        })
    }

    /// Counter value for one kind.
    pub fn count(&self, kind: ReactionKind) -> u64 {
        match kind {
            ReactionKind::Like => self.likes,
            ReactionKind::Dislike => self.dislikes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_and_rejects_unknown() {
        assert_eq!("like".parse::<ReactionKind>().unwrap(), ReactionKind::Like);
        assert_eq!(
            "dislike".parse::<ReactionKind>().unwrap(),
            ReactionKind::Dislike
        );
        assert_eq!(
            "love".parse::<ReactionKind>(),
            Err(UnknownReactionKind("love".to_string()))
        );
    }

    #[test]
    fn tally_counts_by_kind() {
        let tally = ReactionTally::new(3, 1);
        assert_eq!(tally.count(ReactionKind::Like), 3);
        assert_eq!(tally.count(ReactionKind::Dislike), 1);
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn delta_never_clamps() {
        let tally = ReactionTally::new(1, 0);
        assert_eq!(tally.apply_delta(-1, 1), Some(ReactionTally::new(0, 1)));
        assert_eq!(tally.apply_delta(0, -1), None);
    }
}
