use async_trait::async_trait;
use common::{ReactionKind, ReactionTally, TargetId, UserId};

use crate::Result;

/// A toggle outcome to be committed as one atomic unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionChange {
    pub target_id: TargetId,
    pub user_id: UserId,
    /// The user's reaction the change was computed from.
    pub previous: Option<ReactionKind>,
    /// The user's reaction after the toggle; None deletes the record.
    pub reaction: Option<ReactionKind>,
    pub likes_delta: i64,
    pub dislikes_delta: i64,
}

/// Owner of per-user reaction records and per-target tallies.
///
/// A commit is guarded by the user's own record, not by the target: toggles
/// of different users on one target never conflict, and their deltas are
/// added to the tally by the store in the same atomic step as the record
/// write.
#[async_trait]
pub trait ReactionStore: Send + Sync {
    /// Commits a change if the user's reaction is still `change.previous`.
    ///
    /// Fails with `ConcurrencyConflict` if it moved, and with `TallyUnderflow`
    /// if a delta would make a counter negative. Nothing is written in either
    /// case. Returns the tally right after the commit.
    async fn commit(&self, change: ReactionChange) -> Result<ReactionTally>;

    /// Reads the committed tally of a target.
    async fn tally(&self, target_id: TargetId) -> Result<ReactionTally>;

    /// Reads a user's committed reaction to a target.
    async fn user_reaction(
        &self,
        target_id: TargetId,
        user_id: UserId,
    ) -> Result<Option<ReactionKind>>;
}
