use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{ReactionKind, ReactionTally, TargetId, UserId};
use tokio::sync::RwLock;

use crate::{ReactionChange, ReactionStore, Result, StoreError};

#[derive(Debug, Default)]
struct ReactionState {
    tallies: HashMap<TargetId, ReactionTally>,
    records: HashMap<(TargetId, UserId), ReactionKind>,
    injected_conflicts: u32,
}

/// In-memory reaction store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReactionStore {
    state: Arc<RwLock<ReactionState>>,
}

impl InMemoryReactionStore {
    /// Creates a new empty reaction store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` commits fail as if another writer got there first.
    pub async fn inject_conflicts(&self, count: u32) {
        self.state.write().await.injected_conflicts = count;
    }

    /// Overwrites a target's tally without touching the per-user records.
    ///
    /// Only useful to simulate a tally that lost an update elsewhere.
    pub async fn overwrite_tally(&self, target_id: TargetId, tally: ReactionTally) {
        self.state.write().await.tallies.insert(target_id, tally);
    }

    /// Counts the per-user records of a target with the given kind.
    pub async fn record_count(&self, target_id: TargetId, kind: ReactionKind) -> u64 {
        self.state
            .read()
            .await
            .records
            .iter()
            .filter(|((t, _), k)| *t == target_id && **k == kind)
            .count() as u64
    }
}

#[async_trait]
impl ReactionStore for InMemoryReactionStore {
    async fn commit(&self, change: ReactionChange) -> Result<ReactionTally> {
        let mut state = self.state.write().await;
        let key = (change.target_id, change.user_id);

        if state.injected_conflicts > 0 {
            state.injected_conflicts -= 1;
            return Err(StoreError::ConcurrencyConflict {
                target_id: change.target_id,
                user_id: change.user_id,
            });
        }

        if state.records.get(&key).copied() != change.previous {
            return Err(StoreError::ConcurrencyConflict {
                target_id: change.target_id,
                user_id: change.user_id,
            });
        }

        let tally = state
            .tallies
            .get(&change.target_id)
            .copied()
            .unwrap_or_default()
            .apply_delta(change.likes_delta, change.dislikes_delta)
            .ok_or(StoreError::TallyUnderflow(change.target_id))?;

        match change.reaction {
            Some(kind) => {
                state.records.insert(key, kind);
            }
            None => {
                state.records.remove(&key);
            }
        }
        state.tallies.insert(change.target_id, tally);
        Ok(tally)
    }

    async fn tally(&self, target_id: TargetId) -> Result<ReactionTally> {
        Ok(self
            .state
            .read()
            .await
            .tallies
            .get(&target_id)
            .copied()
            .unwrap_or_default())
    }

    async fn user_reaction(
        &self,
        target_id: TargetId,
        user_id: UserId,
    ) -> Result<Option<ReactionKind>> {
        Ok(self
            .state
            .read()
            .await
            .records
            .get(&(target_id, user_id))
            .copied())
    }
}
