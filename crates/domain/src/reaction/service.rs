use std::sync::Arc;

use common::{Identity, ReactionKind, ReactionTally, TargetId, UserId};
use serde::Serialize;
use store::{ReactionChange, ReactionStore, StoreError};

use super::toggle::{Transition, reverse};
use crate::ports::{AuditEvent, AuditLog, Catalog};
use crate::{Result, ServiceError, ServiceSettings};

/// State after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub likes: u64,
    pub dislikes: u64,
    pub reaction: Option<ReactionKind>,
}

/// Service applying toggle semantics to reactions.
///
/// A toggle reads the user's own reaction, computes the transition and
/// commits it expecting that reaction to be unchanged. The store adds the
/// deltas to the tally, so only toggles of the same user can conflict; those
/// are retried from a fresh read.
pub struct ReactionService {
    reactions: Arc<dyn ReactionStore>,
    catalog: Arc<dyn Catalog>,
    audit: Arc<dyn AuditLog>,
    settings: ServiceSettings,
}

impl ReactionService {
    pub fn new(
        reactions: Arc<dyn ReactionStore>,
        catalog: Arc<dyn Catalog>,
        audit: Arc<dyn AuditLog>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            reactions,
            catalog,
            audit,
            settings,
        }
    }

    /// Toggles the caller's reaction to a target.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn toggle(
        &self,
        caller: &Identity,
        target_id: TargetId,
        kind: ReactionKind,
    ) -> Result<ToggleOutcome> {
        let deadline = self.settings.deadline();
        deadline
            .run("catalog lookup", self.catalog.lookup(target_id))
            .await?
            .ok_or_else(|| ServiceError::target_not_found(target_id))?;

        let attempts = self.settings.toggle_max_attempts.max(1);
        for attempt in 1..=attempts {
            let current = deadline
                .run(
                    "reaction read",
                    self.reactions.user_reaction(target_id, caller.user_id),
                )
                .await?;

            let transition = Transition::compute(current, kind);
            let change = transition.change(target_id, caller.user_id, current);

            let reactions = self.reactions.clone();
            let undo = self.reactions.clone();
            let committed = deadline
                .run_or_settle(
                    "reaction commit",
                    async move { reactions.commit(change).await },
                    move |late| async move {
                        if late.is_ok() {
                            take_back(undo, change).await;
                        }
                    },
                )
                .await?;

            match committed {
                Ok(tally) => {
                    let label = transition.next.map_or("none", |k| k.as_str());
                    metrics::counter!("reactions_toggled_total", "kind" => label).increment(1);
                    tracing::debug!(attempt, reaction = label, "reaction toggled");
                    self.audit.record(AuditEvent::ReactionToggled {
                        target_id,
                        user_id: caller.user_id,
                        reaction: transition.next,
                    });
                    return Ok(ToggleOutcome {
                        likes: tally.likes,
                        dislikes: tally.dislikes,
                        reaction: transition.next,
                    });
                }
                Err(StoreError::ConcurrencyConflict { .. }) => {
                    metrics::counter!("reaction_conflicts_total").increment(1);
                    tracing::debug!(attempt, "reaction commit conflicted, retrying");
                    tokio::task::yield_now().await;
                }
                Err(e @ StoreError::TallyUnderflow(_)) => {
                    tracing::error!(%target_id, error = %e, "reaction tally out of sync with records");
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Unavailable(format!(
            "Reaction on {target_id} still contended after {attempts} attempts"
        )))
    }

    /// Reads a user's committed reaction.
    pub async fn user_reaction(
        &self,
        target_id: TargetId,
        user_id: UserId,
    ) -> Result<Option<ReactionKind>> {
        self.settings
            .deadline()
            .run(
                "reaction read",
                self.reactions.user_reaction(target_id, user_id),
            )
            .await
    }

    /// Reads the committed tally of a target.
    pub async fn aggregate(&self, target_id: TargetId) -> Result<ReactionTally> {
        self.settings
            .deadline()
            .run("tally read", self.reactions.tally(target_id))
            .await
    }
}

/// Takes back a toggle that committed after its caller was told it failed.
///
/// If the user toggled again in the meantime the reversal conflicts and the
/// newer state is kept.
async fn take_back(reactions: Arc<dyn ReactionStore>, change: ReactionChange) {
    match reactions.commit(reverse(change)).await {
        Ok(_) => tracing::info!(
            target_id = %change.target_id,
            user_id = %change.user_id,
            "late reaction commit taken back"
        ),
        Err(e) => tracing::warn!(
            target_id = %change.target_id,
            user_id = %change.user_id,
            error = %e,
            "late reaction commit kept"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TargetKind;
    use store::{InMemoryInventoryStore, InMemoryReactionStore, InventoryStore};

    use crate::ports::{InventoryCatalog, RecordingAuditLog};

    async fn setup(
        settings: ServiceSettings,
    ) -> (ReactionService, InMemoryReactionStore, TargetId) {
        let inventory = InMemoryInventoryStore::new();
        let target_id = TargetId::new();
        inventory
            .register(target_id, TargetKind::Trip, 10)
            .await
            .unwrap();

        let reactions = InMemoryReactionStore::new();
        let service = ReactionService::new(
            Arc::new(reactions.clone()),
            Arc::new(InventoryCatalog::new(Arc::new(inventory))),
            Arc::new(RecordingAuditLog::new()),
            settings,
        );
        (service, reactions, target_id)
    }

    #[tokio::test]
    async fn like_twice_nets_to_zero() {
        let (service, _, target_id) = setup(ServiceSettings::default()).await;
        let caller = Identity::user(UserId::new());

        let first = service
            .toggle(&caller, target_id, ReactionKind::Like)
            .await
            .unwrap();
        assert_eq!((first.likes, first.reaction), (1, Some(ReactionKind::Like)));

        let second = service
            .toggle(&caller, target_id, ReactionKind::Like)
            .await
            .unwrap();
        assert_eq!((second.likes, second.reaction), (0, None));
        assert_eq!(
            service.user_reaction(target_id, caller.user_id).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let (service, _, _) = setup(ServiceSettings::default()).await;
        let result = service
            .toggle(
                &Identity::user(UserId::new()),
                TargetId::new(),
                ReactionKind::Like,
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn conflicts_are_retried() {
        let (service, store, target_id) = setup(ServiceSettings::default()).await;
        store.inject_conflicts(3).await;

        let outcome = service
            .toggle(&Identity::user(UserId::new()), target_id, ReactionKind::Dislike)
            .await
            .unwrap();
        assert_eq!(outcome.dislikes, 1);
    }

    #[tokio::test]
    async fn persistent_conflicts_are_unavailable() {
        let (service, store, target_id) = setup(ServiceSettings {
            toggle_max_attempts: 2,
            ..ServiceSettings::default()
        })
        .await;
        store.inject_conflicts(5).await;

        let result = service
            .toggle(&Identity::user(UserId::new()), target_id, ReactionKind::Like)
            .await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert_eq!(service.aggregate(target_id).await.unwrap(), ReactionTally::default());
    }

    #[tokio::test]
    async fn tally_out_of_sync_is_an_invariant_violation() {
        let (service, store, target_id) = setup(ServiceSettings::default()).await;
        let caller = Identity::user(UserId::new());
        service
            .toggle(&caller, target_id, ReactionKind::Like)
            .await
            .unwrap();
        store
            .overwrite_tally(target_id, ReactionTally::new(0, 0))
            .await;

        let result = service.toggle(&caller, target_id, ReactionKind::Like).await;
        assert!(matches!(result, Err(ServiceError::InvariantViolation(_))));
        assert_eq!(
            service.user_reaction(target_id, caller.user_id).await.unwrap(),
            Some(ReactionKind::Like)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn different_users_never_contend() {
        let (service, store, target_id) = setup(ServiceSettings {
            toggle_max_attempts: 1,
            ..ServiceSettings::default()
        })
        .await;
        let service = Arc::new(service);

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let service = service.clone();
                let kind = if i % 4 == 0 {
                    ReactionKind::Dislike
                } else {
                    ReactionKind::Like
                };
                tokio::spawn(async move {
                    service
                        .toggle(&Identity::user(UserId::new()), target_id, kind)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            service.aggregate(target_id).await.unwrap(),
            ReactionTally::new(24, 8)
        );
        assert_eq!(store.record_count(target_id, ReactionKind::Like).await, 24);
    }

    /// Commits like the wrapped store, then holds the reply back.
    struct SlowCommit {
        inner: InMemoryReactionStore,
        stall: std::time::Duration,
    }

    #[async_trait::async_trait]
    impl ReactionStore for SlowCommit {
        async fn commit(&self, change: ReactionChange) -> store::Result<ReactionTally> {
            let tally = self.inner.commit(change).await?;
            tokio::time::sleep(self.stall).await;
            Ok(tally)
        }

        async fn tally(&self, target_id: TargetId) -> store::Result<ReactionTally> {
            self.inner.tally(target_id).await
        }

        async fn user_reaction(
            &self,
            target_id: TargetId,
            user_id: UserId,
        ) -> store::Result<Option<ReactionKind>> {
            self.inner.user_reaction(target_id, user_id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn commit_landing_after_the_window_is_taken_back() {
        use std::time::Duration;

        let inventory = InMemoryInventoryStore::new();
        let target_id = TargetId::new();
        inventory
            .register(target_id, TargetKind::ActivitySlot, 10)
            .await
            .unwrap();
        let store = InMemoryReactionStore::new();
        let service = ReactionService::new(
            Arc::new(SlowCommit {
                inner: store.clone(),
                stall: Duration::from_millis(500),
            }),
            Arc::new(InventoryCatalog::new(Arc::new(inventory))),
            Arc::new(RecordingAuditLog::new()),
            ServiceSettings {
                transaction_timeout: Duration::from_millis(100),
                ..ServiceSettings::default()
            },
        );
        let caller = Identity::user(UserId::new());

        let result = service.toggle(&caller, target_id, ReactionKind::Like).await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.tally(target_id).await.unwrap(), ReactionTally::default());
        assert_eq!(store.user_reaction(target_id, caller.user_id).await.unwrap(), None);
    }
}
