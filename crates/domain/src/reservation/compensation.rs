//! Capacity release with bounded retries.

use std::sync::Arc;

use common::{Quantity, ReservationId, TargetId};
use store::{InventoryStore, ReconciliationEntry, ReconciliationLog};

use crate::ServiceSettings;

/// Outcome of a release that must not be lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReleaseOutcome {
    Released,
    Reconciling,
}

/// Gives seats held by `reservation_id` back to the target.
///
/// Retries with linear backoff. Once every attempt has failed the release is
/// appended to the reconciliation log, so it is never silently dropped.
#[derive(Clone)]
pub(crate) struct Compensator {
    pub(crate) inventory: Arc<dyn InventoryStore>,
    pub(crate) reconciliation: Arc<dyn ReconciliationLog>,
    pub(crate) settings: ServiceSettings,
}

impl Compensator {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn release(
        &self,
        target_id: TargetId,
        quantity: Quantity,
        reservation_id: ReservationId,
        context: &'static str,
    ) -> ReleaseOutcome {
        let attempts = self.settings.compensation_max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.inventory.release(target_id, quantity).await {
                Ok(capacity) => {
                    metrics::counter!("reservation_compensations_total", "outcome" => "released")
                        .increment(1);
                    tracing::info!(
                        attempt,
                        available = capacity.available_capacity,
                        "capacity released"
                    );
                    return ReleaseOutcome::Released;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "capacity release failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.settings.compensation_backoff * attempt).await;
                    }
                }
            }
        }

        metrics::counter!("reservation_compensations_total", "outcome" => "failed").increment(1);
        tracing::error!(
            attempts,
            error = %last_error,
            "capacity release exhausted retries, handing over to reconciliation"
        );
        self.hand_over(
            target_id,
            quantity,
            reservation_id,
            format!("{context}: {last_error}"),
        )
        .await;
        ReleaseOutcome::Reconciling
    }

    /// Appends a release that needs an operator to the reconciliation log.
    pub(crate) async fn hand_over(
        &self,
        target_id: TargetId,
        quantity: Quantity,
        reservation_id: ReservationId,
        reason: String,
    ) {
        let entry = ReconciliationEntry::new(target_id, quantity, reservation_id, reason);
        if let Err(e) = self.reconciliation.record(entry).await {
            tracing::error!(error = %e, "failed to write reconciliation entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use common::TargetKind;
    use store::{InMemoryInventoryStore, InMemoryReconciliationLog};

    fn settings() -> ServiceSettings {
        ServiceSettings {
            compensation_max_attempts: 3,
            compensation_backoff: Duration::from_millis(1),
            ..ServiceSettings::default()
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let inventory = InMemoryInventoryStore::new();
        let target_id = TargetId::new();
        inventory
            .register(target_id, TargetKind::Trip, 4)
            .await
            .unwrap();
        let two = Quantity::new(2).unwrap();
        inventory.try_reserve(target_id, two).await.unwrap();
        inventory.fail_next_releases(2).await;

        let log = InMemoryReconciliationLog::new();
        let compensator = Compensator {
            inventory: Arc::new(inventory.clone()),
            reconciliation: Arc::new(log.clone()),
            settings: settings(),
        };

        let outcome = compensator
            .release(target_id, two, ReservationId::new(), "test")
            .await;

        assert_eq!(outcome, ReleaseOutcome::Released);
        let cap = inventory.capacity(target_id).await.unwrap().unwrap();
        assert_eq!(cap.available_capacity, 4);
        assert!(log.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn exhausted_retries_are_logged_for_reconciliation() {
        let inventory = InMemoryInventoryStore::new();
        let target_id = TargetId::new();
        inventory
            .register(target_id, TargetKind::Trip, 4)
            .await
            .unwrap();
        inventory.fail_next_releases(3).await;

        let log = InMemoryReconciliationLog::new();
        let compensator = Compensator {
            inventory: Arc::new(inventory),
            reconciliation: Arc::new(log.clone()),
            settings: settings(),
        };

        let reservation_id = ReservationId::new();
        let outcome = compensator
            .release(target_id, Quantity::new(1).unwrap(), reservation_id, "test")
            .await;

        assert_eq!(outcome, ReleaseOutcome::Reconciling);
        let pending = log.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reservation_id, reservation_id);
        assert!(pending[0].reason.starts_with("test: "));
    }
}
