//! Reservation service coordinating capacity holds and reservation records.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::{CancelledBy, Identity, Quantity, Reservation, ReservationId, TargetId};
use store::{InventoryStore, ReconciliationEntry, ReconciliationLog, ReservationStore};

use super::commands::{CancelReservation, CreateReservation};
use super::compensation::Compensator;
use crate::ports::{AuditEvent, AuditLog, Catalog};
use crate::settings::Deadline;
use crate::{Result, ServiceError, ServiceSettings, require_admin};

/// Service for creating and cancelling reservations.
///
/// Creating a reservation is a two-step saga: seats are taken from the
/// inventory with a conditional update, then the record is written. If the
/// record write fails the seats are released again. Cancelling flips the
/// record with a conditional update first and releases afterwards, so two
/// racing cancels release at most once.
///
/// Writes that are still in flight when the transaction window closes are
/// not abandoned. They finish in the background and whatever they committed
/// is undone there, while the caller is told `Unavailable`.
pub struct ReservationService {
    inventory: Arc<dyn InventoryStore>,
    reservations: Arc<dyn ReservationStore>,
    catalog: Arc<dyn Catalog>,
    reconciliation: Arc<dyn ReconciliationLog>,
    audit: Arc<dyn AuditLog>,
    compensator: Compensator,
    settings: ServiceSettings,
}

impl ReservationService {
    /// Creates a new reservation service.
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        reservations: Arc<dyn ReservationStore>,
        catalog: Arc<dyn Catalog>,
        reconciliation: Arc<dyn ReconciliationLog>,
        audit: Arc<dyn AuditLog>,
        settings: ServiceSettings,
    ) -> Self {
        let compensator = Compensator {
            inventory: inventory.clone(),
            reconciliation: reconciliation.clone(),
            settings,
        };
        Self {
            inventory,
            reservations,
            catalog,
            reconciliation,
            audit,
            compensator,
            settings,
        }
    }

    /// Reserves seats for the caller.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn create(&self, caller: &Identity, cmd: CreateReservation) -> Result<Reservation> {
        let started = Instant::now();
        let result = self.try_create(caller, cmd).await;

        metrics::histogram!("reservation_create_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(reservation) => {
                metrics::counter!("reservations_created_total").increment(1);
                tracing::info!(
                    reservation_id = %reservation.id,
                    target_id = %reservation.target_id,
                    quantity = %reservation.quantity,
                    "reservation confirmed"
                );
            }
            Err(e) => {
                metrics::counter!("reservations_rejected_total", "reason" => e.code())
                    .increment(1);
                if !e.is_incident() {
                    tracing::info!(reason = e.code(), error = %e, "reservation rejected");
                }
            }
        }
        result
    }

    async fn try_create(&self, caller: &Identity, cmd: CreateReservation) -> Result<Reservation> {
        let quantity = Quantity::new(cmd.quantity)?;
        let deadline = self.settings.deadline();

        let entry = deadline
            .run("catalog lookup", self.catalog.lookup(cmd.target_id))
            .await?
            .ok_or_else(|| ServiceError::target_not_found(cmd.target_id))?;
        if entry.kind != cmd.target_kind {
            return Err(ServiceError::Validation(format!(
                "Target {} is a {}, not a {}",
                cmd.target_id, entry.kind, cmd.target_kind
            )));
        }

        let reservation =
            Reservation::confirmed(cmd.target_id, cmd.target_kind, caller.user_id, quantity);
        let (target_id, reservation_id) = (reservation.target_id, reservation.id);

        // Step 1: take the seats
        let inventory = self.inventory.clone();
        let compensator = self.compensator.clone();
        deadline
            .run_or_settle(
                "capacity reservation",
                async move { inventory.try_reserve(target_id, quantity).await },
                move |late| async move {
                    if late.is_ok() {
                        compensator
                            .release(
                                target_id,
                                quantity,
                                reservation_id,
                                "release after late capacity reservation",
                            )
                            .await;
                    }
                },
            )
            .await??;

        // Step 2: write the record, giving the seats back if that fails
        let reservations = self.reservations.clone();
        let record = reservation.clone();
        let settler = self.write_settler(&reservation);
        let written = deadline
            .run_or_settle(
                "reservation write",
                async move { reservations.insert(&record).await },
                move |late| settler.settle(late.is_ok(), "release after late reservation write"),
            )
            .await?;
        if let Err(e) = written {
            tracing::warn!(error = %e, "reservation write failed, compensating");
            self.write_settler(&reservation)
                .settle(false, "release after failed reservation write")
                .await;
            return Err(e.into());
        }

        self.audit.record(AuditEvent::ReservationCreated {
            reservation_id: reservation.id,
            target_id: reservation.target_id,
            owner_id: reservation.owner_id,
            quantity,
        });
        Ok(reservation)
    }

    fn write_settler(&self, reservation: &Reservation) -> WriteSettler {
        WriteSettler {
            reservations: self.reservations.clone(),
            compensator: self.compensator.clone(),
            target_id: reservation.target_id,
            quantity: reservation.quantity,
            reservation_id: reservation.id,
        }
    }

    /// Cancels one of the caller's own reservations.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn cancel_by_owner(
        &self,
        caller: &Identity,
        cmd: CancelReservation,
    ) -> Result<Reservation> {
        let deadline = self.settings.deadline();
        let reservation = deadline
            .run("reservation lookup", self.reservations.get(cmd.reservation_id))
            .await?
            .ok_or_else(|| ServiceError::reservation_not_found(cmd.reservation_id))?;

        if !reservation.is_owned_by(caller.user_id) {
            return Err(ServiceError::Unauthorized(
                "Only the owner can cancel this reservation".to_string(),
            ));
        }

        self.cancel(caller, reservation, CancelledBy::Owner, deadline)
            .await
    }

    /// Cancels any reservation. Requires the admin role.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn cancel_by_admin(
        &self,
        caller: &Identity,
        cmd: CancelReservation,
    ) -> Result<Reservation> {
        require_admin(caller)?;

        let deadline = self.settings.deadline();
        let reservation = deadline
            .run("reservation lookup", self.reservations.get(cmd.reservation_id))
            .await?
            .ok_or_else(|| ServiceError::reservation_not_found(cmd.reservation_id))?;

        self.cancel(caller, reservation, CancelledBy::Admin, deadline)
            .await
    }

    async fn cancel(
        &self,
        caller: &Identity,
        reservation: Reservation,
        by: CancelledBy,
        deadline: Deadline,
    ) -> Result<Reservation> {
        if !reservation.status.can_cancel() {
            return Err(ServiceError::InvalidStateTransition {
                reservation_id: reservation.id,
                current: reservation.status,
            });
        }

        // The conditional update decides the winner between racing cancels.
        // If it lands after the window, the late winner still releases.
        let reservations = self.reservations.clone();
        let compensator = self.compensator.clone();
        let reservation_id = reservation.id;
        let cancelled = deadline
            .run_or_settle(
                "reservation cancel",
                async move {
                    reservations
                        .mark_cancelled(reservation_id, by, Utc::now())
                        .await
                },
                move |late| async move {
                    if let Ok(cancelled) = late {
                        compensator
                            .release(
                                cancelled.target_id,
                                cancelled.quantity,
                                cancelled.id,
                                "release after late cancellation",
                            )
                            .await;
                    }
                },
            )
            .await??;

        self.compensator
            .release(
                cancelled.target_id,
                cancelled.quantity,
                cancelled.id,
                "release after cancellation",
            )
            .await;

        metrics::counter!("reservations_cancelled_total", "by" => by.as_str()).increment(1);
        tracing::info!(reservation_id = %cancelled.id, cancelled_by = %by, "reservation cancelled");
        self.audit.record(AuditEvent::ReservationCancelled {
            reservation_id: cancelled.id,
            target_id: cancelled.target_id,
            actor_id: caller.user_id,
            cancelled_by: by,
        });
        Ok(cancelled)
    }

    /// Lists the caller's reservations, newest first.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn list_for_owner(&self, caller: &Identity) -> Result<Vec<Reservation>> {
        self.settings
            .deadline()
            .run("reservation listing", self.reservations.list_by_owner(caller.user_id))
            .await
    }

    /// Lists every reservation, newest first. Requires the admin role.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn list_all(&self, caller: &Identity) -> Result<Vec<Reservation>> {
        require_admin(caller)?;
        self.settings
            .deadline()
            .run("reservation listing", self.reservations.list_all())
            .await
    }

    /// Lists releases that could not be completed. Requires the admin role.
    pub async fn pending_reconciliation(
        &self,
        caller: &Identity,
    ) -> Result<Vec<ReconciliationEntry>> {
        require_admin(caller)?;
        self.settings
            .deadline()
            .run("reconciliation listing", self.reconciliation.pending())
            .await
    }
}

/// Undoes the seat hold of a create whose record write was reported failed.
///
/// The write may still have landed, so the record decides: an absent record
/// gets its seats back, a confirmed one is discarded first, and one that was
/// cancelled in the meantime had its seats released by that cancel.
struct WriteSettler {
    reservations: Arc<dyn ReservationStore>,
    compensator: Compensator,
    target_id: TargetId,
    quantity: Quantity,
    reservation_id: ReservationId,
}

impl WriteSettler {
    async fn settle(self, reported_written: bool, context: &'static str) {
        let Self {
            reservations,
            compensator,
            target_id,
            quantity,
            reservation_id,
        } = self;

        let present = if reported_written {
            true
        } else {
            match reservations.get(reservation_id).await {
                Ok(record) => record.is_some(),
                Err(e) => {
                    tracing::error!(%reservation_id, error = %e, "reservation state unknown after failed write");
                    compensator
                        .hand_over(
                            target_id,
                            quantity,
                            reservation_id,
                            format!("{context}: record state unknown: {e}"),
                        )
                        .await;
                    return;
                }
            }
        };

        let release = if present {
            match reservations.discard(reservation_id).await {
                Ok(discarded) => discarded,
                Err(e) => {
                    tracing::error!(
                        %reservation_id,
                        error = %e,
                        "could not discard reservation of a failed create"
                    );
                    false
                }
            }
        } else {
            true
        };

        if release {
            compensator
                .release(target_id, quantity, reservation_id, context)
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use common::{ReservationStatus, TargetId, TargetKind, UserId};
    use store::{
        InMemoryInventoryStore, InMemoryReconciliationLog, InMemoryReservationStore,
    };

    use crate::ports::{InventoryCatalog, RecordingAuditLog};

    struct Fixture {
        service: ReservationService,
        inventory: InMemoryInventoryStore,
        reservations: InMemoryReservationStore,
        reconciliation: InMemoryReconciliationLog,
        audit: RecordingAuditLog,
    }

    /// Commits like the wrapped store, then holds the reply back.
    struct SlowReply {
        inner: InMemoryReservationStore,
        insert_stall: Option<Duration>,
        cancel_stall: Option<Duration>,
    }

    async fn stall(duration: Option<Duration>) {
        if let Some(duration) = duration {
            tokio::time::sleep(duration).await;
        }
    }

    #[async_trait::async_trait]
    impl ReservationStore for SlowReply {
        async fn insert(&self, reservation: &Reservation) -> store::Result<()> {
            self.inner.insert(reservation).await?;
            stall(self.insert_stall).await;
            Ok(())
        }

        async fn get(&self, id: ReservationId) -> store::Result<Option<Reservation>> {
            self.inner.get(id).await
        }

        async fn mark_cancelled(
            &self,
            id: ReservationId,
            by: CancelledBy,
            at: chrono::DateTime<Utc>,
        ) -> store::Result<Reservation> {
            let cancelled = self.inner.mark_cancelled(id, by, at).await?;
            stall(self.cancel_stall).await;
            Ok(cancelled)
        }

        async fn discard(&self, id: ReservationId) -> store::Result<bool> {
            self.inner.discard(id).await
        }

        async fn list_by_owner(&self, owner_id: UserId) -> store::Result<Vec<Reservation>> {
            self.inner.list_by_owner(owner_id).await
        }

        async fn list_all(&self) -> store::Result<Vec<Reservation>> {
            self.inner.list_all().await
        }
    }

    fn fixture(settings: ServiceSettings) -> Fixture {
        fixture_with(settings, |store| Arc::new(store))
    }

    fn slow_reply_fixture(
        insert_stall: Option<Duration>,
        cancel_stall: Option<Duration>,
    ) -> Fixture {
        let settings = ServiceSettings {
            transaction_timeout: Duration::from_millis(100),
            ..fast_settings()
        };
        fixture_with(settings, |inner| {
            Arc::new(SlowReply {
                inner,
                insert_stall,
                cancel_stall,
            })
        })
    }

    fn fixture_with(
        settings: ServiceSettings,
        wrap: impl FnOnce(InMemoryReservationStore) -> Arc<dyn ReservationStore>,
    ) -> Fixture {
        let inventory = InMemoryInventoryStore::new();
        let reservations = InMemoryReservationStore::new();
        let reconciliation = InMemoryReconciliationLog::new();
        let audit = RecordingAuditLog::new();
        let inventory_arc: Arc<dyn InventoryStore> = Arc::new(inventory.clone());

        let service = ReservationService::new(
            inventory_arc.clone(),
            wrap(reservations.clone()),
            Arc::new(InventoryCatalog::new(inventory_arc)),
            Arc::new(reconciliation.clone()),
            Arc::new(audit.clone()),
            settings,
        );
        Fixture {
            service,
            inventory,
            reservations,
            reconciliation,
            audit,
        }
    }

    fn fast_settings() -> ServiceSettings {
        ServiceSettings {
            compensation_backoff: Duration::from_millis(1),
            ..ServiceSettings::default()
        }
    }

    async fn trip(fx: &Fixture, max: u32) -> TargetId {
        let target_id = TargetId::new();
        fx.inventory
            .register(target_id, TargetKind::Trip, max)
            .await
            .unwrap();
        target_id
    }

    async fn available(fx: &Fixture, target_id: TargetId) -> u32 {
        fx.inventory
            .capacity(target_id)
            .await
            .unwrap()
            .unwrap()
            .available_capacity
    }

    async fn confirmed_seats(fx: &Fixture, target_id: TargetId) -> u32 {
        fx.reservations
            .list_all()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.target_id == target_id && r.status == ReservationStatus::Confirmed)
            .map(|r| r.quantity.get())
            .sum()
    }

    #[tokio::test]
    async fn create_takes_seats_and_records() {
        let fx = fixture(fast_settings());
        let target_id = trip(&fx, 5).await;
        let caller = Identity::user(UserId::new());

        let reservation = fx
            .service
            .create(&caller, CreateReservation::new(target_id, TargetKind::Trip, 2))
            .await
            .unwrap();

        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        assert_eq!(reservation.owner_id, caller.user_id);
        assert_eq!(available(&fx, target_id).await, 3);
        assert_eq!(fx.reservations.reservation_count().await, 1);
        assert_eq!(fx.audit.events().len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_non_positive_quantity() {
        let fx = fixture(fast_settings());
        let target_id = trip(&fx, 5).await;
        let caller = Identity::user(UserId::new());

        for quantity in [0, -1] {
            let result = fx
                .service
                .create(
                    &caller,
                    CreateReservation::new(target_id, TargetKind::Trip, quantity),
                )
                .await;
            assert!(matches!(result, Err(ServiceError::Validation(_))));
        }
        assert_eq!(available(&fx, target_id).await, 5);
    }

    #[tokio::test]
    async fn create_on_unknown_target_is_not_found() {
        let fx = fixture(fast_settings());
        let result = fx
            .service
            .create(
                &Identity::user(UserId::new()),
                CreateReservation::new(TargetId::new(), TargetKind::Trip, 1),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn create_with_wrong_kind_is_rejected() {
        let fx = fixture(fast_settings());
        let target_id = trip(&fx, 5).await;
        let result = fx
            .service
            .create(
                &Identity::user(UserId::new()),
                CreateReservation::new(target_id, TargetKind::ActivitySlot, 1),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert_eq!(available(&fx, target_id).await, 5);
    }

    #[tokio::test]
    async fn failed_record_write_gives_seats_back() {
        let fx = fixture(fast_settings());
        let target_id = trip(&fx, 5).await;
        fx.reservations.set_fail_on_insert(true).await;

        let result = fx
            .service
            .create(
                &Identity::user(UserId::new()),
                CreateReservation::new(target_id, TargetKind::Trip, 3),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert_eq!(available(&fx, target_id).await, 5);
        assert!(fx.reconciliation.pending().await.unwrap().is_empty());
        assert!(fx.audit.events().is_empty());
    }

    #[tokio::test]
    async fn failed_compensation_lands_in_reconciliation() {
        let fx = fixture(fast_settings());
        let target_id = trip(&fx, 5).await;
        fx.reservations.set_fail_on_insert(true).await;
        fx.inventory.fail_next_releases(3).await;

        let result = fx
            .service
            .create(
                &Identity::user(UserId::new()),
                CreateReservation::new(target_id, TargetKind::Trip, 3),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(available(&fx, target_id).await, 2);
        let pending = fx.reconciliation.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].target_id, target_id);
        assert_eq!(pending[0].quantity.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_record_write_is_settled_after_the_window() {
        let fx = fixture(ServiceSettings {
            transaction_timeout: Duration::from_millis(100),
            ..fast_settings()
        });
        let target_id = trip(&fx, 5).await;
        fx.reservations
            .set_insert_delay(Some(Duration::from_secs(1)))
            .await;

        let result = fx
            .service
            .create(
                &Identity::user(UserId::new()),
                CreateReservation::new(target_id, TargetKind::Trip, 2),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));

        // The write is still in flight, so its seats stay held
        assert_eq!(available(&fx, target_id).await, 3);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(available(&fx, target_id).await, 5);
        assert_eq!(fx.reservations.reservation_count().await, 0);
        assert!(fx.reconciliation.pending().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn record_committed_after_the_window_is_discarded() {
        let fx = slow_reply_fixture(Some(Duration::from_millis(500)), None);
        let target_id = trip(&fx, 5).await;

        let result = fx
            .service
            .create(
                &Identity::user(UserId::new()),
                CreateReservation::new(target_id, TargetKind::Trip, 5),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert!(confirmed_seats(&fx, target_id).await + available(&fx, target_id).await <= 5);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(confirmed_seats(&fx, target_id).await, 0);
        assert_eq!(fx.reservations.reservation_count().await, 0);
        assert_eq!(available(&fx, target_id).await, 5);
        assert!(fx.reconciliation.pending().await.unwrap().is_empty());
        assert!(fx.audit.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn late_record_cancelled_meanwhile_is_released_once() {
        let fx = slow_reply_fixture(Some(Duration::from_millis(500)), None);
        let target_id = trip(&fx, 5).await;
        fx.inventory
            .try_reserve(target_id, Quantity::new(2).unwrap())
            .await
            .unwrap();
        let owner = Identity::user(UserId::new());

        let result = fx
            .service
            .create(&owner, CreateReservation::new(target_id, TargetKind::Trip, 3))
            .await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));

        // The owner finds the record before the failed create settles
        let listed = fx.service.list_for_owner(&owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        fx.service
            .cancel_by_owner(&owner, CancelReservation::new(listed[0].id))
            .await
            .unwrap();
        assert_eq!(available(&fx, target_id).await, 3);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(available(&fx, target_id).await, 3);
        assert_eq!(fx.reservations.reservation_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_committed_after_the_window_still_releases() {
        let fx = slow_reply_fixture(None, Some(Duration::from_millis(500)));
        let target_id = trip(&fx, 5).await;
        let owner = Identity::user(UserId::new());
        let reservation = fx
            .service
            .create(&owner, CreateReservation::new(target_id, TargetKind::Trip, 3))
            .await
            .unwrap();
        assert_eq!(available(&fx, target_id).await, 2);

        let first = fx
            .service
            .cancel_by_owner(&owner, CancelReservation::new(reservation.id))
            .await;
        assert!(matches!(first, Err(ServiceError::Unavailable(_))));

        let second = fx
            .service
            .cancel_by_owner(&owner, CancelReservation::new(reservation.id))
            .await;
        assert!(matches!(
            second,
            Err(ServiceError::InvalidStateTransition {
                current: ReservationStatus::Cancelled,
                ..
            })
        ));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(available(&fx, target_id).await, 5);
        assert!(fx.reconciliation.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_owner_cannot_cancel() {
        let fx = fixture(fast_settings());
        let target_id = trip(&fx, 5).await;
        let owner = Identity::user(UserId::new());
        let reservation = fx
            .service
            .create(&owner, CreateReservation::new(target_id, TargetKind::Trip, 1))
            .await
            .unwrap();

        let stranger = Identity::user(UserId::new());
        let result = fx
            .service
            .cancel_by_owner(&stranger, CancelReservation::new(reservation.id))
            .await;
        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
        assert_eq!(available(&fx, target_id).await, 4);
    }

    #[tokio::test]
    async fn cancel_unknown_reservation_is_not_found() {
        let fx = fixture(fast_settings());
        let result = fx
            .service
            .cancel_by_owner(
                &Identity::user(UserId::new()),
                CancelReservation::new(common::ReservationId::new()),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn failed_release_after_cancel_is_reconciled() {
        let fx = fixture(fast_settings());
        let target_id = trip(&fx, 5).await;
        let owner = Identity::user(UserId::new());
        let reservation = fx
            .service
            .create(&owner, CreateReservation::new(target_id, TargetKind::Trip, 2))
            .await
            .unwrap();
        fx.inventory.fail_next_releases(3).await;

        let cancelled = fx
            .service
            .cancel_by_owner(&owner, CancelReservation::new(reservation.id))
            .await
            .unwrap();

        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert_eq!(available(&fx, target_id).await, 3);
        let admin = Identity::admin(UserId::new());
        let pending = fx.service.pending_reconciliation(&admin).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reservation_id, reservation.id);
    }

    #[tokio::test]
    async fn listings_are_scoped() {
        let fx = fixture(fast_settings());
        let target_id = trip(&fx, 10).await;
        let alice = Identity::user(UserId::new());
        let bob = Identity::user(UserId::new());

        for caller in [&alice, &alice, &bob] {
            fx.service
                .create(caller, CreateReservation::new(target_id, TargetKind::Trip, 1))
                .await
                .unwrap();
        }

        assert_eq!(fx.service.list_for_owner(&alice).await.unwrap().len(), 2);
        assert!(matches!(
            fx.service.list_all(&alice).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            fx.service.pending_reconciliation(&bob).await,
            Err(ServiceError::Unauthorized(_))
        ));

        let admin = Identity::admin(UserId::new());
        assert_eq!(fx.service.list_all(&admin).await.unwrap().len(), 3);
    }
}
