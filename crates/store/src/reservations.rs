use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CancelledBy, Reservation, ReservationId, UserId};

use crate::Result;

/// Persistence for reservation records.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Writes a newly confirmed reservation.
    ///
    /// Fails with `DuplicateReservation` if the id already exists.
    async fn insert(&self, reservation: &Reservation) -> Result<()>;

    /// Loads a reservation by id.
    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Conditionally moves a reservation from confirmed to cancelled.
    ///
    /// The status check and the write are one atomic step: of two concurrent
    /// calls exactly one succeeds, the other fails with `InvalidTransition`.
    /// Returns the updated record.
    async fn mark_cancelled(
        &self,
        id: ReservationId,
        by: CancelledBy,
        at: DateTime<Utc>,
    ) -> Result<Reservation>;

    /// Deletes a reservation that is still confirmed.
    ///
    /// Used to undo a record whose create was already reported as failed.
    /// Returns false when the record is absent or no longer confirmed; its
    /// seats are then not the caller's to release.
    async fn discard(&self, id: ReservationId) -> Result<bool>;

    /// Lists the reservations of one owner, newest first.
    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Reservation>>;

    /// Lists every reservation, newest first.
    async fn list_all(&self) -> Result<Vec<Reservation>>;
}
