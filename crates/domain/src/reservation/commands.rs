//! Reservation commands.

use common::{ReservationId, TargetId, TargetKind};

/// Command to reserve seats on a target for the caller.
#[derive(Debug, Clone, Copy)]
pub struct CreateReservation {
    /// The trip or activity slot to reserve on.
    pub target_id: TargetId,

    /// The kind the caller believes the target to be.
    pub target_kind: TargetKind,

    /// Requested seats. Validated by the service, so any integer is accepted
    /// here.
    pub quantity: i64,
}

impl CreateReservation {
    /// Creates a new CreateReservation command.
    pub fn new(target_id: TargetId, target_kind: TargetKind, quantity: i64) -> Self {
        Self {
            target_id,
            target_kind,
            quantity,
        }
    }
}

/// Command to cancel a reservation.
#[derive(Debug, Clone, Copy)]
pub struct CancelReservation {
    /// The reservation to cancel.
    pub reservation_id: ReservationId,
}

impl CancelReservation {
    /// Creates a new CancelReservation command.
    pub fn new(reservation_id: ReservationId) -> Self {
        Self { reservation_id }
    }
}
