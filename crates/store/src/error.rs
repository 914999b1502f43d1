use thiserror::Error;

use common::{ReservationId, ReservationStatus, TargetId, UserId};

/// Errors that can occur when interacting with a store.
///
/// A rejected conditional update always surfaces as one of these typed
/// variants; stores never report an assumed success.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No inventory target with this id is registered.
    #[error("Target not found: {0}")]
    TargetNotFound(TargetId),

    /// A target with this id is already registered.
    #[error("Target already registered: {0}")]
    TargetExists(TargetId),

    /// The atomic guard refused the decrement.
    #[error(
        "Insufficient capacity for target {target_id}: requested {requested}, available {available}"
    )]
    InsufficientCapacity {
        target_id: TargetId,
        requested: u32,
        available: u32,
    },

    /// A capacity edit would drop the ceiling below seats already held.
    #[error(
        "Capacity {requested_max} for target {target_id} is below the {reserved} seats already reserved"
    )]
    CapacityBelowReserved {
        target_id: TargetId,
        requested_max: u32,
        reserved: u32,
    },

    /// No reservation with this id exists.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// A reservation with this id was already written.
    #[error("Reservation already exists: {0}")]
    DuplicateReservation(ReservationId),

    /// The conditional status update found the reservation in another state.
    #[error("Reservation {reservation_id} is {current}, cannot be cancelled")]
    InvalidTransition {
        reservation_id: ReservationId,
        current: ReservationStatus,
    },

    /// The user's reaction moved since it was read.
    #[error("Concurrency conflict on reaction of user {user_id} to target {target_id}")]
    ConcurrencyConflict { target_id: TargetId, user_id: UserId },

    /// A reaction delta would have made a tally counter negative.
    #[error("Reaction tally of target {0} would become negative")]
    TallyUnderflow(TargetId),

    /// Persisted data is inconsistent with the store's invariants.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The store could not be reached or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
