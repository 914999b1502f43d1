//! Service error taxonomy.

use common::{
    InvalidQuantity, ReservationId, ReservationStatus, TargetId, UnknownReactionKind,
    UnknownTargetKind,
};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the booking services.
///
/// Every variant has a stable [`code`](ServiceError::code) that callers can
/// match on without parsing messages.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed or violates a business rule.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The referenced target or reservation does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// The target has fewer seats left than requested.
    #[error("Insufficient capacity on {target_id}: requested {requested}, available {available}")]
    InsufficientCapacity {
        target_id: TargetId,
        requested: u32,
        available: u32,
    },

    /// The caller is not allowed to perform the operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The reservation is not in a state that allows the transition.
    #[error("Reservation {reservation_id} is {current}")]
    InvalidStateTransition {
        reservation_id: ReservationId,
        current: ReservationStatus,
    },

    /// Stored state contradicts a data-model invariant.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// The backend could not complete the operation in time, or at all.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    pub fn target_not_found(target_id: TargetId) -> Self {
        ServiceError::NotFound {
            resource: "target",
            id: target_id.to_string(),
        }
    }

    pub fn reservation_not_found(reservation_id: ReservationId) -> Self {
        ServiceError::NotFound {
            resource: "reservation",
            id: reservation_id.to_string(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::InsufficientCapacity { .. } => "insufficient_capacity",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::InvalidStateTransition { .. } => "invalid_state_transition",
            ServiceError::InvariantViolation(_) => "invariant_violation",
            ServiceError::Unavailable(_) => "unavailable",
        }
    }

    /// Whether the error is an incident rather than an expected outcome.
    pub fn is_incident(&self) -> bool {
        matches!(
            self,
            ServiceError::Unavailable(_) | ServiceError::InvariantViolation(_)
        )
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::TargetNotFound(id) => ServiceError::target_not_found(id),
            StoreError::TargetExists(id) => {
                ServiceError::Validation(format!("Target {id} is already registered"))
            }
            StoreError::InsufficientCapacity {
                target_id,
                requested,
                available,
            } => ServiceError::InsufficientCapacity {
                target_id,
                requested,
                available,
            },
            StoreError::CapacityBelowReserved {
                target_id,
                requested_max,
                reserved,
            } => ServiceError::Validation(format!(
                "Cannot set max capacity of {target_id} to {requested_max}: {reserved} seats are reserved"
            )),
            StoreError::ReservationNotFound(id) => ServiceError::reservation_not_found(id),
            StoreError::InvalidTransition {
                reservation_id,
                current,
            } => ServiceError::InvalidStateTransition {
                reservation_id,
                current,
            },
            StoreError::DuplicateReservation(id) => {
                ServiceError::InvariantViolation(format!("Reservation id {id} already exists"))
            }
            StoreError::Corrupt(msg) => ServiceError::InvariantViolation(msg),
            StoreError::TallyUnderflow(target_id) => ServiceError::InvariantViolation(format!(
                "Reaction tally of {target_id} is out of sync with its records"
            )),
            StoreError::ConcurrencyConflict { target_id, .. } => ServiceError::Unavailable(
                format!("Concurrent update on {target_id} could not be resolved"),
            ),
            StoreError::Unavailable(msg) => ServiceError::Unavailable(msg),
            e @ (StoreError::Database(_) | StoreError::Migration(_)) => {
                ServiceError::Unavailable(e.to_string())
            }
        }
    }
}

impl From<InvalidQuantity> for ServiceError {
    fn from(e: InvalidQuantity) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<UnknownTargetKind> for ServiceError {
    fn from(e: UnknownTargetKind) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<UnknownReactionKind> for ServiceError {
    fn from(e: UnknownReactionKind) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
