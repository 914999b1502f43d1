//! Reservation record and its two-state lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Quantity, ReservationId, TargetId, TargetKind, UserId};

/// Status of a reservation.
///
/// State transitions:
/// ```text
/// Confirmed ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Capacity is held for the owner. Initial state.
    #[default]
    Confirmed,

    /// Capacity has been returned (terminal state).
    Cancelled,
}

impl ReservationStatus {
    /// Returns true if a reservation in this state may be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, ReservationStatus::Confirmed)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("unknown reservation status: {other}")),
        }
    }
}

/// Who cancelled a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    #[default]
    None,
    Owner,
    Admin,
}

impl CancelledBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelledBy::None => "none",
            CancelledBy::Owner => "owner",
            CancelledBy::Admin => "admin",
        }
    }
}

impl std::fmt::Display for CancelledBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CancelledBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(CancelledBy::None),
            "owner" => Ok(CancelledBy::Owner),
            "admin" => Ok(CancelledBy::Admin),
            other => Err(format!("unknown canceller: {other}")),
        }
    }
}

/// Rejected lifecycle transition on a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Reservation {reservation_id} is {current}, cannot be cancelled")]
pub struct TransitionError {
    pub reservation_id: ReservationId,
    pub current: ReservationStatus,
}

/// A confirmed (or formerly confirmed) hold on capacity of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub target_id: TargetId,
    pub target_kind: TargetKind,
    pub owner_id: UserId,
    pub quantity: Quantity,
    pub status: ReservationStatus,
    pub cancelled_by: CancelledBy,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Creates a new confirmed reservation.
    pub fn confirmed(
        target_id: TargetId,
        target_kind: TargetKind,
        owner_id: UserId,
        quantity: Quantity,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            target_id,
            target_kind,
            owner_id,
            quantity,
            status: ReservationStatus::Confirmed,
            cancelled_by: CancelledBy::None,
            created_at: Utc::now(),
            cancelled_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Moves the reservation to `Cancelled`.
    ///
    /// Fails if the reservation is already terminal; the record is left
    /// untouched in that case.
    pub fn cancel(&mut self, by: CancelledBy, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if !self.status.can_cancel() {
            return Err(TransitionError {
                reservation_id: self.id,
                current: self.status,
            });
        }
        self.status = ReservationStatus::Cancelled;
        self.cancelled_by = by;
        self.cancelled_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation() -> Reservation {
        Reservation::confirmed(
            TargetId::new(),
            TargetKind::Trip,
            UserId::new(),
            Quantity::new(2).unwrap(),
        )
    }

    #[test]
    fn new_reservation_is_confirmed() {
        let r = reservation();
        assert_eq!(r.status, ReservationStatus::Confirmed);
        assert_eq!(r.cancelled_by, CancelledBy::None);
        assert!(r.cancelled_at.is_none());
    }

    #[test]
    fn cancel_records_canceller_and_time() {
        let mut r = reservation();
        let now = Utc::now();
        r.cancel(CancelledBy::Admin, now).unwrap();
        assert_eq!(r.status, ReservationStatus::Cancelled);
        assert_eq!(r.cancelled_by, CancelledBy::Admin);
        assert_eq!(r.cancelled_at, Some(now));
    }

    #[test]
    fn second_cancel_is_rejected_and_leaves_record_unchanged() {
        let mut r = reservation();
        let first = Utc::now();
        r.cancel(CancelledBy::Owner, first).unwrap();

        let err = r.cancel(CancelledBy::Admin, Utc::now()).unwrap_err();
        assert_eq!(err.current, ReservationStatus::Cancelled);
        assert_eq!(r.cancelled_by, CancelledBy::Owner);
        assert_eq!(r.cancelled_at, Some(first));
    }

    #[test]
    fn status_terminal_states() {
        assert!(ReservationStatus::Confirmed.can_cancel());
        assert!(!ReservationStatus::Cancelled.can_cancel());
        assert!(ReservationStatus::Cancelled.is_terminal());
        assert_eq!(
            "cancelled".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::Cancelled
        );
    }
}
