//! Shared identifiers and data model for the booking core.

pub mod inventory;
pub mod reaction;
pub mod reservation;
pub mod types;

pub use inventory::{Capacity, InvalidQuantity, Quantity, TargetKind, UnknownTargetKind};
pub use reaction::{ReactionKind, ReactionTally, UnknownReactionKind};
pub use reservation::{CancelledBy, Reservation, ReservationStatus, TransitionError};
pub use types::{Identity, ReservationId, Role, TargetId, UserId};
