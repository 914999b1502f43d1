//! Domain layer of the booking core.
//!
//! This crate provides the services that enforce the booking rules on top of
//! the stores:
//! - [`ReservationService`]: create and cancel reservations without ever
//!   overselling a target
//! - [`ReactionService`]: like/dislike toggles with consistent counters
//! - [`InventoryService`]: target registration and capacity edits
//!
//! External collaborators (identity, catalog, audit) are consumed through the
//! traits in [`ports`].

pub mod error;
pub mod inventory;
pub mod ports;
pub mod reaction;
pub mod reservation;
pub mod settings;

pub use error::{Result, ServiceError};
pub use inventory::InventoryService;
pub use reaction::{ReactionService, ToggleOutcome, Transition};
pub use reservation::{CancelReservation, CreateReservation, ReservationService};
pub use settings::ServiceSettings;

use common::Identity;

pub(crate) fn require_admin(caller: &Identity) -> Result<()> {
    if caller.role.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(
            "Administrator role required".to_string(),
        ))
    }
}
