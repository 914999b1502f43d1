//! Reservation lifecycle: create, owner cancel, admin cancel.

mod commands;
mod compensation;
mod service;

pub use commands::{CancelReservation, CreateReservation};
pub use service::ReservationService;
