pub mod admin;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod reactions;
pub mod reservations;
