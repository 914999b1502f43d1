//! In-memory store implementations.
//!
//! Each store keeps its state behind a single `tokio::sync::RwLock`; a
//! conditional update is evaluated entirely inside one write guard, which
//! gives the same all-or-nothing behaviour as a single SQL statement. The
//! stores also expose fault-injection switches used by tests to exercise
//! compensation and retry paths.

mod inventory;
mod reactions;
mod reconciliation;
mod reservations;

pub use inventory::InMemoryInventoryStore;
pub use reactions::InMemoryReactionStore;
pub use reconciliation::InMemoryReconciliationLog;
pub use reservations::InMemoryReservationStore;
