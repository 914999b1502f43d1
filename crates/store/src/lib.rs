//! Stores for the booking core.
//!
//! Three stores own the mutable state: [`InventoryStore`] (capacity
//! counters), [`ReservationStore`] (reservation records) and
//! [`ReactionStore`] (per-user reactions plus per-target tallies). Each comes
//! with an in-memory and a PostgreSQL implementation.

pub mod error;
pub mod inventory;
pub mod memory;
pub mod postgres;
pub mod reactions;
pub mod reconciliation;
pub mod reservations;

pub use error::{Result, StoreError};
pub use inventory::InventoryStore;
pub use memory::{
    InMemoryInventoryStore, InMemoryReactionStore, InMemoryReconciliationLog,
    InMemoryReservationStore,
};
pub use postgres::{
    PostgresInventoryStore, PostgresReactionStore, PostgresReconciliationLog,
    PostgresReservationStore, run_migrations,
};
pub use reactions::{ReactionChange, ReactionStore};
pub use reconciliation::{ReconciliationEntry, ReconciliationLog};
pub use reservations::ReservationStore;
