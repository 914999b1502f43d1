//! Shared application state.

use std::sync::Arc;

use domain::ports::{AuditLog, IdentityProvider, InventoryCatalog};
use domain::{InventoryService, ReactionService, ReservationService, ServiceSettings};
use sqlx::PgPool;
use store::{
    InMemoryInventoryStore, InMemoryReactionStore, InMemoryReconciliationLog,
    InMemoryReservationStore, InventoryStore, PostgresInventoryStore, PostgresReactionStore,
    PostgresReconciliationLog, PostgresReservationStore, ReactionStore, ReconciliationLog,
    ReservationStore,
};

/// The stores a server instance runs on.
#[derive(Clone)]
pub struct Backends {
    pub inventory: Arc<dyn InventoryStore>,
    pub reservations: Arc<dyn ReservationStore>,
    pub reactions: Arc<dyn ReactionStore>,
    pub reconciliation: Arc<dyn ReconciliationLog>,
}

impl Backends {
    pub fn in_memory() -> Self {
        Self {
            inventory: Arc::new(InMemoryInventoryStore::new()),
            reservations: Arc::new(InMemoryReservationStore::new()),
            reactions: Arc::new(InMemoryReactionStore::new()),
            reconciliation: Arc::new(InMemoryReconciliationLog::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            inventory: Arc::new(PostgresInventoryStore::new(pool.clone())),
            reservations: Arc::new(PostgresReservationStore::new(pool.clone())),
            reactions: Arc::new(PostgresReactionStore::new(pool.clone())),
            reconciliation: Arc::new(PostgresReconciliationLog::new(pool)),
        }
    }
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub reservations: ReservationService,
    pub reactions: ReactionService,
    pub inventory: InventoryService,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        backends: Backends,
        identity: Arc<dyn IdentityProvider>,
        audit: Arc<dyn AuditLog>,
        settings: ServiceSettings,
    ) -> Self {
        let catalog = Arc::new(InventoryCatalog::new(backends.inventory.clone()));

        Self {
            reservations: ReservationService::new(
                backends.inventory.clone(),
                backends.reservations,
                catalog.clone(),
                backends.reconciliation,
                audit.clone(),
                settings,
            ),
            reactions: ReactionService::new(backends.reactions, catalog, audit.clone(), settings),
            inventory: InventoryService::new(backends.inventory, audit, settings),
            identity,
        }
    }
}
