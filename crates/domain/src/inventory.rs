//! Capacity registration, reads and administrative edits.

use std::sync::Arc;

use common::{Capacity, Identity, TargetId, TargetKind};
use store::InventoryStore;

use crate::ports::{AuditEvent, AuditLog};
use crate::{Result, ServiceError, ServiceSettings, require_admin};

/// Service owning the capacity counters' lifecycle outside of reservations.
pub struct InventoryService {
    inventory: Arc<dyn InventoryStore>,
    audit: Arc<dyn AuditLog>,
    settings: ServiceSettings,
}

impl InventoryService {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        audit: Arc<dyn AuditLog>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            inventory,
            audit,
            settings,
        }
    }

    /// Creates the counter of a new catalog item at full availability.
    #[tracing::instrument(skip(self))]
    pub async fn register(
        &self,
        target_id: TargetId,
        kind: TargetKind,
        max_capacity: u32,
    ) -> Result<Capacity> {
        let capacity = self
            .settings
            .deadline()
            .run(
                "target registration",
                self.inventory.register(target_id, kind, max_capacity),
            )
            .await?;
        tracing::info!(%target_id, %kind, max_capacity, "target registered");
        Ok(capacity)
    }

    /// Reads the committed capacity of a target.
    pub async fn capacity(&self, target_id: TargetId) -> Result<Capacity> {
        self.settings
            .deadline()
            .run("capacity read", self.inventory.capacity(target_id))
            .await?
            .ok_or_else(|| ServiceError::target_not_found(target_id))
    }

    /// Changes a target's max capacity, keeping every reserved seat.
    ///
    /// Rejected when `new_max` is below the number of seats currently
    /// reserved. Requires the admin role.
    #[tracing::instrument(skip(self), fields(user_id = %caller.user_id))]
    pub async fn adjust_max_capacity(
        &self,
        caller: &Identity,
        target_id: TargetId,
        new_max: i64,
    ) -> Result<Capacity> {
        require_admin(caller)?;
        let new_max = u32::try_from(new_max).map_err(|_| {
            ServiceError::Validation(format!("Invalid max capacity: {new_max}"))
        })?;

        let capacity = self
            .settings
            .deadline()
            .run(
                "capacity adjustment",
                self.inventory.adjust_max_capacity(target_id, new_max),
            )
            .await?;

        tracing::info!(
            %target_id,
            max_capacity = capacity.max_capacity,
            available = capacity.available_capacity,
            "max capacity adjusted"
        );
        self.audit.record(AuditEvent::CapacityAdjusted {
            target_id,
            actor_id: caller.user_id,
            max_capacity: capacity.max_capacity,
        });
        Ok(capacity)
    }
}
