use std::sync::Arc;

use async_trait::async_trait;
use common::{TargetId, TargetKind};
use store::InventoryStore;

use crate::Result;

/// Read-only metadata about a bookable or reactable target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub target_id: TargetId,
    pub kind: TargetKind,
    pub max_capacity: u32,
}

/// Answers "does this target exist, and what is it?".
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn lookup(&self, target_id: TargetId) -> Result<Option<CatalogEntry>>;
}

/// Catalog backed by the inventory registrations.
///
/// Every catalog item gets a capacity counter when it is created, so the
/// inventory already knows which targets exist and what kind they are.
#[derive(Clone)]
pub struct InventoryCatalog {
    inventory: Arc<dyn InventoryStore>,
}

impl InventoryCatalog {
    pub fn new(inventory: Arc<dyn InventoryStore>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl Catalog for InventoryCatalog {
    async fn lookup(&self, target_id: TargetId) -> Result<Option<CatalogEntry>> {
        let capacity = self.inventory.capacity(target_id).await?;
        Ok(capacity.map(|c| CatalogEntry {
            target_id: c.target_id,
            kind: c.target_kind,
            max_capacity: c.max_capacity,
        }))
    }
}
