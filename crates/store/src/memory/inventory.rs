use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Capacity, Quantity, TargetId, TargetKind};
use tokio::sync::RwLock;

use crate::{InventoryStore, Result, StoreError};

#[derive(Debug, Default)]
struct InventoryState {
    targets: HashMap<TargetId, Capacity>,
    failing_releases: u32,
}

/// In-memory inventory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<RwLock<InventoryState>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty inventory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` release calls fail with `Unavailable`.
    pub async fn fail_next_releases(&self, count: u32) {
        self.state.write().await.failing_releases = count;
    }

    /// Returns the number of registered targets.
    pub async fn target_count(&self) -> usize {
        self.state.read().await.targets.len()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn register(
        &self,
        target_id: TargetId,
        kind: TargetKind,
        max_capacity: u32,
    ) -> Result<Capacity> {
        let mut state = self.state.write().await;
        if state.targets.contains_key(&target_id) {
            return Err(StoreError::TargetExists(target_id));
        }
        let capacity = Capacity::full(target_id, kind, max_capacity);
        state.targets.insert(target_id, capacity);
        Ok(capacity)
    }

    async fn try_reserve(&self, target_id: TargetId, quantity: Quantity) -> Result<Capacity> {
        let mut state = self.state.write().await;
        let capacity = state
            .targets
            .get_mut(&target_id)
            .ok_or(StoreError::TargetNotFound(target_id))?;

        if !capacity.can_reserve(quantity) {
            return Err(StoreError::InsufficientCapacity {
                target_id,
                requested: quantity.get(),
                available: capacity.available_capacity,
            });
        }

        capacity.available_capacity -= quantity.get();
        Ok(*capacity)
    }

    async fn release(&self, target_id: TargetId, quantity: Quantity) -> Result<Capacity> {
        let mut state = self.state.write().await;

        if state.failing_releases > 0 {
            state.failing_releases -= 1;
            return Err(StoreError::Unavailable(
                "inventory release rejected".to_string(),
            ));
        }

        let capacity = state
            .targets
            .get_mut(&target_id)
            .ok_or(StoreError::TargetNotFound(target_id))?;

        capacity.available_capacity = capacity
            .available_capacity
            .saturating_add(quantity.get())
            .min(capacity.max_capacity);
        Ok(*capacity)
    }

    async fn capacity(&self, target_id: TargetId) -> Result<Option<Capacity>> {
        Ok(self.state.read().await.targets.get(&target_id).copied())
    }

    async fn adjust_max_capacity(&self, target_id: TargetId, new_max: u32) -> Result<Capacity> {
        let mut state = self.state.write().await;
        let capacity = state
            .targets
            .get_mut(&target_id)
            .ok_or(StoreError::TargetNotFound(target_id))?;

        let reserved = capacity.reserved();
        if new_max < reserved {
            return Err(StoreError::CapacityBelowReserved {
                target_id,
                requested_max: new_max,
                reserved,
            });
        }

        capacity.max_capacity = new_max;
        capacity.available_capacity = new_max - reserved;
        Ok(*capacity)
    }
}
