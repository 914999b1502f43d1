use async_trait::async_trait;
use common::{Capacity, Quantity, TargetId, TargetKind};

use crate::Result;

/// Owner of the capacity counters of bookable targets.
///
/// Every mutation is a single conditional update evaluated by the backing
/// store. Callers never read-then-write, so no external lock is needed and
/// concurrent `try_reserve` calls on one target are linearized by the store.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Registers a new target at full availability.
    ///
    /// Fails with `TargetExists` if the id is already registered.
    async fn register(
        &self,
        target_id: TargetId,
        kind: TargetKind,
        max_capacity: u32,
    ) -> Result<Capacity>;

    /// Atomically takes `quantity` seats if at least that many are available.
    ///
    /// Returns the post-mutation snapshot. Fails with `InsufficientCapacity`
    /// (carrying the current availability) or `TargetNotFound`.
    async fn try_reserve(&self, target_id: TargetId, quantity: Quantity) -> Result<Capacity>;

    /// Atomically returns `quantity` seats, clamped to the target's maximum.
    async fn release(&self, target_id: TargetId, quantity: Quantity) -> Result<Capacity>;

    /// Reads the committed capacity of a target.
    ///
    /// Returns None if the target is not registered.
    async fn capacity(&self, target_id: TargetId) -> Result<Option<Capacity>>;

    /// Changes a target's ceiling while preserving seats already reserved.
    ///
    /// With `reserved = max - available`, the edit is rejected with
    /// `CapacityBelowReserved` if `new_max < reserved`; otherwise the result
    /// is `max = new_max`, `available = new_max - reserved`.
    async fn adjust_max_capacity(&self, target_id: TargetId, new_max: u32) -> Result<Capacity>;
}
