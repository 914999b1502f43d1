use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Quantity, ReservationId, TargetId};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A capacity release that could not be completed and needs manual repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationEntry {
    pub target_id: TargetId,
    pub quantity: Quantity,
    pub reservation_id: ReservationId,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

impl ReconciliationEntry {
    pub fn new(
        target_id: TargetId,
        quantity: Quantity,
        reservation_id: ReservationId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            target_id,
            quantity,
            reservation_id,
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Out-of-band sink for failed compensations.
#[async_trait]
pub trait ReconciliationLog: Send + Sync {
    async fn record(&self, entry: ReconciliationEntry) -> Result<()>;

    /// Lists recorded entries, oldest first.
    async fn pending(&self) -> Result<Vec<ReconciliationEntry>>;
}
