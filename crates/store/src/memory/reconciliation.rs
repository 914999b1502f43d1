use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{ReconciliationEntry, ReconciliationLog, Result};

/// In-memory reconciliation log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReconciliationLog {
    entries: Arc<RwLock<Vec<ReconciliationEntry>>>,
}

impl InMemoryReconciliationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReconciliationLog for InMemoryReconciliationLog {
    async fn record(&self, entry: ReconciliationEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<ReconciliationEntry>> {
        Ok(self.entries.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Quantity, ReservationId, TargetId};

    #[tokio::test]
    async fn entries_are_kept_in_order() {
        let log = InMemoryReconciliationLog::new();
        let first = ReconciliationEntry::new(
            TargetId::new(),
            Quantity::new(2).unwrap(),
            ReservationId::new(),
            "release failed",
        );
        let second = ReconciliationEntry::new(
            TargetId::new(),
            Quantity::new(1).unwrap(),
            ReservationId::new(),
            "release failed",
        );

        log.record(first.clone()).await.unwrap();
        log.record(second.clone()).await.unwrap();

        assert_eq!(log.pending().await.unwrap(), vec![first, second]);
    }
}
