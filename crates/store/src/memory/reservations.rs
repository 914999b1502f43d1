use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CancelledBy, Reservation, ReservationId, UserId};
use tokio::sync::RwLock;

use crate::{ReservationStore, Result, StoreError};

#[derive(Debug, Default)]
struct ReservationState {
    reservations: HashMap<ReservationId, Reservation>,
    fail_on_insert: bool,
    insert_delay: Option<Duration>,
}

/// In-memory reservation store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationStore {
    state: Arc<RwLock<ReservationState>>,
}

impl InMemoryReservationStore {
    /// Creates a new empty reservation store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to reject inserts.
    pub async fn set_fail_on_insert(&self, fail: bool) {
        self.state.write().await.fail_on_insert = fail;
    }

    /// Delays every insert, simulating a slow write.
    pub async fn set_insert_delay(&self, delay: Option<Duration>) {
        self.state.write().await.insert_delay = delay;
    }

    /// Returns the number of stored reservations.
    pub async fn reservation_count(&self) -> usize {
        self.state.read().await.reservations.len()
    }

    fn newest_first(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reservations
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert(&self, reservation: &Reservation) -> Result<()> {
        let delay = self.state.read().await.insert_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        if state.fail_on_insert {
            return Err(StoreError::Unavailable(
                "reservation write rejected".to_string(),
            ));
        }
        if state.reservations.contains_key(&reservation.id) {
            return Err(StoreError::DuplicateReservation(reservation.id));
        }
        state
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>> {
        Ok(self.state.read().await.reservations.get(&id).cloned())
    }

    async fn mark_cancelled(
        &self,
        id: ReservationId,
        by: CancelledBy,
        at: DateTime<Utc>,
    ) -> Result<Reservation> {
        let mut state = self.state.write().await;
        let reservation = state
            .reservations
            .get_mut(&id)
            .ok_or(StoreError::ReservationNotFound(id))?;

        reservation
            .cancel(by, at)
            .map_err(|e| StoreError::InvalidTransition {
                reservation_id: e.reservation_id,
                current: e.current,
            })?;
        Ok(reservation.clone())
    }

    async fn discard(&self, id: ReservationId) -> Result<bool> {
        let mut state = self.state.write().await;
        let confirmed = state
            .reservations
            .get(&id)
            .is_some_and(|r| r.status.can_cancel());
        if confirmed {
            state.reservations.remove(&id);
        }
        Ok(confirmed)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Reservation>> {
        let state = self.state.read().await;
        let owned = state
            .reservations
            .values()
            .filter(|r| r.is_owned_by(owner_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(owned))
    }

    async fn list_all(&self) -> Result<Vec<Reservation>> {
        let state = self.state.read().await;
        Ok(Self::newest_first(
            state.reservations.values().cloned().collect(),
        ))
    }
}
