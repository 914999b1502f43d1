//! PostgreSQL-backed stores.
//!
//! Capacity and status changes are single conditional `UPDATE … RETURNING`
//! statements run inside a transaction, so a caller that is dropped before
//! commit leaves no partial effect. Reaction commits lock the user's own
//! reaction row and add their deltas to the tally row in the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    CancelledBy, Capacity, Quantity, ReactionKind, ReactionTally, Reservation, ReservationId,
    TargetId, TargetKind, UserId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    InventoryStore, ReactionChange, ReactionStore, ReconciliationEntry, ReconciliationLog,
    ReservationStore, Result, StoreError,
};

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}

fn corrupt(what: &str, value: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{what}: {value}"))
}

fn to_u32(column: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| corrupt(column, value))
}

fn to_u64(column: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| corrupt(column, value))
}


const CAPACITY_COLUMNS: &str = "target_id, target_kind, max_capacity, available_capacity";

fn row_to_capacity(row: PgRow) -> Result<Capacity> {
    let kind: String = row.try_get("target_kind")?;
    Ok(Capacity {
        target_id: TargetId::from_uuid(row.try_get::<Uuid, _>("target_id")?),
        target_kind: kind.parse().map_err(|_| corrupt("target_kind", &kind))?,
        max_capacity: to_u32("max_capacity", row.try_get("max_capacity")?)?,
        available_capacity: to_u32("available_capacity", row.try_get("available_capacity")?)?,
    })
}

/// PostgreSQL inventory store.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current(&self, target_id: TargetId) -> Result<Capacity> {
        self.capacity(target_id)
            .await?
            .ok_or(StoreError::TargetNotFound(target_id))
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn register(
        &self,
        target_id: TargetId,
        kind: TargetKind,
        max_capacity: u32,
    ) -> Result<Capacity> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO inventory_targets (target_id, target_kind, max_capacity, available_capacity)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (target_id) DO NOTHING
            RETURNING {CAPACITY_COLUMNS}
            "#
        ))
        .bind(target_id.as_uuid())
        .bind(kind.as_str())
        .bind(i64::from(max_capacity))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_capacity(row),
            None => Err(StoreError::TargetExists(target_id)),
        }
    }

    async fn try_reserve(&self, target_id: TargetId, quantity: Quantity) -> Result<Capacity> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_targets
            SET available_capacity = available_capacity - $2, updated_at = NOW()
            WHERE target_id = $1 AND available_capacity >= $2
            RETURNING {CAPACITY_COLUMNS}
            "#
        ))
        .bind(target_id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&mut *tx)
        .await?;

        match row {
            Some(row) => {
                let capacity = row_to_capacity(row)?;
                tx.commit().await?;
                Ok(capacity)
            }
            None => {
                tx.rollback().await?;
                let current = self.current(target_id).await?;
                tracing::debug!(
                    %target_id,
                    requested = quantity.get(),
                    available = current.available_capacity,
                    "capacity guard refused reservation"
                );
                Err(StoreError::InsufficientCapacity {
                    target_id,
                    requested: quantity.get(),
                    available: current.available_capacity,
                })
            }
        }
    }

    async fn release(&self, target_id: TargetId, quantity: Quantity) -> Result<Capacity> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_targets
            SET available_capacity = LEAST(max_capacity, available_capacity + $2),
                updated_at = NOW()
            WHERE target_id = $1
            RETURNING {CAPACITY_COLUMNS}
            "#
        ))
        .bind(target_id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&mut *tx)
        .await?;

        let row = row.ok_or(StoreError::TargetNotFound(target_id))?;
        let capacity = row_to_capacity(row)?;
        tx.commit().await?;
        Ok(capacity)
    }

    async fn capacity(&self, target_id: TargetId) -> Result<Option<Capacity>> {
        let row = sqlx::query(&format!(
            "SELECT {CAPACITY_COLUMNS} FROM inventory_targets WHERE target_id = $1"
        ))
        .bind(target_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_capacity).transpose()
    }

    async fn adjust_max_capacity(&self, target_id: TargetId, new_max: u32) -> Result<Capacity> {
        let mut tx = self.pool.begin().await?;

        // Right-hand sides see the pre-update row, so `max - available` is
        // the reserved quantity before the edit.
        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_targets
            SET max_capacity = $2,
                available_capacity = $2 - (max_capacity - available_capacity),
                updated_at = NOW()
            WHERE target_id = $1 AND (max_capacity - available_capacity) <= $2
            RETURNING {CAPACITY_COLUMNS}
            "#
        ))
        .bind(target_id.as_uuid())
        .bind(i64::from(new_max))
        .fetch_optional(&mut *tx)
        .await?;

        match row {
            Some(row) => {
                let capacity = row_to_capacity(row)?;
                tx.commit().await?;
                Ok(capacity)
            }
            None => {
                tx.rollback().await?;
                let current = self.current(target_id).await?;
                tracing::debug!(
                    %target_id,
                    new_max,
                    reserved = current.reserved(),
                    "capacity edit below reserved seats refused"
                );
                Err(StoreError::CapacityBelowReserved {
                    target_id,
                    requested_max: new_max,
                    reserved: current.reserved(),
                })
            }
        }
    }
}

const RESERVATION_COLUMNS: &str = "id, target_id, target_kind, owner_id, quantity, status, cancelled_by, created_at, cancelled_at";

fn row_to_reservation(row: PgRow) -> Result<Reservation> {
    let kind: String = row.try_get("target_kind")?;
    let status: String = row.try_get("status")?;
    let cancelled_by: String = row.try_get("cancelled_by")?;
    let quantity: i64 = row.try_get("quantity")?;

    Ok(Reservation {
        id: ReservationId::from_uuid(row.try_get::<Uuid, _>("id")?),
        target_id: TargetId::from_uuid(row.try_get::<Uuid, _>("target_id")?),
        target_kind: kind.parse().map_err(|_| corrupt("target_kind", &kind))?,
        owner_id: UserId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
        quantity: Quantity::new(quantity).map_err(|_| corrupt("quantity", quantity))?,
        status: status.parse().map_err(|_| corrupt("status", &status))?,
        cancelled_by: cancelled_by
            .parse()
            .map_err(|_| corrupt("cancelled_by", &cancelled_by))?,
        created_at: row.try_get("created_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
    })
}

/// PostgreSQL reservation store.
#[derive(Clone)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn insert(&self, reservation: &Reservation) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO reservations (id, target_id, target_kind, owner_id, quantity, status, cancelled_by, created_at, cancelled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.target_id.as_uuid())
        .bind(reservation.target_kind.as_str())
        .bind(reservation.owner_id.as_uuid())
        .bind(i64::from(reservation.quantity))
        .bind(reservation.status.as_str())
        .bind(reservation.cancelled_by.as_str())
        .bind(reservation.created_at)
        .bind(reservation.cancelled_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return StoreError::DuplicateReservation(reservation.id);
                }
                if db_err.is_foreign_key_violation() {
                    return StoreError::TargetNotFound(reservation.target_id);
                }
            }
            StoreError::Database(e)
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_reservation).transpose()
    }

    async fn mark_cancelled(
        &self,
        id: ReservationId,
        by: CancelledBy,
        at: DateTime<Utc>,
    ) -> Result<Reservation> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE reservations
            SET status = 'cancelled', cancelled_by = $2, cancelled_at = $3
            WHERE id = $1 AND status = 'confirmed'
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(by.as_str())
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;

        match row {
            Some(row) => {
                let reservation = row_to_reservation(row)?;
                tx.commit().await?;
                Ok(reservation)
            }
            None => {
                tx.rollback().await?;
                let current = self.get(id).await?;
                tracing::debug!(reservation_id = %id, "cancel guard found no confirmed reservation");
                match current {
                    Some(reservation) => Err(StoreError::InvalidTransition {
                        reservation_id: id,
                        current: reservation.status,
                    }),
                    None => Err(StoreError::ReservationNotFound(id)),
                }
            }
        }
    }

    async fn discard(&self, id: ReservationId) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM reservations WHERE id = $1 AND status = 'confirmed'")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            tracing::debug!(reservation_id = %id, "no confirmed reservation to discard");
        }
        Ok(affected == 1)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_reservation).collect()
    }

    async fn list_all(&self) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_reservation).collect()
    }
}

fn parse_kind(value: Option<String>) -> Result<Option<ReactionKind>> {
    value
        .map(|k| k.parse().map_err(|_| corrupt("reaction kind", &k)))
        .transpose()
}

/// PostgreSQL reaction store.
#[derive(Clone)]
pub struct PostgresReactionStore {
    pool: PgPool,
}

impl PostgresReactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_tally(row: PgRow) -> Result<ReactionTally> {
    Ok(ReactionTally::new(
        to_u64("likes", row.try_get("likes")?)?,
        to_u64("dislikes", row.try_get("dislikes")?)?,
    ))
}

fn tally_error(target_id: TargetId, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_check_violation() {
            return StoreError::TallyUnderflow(target_id);
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl ReactionStore for PostgresReactionStore {
    async fn commit(&self, change: ReactionChange) -> Result<ReactionTally> {
        let conflict = || StoreError::ConcurrencyConflict {
            target_id: change.target_id,
            user_id: change.user_id,
        };
        let mut tx = self.pool.begin().await?;

        // Toggles of the same user serialize on this row lock
        let current: Option<String> = sqlx::query_scalar(
            "SELECT kind FROM reactions WHERE target_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(change.target_id.as_uuid())
        .bind(change.user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        if parse_kind(current)? != change.previous {
            tx.rollback().await?;
            tracing::debug!(
                target_id = %change.target_id,
                user_id = %change.user_id,
                "reaction moved since it was read"
            );
            return Err(conflict());
        }

        let written = match (change.previous, change.reaction) {
            (None, Some(kind)) => {
                sqlx::query("INSERT INTO reactions (target_id, user_id, kind) VALUES ($1, $2, $3)")
                    .bind(change.target_id.as_uuid())
                    .bind(change.user_id.as_uuid())
                    .bind(kind.as_str())
                    .execute(&mut *tx)
                    .await
            }
            (Some(_), Some(kind)) => {
                sqlx::query(
                    r#"
                    UPDATE reactions SET kind = $3, reacted_at = NOW()
                    WHERE target_id = $1 AND user_id = $2
                    "#,
                )
                .bind(change.target_id.as_uuid())
                .bind(change.user_id.as_uuid())
                .bind(kind.as_str())
                .execute(&mut *tx)
                .await
            }
            (_, None) => {
                sqlx::query("DELETE FROM reactions WHERE target_id = $1 AND user_id = $2")
                    .bind(change.target_id.as_uuid())
                    .bind(change.user_id.as_uuid())
                    .execute(&mut *tx)
                    .await
            }
        };
        if let Err(e) = written {
            // A concurrent first toggle of the same user inserted the row
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return Err(conflict());
                }
            }
            return Err(e.into());
        }

        let updated = sqlx::query(
            r#"
            UPDATE reaction_tallies
            SET likes = likes + $2, dislikes = dislikes + $3
            WHERE target_id = $1
            RETURNING likes, dislikes
            "#,
        )
        .bind(change.target_id.as_uuid())
        .bind(change.likes_delta)
        .bind(change.dislikes_delta)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| tally_error(change.target_id, e))?;

        let row = match updated {
            Some(row) => row,
            None => sqlx::query(
                r#"
                INSERT INTO reaction_tallies (target_id, likes, dislikes)
                VALUES ($1, $2, $3)
                ON CONFLICT (target_id) DO UPDATE
                SET likes = reaction_tallies.likes + EXCLUDED.likes,
                    dislikes = reaction_tallies.dislikes + EXCLUDED.dislikes
                RETURNING likes, dislikes
                "#,
            )
            .bind(change.target_id.as_uuid())
            .bind(change.likes_delta)
            .bind(change.dislikes_delta)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| tally_error(change.target_id, e))?,
        };

        let tally = row_to_tally(row)?;
        tx.commit().await?;
        Ok(tally)
    }

    async fn tally(&self, target_id: TargetId) -> Result<ReactionTally> {
        let row = sqlx::query("SELECT likes, dislikes FROM reaction_tallies WHERE target_id = $1")
            .bind(target_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_tally)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    async fn user_reaction(
        &self,
        target_id: TargetId,
        user_id: UserId,
    ) -> Result<Option<ReactionKind>> {
        let kind: Option<String> =
            sqlx::query_scalar("SELECT kind FROM reactions WHERE target_id = $1 AND user_id = $2")
                .bind(target_id.as_uuid())
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        parse_kind(kind)
    }
}

/// PostgreSQL reconciliation log.
#[derive(Clone)]
pub struct PostgresReconciliationLog {
    pool: PgPool,
}

impl PostgresReconciliationLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReconciliationLog for PostgresReconciliationLog {
    async fn record(&self, entry: ReconciliationEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reconciliation_entries (target_id, quantity, reservation_id, reason, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.target_id.as_uuid())
        .bind(i64::from(entry.quantity))
        .bind(entry.reservation_id.as_uuid())
        .bind(&entry.reason)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn pending(&self) -> Result<Vec<ReconciliationEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT target_id, quantity, reservation_id, reason, recorded_at
            FROM reconciliation_entries
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let quantity: i64 = row.try_get("quantity")?;
                Ok(ReconciliationEntry {
                    target_id: TargetId::from_uuid(row.try_get::<Uuid, _>("target_id")?),
                    quantity: Quantity::new(quantity).map_err(|_| corrupt("quantity", quantity))?,
                    reservation_id: ReservationId::from_uuid(
                        row.try_get::<Uuid, _>("reservation_id")?,
                    ),
                    reason: row.try_get("reason")?,
                    recorded_at: row.try_get("recorded_at")?,
                })
            })
            .collect()
    }
}

