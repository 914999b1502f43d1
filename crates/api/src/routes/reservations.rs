//! Reservation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{
    CancelledBy, Reservation, ReservationId, ReservationStatus, TargetId, TargetKind, UserId,
};
use domain::{CancelReservation, CreateReservation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, parse_id};
use crate::extract::Caller;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateReservationRequest {
    pub target_id: String,
    pub target_kind: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub owner: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ReservationResponse {
    pub reservation_id: ReservationId,
    pub target_id: TargetId,
    pub target_kind: TargetKind,
    pub owner_id: UserId,
    pub quantity: u32,
    pub status: ReservationStatus,
    pub cancelled_by: CancelledBy,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            reservation_id: r.id,
            target_id: r.target_id,
            target_kind: r.target_kind,
            owner_id: r.owner_id,
            quantity: r.quantity.get(),
            status: r.status,
            cancelled_by: r.cancelled_by,
            created_at: r.created_at,
            cancelled_at: r.cancelled_at,
        }
    }
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub reservation_id: ReservationId,
    pub status: ReservationStatus,
    pub cancelled_by: CancelledBy,
}

impl From<Reservation> for CancelResponse {
    fn from(r: Reservation) -> Self {
        Self {
            reservation_id: r.id,
            status: r.status,
            cancelled_by: r.cancelled_by,
        }
    }
}

// -- Handlers --

/// POST /reservations: reserve seats for the caller.
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    payload: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let Json(req) = payload?;
    let target_id = parse_id("target_id", &req.target_id)?;
    let target_kind: TargetKind = req
        .target_kind
        .parse()
        .map_err(domain::ServiceError::from)?;

    let reservation = state
        .reservations
        .create(
            &caller,
            CreateReservation::new(target_id, target_kind, req.quantity),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// PATCH /reservations/{id}/cancel: cancel one of the caller's reservations.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let reservation_id = parse_id("reservation id", &id)?;
    let cancelled = state
        .reservations
        .cancel_by_owner(&caller, CancelReservation::new(reservation_id))
        .await?;
    Ok(Json(cancelled.into()))
}

/// PATCH /admin/reservations/{id}/cancel: cancel any reservation.
#[tracing::instrument(skip(state))]
pub async fn admin_cancel(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let reservation_id = parse_id("reservation id", &id)?;
    let cancelled = state
        .reservations
        .cancel_by_admin(&caller, CancelReservation::new(reservation_id))
        .await?;
    Ok(Json(cancelled.into()))
}

/// GET /reservations?owner=me: the caller's reservations.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let Query(query) = query?;
    if let Some(owner) = query.owner.as_deref().filter(|owner| *owner != "me") {
        return Err(ApiError::BadRequest(format!(
            "Unsupported owner filter: {owner}"
        )));
    }

    let reservations = state.reservations.list_for_owner(&caller).await?;
    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}

/// GET /admin/reservations: every reservation.
#[tracing::instrument(skip(state))]
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let reservations = state.reservations.list_all(&caller).await?;
    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}
