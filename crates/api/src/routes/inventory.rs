//! Capacity endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::Capacity;
use serde::Deserialize;

use crate::error::{ApiError, parse_id};
use crate::extract::Caller;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AdjustCapacityRequest {
    pub max_capacity: i64,
}

/// GET /inventory/{target_id}: committed capacity of a target.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<String>,
) -> Result<Json<Capacity>, ApiError> {
    let target_id = parse_id("target_id", &target_id)?;
    Ok(Json(state.inventory.capacity(target_id).await?))
}

/// PATCH /admin/inventory/{target_id}/capacity: change max capacity.
#[tracing::instrument(skip(state, payload))]
pub async fn adjust_capacity(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(target_id): Path<String>,
    payload: Result<Json<AdjustCapacityRequest>, JsonRejection>,
) -> Result<Json<Capacity>, ApiError> {
    let target_id = parse_id("target_id", &target_id)?;
    let Json(req) = payload?;
    let capacity = state
        .inventory
        .adjust_max_capacity(&caller, target_id, req.max_capacity)
        .await?;
    Ok(Json(capacity))
}
