//! Operator endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use store::ReconciliationEntry;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::AppState;

/// GET /admin/reconciliation: capacity releases awaiting manual repair.
#[tracing::instrument(skip(state))]
pub async fn reconciliation(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<Json<Vec<ReconciliationEntry>>, ApiError> {
    let pending = state.reservations.pending_reconciliation(&caller).await?;
    Ok(Json(pending))
}
