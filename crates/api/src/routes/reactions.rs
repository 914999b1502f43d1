//! Reaction endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::{ReactionKind, TargetId};
use domain::{ServiceError, ToggleOutcome};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, parse_id};
use crate::extract::Caller;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ToggleRequest {
    pub target_id: String,
    pub kind: String,
}

#[derive(Serialize)]
pub struct AggregateResponse {
    pub target_id: TargetId,
    pub likes: u64,
    pub dislikes: u64,
}

#[derive(Serialize)]
pub struct UserReactionResponse {
    pub target_id: TargetId,
    pub reaction: Option<ReactionKind>,
}

/// POST /reactions: toggle the caller's like or dislike.
#[tracing::instrument(skip(state, payload))]
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<ToggleOutcome>, ApiError> {
    let Json(req) = payload?;
    let target_id = parse_id("target_id", &req.target_id)?;
    let kind: ReactionKind = req.kind.parse().map_err(ServiceError::from)?;

    let outcome = state.reactions.toggle(&caller, target_id, kind).await?;
    Ok(Json(outcome))
}

/// GET /reactions/{target_id}: like/dislike counters.
#[tracing::instrument(skip(state))]
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<String>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let target_id = parse_id("target_id", &target_id)?;
    let tally = state.reactions.aggregate(target_id).await?;
    Ok(Json(AggregateResponse {
        target_id,
        likes: tally.likes,
        dislikes: tally.dislikes,
    }))
}

/// GET /reactions/{target_id}/me: the caller's current reaction.
#[tracing::instrument(skip(state))]
pub async fn mine(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(target_id): Path<String>,
) -> Result<Json<UserReactionResponse>, ApiError> {
    let target_id = parse_id("target_id", &target_id)?;
    let reaction = state
        .reactions
        .user_reaction(target_id, caller.user_id)
        .await?;
    Ok(Json(UserReactionResponse {
        target_id,
        reaction,
    }))
}
