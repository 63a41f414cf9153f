//! Badge definitions, rewards and automatic distribution

use axum::routing::{delete, get, patch, post};
use axum::{Extension, Json, Router, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    BadgeCreate, BadgeDefinition, BadgeUpdate, DistributeRequest, DistributionReport, Reward,
    RewardGrant, RewardInventory, plan_distribution,
};

use super::{ApiResult, AppJson, AppPath, ValidJson, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::error::conflict_on_unique;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/badges", get(list_badges).post(create_badge))
        .route("/api/badges/{id}", patch(update_badge).delete(delete_badge))
        .route("/api/rewards/grant", post(grant_reward))
        .route("/api/rewards/{id}", delete(revoke_reward))
        .route("/api/rewards/inventory", get(inventory))
        .route("/api/rewards/distribute", post(distribute))
}

/// GET /api/badges
pub async fn list_badges(State(state): State<AppState>) -> ApiResult<Vec<BadgeDefinition>> {
    let badges = db::badges::list(&state.pool).await.map_err(internal)?;
    Ok(Json(badges))
}

/// POST /api/badges (admin)
pub async fn create_badge(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ValidJson(req): ValidJson<BadgeCreate>,
) -> ApiResult<BadgeDefinition> {
    identity.require_admin()?;
    let badge = db::badges::create(
        &state.pool,
        shared::util::snowflake_id(),
        &req,
        shared::util::now_millis(),
    )
    .await
    .map_err(|e| AppError::from(conflict_on_unique(e, ErrorCode::BadgeCodeExists)))?;
    tracing::info!(badge_id = badge.id, code = %badge.code, "Badge created");
    Ok(Json(badge))
}

/// PATCH /api/badges/{id} (admin)
pub async fn update_badge(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
    ValidJson(req): ValidJson<BadgeUpdate>,
) -> ApiResult<BadgeDefinition> {
    identity.require_admin()?;
    let badge = db::badges::update(&state.pool, id, &req)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::BadgeNotFound))?;
    Ok(Json(badge))
}

/// DELETE /api/badges/{id} (admin); awarded rewards go with it
pub async fn delete_badge(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<serde_json::Value> {
    identity.require_admin()?;
    if !db::badges::delete(&state.pool, id).await.map_err(internal)? {
        return Err(AppError::new(ErrorCode::BadgeNotFound));
    }
    tracing::info!(badge_id = id, "Badge deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// POST /api/rewards/grant (admin)
pub async fn grant_reward(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ValidJson(req): ValidJson<RewardGrant>,
) -> ApiResult<Reward> {
    identity.require_admin()?;
    db::badges::find_by_id(&state.pool, req.badge_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::BadgeNotFound))?;
    db::users::find_profile(&state.pool, req.user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let reward = db::rewards::grant(
        &state.pool,
        shared::util::snowflake_id(),
        req.user_id,
        req.badge_id,
        req.reason.as_deref(),
        shared::util::now_millis(),
    )
    .await
    .map_err(|e| AppError::from(conflict_on_unique(e, ErrorCode::RewardAlreadyGranted)))?;
    tracing::info!(user_id = req.user_id, badge_id = req.badge_id, "Reward granted");
    Ok(Json(reward))
}

/// DELETE /api/rewards/{id} (admin)
pub async fn revoke_reward(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<serde_json::Value> {
    identity.require_admin()?;
    if !db::rewards::revoke(&state.pool, id).await.map_err(internal)? {
        return Err(AppError::new(ErrorCode::RewardNotFound));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// GET /api/rewards/inventory
pub async fn inventory(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<RewardInventory> {
    let rewards = db::rewards::inventory(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(RewardInventory::new(rewards)))
}

/// POST /api/rewards/distribute (admin)
pub async fn distribute(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppJson(req): AppJson<DistributeRequest>,
) -> ApiResult<DistributionReport> {
    identity.require_admin()?;

    let badges = db::badges::list_active(&state.pool).await.map_err(internal)?;
    let only = req.user_id.map(|id| vec![id]);
    let metrics = db::metrics::user_metrics(&state.pool, only.as_deref())
        .await
        .map_err(internal)?;
    let user_ids: Vec<i64> = metrics.iter().map(|m| m.user_id).collect();
    let held = db::rewards::held_badges(&state.pool, &user_ids)
        .await
        .map_err(internal)?;

    let planned = plan_distribution(&badges, &metrics, &held);
    let mut awarded = 0;
    if !req.dry_run {
        let now = shared::util::now_millis();
        for award in &planned {
            let written = db::rewards::grant_if_absent(
                &state.pool,
                shared::util::snowflake_id(),
                award.user_id,
                award.badge_id,
                "automatic distribution",
                now,
            )
            .await
            .map_err(internal)?;
            if written {
                awarded += 1;
            }
        }
    }

    tracing::info!(
        dry_run = req.dry_run,
        users = metrics.len(),
        planned = planned.len(),
        awarded,
        "Reward distribution finished"
    );
    Ok(Json(DistributionReport {
        dry_run: req.dry_run,
        users_evaluated: metrics.len(),
        planned,
        awarded,
    }))
}
