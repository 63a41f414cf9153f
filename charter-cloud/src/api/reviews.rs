//! Trip reviews

use axum::routing::get;
use axum::{Extension, Json, Router, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{Review, ReviewCreate};

use super::{ApiResult, AppPath, ValidJson, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::error::conflict_on_unique;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/trips/{id}/reviews", get(list_reviews).post(create_review))
}

/// POST /api/trips/{id}/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(trip_id): AppPath<i64>,
    ValidJson(req): ValidJson<ReviewCreate>,
) -> ApiResult<Review> {
    let trip = db::trips::find_by_id(&state.pool, trip_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::TripNotFound))?;

    let eligible = db::bookings::has_completed(&state.pool, trip_id, identity.user_id)
        .await
        .map_err(internal)?;
    if !eligible {
        return Err(AppError::new(ErrorCode::ReviewNotEligible));
    }

    let review = db::reviews::create(
        &state.pool,
        shared::util::snowflake_id(),
        trip_id,
        trip.captain_id,
        identity.user_id,
        &req,
        shared::util::now_millis(),
    )
    .await
    .map_err(|e| AppError::from(conflict_on_unique(e, ErrorCode::ReviewAlreadyExists)))?;

    tracing::info!(review_id = review.id, trip_id, rating = review.rating, "Review created");
    Ok(Json(review))
}

/// GET /api/trips/{id}/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    AppPath(trip_id): AppPath<i64>,
) -> ApiResult<Vec<Review>> {
    let reviews = db::reviews::list_by_trip(&state.pool, trip_id)
        .await
        .map_err(internal)?;
    Ok(Json(reviews))
}
