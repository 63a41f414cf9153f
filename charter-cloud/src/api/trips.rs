//! Group trip endpoints

use axum::routing::{get, patch};
use axum::{Extension, Json, Router, extract::State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    FREE_MAX_OPEN_TRIPS, GroupTrip, SubscriptionPlan, TripCreate, TripQuery, TripStatus,
    TripStatusUpdate, TripWithAvailability,
};

use super::{ApiResult, AppJson, AppPath, AppQuery, ValidJson, internal, page_window};
use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/trips", get(list_trips).post(create_trip))
        .route("/api/trips/{id}", get(get_trip))
        .route("/api/trips/{id}/status", patch(update_trip_status))
}

/// Load a trip and check the caller captains it (admins pass)
pub(crate) async fn owned_trip(
    state: &AppState,
    identity: &UserIdentity,
    trip_id: i64,
) -> Result<GroupTrip, AppError> {
    let trip = db::trips::find_by_id(&state.pool, trip_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::TripNotFound))?;
    if trip.captain_id != identity.user_id && !identity.is_admin() {
        return Err(AppError::new(ErrorCode::NotTripOwner));
    }
    Ok(trip)
}

/// POST /api/trips
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ValidJson(req): ValidJson<TripCreate>,
) -> ApiResult<GroupTrip> {
    identity.require_captain()?;

    let now = shared::util::now_millis();
    if req.departure_at <= now {
        return Err(AppError::new(ErrorCode::TripDepartureInPast));
    }

    let plan = db::subscriptions::find_active(&state.pool, identity.user_id)
        .await
        .map_err(internal)?
        .and_then(|s| SubscriptionPlan::from_db(&s.plan));
    let limit = plan.map_or(FREE_MAX_OPEN_TRIPS, |p| p.max_open_trips());
    let open = db::trips::count_open_by_captain(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;
    if !identity.is_admin() && open >= i64::from(limit) {
        return Err(AppError::new(ErrorCode::PlanLimitReached)
            .with_detail("max_open_trips", limit));
    }

    let trip = db::trips::create(
        &state.pool,
        shared::util::snowflake_id(),
        identity.user_id,
        &req,
        now,
    )
    .await
    .map_err(internal)?;
    tracing::info!(trip_id = trip.id, captain_id = identity.user_id, "Trip created");
    Ok(Json(trip))
}

#[derive(Deserialize)]
pub struct ListTripsQuery {
    pub status: Option<TripStatus>,
    pub captain_id: Option<i64>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListTripsQuery {
    fn filter(&self) -> TripQuery {
        TripQuery {
            status: self.status,
            captain_id: self.captain_id,
            from: self.from,
            to: self.to,
        }
    }
}

/// GET /api/trips
pub async fn list_trips(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListTripsQuery>,
) -> ApiResult<Vec<TripWithAvailability>> {
    let (limit, offset) = page_window(query.page, query.per_page);
    let trips = db::trips::list(&state.pool, &query.filter(), limit, offset)
        .await
        .map_err(internal)?;
    Ok(Json(trips))
}

/// GET /api/trips/{id}
pub async fn get_trip(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<TripWithAvailability> {
    let trip = db::trips::find_with_availability(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::TripNotFound))?;
    Ok(Json(trip))
}

/// PATCH /api/trips/{id}/status
pub async fn update_trip_status(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<TripStatusUpdate>,
) -> ApiResult<GroupTrip> {
    let trip = owned_trip(&state, &identity, id).await?;
    let current = trip
        .status()
        .ok_or_else(|| internal(format!("trip {id} has unknown status {}", trip.status)))?;

    if !current.can_transition_to(req.status) {
        return Err(AppError::new(ErrorCode::TripInvalidTransition)
            .with_detail("from", current.as_db())
            .with_detail("to", req.status.as_db()));
    }

    let updated = db::trips::update_status(
        &state.pool,
        id,
        current,
        req.status,
        shared::util::now_millis(),
    )
    .await
    .map_err(internal)?
    .ok_or_else(|| AppError::with_message(ErrorCode::TripInvalidTransition, "Trip changed concurrently"))?;

    tracing::info!(trip_id = id, from = current.as_db(), to = req.status.as_db(), "Trip status changed");
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;

    #[test]
    fn list_query_from_url() {
        let uri: http::Uri = "/api/trips?status=open&captain_id=7&page=2".parse().unwrap();
        let Query(q) = Query::<ListTripsQuery>::try_from_uri(&uri).unwrap();
        let filter = q.filter();
        assert_eq!(filter.status, Some(TripStatus::Open));
        assert_eq!(filter.captain_id, Some(7));
        assert_eq!(filter.from, None);
        assert_eq!(q.page, Some(2));
    }
}
