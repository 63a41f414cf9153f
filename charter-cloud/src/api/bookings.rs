//! Booking endpoints

use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Booking, BookingCompletion, BookingCreate, BookingDecision, BookingDecisionRequest,
    BookingStatus,
};

use super::trips::owned_trip;
use super::{ApiResult, AppJson, AppPath, ValidJson, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::db::bookings::NewBooking;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/trips/{id}/bookings", post(create_booking))
        .route("/api/bookings", get(list_my_bookings))
        .route("/api/bookings/{id}/decision", post(decide_booking))
        .route("/api/bookings/{id}/complete", post(complete_booking))
        .route("/api/bookings/{id}/cancel", post(cancel_booking))
}

async fn load_booking(state: &AppState, id: i64) -> Result<Booking, AppError> {
    db::bookings::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))
}

/// POST /api/trips/{id}/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(trip_id): AppPath<i64>,
    ValidJson(req): ValidJson<BookingCreate>,
) -> ApiResult<Booking> {
    let booking = db::bookings::create(
        &state.pool,
        &NewBooking {
            id: shared::util::snowflake_id(),
            trip_id,
            user_id: identity.user_id,
            seats: req.seats,
            note: req.note.as_deref(),
            now: shared::util::now_millis(),
        },
    )
    .await?;
    tracing::info!(booking_id = booking.id, trip_id, seats = booking.seats, "Booking created");
    Ok(Json(booking))
}

/// GET /api/bookings
pub async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<Booking>> {
    let bookings = db::bookings::list_by_user(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(bookings))
}

/// Approve or reject a pending booking. Shared with rule auto-processing.
pub(crate) async fn apply_decision(
    state: &AppState,
    booking: &Booking,
    decision: BookingDecision,
) -> Result<Booking, AppError> {
    let target = decision.target_status();
    let updated = db::bookings::transition(
        &state.pool,
        booking,
        &[BookingStatus::Pending],
        target,
        None,
        shared::util::now_millis(),
    )
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::BookingNotPending))?;
    tracing::info!(booking_id = booking.id, status = target.as_db(), "Booking decided");
    Ok(updated)
}

/// POST /api/bookings/{id}/decision
pub async fn decide_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<BookingDecisionRequest>,
) -> ApiResult<Booking> {
    let booking = load_booking(&state, id).await?;
    owned_trip(&state, &identity, booking.trip_id).await?;
    Ok(Json(apply_decision(&state, &booking, req.decision).await?))
}

/// POST /api/bookings/{id}/complete
pub async fn complete_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
    ValidJson(req): ValidJson<BookingCompletion>,
) -> ApiResult<Booking> {
    let booking = load_booking(&state, id).await?;
    owned_trip(&state, &identity, booking.trip_id).await?;

    let (status, rating) = if req.attended {
        (BookingStatus::Completed, req.participant_rating)
    } else {
        (BookingStatus::NoShow, None)
    };
    let updated = db::bookings::transition(
        &state.pool,
        &booking,
        &[BookingStatus::Confirmed],
        status,
        rating,
        shared::util::now_millis(),
    )
    .await?
    .ok_or_else(|| {
        AppError::with_message(ErrorCode::InvalidRequest, "Only confirmed bookings can be completed")
    })?;
    Ok(Json(updated))
}

/// POST /api/bookings/{id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Booking> {
    let booking = load_booking(&state, id).await?;
    if booking.user_id != identity.user_id {
        return Err(AppError::new(ErrorCode::BookingNotFound));
    }
    if !booking.status().is_some_and(|s| s.is_cancellable()) {
        return Err(AppError::new(ErrorCode::BookingNotCancellable));
    }

    let trip = db::trips::find_by_id(&state.pool, booking.trip_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::TripNotFound))?;
    let now = shared::util::now_millis();
    let status = BookingStatus::cancellation_for(now, trip.departure_at);

    let updated = db::bookings::transition(
        &state.pool,
        &booking,
        &[BookingStatus::Pending, BookingStatus::Confirmed],
        status,
        None,
        now,
    )
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::BookingNotCancellable))?;
    tracing::info!(booking_id = id, status = status.as_db(), "Booking cancelled");
    Ok(Json(updated))
}
