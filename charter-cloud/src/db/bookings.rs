//! Booking persistence
//!
//! Every write that changes how many seats a trip holds runs in a
//! transaction that first locks the trip row, so capacity checks and the
//! `open`/`full` flip never race.

use shared::error::{AppError, ErrorCode};
use shared::models::{Booking, BookingStatus, GroupTrip, TripStatus};
use sqlx::{PgPool, Postgres, Transaction};

use super::trips;
use crate::error::{ServiceResult, conflict_on_unique};

pub struct NewBooking<'a> {
    pub id: i64,
    pub trip_id: i64,
    pub user_id: i64,
    pub seats: i32,
    pub note: Option<&'a str>,
    pub now: i64,
}

/// Reserve seats on an open trip
pub async fn create(pool: &PgPool, new: &NewBooking<'_>) -> ServiceResult<Booking> {
    let mut tx = pool.begin().await?;

    let trip = trips::lock_for_update(&mut tx, new.trip_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TripNotFound))?;
    if trip.captain_id == new.user_id {
        return Err(AppError::new(ErrorCode::CannotBookOwnTrip).into());
    }
    match trip.status() {
        Some(TripStatus::Open) => {}
        Some(TripStatus::Full) => return Err(AppError::new(ErrorCode::TripFull).into()),
        _ => return Err(AppError::new(ErrorCode::TripNotOpen).into()),
    }
    if trip.departure_at <= new.now {
        return Err(AppError::new(ErrorCode::TripDepartureInPast).into());
    }

    let booked = trips::booked_seats_tx(&mut tx, trip.id).await?;
    let capacity = i64::from(trip.max_participants);
    let after = booked + i64::from(new.seats);
    if after > capacity {
        return Err(AppError::new(ErrorCode::TripFull)
            .with_detail("seats_left", (capacity - booked).max(0))
            .into());
    }

    let booking: Booking = sqlx::query_as(
        "INSERT INTO bookings (id, trip_id, user_id, seats, status, note, created_at, updated_at)
         VALUES ($1, $2, $3, $4, 'pending', $5, $6, $6)
         RETURNING *",
    )
    .bind(new.id)
    .bind(new.trip_id)
    .bind(new.user_id)
    .bind(new.seats)
    .bind(new.note)
    .bind(new.now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, ErrorCode::BookingAlreadyExists))?;

    if after == capacity {
        trips::set_status_tx(&mut tx, trip.id, TripStatus::Full, new.now).await?;
        tracing::info!(trip_id = trip.id, "Trip is now full");
    }

    tx.commit().await?;
    Ok(booking)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM bookings WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Booking together with its trip, for ownership checks
pub async fn find_with_trip(
    pool: &PgPool,
    id: i64,
) -> Result<Option<(Booking, GroupTrip)>, sqlx::Error> {
    let Some(booking) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let trip = trips::find_by_id(pool, booking.trip_id).await?;
    Ok(trip.map(|t| (booking, t)))
}

pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<Booking>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn list_pending_for_trip(
    pool: &PgPool,
    trip_id: i64,
) -> Result<Vec<Booking>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM bookings WHERE trip_id = $1 AND status = 'pending' ORDER BY created_at",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
}

/// Bookings on the captain's trips created inside the range (for exports)
pub async fn list_for_captain(
    pool: &PgPool,
    captain_id: i64,
    from: i64,
    to: i64,
) -> Result<Vec<Booking>, sqlx::Error> {
    sqlx::query_as(
        "SELECT b.* FROM bookings b JOIN trips t ON t.id = b.trip_id
         WHERE t.captain_id = $1 AND b.created_at BETWEEN $2 AND $3
         ORDER BY b.created_at",
    )
    .bind(captain_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

pub async fn has_completed(pool: &PgPool, trip_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM bookings
                        WHERE trip_id = $1 AND user_id = $2 AND status = 'completed')",
    )
    .bind(trip_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Move a booking from one of `from` to `to`.
///
/// Returns `None` when the booking is no longer in an allowed status. When
/// the move releases seats, a `full` trip is reopened.
pub async fn transition(
    pool: &PgPool,
    booking: &Booking,
    from: &[BookingStatus],
    to: BookingStatus,
    participant_rating: Option<i32>,
    now: i64,
) -> ServiceResult<Option<Booking>> {
    let mut tx = pool.begin().await?;
    let trip = trips::lock_for_update(&mut tx, booking.trip_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TripNotFound))?;

    let from: Vec<&str> = from.iter().map(BookingStatus::as_db).collect();
    let updated: Option<Booking> = sqlx::query_as(
        "UPDATE bookings
         SET status = $2, participant_rating = COALESCE($3, participant_rating), updated_at = $4
         WHERE id = $1 AND status = ANY($5)
         RETURNING *",
    )
    .bind(booking.id)
    .bind(to.as_db())
    .bind(participant_rating)
    .bind(now)
    .bind(&from)
    .fetch_optional(&mut *tx)
    .await?;

    if updated.is_some() && !to.holds_seat() {
        reopen_if_space(&mut tx, &trip, now).await?;
    }

    tx.commit().await?;
    Ok(updated)
}

async fn reopen_if_space(
    tx: &mut Transaction<'_, Postgres>,
    trip: &GroupTrip,
    now: i64,
) -> Result<(), sqlx::Error> {
    if trip.status() != Some(TripStatus::Full) {
        return Ok(());
    }
    let booked = trips::booked_seats_tx(tx, trip.id).await?;
    if booked < i64::from(trip.max_participants) {
        trips::set_status_tx(tx, trip.id, TripStatus::Open, now).await?;
        tracing::info!(trip_id = trip.id, booked, "Trip reopened");
    }
    Ok(())
}

/// Payment success confirms the booking it pays for
pub async fn confirm_if_pending(
    pool: &PgPool,
    booking_id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE bookings SET status = 'confirmed', updated_at = $2
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(booking_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
