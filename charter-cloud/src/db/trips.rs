use shared::models::{GroupTrip, TripCreate, TripQuery, TripStatus, TripWithAvailability};
use sqlx::{PgPool, Postgres, Transaction};

/// Seats taken by pending, confirmed and completed bookings
pub(crate) const BOOKED_SEATS_SQL: &str = "COALESCE((SELECT SUM(b.seats) FROM bookings b
     WHERE b.trip_id = t.id AND b.status IN ('pending', 'confirmed', 'completed')), 0)";

#[derive(sqlx::FromRow)]
struct TripRow {
    #[sqlx(flatten)]
    trip: GroupTrip,
    booked_seats: i64,
}

impl From<TripRow> for TripWithAvailability {
    fn from(row: TripRow) -> Self {
        let seats_left = (i64::from(row.trip.max_participants) - row.booked_seats).max(0);
        Self {
            trip: row.trip,
            booked_seats: row.booked_seats,
            seats_left,
        }
    }
}

pub async fn create(
    pool: &PgPool,
    id: i64,
    captain_id: i64,
    req: &TripCreate,
    now: i64,
) -> Result<GroupTrip, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO trips (id, captain_id, title, description, location, latitude, longitude,
                            departure_at, duration_hours, max_participants, price_per_seat_cents,
                            status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'open', $12, $12)
         RETURNING *",
    )
    .bind(id)
    .bind(captain_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.location)
    .bind(req.latitude)
    .bind(req.longitude)
    .bind(req.departure_at)
    .bind(req.duration_hours)
    .bind(req.max_participants)
    .bind(req.price_per_seat_cents)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<GroupTrip>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM trips WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_with_availability(
    pool: &PgPool,
    id: i64,
) -> Result<Option<TripWithAvailability>, sqlx::Error> {
    let row: Option<TripRow> = sqlx::query_as(&format!(
        "SELECT t.*, {BOOKED_SEATS_SQL}::BIGINT AS booked_seats FROM trips t WHERE t.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

/// Row lock held until the transaction ends; serializes bookings per trip
pub async fn lock_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> Result<Option<GroupTrip>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM trips WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
}

pub async fn list(
    pool: &PgPool,
    query: &TripQuery,
    limit: i64,
    offset: i64,
) -> Result<Vec<TripWithAvailability>, sqlx::Error> {
    let rows: Vec<TripRow> = sqlx::query_as(&format!(
        "SELECT t.*, {BOOKED_SEATS_SQL}::BIGINT AS booked_seats FROM trips t
         WHERE ($1::TEXT IS NULL OR t.status = $1)
           AND ($2::BIGINT IS NULL OR t.captain_id = $2)
           AND ($3::BIGINT IS NULL OR t.departure_at >= $3)
           AND ($4::BIGINT IS NULL OR t.departure_at <= $4)
         ORDER BY t.departure_at ASC
         LIMIT $5 OFFSET $6"
    ))
    .bind(query.status.map(|s| s.as_db()))
    .bind(query.captain_id)
    .bind(query.from)
    .bind(query.to)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Trips the captain has published that still take bookings
pub async fn count_open_by_captain(pool: &PgPool, captain_id: i64) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM trips WHERE captain_id = $1 AND status IN ('open', 'full')",
    )
    .bind(captain_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Compare-and-set on status; `None` when the trip moved on concurrently
pub async fn update_status(
    pool: &PgPool,
    id: i64,
    from: TripStatus,
    to: TripStatus,
    now: i64,
) -> Result<Option<GroupTrip>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE trips SET status = $3, updated_at = $4
         WHERE id = $1 AND status = $2
         RETURNING *",
    )
    .bind(id)
    .bind(from.as_db())
    .bind(to.as_db())
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn set_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    status: TripStatus,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE trips SET status = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(status.as_db())
        .bind(now)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Seats held on a trip, read inside the booking transaction
pub async fn booked_seats_tx(
    tx: &mut Transaction<'_, Postgres>,
    trip_id: i64,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(seats), 0)::BIGINT FROM bookings
         WHERE trip_id = $1 AND status IN ('pending', 'confirmed', 'completed')",
    )
    .bind(trip_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row.0)
}
