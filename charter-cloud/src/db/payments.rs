use shared::analytics::EarningRow;
use shared::models::{Payment, PaymentStatus};
use sqlx::PgPool;

pub struct NewPayment<'a> {
    pub id: i64,
    pub booking_id: i64,
    pub user_id: i64,
    pub amount_cents: i64,
    pub currency: &'a str,
    pub status: PaymentStatus,
    pub gateway_intent_id: &'a str,
    pub now: i64,
}

pub async fn create(pool: &PgPool, p: &NewPayment<'_>) -> Result<Payment, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO payments (id, booking_id, user_id, amount_cents, currency, status,
                               gateway_intent_id, paid_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7,
                 CASE WHEN $6 = 'succeeded' THEN $8 END, $8, $8)
         RETURNING *",
    )
    .bind(p.id)
    .bind(p.booking_id)
    .bind(p.user_id)
    .bind(p.amount_cents)
    .bind(p.currency)
    .bind(p.status.as_db())
    .bind(p.gateway_intent_id)
    .bind(p.now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_intent(
    pool: &PgPool,
    intent_id: &str,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE gateway_intent_id = $1")
        .bind(intent_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn list_in_range(pool: &PgPool, from: i64, to: i64) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM payments WHERE created_at BETWEEN $1 AND $2 ORDER BY created_at",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// Payments on a captain's trips (payments export)
pub async fn list_for_captain(
    pool: &PgPool,
    captain_id: i64,
    from: i64,
    to: i64,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as(
        "SELECT p.* FROM payments p
         JOIN bookings b ON b.id = p.booking_id
         JOIN trips t ON t.id = b.trip_id
         WHERE t.captain_id = $1 AND p.created_at BETWEEN $2 AND $3
         ORDER BY p.created_at",
    )
    .bind(captain_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// The booking's payment that is not cancelled, if any. The
/// `uq_payments_booking_live` index allows at most one.
pub async fn find_live_for_booking(
    pool: &PgPool,
    booking_id: i64,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE booking_id = $1 AND status <> 'cancelled'")
        .bind(booking_id)
        .fetch_optional(pool)
        .await
}

/// Optimistic status write: only applies while the row still has `expected`.
/// `None` means a concurrent writer changed it first.
pub async fn update_status_if(
    pool: &PgPool,
    id: i64,
    expected: PaymentStatus,
    next: PaymentStatus,
    failure_reason: Option<&str>,
    now: i64,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE payments
         SET status = $3, failure_reason = COALESCE($4, failure_reason), updated_at = $5,
             paid_at = CASE WHEN $3 = 'succeeded' THEN COALESCE(paid_at, $5) ELSE paid_at END
         WHERE id = $1 AND status = $2
         RETURNING *",
    )
    .bind(id)
    .bind(expected.as_db())
    .bind(next.as_db())
    .bind(failure_reason)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Record a refund from the gateway. Only succeeded payments can be refunded.
pub async fn mark_refunded(
    pool: &PgPool,
    intent_id: &str,
    refunded_cents: i64,
    now: i64,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE payments SET status = 'refunded', refunded_cents = $2, updated_at = $3
         WHERE gateway_intent_id = $1 AND status IN ('succeeded', 'refunded')
         RETURNING *",
    )
    .bind(intent_id)
    .bind(refunded_cents)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Captured payments on a captain's trips, for the earnings view
pub async fn earnings_rows(
    pool: &PgPool,
    captain_id: i64,
    from: i64,
    to: i64,
) -> Result<Vec<EarningRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT p.id AS payment_id, t.id AS trip_id, t.title AS trip_title,
                p.amount_cents, p.refunded_cents, p.paid_at
         FROM payments p
         JOIN bookings b ON b.id = p.booking_id
         JOIN trips t ON t.id = b.trip_id
         WHERE t.captain_id = $1
           AND p.status IN ('succeeded', 'refunded')
           AND p.paid_at BETWEEN $2 AND $3
         ORDER BY p.paid_at",
    )
    .bind(captain_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
