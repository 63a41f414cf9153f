use shared::models::{Review, ReviewCreate};
use sqlx::PgPool;

pub async fn create(
    pool: &PgPool,
    id: i64,
    trip_id: i64,
    captain_id: i64,
    author_id: i64,
    req: &ReviewCreate,
    now: i64,
) -> Result<Review, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO reviews (id, trip_id, captain_id, author_id, rating, captain_score,
                              boat_score, value_score, comment, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(id)
    .bind(trip_id)
    .bind(captain_id)
    .bind(author_id)
    .bind(req.rating)
    .bind(req.captain_score)
    .bind(req.boat_score)
    .bind(req.value_score)
    .bind(&req.comment)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list_by_trip(pool: &PgPool, trip_id: i64) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM reviews WHERE trip_id = $1 ORDER BY created_at DESC")
        .bind(trip_id)
        .fetch_all(pool)
        .await
}

/// Reviews of one captain, or of every captain when `captain_id` is `None`
pub async fn list_for_captain(
    pool: &PgPool,
    captain_id: Option<i64>,
    from: i64,
    to: i64,
) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM reviews
         WHERE ($1::BIGINT IS NULL OR captain_id = $1) AND created_at BETWEEN $2 AND $3
         ORDER BY created_at",
    )
    .bind(captain_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
