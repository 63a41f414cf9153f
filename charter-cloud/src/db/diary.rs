use shared::models::{DiaryEntry, DiaryEntryInput};
use sqlx::PgPool;
use sqlx::types::Json;

pub async fn create(
    pool: &PgPool,
    id: i64,
    user_id: i64,
    input: &DiaryEntryInput,
    now: i64,
) -> Result<DiaryEntry, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO diary_entries (id, user_id, trip_id, entry_date, location, latitude, longitude,
                                    weather_summary, notes, catches, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(input.trip_id)
    .bind(input.entry_date)
    .bind(&input.location)
    .bind(input.latitude)
    .bind(input.longitude)
    .bind(&input.weather_summary)
    .bind(&input.notes)
    .bind(Json(&input.catches))
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Entry lookup scoped to its owner
pub async fn find_owned(
    pool: &PgPool,
    id: i64,
    user_id: i64,
) -> Result<Option<DiaryEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM diary_entries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<DiaryEntry>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM diary_entries WHERE user_id = $1 ORDER BY entry_date DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Full replacement of the editable fields; photos are kept
pub async fn update(
    pool: &PgPool,
    id: i64,
    user_id: i64,
    input: &DiaryEntryInput,
    now: i64,
) -> Result<Option<DiaryEntry>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE diary_entries SET
            trip_id = $3, entry_date = $4, location = $5, latitude = $6, longitude = $7,
            weather_summary = $8, notes = $9, catches = $10, updated_at = $11
         WHERE id = $1 AND user_id = $2
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(input.trip_id)
    .bind(input.entry_date)
    .bind(&input.location)
    .bind(input.latitude)
    .bind(input.longitude)
    .bind(&input.weather_summary)
    .bind(&input.notes)
    .bind(Json(&input.catches))
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM diary_entries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Appends once; `false` when the entry no longer exists for this user
pub async fn add_photo_key(
    pool: &PgPool,
    id: i64,
    user_id: i64,
    key: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE diary_entries
         SET photo_keys = CASE WHEN $3 = ANY(photo_keys) THEN photo_keys
                               ELSE array_append(photo_keys, $3) END,
             updated_at = $4
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .bind(key)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
