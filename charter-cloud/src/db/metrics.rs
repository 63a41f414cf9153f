//! Per-user aggregates feeding approval scoring and badge criteria

use shared::models::{ExperienceLevel, UserMetrics};
use shared::scoring::ParticipantStats;
use sqlx::PgPool;

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    user_id: i64,
    experience_level: String,
    average_rating: Option<f64>,
    completed_trips: i64,
    no_shows: i64,
    late_cancellations: i64,
}

impl From<ParticipantRow> for ParticipantStats {
    fn from(row: ParticipantRow) -> Self {
        Self {
            user_id: row.user_id,
            experience_level: ExperienceLevel::from_db(&row.experience_level)
                .unwrap_or(ExperienceLevel::Beginner),
            average_rating: row.average_rating,
            completed_trips: row.completed_trips,
            no_shows: row.no_shows,
            late_cancellations: row.late_cancellations,
        }
    }
}

/// Booking history of each user in `user_ids`
pub async fn participant_stats(
    pool: &PgPool,
    user_ids: &[i64],
) -> Result<Vec<ParticipantStats>, sqlx::Error> {
    let rows: Vec<ParticipantRow> = sqlx::query_as(
        "SELECT u.id AS user_id, u.experience_level,
                AVG(b.participant_rating)::DOUBLE PRECISION AS average_rating,
                COUNT(*) FILTER (WHERE b.status = 'completed') AS completed_trips,
                COUNT(*) FILTER (WHERE b.status = 'no_show') AS no_shows,
                COUNT(*) FILTER (WHERE b.status = 'late_cancelled') AS late_cancellations
         FROM users u
         LEFT JOIN bookings b ON b.user_id = u.id
         WHERE u.id = ANY($1)
         GROUP BY u.id, u.experience_level",
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Badge metrics for the given users, or for everyone when `user_ids` is `None`
pub async fn user_metrics(
    pool: &PgPool,
    user_ids: Option<&[i64]>,
) -> Result<Vec<UserMetrics>, sqlx::Error> {
    sqlx::query_as(
        "WITH catches AS (
             SELECT d.user_id, c.value AS catch
             FROM diary_entries d, jsonb_array_elements(d.catches) c
         )
         SELECT u.id AS user_id,
                (SELECT COUNT(*) FROM bookings b
                  WHERE b.user_id = u.id AND b.status = 'completed') AS trips_completed,
                (SELECT COUNT(*) FROM catches c WHERE c.user_id = u.id) AS catches_logged,
                (SELECT COUNT(DISTINCT LOWER(TRIM(c.catch->>'species')))
                   FROM catches c WHERE c.user_id = u.id) AS species_count,
                (SELECT COUNT(*) FROM reviews r WHERE r.author_id = u.id) AS reviews_written,
                COALESCE((SELECT MAX((c.catch->>'weight_grams')::BIGINT)
                            FROM catches c WHERE c.user_id = u.id), 0) AS biggest_catch_grams
         FROM users u
         WHERE $1::BIGINT[] IS NULL OR u.id = ANY($1)
         ORDER BY u.id",
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await
}
