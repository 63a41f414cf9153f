use shared::models::{Reward, RewardWithBadge};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};

pub async fn grant(
    pool: &PgPool,
    id: i64,
    user_id: i64,
    badge_id: i64,
    reason: Option<&str>,
    now: i64,
) -> Result<Reward, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO rewards (id, user_id, badge_id, reason, awarded_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(badge_id)
    .bind(reason)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Award unless already held; returns whether a row was written
pub async fn grant_if_absent(
    pool: &PgPool,
    id: i64,
    user_id: i64,
    badge_id: i64,
    reason: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO rewards (id, user_id, badge_id, reason, awarded_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (user_id, badge_id) DO NOTHING",
    )
    .bind(id)
    .bind(user_id)
    .bind(badge_id)
    .bind(reason)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn revoke(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM rewards WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn inventory(pool: &PgPool, user_id: i64) -> Result<Vec<RewardWithBadge>, sqlx::Error> {
    sqlx::query_as(
        "SELECT r.id, r.badge_id, b.code, b.name, b.category, b.rarity, b.points,
                r.reason, r.awarded_at
         FROM rewards r JOIN badge_definitions b ON b.id = r.badge_id
         WHERE r.user_id = $1
         ORDER BY r.awarded_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Badge ids each user already holds
pub async fn held_badges(
    pool: &PgPool,
    user_ids: &[i64],
) -> Result<HashMap<i64, HashSet<i64>>, sqlx::Error> {
    let rows: Vec<(i64, i64)> =
        sqlx::query_as("SELECT user_id, badge_id FROM rewards WHERE user_id = ANY($1)")
            .bind(user_ids)
            .fetch_all(pool)
            .await?;
    let mut held: HashMap<i64, HashSet<i64>> = HashMap::new();
    for (user_id, badge_id) in rows {
        held.entry(user_id).or_default().insert(badge_id);
    }
    Ok(held)
}
