use shared::models::{BadgeCreate, BadgeDefinition, BadgeUpdate};
use sqlx::PgPool;

pub async fn create(
    pool: &PgPool,
    id: i64,
    req: &BadgeCreate,
    now: i64,
) -> Result<BadgeDefinition, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO badge_definitions (id, code, name, description, category, rarity, points,
                                        criterion_metric, criterion_threshold, active, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10)
         RETURNING *",
    )
    .bind(id)
    .bind(&req.code)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.category.as_db())
    .bind(req.rarity.as_db())
    .bind(req.points)
    .bind(req.criterion.as_ref().map(|c| c.metric.as_db()))
    .bind(req.criterion.as_ref().map(|c| c.threshold))
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<BadgeDefinition>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM badge_definitions ORDER BY category, code")
        .fetch_all(pool)
        .await
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<BadgeDefinition>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM badge_definitions WHERE active ORDER BY code")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<BadgeDefinition>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM badge_definitions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Partial update; a provided criterion replaces both metric and threshold
pub async fn update(
    pool: &PgPool,
    id: i64,
    req: &BadgeUpdate,
) -> Result<Option<BadgeDefinition>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE badge_definitions SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            category = COALESCE($4, category),
            rarity = COALESCE($5, rarity),
            points = COALESCE($6, points),
            criterion_metric = CASE WHEN $7::TEXT IS NULL THEN criterion_metric ELSE $7 END,
            criterion_threshold = CASE WHEN $7::TEXT IS NULL THEN criterion_threshold ELSE $8 END,
            active = COALESCE($9, active)
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.category.map(|c| c.as_db()))
    .bind(req.rarity.map(|r| r.as_db()))
    .bind(req.points)
    .bind(req.criterion.as_ref().map(|c| c.metric.as_db()))
    .bind(req.criterion.as_ref().map(|c| c.threshold))
    .bind(req.active)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM badge_definitions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
