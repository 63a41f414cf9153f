use shared::models::{ScheduledReport, ScheduledReportCreate, ScheduledReportUpdate};
use sqlx::PgPool;

pub async fn create(
    pool: &PgPool,
    id: i64,
    owner_id: i64,
    req: &ScheduledReportCreate,
    next_run_at: i64,
    now: i64,
) -> Result<ScheduledReport, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO scheduled_reports (id, owner_id, name, report_type, frequency, format,
                                        recipients, enabled, next_run_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
         RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .bind(&req.name)
    .bind(req.report_type.as_db())
    .bind(req.frequency.as_db())
    .bind(req.format.as_db())
    .bind(&req.recipients)
    .bind(req.enabled)
    .bind(next_run_at)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list_by_owner(
    pool: &PgPool,
    owner_id: i64,
) -> Result<Vec<ScheduledReport>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM scheduled_reports WHERE owner_id = $1 ORDER BY created_at")
        .bind(owner_id)
        .fetch_all(pool)
        .await
}

pub async fn find_owned(
    pool: &PgPool,
    id: i64,
    owner_id: i64,
) -> Result<Option<ScheduledReport>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM scheduled_reports WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

/// `next_run_at` is recomputed by the caller when the frequency changes
pub async fn update(
    pool: &PgPool,
    id: i64,
    owner_id: i64,
    req: &ScheduledReportUpdate,
    next_run_at: Option<i64>,
    now: i64,
) -> Result<Option<ScheduledReport>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE scheduled_reports SET
            name = COALESCE($3, name),
            frequency = COALESCE($4, frequency),
            format = COALESCE($5, format),
            recipients = COALESCE($6, recipients),
            enabled = COALESCE($7, enabled),
            next_run_at = COALESCE($8, next_run_at),
            updated_at = $9
         WHERE id = $1 AND owner_id = $2
         RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .bind(&req.name)
    .bind(req.frequency.map(|f| f.as_db()))
    .bind(req.format.map(|f| f.as_db()))
    .bind(&req.recipients)
    .bind(req.enabled)
    .bind(next_run_at)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM scheduled_reports WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_run(
    pool: &PgPool,
    id: i64,
    ran_at: i64,
    next_run_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE scheduled_reports SET last_run_at = $2, next_run_at = $3, updated_at = $2
         WHERE id = $1",
    )
    .bind(id)
    .bind(ran_at)
    .bind(next_run_at)
    .execute(pool)
    .await?;
    Ok(())
}
