use shared::models::{ExportFormat, ExportHistory, ReportType};
use sqlx::PgPool;

pub struct NewExport {
    pub id: i64,
    pub owner_id: i64,
    pub report_id: Option<i64>,
    pub report_type: ReportType,
    pub format: ExportFormat,
    pub range_from: i64,
    pub range_to: i64,
    pub row_count: i64,
    pub size_bytes: i64,
    pub error: Option<String>,
    pub now: i64,
}

pub async fn record(pool: &PgPool, e: &NewExport) -> Result<ExportHistory, sqlx::Error> {
    let status = if e.error.is_some() { "failed" } else { "completed" };
    sqlx::query_as(
        "INSERT INTO export_history (id, owner_id, report_id, report_type, format, range_from,
                                     range_to, row_count, size_bytes, status, error, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING *",
    )
    .bind(e.id)
    .bind(e.owner_id)
    .bind(e.report_id)
    .bind(e.report_type.as_db())
    .bind(e.format.as_db())
    .bind(e.range_from)
    .bind(e.range_to)
    .bind(e.row_count)
    .bind(e.size_bytes)
    .bind(status)
    .bind(&e.error)
    .bind(e.now)
    .fetch_one(pool)
    .await
}

pub async fn list_by_owner(
    pool: &PgPool,
    owner_id: i64,
    limit: i64,
) -> Result<Vec<ExportHistory>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM export_history WHERE owner_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
