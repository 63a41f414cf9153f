use shared::models::Subscription;
use sqlx::PgPool;

pub struct UpsertSubscription<'a> {
    pub id: &'a str,
    pub user_id: i64,
    pub plan: &'a str,
    pub status: &'a str,
    pub current_period_end: Option<i64>,
    pub now: i64,
}

pub async fn upsert(pool: &PgPool, sub: &UpsertSubscription<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subscriptions (id, user_id, plan, status, current_period_end, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $6)
         ON CONFLICT (id) DO UPDATE SET
            plan = $3, status = $4,
            current_period_end = COALESCE($5, subscriptions.current_period_end),
            updated_at = $6",
    )
    .bind(sub.id)
    .bind(sub.user_id)
    .bind(sub.plan)
    .bind(sub.status)
    .bind(sub.current_period_end)
    .bind(sub.now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Status change from the gateway; returns whether the subscription is known
pub async fn update_status(
    pool: &PgPool,
    id: &str,
    status: &str,
    current_period_end: Option<i64>,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE subscriptions
         SET status = $2, current_period_end = COALESCE($3, current_period_end), updated_at = $4
         WHERE id = $1",
    )
    .bind(id)
    .bind(status)
    .bind(current_period_end)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Latest active (or trialing) subscription of a user
pub async fn find_active(pool: &PgPool, user_id: i64) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM subscriptions
         WHERE user_id = $1 AND status IN ('active', 'trialing')
         ORDER BY updated_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_latest(pool: &PgPool, user_id: i64) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM subscriptions WHERE user_id = $1 ORDER BY updated_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
