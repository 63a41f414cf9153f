use shared::scoring::AutomationRuleSet;
use sqlx::PgPool;
use sqlx::types::Json;

/// Stored rule set of a captain; empty when none was saved
pub async fn find(pool: &PgPool, captain_id: i64) -> Result<AutomationRuleSet, sqlx::Error> {
    let row: Option<(Json<AutomationRuleSet>,)> =
        sqlx::query_as("SELECT rules FROM automation_rules WHERE captain_id = $1")
            .bind(captain_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|r| r.0.0).unwrap_or_default())
}

pub async fn save(
    pool: &PgPool,
    captain_id: i64,
    rules: &AutomationRuleSet,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO automation_rules (captain_id, rules, updated_at) VALUES ($1, $2, $3)
         ON CONFLICT (captain_id) DO UPDATE SET rules = $2, updated_at = $3",
    )
    .bind(captain_id)
    .bind(Json(rules))
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
