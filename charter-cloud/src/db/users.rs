use shared::models::UserProfile;
use sqlx::PgPool;

/// Full user row, only read for login
#[derive(sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub hashed_password: String,
    pub name: String,
    pub role: String,
    pub experience_level: String,
    pub stripe_customer_id: Option<String>,
    pub created_at: i64,
}

impl UserRecord {
    pub fn profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            name: self.name,
            role: self.role,
            experience_level: self.experience_level,
            created_at: self.created_at,
        }
    }
}

pub struct CreateUser<'a> {
    pub id: i64,
    pub email: &'a str,
    pub hashed_password: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    pub experience_level: &'a str,
    pub now: i64,
}

pub async fn create(pool: &PgPool, user: &CreateUser<'_>) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO users (id, email, hashed_password, name, role, experience_level, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id, email, name, role, experience_level, created_at",
    )
    .bind(user.id)
    .bind(user.email)
    .bind(user.hashed_password)
    .bind(user.name)
    .bind(user.role)
    .bind(user.experience_level)
    .bind(user.now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_profile(pool: &PgPool, id: i64) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, email, name, role, experience_level, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_stripe_customer(
    pool: &PgPool,
    user_id: i64,
    stripe_customer_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET stripe_customer_id = $1 WHERE id = $2")
        .bind(stripe_customer_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_by_stripe_customer(
    pool: &PgPool,
    customer_id: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE stripe_customer_id = $1")
        .bind(customer_id)
        .fetch_optional(pool)
        .await
}

/// Ids of every participant, for reward distribution
pub async fn list_ids(pool: &PgPool) -> Result<Vec<i64>, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}
