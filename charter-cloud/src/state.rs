//! Application state

use sqlx::PgPool;

use crate::BoxError;
use crate::auth::RateLimiter;
use crate::config::Config;
use crate::storage::PhotoStorage;
use crate::stripe::StripeClient;
use crate::weather::WeatherClient;

/// Stripe settings the handlers need besides the client
#[derive(Clone)]
pub struct BillingConfig {
    pub webhook_secret: String,
    pub captain_pro_price_id: String,
    pub captain_pro_yearly_price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub currency: String,
    pub platform_fee_bps: u32,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for user authentication
    pub jwt_secret: String,
    pub stripe: StripeClient,
    pub billing: BillingConfig,
    pub weather: WeatherClient,
    pub photos: PhotoStorage,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect, migrate and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let photos = PhotoStorage::from_config(config).await;
        Ok(Self::from_parts(pool, config, photos))
    }

    /// Assemble state from an existing pool (used by tests with a lazy pool)
    pub fn from_parts(pool: PgPool, config: &Config, photos: PhotoStorage) -> Self {
        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            stripe: StripeClient::new(&config.stripe_secret_key, &config.stripe_api_base),
            billing: BillingConfig {
                webhook_secret: config.stripe_webhook_secret.clone(),
                captain_pro_price_id: config.stripe_captain_pro_price_id.clone(),
                captain_pro_yearly_price_id: config.stripe_captain_pro_yearly_price_id.clone(),
                success_url: config.billing_success_url.clone(),
                cancel_url: config.billing_cancel_url.clone(),
                currency: config.payment_currency.clone(),
                platform_fee_bps: config.platform_fee_bps,
            },
            weather: WeatherClient::new(&config.weather_api_base, &config.marine_api_base),
            photos,
            rate_limiter: RateLimiter::new(),
        }
    }
}
