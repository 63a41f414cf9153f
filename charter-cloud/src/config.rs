//! Service configuration

use crate::BoxError;

/// Service configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for user authentication
    pub jwt_secret: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Stripe REST base URL (overridable for stripe-mock)
    pub stripe_api_base: String,
    /// Stripe Price ID for the monthly captain plan
    pub stripe_captain_pro_price_id: String,
    /// Stripe Price ID for the yearly captain plan
    pub stripe_captain_pro_yearly_price_id: String,
    /// Redirect after a completed subscription checkout
    pub billing_success_url: String,
    /// Redirect after an abandoned subscription checkout
    pub billing_cancel_url: String,
    /// ISO currency for trip payments
    pub payment_currency: String,
    /// Platform share of trip revenue in basis points
    pub platform_fee_bps: u32,
    /// Forecast API base (open-meteo compatible)
    pub weather_api_base: String,
    /// Marine forecast API base (open-meteo compatible)
    pub marine_api_base: String,
    /// Bucket for diary photos
    pub s3_bucket: String,
    pub s3_region: String,
    /// Custom endpoint (MinIO, LocalStack)
    pub s3_endpoint: Option<String>,
    /// Static credentials; the default AWS chain is used when unset
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    /// Lifetime of presigned upload URLs
    pub upload_url_ttl_secs: u64,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn var_or(name: &str, default: &str) -> String {
        std::env::var(name).unwrap_or_else(|_| default.into())
    }

    fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn optional(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.is_empty())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = Self::var_or("ENVIRONMENT", "development");

        let platform_fee_bps: u32 = Self::parsed_or("PLATFORM_FEE_BPS", 1000);
        if platform_fee_bps > 10_000 {
            return Err("PLATFORM_FEE_BPS must be at most 10000".into());
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: Self::parsed_or("HTTP_PORT", 8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            stripe_secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?,
            stripe_api_base: Self::var_or("STRIPE_API_BASE", "https://api.stripe.com"),
            stripe_captain_pro_price_id: Self::var_or(
                "STRIPE_CAPTAIN_PRO_PRICE_ID",
                "price_captain_pro_monthly",
            ),
            stripe_captain_pro_yearly_price_id: Self::var_or(
                "STRIPE_CAPTAIN_PRO_YEARLY_PRICE_ID",
                "price_captain_pro_yearly",
            ),
            billing_success_url: Self::var_or(
                "BILLING_SUCCESS_URL",
                "http://localhost:3000/billing/success",
            ),
            billing_cancel_url: Self::var_or(
                "BILLING_CANCEL_URL",
                "http://localhost:3000/billing/cancel",
            ),
            payment_currency: Self::var_or("PAYMENT_CURRENCY", "usd").to_lowercase(),
            platform_fee_bps,
            weather_api_base: Self::var_or("WEATHER_API_BASE", "https://api.open-meteo.com"),
            marine_api_base: Self::var_or(
                "MARINE_API_BASE",
                "https://marine-api.open-meteo.com",
            ),
            s3_bucket: Self::var_or("S3_BUCKET", "charter-diary-photos"),
            s3_region: Self::var_or("S3_REGION", "us-east-1"),
            s3_endpoint: Self::optional("S3_ENDPOINT"),
            s3_access_key_id: Self::optional("S3_ACCESS_KEY_ID"),
            s3_secret_access_key: Self::optional("S3_SECRET_ACCESS_KEY"),
            upload_url_ttl_secs: Self::parsed_or("UPLOAD_URL_TTL_SECS", 900),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
