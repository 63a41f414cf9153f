//! HTTP routes for charter-cloud

pub mod account;
pub mod analytics;
pub mod billing;
pub mod bookings;
pub mod calendar;
pub mod chat;
pub mod diary;
pub mod health;
pub mod participants;
pub mod payments;
pub mod reports;
pub mod reviews;
pub mod rewards;
pub mod stripe_webhook;
pub mod trips;

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use http::request::Parts;
use http::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use shared::error::{AppError, ErrorCode};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use validator::Validate;

use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::auth::user_auth_middleware;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Log an infrastructure error and hide it behind `InternalError`
pub(crate) fn internal(e: impl std::fmt::Display) -> AppError {
    tracing::error!(error = %e, "Request failed");
    AppError::new(ErrorCode::InternalError)
}

/// JSON body whose rejection answers 400 `ValidationFailed` with an `ErrorBody`
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::validation("Invalid request body")
                    .with_detail("body", rejection.body_text())
            })?;
        Ok(Self(value))
    }
}

/// JSON body that is deserialized and then validated.
/// Both kinds of failure answer 400 `ValidationFailed`.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(value) = AppJson::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string, rejected as 400 `ValidationFailed`
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::validation("Invalid query string")
                    .with_detail("query", rejection.body_text())
            })?;
        Ok(Self(value))
    }
}

/// Path parameters, rejected as 400 `InvalidFormat`
pub struct AppPath<T>(pub T);

impl<T, S> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::new(ErrorCode::InvalidFormat).with_detail("path", rejection.body_text())
            })?;
        Ok(Self(value))
    }
}

#[derive(Clone)]
struct SnowflakeRequestId;

impl MakeRequestId for SnowflakeRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&shared::util::snowflake_id().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build the full application router with middleware and state
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    // Public, rate limited per IP
    let login = Router::new()
        .route("/api/auth/login", post(account::login))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));
    let register = Router::new()
        .route("/api/auth/register", post(account::register))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));

    // Stripe webhook (signature-verified, raw body)
    let webhook = Router::new().route("/stripe/webhook", post(stripe_webhook::handle_webhook));

    // JWT authenticated
    let protected = Router::new()
        .merge(account::router())
        .merge(trips::router())
        .merge(bookings::router())
        .merge(payments::router())
        .merge(reviews::router())
        .merge(analytics::router())
        .merge(participants::router())
        .merge(rewards::router())
        .merge(reports::router())
        .merge(diary::router())
        .merge(calendar::router())
        .merge(chat::router())
        .merge(billing::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(login)
        .merge(register)
        .merge(webhook)
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, SnowflakeRequestId))
        .with_state(state)
}

/// Page window from `page`/`per_page` query values
pub(crate) fn page_window(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    (per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_clamps() {
        assert_eq!(page_window(None, None), (20, 0));
        assert_eq!(page_window(Some(3), Some(10)), (10, 20));
        assert_eq!(page_window(Some(0), Some(1000)), (100, 0));
    }
}
