//! Captain subscriptions (Stripe Checkout)

use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CheckoutRequest, Subscription, SubscriptionPlan};

use super::{ApiResult, AppJson, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::state::{AppState, BillingConfig};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/billing/checkout", post(create_checkout))
        .route("/api/billing/subscription", get(current_subscription))
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

fn price_for(billing: &BillingConfig, plan: SubscriptionPlan) -> &str {
    match plan {
        SubscriptionPlan::CaptainPro => &billing.captain_pro_price_id,
        SubscriptionPlan::CaptainProYearly => &billing.captain_pro_yearly_price_id,
    }
}

/// POST /api/billing/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppJson(req): AppJson<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    identity.require_captain()?;

    let user = db::users::find_by_id(&state.pool, identity.user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let customer_id = match user.stripe_customer_id {
        Some(id) => id,
        None => {
            let id = state.stripe.create_customer(&user.email, user.id).await?;
            db::users::set_stripe_customer(&state.pool, user.id, &id)
                .await
                .map_err(internal)?;
            tracing::info!(user_id = user.id, customer = %id, "Stripe customer created");
            id
        }
    };

    let price_id = price_for(&state.billing, req.plan);
    if price_id.is_empty() {
        tracing::error!(plan = req.plan.as_db(), "No Stripe price configured for plan");
        return Err(AppError::new(ErrorCode::PaymentGatewayUnavailable));
    }

    let url = state
        .stripe
        .create_checkout_session(
            &customer_id,
            price_id,
            req.plan.as_db(),
            user.id,
            &state.billing.success_url,
            &state.billing.cancel_url,
        )
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// GET /api/billing/subscription
pub async fn current_subscription(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Subscription> {
    let sub = db::subscriptions::find_latest(&state.pool, identity.user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::SubscriptionNotFound))?;
    Ok(Json(sub))
}
