//! Stripe webhook handler
//!
//! POST /stripe/webhook, raw body for signature verification

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;
use shared::models::{PaymentStatus, SubscriptionPlan};

use super::payments::apply_gateway_status;
use crate::db;
use crate::db::subscriptions::UpsertSubscription;
use crate::state::AppState;
use crate::stripe;

/// Handle incoming Stripe webhook events
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(sig_header) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    let now_secs = chrono::Utc::now().timestamp();
    if let Err(e) =
        stripe::verify_webhook_signature(&body, sig_header, &state.billing.webhook_secret, now_secs)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    let Some(event_id) = event["id"].as_str() else {
        tracing::warn!("Webhook event missing id");
        return StatusCode::BAD_REQUEST;
    };
    tracing::info!(event_id, event_type, "Received Stripe webhook");

    // Claim first, then process: a duplicate delivery finds the claim
    let now = shared::util::now_millis();
    match db::webhook_events::claim(&state.pool, event_id, event_type, now).await {
        Ok(false) => {
            tracing::info!(event_id, "Duplicate webhook event, skipping");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error recording webhook event");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        Ok(true) => {}
    }

    let Some(obj) = event.get("data").and_then(|d| d.get("object")) else {
        return StatusCode::OK;
    };

    let status = match event_type {
        "payment_intent.succeeded"
        | "payment_intent.canceled"
        | "payment_intent.processing" => handle_intent_status(&state, obj).await,
        "payment_intent.payment_failed" => handle_intent_failed(&state, obj).await,
        "charge.refunded" => handle_charge_refunded(&state, obj).await,
        "checkout.session.completed" => handle_checkout_completed(&state, obj).await,
        "customer.subscription.updated" => handle_subscription_updated(&state, obj, None).await,
        "customer.subscription.deleted" => {
            handle_subscription_updated(&state, obj, Some("canceled")).await
        }
        _ => {
            tracing::debug!(event_type, "Unhandled webhook event type");
            StatusCode::OK
        }
    };

    // Let Stripe retry events that failed on our side
    if status.is_server_error()
        && let Err(e) = db::webhook_events::release(&state.pool, event_id).await
    {
        tracing::error!(%e, event_id, "Failed to release webhook claim");
    }
    status
}

async fn payment_for_intent(
    state: &AppState,
    obj: &Value,
) -> Result<Option<shared::models::Payment>, StatusCode> {
    let Some(intent_id) = obj["id"].as_str() else {
        tracing::warn!("payment_intent event missing id");
        return Ok(None);
    };
    match db::payments::find_by_intent(&state.pool, intent_id).await {
        Ok(Some(p)) => Ok(Some(p)),
        Ok(None) => {
            tracing::warn!(intent_id, "No payment for intent");
            Ok(None)
        }
        Err(e) => {
            tracing::error!(%e, "DB error finding payment by intent");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn failure_message(obj: &Value) -> Option<&str> {
    obj.get("last_payment_error")
        .and_then(|e| e["message"].as_str())
}

/// payment_intent.{succeeded,canceled,processing} → map the intent status
async fn handle_intent_status(state: &AppState, obj: &Value) -> StatusCode {
    let payment = match payment_for_intent(state, obj).await {
        Ok(Some(p)) => p,
        Ok(None) => return StatusCode::OK,
        Err(status) => return status,
    };
    let gateway_status = obj["status"].as_str().unwrap_or("");
    match apply_gateway_status(state, payment, gateway_status, failure_message(obj)).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Failed to apply webhook payment status");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// payment_intent.payment_failed → failed, unless already settled
async fn handle_intent_failed(state: &AppState, obj: &Value) -> StatusCode {
    let payment = match payment_for_intent(state, obj).await {
        Ok(Some(p)) => p,
        Ok(None) => return StatusCode::OK,
        Err(status) => return status,
    };
    let Some(local) = payment.status() else {
        return StatusCode::OK;
    };
    if local.is_settled() || local == PaymentStatus::Failed {
        return StatusCode::OK;
    }

    let reason = failure_message(obj);
    match db::payments::update_status_if(
        &state.pool,
        payment.id,
        local,
        PaymentStatus::Failed,
        reason,
        shared::util::now_millis(),
    )
    .await
    {
        Ok(Some(_)) => {
            tracing::info!(payment_id = payment.id, reason = ?reason, "Payment failed");
            StatusCode::OK
        }
        Ok(None) => {
            tracing::info!(payment_id = payment.id, "Payment changed before failure was recorded");
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(%e, "DB error marking payment failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// charge.refunded → refunded with the refunded amount
async fn handle_charge_refunded(state: &AppState, obj: &Value) -> StatusCode {
    let Some(intent_id) = obj["payment_intent"].as_str() else {
        tracing::warn!("charge.refunded missing payment_intent");
        return StatusCode::OK;
    };
    let refunded = obj["amount_refunded"].as_i64().unwrap_or(0);

    match db::payments::mark_refunded(&state.pool, intent_id, refunded, shared::util::now_millis())
        .await
    {
        Ok(Some(p)) => {
            tracing::info!(payment_id = p.id, refunded_cents = refunded, "Payment refunded");
            StatusCode::OK
        }
        Ok(None) => {
            tracing::warn!(intent_id, "Refund for unknown or unsettled payment");
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(%e, "DB error recording refund");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// checkout.session.completed → create the captain's subscription
async fn handle_checkout_completed(state: &AppState, obj: &Value) -> StatusCode {
    let (Some(customer_id), Some(subscription_id)) =
        (obj["customer"].as_str(), obj["subscription"].as_str())
    else {
        tracing::warn!("checkout.session.completed missing customer or subscription");
        return StatusCode::OK;
    };

    let user = match db::users::find_by_stripe_customer(&state.pool, customer_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            tracing::warn!(customer_id, "No user for Stripe customer");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error finding user by Stripe customer");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let plan = obj
        .get("metadata")
        .and_then(|m| m["plan"].as_str())
        .and_then(SubscriptionPlan::from_db)
        .unwrap_or(SubscriptionPlan::CaptainPro);

    let result = db::subscriptions::upsert(
        &state.pool,
        &UpsertSubscription {
            id: subscription_id,
            user_id: user.id,
            plan: plan.as_db(),
            status: "active",
            current_period_end: None,
            now: shared::util::now_millis(),
        },
    )
    .await;

    match result {
        Ok(()) => {
            tracing::info!(user_id = user.id, plan = plan.as_db(), "Subscription activated");
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(%e, "DB error creating subscription");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// customer.subscription.{updated,deleted} → mirror status and period end
async fn handle_subscription_updated(
    state: &AppState,
    obj: &Value,
    forced_status: Option<&str>,
) -> StatusCode {
    let Some(subscription_id) = obj["id"].as_str() else {
        return StatusCode::OK;
    };
    let status = forced_status
        .or_else(|| obj["status"].as_str())
        .unwrap_or("active");
    let period_end = obj["current_period_end"].as_i64().map(|s| s * 1000);

    match db::subscriptions::update_status(
        &state.pool,
        subscription_id,
        status,
        period_end,
        shared::util::now_millis(),
    )
    .await
    {
        Ok(true) => {
            tracing::info!(subscription_id, status, "Subscription updated");
            StatusCode::OK
        }
        Ok(false) => {
            tracing::warn!(subscription_id, "Update for unknown subscription");
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(%e, "DB error updating subscription");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
