//! Booking payments through the Stripe PaymentIntent API
//!
//! Local status follows the gateway through two paths: an explicit sync
//! call and the webhook. Both write with a compare-and-set on the status
//! that was read, so a slow writer can never overwrite a newer state.

use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    BookingStatus, ChargeDecision, Payment, PaymentCreate, PaymentIntentResponse, PaymentStatus,
    PaymentSyncResponse, Reconciliation, charge_decision, reconcile,
};

use super::{ApiResult, AppJson, AppPath, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::db::payments::NewPayment;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments", get(list_my_payments).post(create_payment))
        .route("/api/payments/{id}", get(get_payment))
        .route("/api/payments/{id}/sync", post(sync_payment))
        .route("/api/payments/{id}/cancel", post(cancel_payment))
}

/// Payment visible to the caller. Other users' payments answer 404.
async fn visible_payment(
    state: &AppState,
    identity: &UserIdentity,
    id: i64,
) -> Result<Payment, AppError> {
    db::payments::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .filter(|p| p.visible_to(identity.user_id, identity.is_admin()))
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))
}

/// POST /api/payments
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppJson(req): AppJson<PaymentCreate>,
) -> ApiResult<PaymentIntentResponse> {
    let (booking, trip) = db::bookings::find_with_trip(&state.pool, req.booking_id)
        .await
        .map_err(internal)?
        .filter(|(b, _)| b.user_id == identity.user_id)
        .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;

    if !matches!(
        booking.status(),
        Some(BookingStatus::Pending | BookingStatus::Confirmed)
    ) {
        return Err(AppError::new(ErrorCode::BookingNotPayable)
            .with_detail("booking_status", booking.status.clone()));
    }
    let live = db::payments::find_live_for_booking(&state.pool, booking.id)
        .await
        .map_err(internal)?;
    match (charge_decision(live.as_ref().and_then(Payment::status)), live) {
        (ChargeDecision::AlreadyPaid, _) => {
            return Err(AppError::new(ErrorCode::BookingAlreadyPaid));
        }
        (ChargeDecision::Resume, Some(payment)) => {
            if let Some(resumed) = resume(&state, payment).await? {
                return Ok(Json(resumed));
            }
        }
        _ => {}
    }

    let amount = i64::from(booking.seats) * trip.price_per_seat_cents;
    if amount <= 0 {
        return Err(AppError::with_message(
            ErrorCode::BookingNotPayable,
            "Trip is free of charge",
        ));
    }

    let payment_id = shared::util::snowflake_id();
    let intent = state
        .stripe
        .create_payment_intent(amount, &state.billing.currency, payment_id, booking.id)
        .await?;
    let status = PaymentStatus::from_gateway(&intent.status).unwrap_or(PaymentStatus::Pending);

    let created = db::payments::create(
        &state.pool,
        &NewPayment {
            id: payment_id,
            booking_id: booking.id,
            user_id: identity.user_id,
            amount_cents: amount,
            currency: &intent.currency,
            status,
            gateway_intent_id: &intent.id,
            now: shared::util::now_millis(),
        },
    )
    .await;

    let payment = match created {
        Ok(payment) => payment,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            // A concurrent request opened the booking's charge first
            tracing::warn!(booking_id = booking.id, intent_id = %intent.id, "Duplicate payment intent, cancelling it");
            if let Err(e) = state.stripe.cancel_payment_intent(&intent.id).await {
                tracing::error!(intent_id = %intent.id, error = %e, "Failed to cancel duplicate intent");
            }
            let live = db::payments::find_live_for_booking(&state.pool, booking.id)
                .await
                .map_err(internal)?
                .ok_or_else(|| internal(format!("booking {} lost its live payment", booking.id)))?;
            if charge_decision(live.status()) == ChargeDecision::AlreadyPaid {
                return Err(AppError::new(ErrorCode::BookingAlreadyPaid));
            }
            return resume(&state, live).await?.map(Json).ok_or_else(|| {
                AppError::with_message(ErrorCode::InvalidRequest, "Payment changed, retry")
            });
        }
        Err(e) => return Err(internal(e)),
    };

    tracing::info!(
        payment_id,
        booking_id = booking.id,
        amount_cents = amount,
        intent_id = %intent.id,
        "Payment intent created"
    );
    Ok(Json(PaymentIntentResponse {
        payment,
        client_secret: intent.client_secret,
    }))
}

/// The booking's open intent, handed back instead of charging twice.
/// `None` when the gateway already cancelled it; the local row is updated
/// so a new intent can be opened.
async fn resume(
    state: &AppState,
    payment: Payment,
) -> Result<Option<PaymentIntentResponse>, AppError> {
    let intent = state
        .stripe
        .retrieve_payment_intent(&payment.gateway_intent_id)
        .await?;
    if PaymentStatus::from_gateway(&intent.status) == Some(PaymentStatus::Cancelled) {
        apply_gateway_status(state, payment, &intent.status, None).await?;
        return Ok(None);
    }

    tracing::info!(payment_id = payment.id, booking_id = payment.booking_id, "Resuming open payment intent");
    Ok(Some(PaymentIntentResponse {
        payment,
        client_secret: intent.client_secret,
    }))
}

/// GET /api/payments
pub async fn list_my_payments(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<Payment>> {
    let payments = db::payments::list_by_user(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(payments))
}

/// GET /api/payments/{id}
pub async fn get_payment(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Payment> {
    Ok(Json(visible_payment(&state, &identity, id).await?))
}

/// Outcome of applying a gateway status to a local payment
pub struct Applied {
    pub payment: Payment,
    pub updated: bool,
}

/// Reconcile `payment` with `gateway_status` and persist the result.
///
/// The write only lands while the row still carries the status that was
/// read; when another writer got there first the current row is returned.
pub async fn apply_gateway_status(
    state: &AppState,
    payment: Payment,
    gateway_status: &str,
    failure_reason: Option<&str>,
) -> Result<Applied, AppError> {
    let Some(local) = payment.status() else {
        return Err(internal(format!(
            "payment {} has unknown status {}",
            payment.id, payment.status
        )));
    };

    let next = match reconcile(local, gateway_status) {
        Reconciliation::Update(next) => next,
        Reconciliation::Unchanged => {
            return Ok(Applied {
                payment,
                updated: false,
            });
        }
        Reconciliation::UnknownGatewayStatus => {
            tracing::warn!(
                payment_id = payment.id,
                gateway_status,
                "Unknown gateway status, payment left unchanged"
            );
            return Ok(Applied {
                payment,
                updated: false,
            });
        }
    };

    let now = shared::util::now_millis();
    let written = db::payments::update_status_if(
        &state.pool,
        payment.id,
        local,
        next,
        failure_reason,
        now,
    )
    .await
    .map_err(internal)?;

    let Some(updated) = written else {
        tracing::info!(payment_id = payment.id, "Payment changed concurrently, re-reading");
        let current = db::payments::find_by_id(&state.pool, payment.id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
        return Ok(Applied {
            payment: current,
            updated: false,
        });
    };

    if next == PaymentStatus::Succeeded {
        let confirmed = db::bookings::confirm_if_pending(&state.pool, updated.booking_id, now)
            .await
            .map_err(internal)?;
        if confirmed {
            tracing::info!(booking_id = updated.booking_id, "Booking confirmed by payment");
        }
    }

    tracing::info!(
        payment_id = updated.id,
        from = local.as_db(),
        to = next.as_db(),
        "Payment status updated"
    );
    Ok(Applied {
        payment: updated,
        updated: true,
    })
}

/// POST /api/payments/{id}/sync
pub async fn sync_payment(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<PaymentSyncResponse> {
    let payment = visible_payment(&state, &identity, id).await?;
    let intent = state
        .stripe
        .retrieve_payment_intent(&payment.gateway_intent_id)
        .await?;

    let failure = intent.failure_message();
    let applied = apply_gateway_status(&state, payment, &intent.status, failure.as_deref()).await?;
    Ok(Json(PaymentSyncResponse {
        payment: applied.payment,
        gateway_status: intent.status,
        updated: applied.updated,
    }))
}

/// POST /api/payments/{id}/cancel
pub async fn cancel_payment(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Payment> {
    let payment = visible_payment(&state, &identity, id).await?;
    let local = payment
        .status()
        .ok_or_else(|| internal(format!("payment {id} has unknown status")))?;
    if let Some(code) = local.cancel_refusal() {
        return Err(AppError::new(code).with_detail("status", local.as_db()));
    }

    let intent = state
        .stripe
        .cancel_payment_intent(&payment.gateway_intent_id)
        .await?;

    let now = shared::util::now_millis();
    let cancelled = db::payments::update_status_if(
        &state.pool,
        payment.id,
        local,
        PaymentStatus::Cancelled,
        None,
        now,
    )
    .await
    .map_err(internal)?;

    let Some(cancelled) = cancelled else {
        // The webhook may have recorded the cancellation first
        let current = db::payments::find_by_id(&state.pool, id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
        tracing::info!(payment_id = id, status = %current.status, intent_status = %intent.status, "Payment changed during cancel");
        return Ok(Json(current));
    };

    if let Some(booking) = db::bookings::find_by_id(&state.pool, cancelled.booking_id)
        .await
        .map_err(internal)?
    {
        db::bookings::transition(
            &state.pool,
            &booking,
            &[BookingStatus::Pending],
            BookingStatus::Cancelled,
            None,
            now,
        )
        .await?;
    }

    tracing::info!(payment_id = id, "Payment cancelled");
    Ok(Json(cancelled))
}
