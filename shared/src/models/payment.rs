//! Payment Model
//!
//! Local payment status plus the lookup table that maps payment-gateway
//! intent statuses onto it.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    RequiresAction,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    Refunded,
}

/// Gateway intent status → local status
const GATEWAY_STATUS_MAP: &[(&str, PaymentStatus)] = &[
    ("requires_payment_method", PaymentStatus::Pending),
    ("requires_confirmation", PaymentStatus::Pending),
    ("requires_action", PaymentStatus::RequiresAction),
    ("processing", PaymentStatus::Processing),
    ("requires_capture", PaymentStatus::Processing),
    ("succeeded", PaymentStatus::Succeeded),
    ("canceled", PaymentStatus::Cancelled),
];

impl PaymentStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "requires_action" => Some(Self::RequiresAction),
            "processing" => Some(Self::Processing),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Map a gateway intent status string. Unknown strings yield `None`.
    pub fn from_gateway(status: &str) -> Option<Self> {
        GATEWAY_STATUS_MAP
            .iter()
            .find(|(gateway, _)| *gateway == status)
            .map(|(_, local)| *local)
    }

    /// Settled payments never move again through status sync
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Cancelled | Self::Refunded)
    }

    pub fn is_cancellable(&self) -> bool {
        !self.is_settled()
    }

    /// Why a cancel request is refused, `None` when it may go ahead
    pub fn cancel_refusal(&self) -> Option<ErrorCode> {
        match self {
            Self::Succeeded => Some(ErrorCode::PaymentAlreadySucceeded),
            s if !s.is_cancellable() => Some(ErrorCode::PaymentNotCancellable),
            _ => None,
        }
    }

    /// Every status but `cancelled` keeps the booking's charge slot taken.
    /// A failed intent can still be retried by the client.
    pub fn holds_booking(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// What a new payment request does, given the booking's live payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeDecision {
    /// Open a new intent
    Create,
    /// Hand back the live intent instead of charging twice
    Resume,
    AlreadyPaid,
}

pub fn charge_decision(live: Option<PaymentStatus>) -> ChargeDecision {
    match live {
        Some(PaymentStatus::Succeeded | PaymentStatus::Refunded) => ChargeDecision::AlreadyPaid,
        Some(status) if status.holds_booking() => ChargeDecision::Resume,
        _ => ChargeDecision::Create,
    }
}

/// Outcome of comparing a local payment with the gateway's view of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Unchanged,
    Update(PaymentStatus),
    UnknownGatewayStatus,
}

pub fn reconcile(local: PaymentStatus, gateway_status: &str) -> Reconciliation {
    let Some(remote) = PaymentStatus::from_gateway(gateway_status) else {
        return Reconciliation::UnknownGatewayStatus;
    };
    if remote == local || local.is_settled() {
        Reconciliation::Unchanged
    } else {
        Reconciliation::Update(remote)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub user_id: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub gateway_intent_id: String,
    pub refunded_cents: i64,
    pub failure_reason: Option<String>,
    /// Set once, when the payment first succeeds
    pub paid_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Payment {
    pub fn status(&self) -> Option<PaymentStatus> {
        PaymentStatus::from_db(&self.status)
    }

    /// Owners see their payments, admins see all
    pub fn visible_to(&self, user_id: i64, is_admin: bool) -> bool {
        is_admin || self.user_id == user_id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCreate {
    pub booking_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentResponse {
    pub payment: Payment,
    /// Secret the browser uses to confirm the intent with the gateway
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentSyncResponse {
    pub payment: Payment,
    pub gateway_status: String,
    pub updated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_mapping() {
        assert_eq!(
            PaymentStatus::from_gateway("requires_payment_method"),
            Some(PaymentStatus::Pending)
        );
        assert_eq!(
            PaymentStatus::from_gateway("requires_action"),
            Some(PaymentStatus::RequiresAction)
        );
        assert_eq!(
            PaymentStatus::from_gateway("requires_capture"),
            Some(PaymentStatus::Processing)
        );
        assert_eq!(
            PaymentStatus::from_gateway("canceled"),
            Some(PaymentStatus::Cancelled)
        );
        assert_eq!(PaymentStatus::from_gateway("exploded"), None);
    }

    #[test]
    fn reconcile_updates_open_payments() {
        assert_eq!(
            reconcile(PaymentStatus::Pending, "succeeded"),
            Reconciliation::Update(PaymentStatus::Succeeded)
        );
        assert_eq!(
            reconcile(PaymentStatus::Failed, "requires_payment_method"),
            Reconciliation::Update(PaymentStatus::Pending)
        );
        assert_eq!(
            reconcile(PaymentStatus::Processing, "processing"),
            Reconciliation::Unchanged
        );
    }

    #[test]
    fn reconcile_never_regresses_settled_payments() {
        assert_eq!(
            reconcile(PaymentStatus::Refunded, "succeeded"),
            Reconciliation::Unchanged
        );
        assert_eq!(
            reconcile(PaymentStatus::Succeeded, "processing"),
            Reconciliation::Unchanged
        );
        assert_eq!(
            reconcile(PaymentStatus::Pending, "mystery"),
            Reconciliation::UnknownGatewayStatus
        );
    }

    #[test]
    fn cancel_refusals() {
        assert_eq!(
            PaymentStatus::Succeeded.cancel_refusal(),
            Some(ErrorCode::PaymentAlreadySucceeded)
        );
        assert_eq!(
            PaymentStatus::Refunded.cancel_refusal(),
            Some(ErrorCode::PaymentNotCancellable)
        );
        assert_eq!(
            PaymentStatus::Cancelled.cancel_refusal(),
            Some(ErrorCode::PaymentNotCancellable)
        );
        assert_eq!(PaymentStatus::Processing.cancel_refusal(), None);
        assert_eq!(PaymentStatus::Failed.cancel_refusal(), None);
    }

    #[test]
    fn one_live_charge_per_booking() {
        assert_eq!(charge_decision(None), ChargeDecision::Create);
        assert_eq!(
            charge_decision(Some(PaymentStatus::Cancelled)),
            ChargeDecision::Create
        );
        for open in [
            PaymentStatus::Pending,
            PaymentStatus::RequiresAction,
            PaymentStatus::Processing,
            PaymentStatus::Failed,
        ] {
            assert_eq!(charge_decision(Some(open)), ChargeDecision::Resume);
        }
        assert_eq!(
            charge_decision(Some(PaymentStatus::Succeeded)),
            ChargeDecision::AlreadyPaid
        );
        assert_eq!(
            charge_decision(Some(PaymentStatus::Refunded)),
            ChargeDecision::AlreadyPaid
        );
    }

    #[test]
    fn only_owner_or_admin_sees_a_payment() {
        let payment = Payment {
            id: 1,
            booking_id: 2,
            user_id: 10,
            amount_cents: 5_000,
            currency: "usd".into(),
            status: "pending".into(),
            gateway_intent_id: "pi_1".into(),
            refunded_cents: 0,
            failure_reason: None,
            paid_at: None,
            created_at: 0,
            updated_at: 0,
        };
        assert!(payment.visible_to(10, false));
        assert!(!payment.visible_to(11, false));
        assert!(payment.visible_to(11, true));
    }

    #[test]
    fn cancellable_statuses() {
        assert!(PaymentStatus::Pending.is_cancellable());
        assert!(PaymentStatus::RequiresAction.is_cancellable());
        assert!(!PaymentStatus::Succeeded.is_cancellable());
        assert!(!PaymentStatus::Cancelled.is_cancellable());
    }
}
