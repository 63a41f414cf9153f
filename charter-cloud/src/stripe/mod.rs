//! Stripe integration via REST API (no SDK dependency)

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Webhook events older than this are rejected as replays
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum StripeError {
    /// Network failure or timeout talking to Stripe
    #[error("stripe transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Stripe answered with a non-2xx status
    #[error("stripe api error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl StripeError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if (400..500).contains(status))
    }
}

impl From<StripeError> for AppError {
    fn from(e: StripeError) -> Self {
        tracing::error!(error = %e, "Stripe request failed");
        match &e {
            StripeError::Api { message, .. } if e.is_client_error() => {
                AppError::with_message(ErrorCode::PaymentGatewayRejected, message.clone())
            }
            _ => AppError::new(ErrorCode::PaymentGatewayUnavailable),
        }
    }
}

/// The subset of a PaymentIntent the service reads
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub last_payment_error: Option<serde_json::Value>,
}

impl PaymentIntent {
    pub fn failure_message(&self) -> Option<String> {
        self.last_payment_error
            .as_ref()
            .and_then(|e| e["message"].as_str())
            .map(String::from)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(secret_key: &str, api_base: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            http,
            secret_key: secret_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
        idempotency_key: Option<&str>,
    ) -> Result<T, StripeError> {
        let mut req = self
            .http
            .post(format!("{}{path}", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form);
        if let Some(key) = idempotency_key {
            req = req.header("Idempotency-Key", key);
        }
        Self::decode(req.send().await?).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, StripeError> {
        let resp = self
            .http
            .get(format!("{}{path}", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        let message = resp
            .json::<ErrorEnvelope>()
            .await
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| status.to_string());
        Err(StripeError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Create a PaymentIntent for a booking. The local payment id doubles as
    /// the idempotency key so a retried request never charges twice.
    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        payment_id: i64,
        booking_id: i64,
    ) -> Result<PaymentIntent, StripeError> {
        self.post_form(
            "/v1/payment_intents",
            &[
                ("amount", amount_cents.to_string()),
                ("currency", currency.to_string()),
                ("automatic_payment_methods[enabled]", "true".into()),
                ("metadata[payment_id]", payment_id.to_string()),
                ("metadata[booking_id]", booking_id.to_string()),
            ],
            Some(&format!("payment-{payment_id}")),
        )
        .await
    }

    pub async fn retrieve_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, StripeError> {
        self.get(&format!("/v1/payment_intents/{intent_id}")).await
    }

    pub async fn cancel_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, StripeError> {
        self.post_form(&format!("/v1/payment_intents/{intent_id}/cancel"), &[], None)
            .await
    }

    /// Create a Stripe Customer, returns its id
    pub async fn create_customer(&self, email: &str, user_id: i64) -> Result<String, StripeError> {
        #[derive(Deserialize)]
        struct Customer {
            id: String,
        }
        let customer: Customer = self
            .post_form(
                "/v1/customers",
                &[
                    ("email", email.to_string()),
                    ("metadata[user_id]", user_id.to_string()),
                ],
                None,
            )
            .await?;
        Ok(customer.id)
    }

    /// Create a Checkout Session in subscription mode, returns its URL
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        plan: &str,
        user_id: i64,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String, StripeError> {
        #[derive(Deserialize)]
        struct Session {
            url: Option<String>,
        }
        let session: Session = self
            .post_form(
                "/v1/checkout/sessions",
                &[
                    ("customer", customer_id.to_string()),
                    ("mode", "subscription".into()),
                    ("line_items[0][price]", price_id.to_string()),
                    ("line_items[0][quantity]", "1".into()),
                    ("success_url", success_url.to_string()),
                    ("cancel_url", cancel_url.to_string()),
                    ("metadata[plan]", plan.to_string()),
                    ("metadata[user_id]", user_id.to_string()),
                ],
                None,
            )
            .await?;
        session.url.ok_or_else(|| StripeError::Api {
            status: 502,
            message: "checkout session has no url".into(),
        })
    }
}

/// Verify Stripe webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now_secs: i64,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    if (now_secs - ts).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err("Webhook timestamp outside tolerance");
    }

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Stripe may send several v1 signatures during secret rotation
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if matched {
        Ok(())
    } else {
        Err("Webhook signature mismatch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str, ts: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{ts}.").as_bytes());
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = format!("t=1700000000,v1={}", sign(payload, "whsec", 1_700_000_000));
        assert!(verify_webhook_signature(payload, &header, "whsec", 1_700_000_100).is_ok());
    }

    #[test]
    fn rotated_secret_second_signature() {
        let payload = b"{}";
        let header = format!(
            "t=100,v1={},v1={}",
            sign(payload, "old", 100),
            sign(payload, "new", 100)
        );
        assert!(verify_webhook_signature(payload, &header, "new", 100).is_ok());
    }

    #[test]
    fn rejects_tampering_and_replay() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = format!("t=1000,v1={}", sign(payload, "whsec", 1000));
        assert_eq!(
            verify_webhook_signature(br#"{"id":"evt_2"}"#, &header, "whsec", 1000),
            Err("Webhook signature mismatch")
        );
        assert_eq!(
            verify_webhook_signature(payload, &header, "whsec", 1000 + 301),
            Err("Webhook timestamp outside tolerance")
        );
        assert_eq!(
            verify_webhook_signature(payload, "v1=abc", "whsec", 1000),
            Err("Invalid Stripe-Signature header")
        );
    }

    #[test]
    fn error_mapping() {
        let rejected: AppError = StripeError::Api {
            status: 402,
            message: "card declined".into(),
        }
        .into();
        assert_eq!(rejected.code, ErrorCode::PaymentGatewayRejected);
        assert_eq!(rejected.message, "card declined");

        let down: AppError = StripeError::Api {
            status: 503,
            message: "unavailable".into(),
        }
        .into();
        assert_eq!(down.code, ErrorCode::PaymentGatewayUnavailable);
    }
}
