//! Custom chat message cards
//!
//! The chat transport lives in the client SDK; the server only resolves the
//! referenced records and hands back a card payload the client attaches to a
//! message.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardRequest {
    TripInvite { trip_id: i64 },
    CatchShare { entry_id: i64, catch_index: usize },
    PaymentRequest { booking_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    TripInvite,
    CatchShare,
    PaymentRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardField {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCard {
    pub kind: CardKind,
    pub title: String,
    pub subtitle: Option<String>,
    pub fields: Vec<CardField>,
    /// In-app path the card opens
    pub action_path: String,
}

impl MessageCard {
    pub fn new(kind: CardKind, title: impl Into<String>, action_path: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            subtitle: None,
            fields: Vec::new(),
            action_path: action_path.into(),
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(CardField {
            label: label.into(),
            value: value.into(),
        });
        self
    }
}

/// Format minor currency units as "123.45 USD"
pub fn format_money(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!(
        "{sign}{}.{:02} {}",
        abs / 100,
        abs % 100,
        currency.to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_request_is_tagged() {
        let req: CardRequest =
            serde_json::from_str(r#"{"kind":"catch_share","entry_id":7,"catch_index":1}"#).unwrap();
        assert_eq!(
            req,
            CardRequest::CatchShare {
                entry_id: 7,
                catch_index: 1
            }
        );
    }

    #[test]
    fn card_builder() {
        let card = MessageCard::new(CardKind::TripInvite, "Reef run", "/trips/1")
            .subtitle("Key West")
            .field("Seats left", "3");
        assert_eq!(card.fields.len(), 1);
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["kind"], "trip_invite");
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(15_005, "usd"), "150.05 USD");
        assert_eq!(format_money(-50, "eur"), "-0.50 EUR");
    }
}
