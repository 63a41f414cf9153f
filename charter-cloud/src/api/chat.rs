//! Custom chat message cards

use axum::routing::post;
use axum::{Extension, Json, Router, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Booking, CardKind, CardRequest, FishCatch, GroupTrip, MessageCard, TripWithAvailability,
    format_money,
};
use shared::util::millis_to_datetime;

use super::diary::owned_entry;
use super::{ApiResult, AppJson, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat/cards", post(build_card))
}

fn trip_invite_card(trip: &TripWithAvailability, currency: &str) -> MessageCard {
    let t = &trip.trip;
    MessageCard::new(CardKind::TripInvite, &t.title, format!("/trips/{}", t.id))
        .subtitle(&t.location)
        .field(
            "Departure",
            millis_to_datetime(t.departure_at)
                .format("%Y-%m-%d %H:%M UTC")
                .to_string(),
        )
        .field("Seats left", trip.seats_left.to_string())
        .field("Price per seat", format_money(t.price_per_seat_cents, currency))
}

fn catch_share_card(entry_id: i64, location: Option<&str>, catch: &FishCatch) -> MessageCard {
    let mut card = MessageCard::new(CardKind::CatchShare, &catch.species, format!("/diary/{entry_id}"));
    if let Some(location) = location {
        card = card.subtitle(location);
    }
    if let Some(w) = catch.weight_grams {
        card = card.field("Weight", format!("{:.2} kg", w as f64 / 1000.0));
    }
    if let Some(l) = catch.length_mm {
        card = card.field("Length", format!("{:.1} cm", f64::from(l) / 10.0));
    }
    card.field("Released", if catch.released { "yes" } else { "no" })
}

fn payment_request_card(booking: &Booking, trip: &GroupTrip, currency: &str) -> MessageCard {
    let amount = i64::from(booking.seats) * trip.price_per_seat_cents;
    MessageCard::new(
        CardKind::PaymentRequest,
        format!("Payment for {}", trip.title),
        format!("/bookings/{}/pay", booking.id),
    )
    .field("Seats", booking.seats.to_string())
    .field("Amount", format_money(amount, currency))
    .field("Booking status", booking.status.clone())
}

/// POST /api/chat/cards
pub async fn build_card(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppJson(req): AppJson<CardRequest>,
) -> ApiResult<MessageCard> {
    let currency = &state.billing.currency;
    let card = match req {
        CardRequest::TripInvite { trip_id } => {
            let trip = db::trips::find_with_availability(&state.pool, trip_id)
                .await
                .map_err(internal)?
                .ok_or_else(|| AppError::new(ErrorCode::TripNotFound))?;
            trip_invite_card(&trip, currency)
        }
        CardRequest::CatchShare {
            entry_id,
            catch_index,
        } => {
            let entry = owned_entry(&state, &identity, entry_id).await?;
            let catch = entry
                .catches
                .get(catch_index)
                .ok_or_else(|| AppError::new(ErrorCode::CatchNotFound))?;
            catch_share_card(entry.id, entry.location.as_deref(), catch)
        }
        CardRequest::PaymentRequest { booking_id } => {
            let (booking, trip) = db::bookings::find_with_trip(&state.pool, booking_id)
                .await
                .map_err(internal)?
                .filter(|(b, t)| b.user_id == identity.user_id || t.captain_id == identity.user_id)
                .ok_or_else(|| AppError::new(ErrorCode::BookingNotFound))?;
            payment_request_card(&booking, &trip, currency)
        }
    };
    Ok(Json(card))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_card_formats_units() {
        let catch = FishCatch {
            species: "Mahi-mahi".into(),
            weight_grams: Some(8_450),
            length_mm: Some(1_020),
            released: false,
            bait: None,
        };
        let card = catch_share_card(9, Some("Gulf Stream"), &catch);
        assert_eq!(card.kind, CardKind::CatchShare);
        assert_eq!(card.action_path, "/diary/9");
        assert_eq!(card.subtitle.as_deref(), Some("Gulf Stream"));
        let values: Vec<&str> = card.fields.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, ["8.45 kg", "102.0 cm", "no"]);
    }

    #[test]
    fn payment_card_totals_seats() {
        let trip = GroupTrip {
            id: 1,
            captain_id: 2,
            title: "Tarpon at dawn".into(),
            description: None,
            location: "Islamorada".into(),
            latitude: None,
            longitude: None,
            departure_at: 0,
            duration_hours: 4,
            max_participants: 6,
            price_per_seat_cents: 12_550,
            status: "open".into(),
            created_at: 0,
            updated_at: 0,
        };
        let booking = Booking {
            id: 5,
            trip_id: 1,
            user_id: 3,
            seats: 2,
            status: "pending".into(),
            note: None,
            participant_rating: None,
            created_at: 0,
            updated_at: 0,
        };
        let card = payment_request_card(&booking, &trip, "usd");
        assert_eq!(card.title, "Payment for Tarpon at dawn");
        assert_eq!(card.fields[1].value, "251.00 USD");
        assert_eq!(card.action_path, "/bookings/5/pay");
    }
}
