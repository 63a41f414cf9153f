//! Booking Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Cancellations closer than this to departure count as late
pub const LATE_CANCELLATION_WINDOW_MS: i64 = 48 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting captain approval and/or payment
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
    LateCancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            "late_cancelled" => Some(Self::LateCancelled),
            "completed" => Some(Self::Completed),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::LateCancelled => "late_cancelled",
            Self::Completed => "completed",
            Self::NoShow => "no_show",
        }
    }

    /// Statuses that hold seats on the trip
    pub const SEAT_HOLDING: [BookingStatus; 3] = [Self::Pending, Self::Confirmed, Self::Completed];

    pub fn holds_seat(&self) -> bool {
        Self::SEAT_HOLDING.contains(self)
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Status a participant cancellation lands in, given how far departure is
    pub fn cancellation_for(now: i64, departure_at: i64) -> Self {
        if departure_at - now < LATE_CANCELLATION_WINDOW_MS {
            Self::LateCancelled
        } else {
            Self::Cancelled
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Booking {
    pub id: i64,
    pub trip_id: i64,
    pub user_id: i64,
    pub seats: i32,
    pub status: String,
    pub note: Option<String>,
    /// Rating the captain gave this participant after the trip
    pub participant_rating: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Booking {
    pub fn status(&self) -> Option<BookingStatus> {
        BookingStatus::from_db(&self.status)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookingCreate {
    #[validate(range(min = 1, max = 20))]
    pub seats: i32,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingDecision {
    Approve,
    Reject,
}

impl BookingDecision {
    pub fn target_status(&self) -> BookingStatus {
        match self {
            Self::Approve => BookingStatus::Confirmed,
            Self::Reject => BookingStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingDecisionRequest {
    pub decision: BookingDecision,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookingCompletion {
    pub attended: bool,
    #[validate(range(min = 1, max = 5))]
    pub participant_rating: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_holding_statuses() {
        assert!(BookingStatus::Pending.holds_seat());
        assert!(BookingStatus::Completed.holds_seat());
        assert!(!BookingStatus::Cancelled.holds_seat());
        assert!(!BookingStatus::NoShow.holds_seat());
    }

    #[test]
    fn late_cancellation_window() {
        let departure = 10 * LATE_CANCELLATION_WINDOW_MS;
        assert_eq!(
            BookingStatus::cancellation_for(departure - LATE_CANCELLATION_WINDOW_MS - 1, departure),
            BookingStatus::Cancelled
        );
        assert_eq!(
            BookingStatus::cancellation_for(departure - 1000, departure),
            BookingStatus::LateCancelled
        );
    }

    #[test]
    fn decisions_map_to_statuses() {
        assert_eq!(BookingDecision::Approve.target_status(), BookingStatus::Confirmed);
        assert_eq!(BookingDecision::Reject.target_status(), BookingStatus::Rejected);
        let req: BookingDecisionRequest = serde_json::from_str(r#"{"decision":"reject"}"#).unwrap();
        assert_eq!(req.decision, BookingDecision::Reject);
    }
}
