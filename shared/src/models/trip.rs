//! Group Trip Model

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Open,
    Full,
    Cancelled,
    Completed,
}

impl TripStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "full" => Some(Self::Full),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Full => "full",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Cancelled and completed trips are final
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        !self.is_final() && *self != next
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct GroupTrip {
    pub id: i64,
    pub captain_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub departure_at: i64,
    pub duration_hours: i32,
    pub max_participants: i32,
    pub price_per_seat_cents: i64,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl GroupTrip {
    pub fn status(&self) -> Option<TripStatus> {
        TripStatus::from_db(&self.status)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TripCreate {
    #[validate(length(min = 3, max = 120))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub departure_at: i64,
    #[validate(range(min = 1, max = 72))]
    pub duration_hours: i32,
    #[validate(range(min = 1, max = 50))]
    pub max_participants: i32,
    #[validate(range(min = 0))]
    pub price_per_seat_cents: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripStatusUpdate {
    pub status: TripStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripQuery {
    pub status: Option<TripStatus>,
    pub captain_id: Option<i64>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Trip with live seat count, as listed to participants
#[derive(Debug, Clone, Serialize)]
pub struct TripWithAvailability {
    #[serde(flatten)]
    pub trip: GroupTrip,
    pub booked_seats: i64,
    pub seats_left: i64,
}
