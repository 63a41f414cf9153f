//! Captain subscription plans

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    CaptainPro,
    CaptainProYearly,
}

impl SubscriptionPlan {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "captain_pro" => Some(Self::CaptainPro),
            "captain_pro_yearly" => Some(Self::CaptainProYearly),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::CaptainPro => "captain_pro",
            Self::CaptainProYearly => "captain_pro_yearly",
        }
    }

    /// Concurrent open trips a captain may publish on this plan
    pub fn max_open_trips(&self) -> i32 {
        match self {
            Self::CaptainPro | Self::CaptainProYearly => 50,
        }
    }
}

/// Trips a captain may keep open without a subscription
pub const FREE_MAX_OPEN_TRIPS: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: String,
    pub user_id: i64,
    pub plan: String,
    pub status: String,
    pub current_period_end: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub plan: SubscriptionPlan,
}
