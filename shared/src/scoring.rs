//! Participant approval scoring and captain automation rules
//!
//! A captain reviewing pending bookings sees one score per applicant:
//!
//! ```text
//! score = rating/5 * 40 + reliability * 25 + tier * 20 + min(trips, 20)/20 * 15
//!         - (no_shows * 5 + late_cancellations * 2)
//! ```
//!
//! clamped to `0..=100`. Automation rules are evaluated in order and the first
//! enabled rule whose conditions all hold decides the action.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::ExperienceLevel;

pub const RATING_WEIGHT: f64 = 40.0;
pub const RELIABILITY_WEIGHT: f64 = 25.0;
pub const TIER_WEIGHT: f64 = 20.0;
pub const TRIPS_WEIGHT: f64 = 15.0;
/// Trip count at which the trips component saturates
pub const TRIPS_CAP: i64 = 20;
pub const NO_SHOW_PENALTY: f64 = 5.0;
pub const LATE_CANCEL_PENALTY: f64 = 2.0;
/// Rating assumed for participants nobody has rated yet
pub const DEFAULT_RATING: f64 = 3.0;

/// Booking history of one participant, aggregated from completed trips
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticipantStats {
    pub user_id: i64,
    pub experience_level: ExperienceLevel,
    /// Mean captain rating; `None` without rated trips
    pub average_rating: Option<f64>,
    pub completed_trips: i64,
    pub no_shows: i64,
    pub late_cancellations: i64,
}

impl ParticipantStats {
    pub fn rating(&self) -> f64 {
        self.average_rating.unwrap_or(DEFAULT_RATING).clamp(0.0, 5.0)
    }

    /// Share of finished bookings the participant actually showed up for
    pub fn reliability(&self) -> f64 {
        let total = self.completed_trips + self.no_shows + self.late_cancellations;
        if total == 0 {
            return 1.0;
        }
        self.completed_trips as f64 / total as f64
    }

    pub fn score(&self) -> f64 {
        let trips = self.completed_trips.clamp(0, TRIPS_CAP) as f64 / TRIPS_CAP as f64;
        let positive = self.rating() / 5.0 * RATING_WEIGHT
            + self.reliability() * RELIABILITY_WEIGHT
            + self.experience_level.tier_value() * TIER_WEIGHT
            + trips * TRIPS_WEIGHT;
        let penalty = self.no_shows as f64 * NO_SHOW_PENALTY
            + self.late_cancellations as f64 * LATE_CANCEL_PENALTY;
        (positive - penalty).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Approve,
    Reject,
    /// Leave pending, highlighted for the captain
    Flag,
}

/// Conditions are AND-ed; unset conditions always hold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RuleConditions {
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_score: Option<f64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub min_rating: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_reliability: Option<f64>,
    pub min_experience: Option<ExperienceLevel>,
    #[validate(range(min = 0))]
    pub max_no_shows: Option<i64>,
}

impl RuleConditions {
    pub fn matches(&self, stats: &ParticipantStats) -> bool {
        let score = stats.score();
        self.min_score.is_none_or(|min| score >= min)
            && self.min_rating.is_none_or(|min| stats.rating() >= min)
            && self.min_reliability.is_none_or(|min| stats.reliability() >= min)
            && self
                .min_experience
                .is_none_or(|min| stats.experience_level >= min)
            && self.max_no_shows.is_none_or(|max| stats.no_shows <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AutomationRule {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    #[validate(nested)]
    pub conditions: RuleConditions,
    pub action: RuleAction,
}

fn default_enabled() -> bool {
    true
}

/// Full rule list as stored per captain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct AutomationRuleSet {
    #[validate(length(max = 50), nested)]
    pub rules: Vec<AutomationRule>,
}

/// What the rules decided for one applicant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleDecision {
    Matched { rule: String, action: RuleAction },
    Manual,
}

impl RuleDecision {
    pub fn action(&self) -> Option<RuleAction> {
        match self {
            Self::Matched { action, .. } => Some(*action),
            Self::Manual => None,
        }
    }
}

impl AutomationRuleSet {
    pub fn evaluate(&self, stats: &ParticipantStats) -> RuleDecision {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .find(|r| r.conditions.matches(stats))
            .map(|r| RuleDecision::Matched {
                rule: r.name.clone(),
                action: r.action,
            })
            .unwrap_or(RuleDecision::Manual)
    }
}
