//! Badge definitions and awarded rewards

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Skill,
    Milestone,
    Species,
    Community,
    Seasonal,
}

impl BadgeCategory {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "skill" => Some(Self::Skill),
            "milestone" => Some(Self::Milestone),
            "species" => Some(Self::Species),
            "community" => Some(Self::Community),
            "seasonal" => Some(Self::Seasonal),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Milestone => "milestone",
            Self::Species => "species",
            Self::Community => "community",
            Self::Seasonal => "seasonal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl BadgeRarity {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "common" => Some(Self::Common),
            "uncommon" => Some(Self::Uncommon),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    /// Point multiplier applied to a badge's base points
    pub fn multiplier(&self) -> i64 {
        match self {
            Self::Common => 1,
            Self::Uncommon => 2,
            Self::Rare => 3,
            Self::Epic => 5,
            Self::Legendary => 10,
        }
    }
}

/// User metric a badge criterion is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeMetric {
    TripsCompleted,
    CatchesLogged,
    SpeciesCount,
    ReviewsWritten,
    BiggestCatchGrams,
}

impl BadgeMetric {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "trips_completed" => Some(Self::TripsCompleted),
            "catches_logged" => Some(Self::CatchesLogged),
            "species_count" => Some(Self::SpeciesCount),
            "reviews_written" => Some(Self::ReviewsWritten),
            "biggest_catch_grams" => Some(Self::BiggestCatchGrams),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::TripsCompleted => "trips_completed",
            Self::CatchesLogged => "catches_logged",
            Self::SpeciesCount => "species_count",
            Self::ReviewsWritten => "reviews_written",
            Self::BiggestCatchGrams => "biggest_catch_grams",
        }
    }
}

/// Per-user numbers badge criteria are checked against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserMetrics {
    pub user_id: i64,
    pub trips_completed: i64,
    pub catches_logged: i64,
    pub species_count: i64,
    pub reviews_written: i64,
    pub biggest_catch_grams: i64,
}

impl UserMetrics {
    pub fn value(&self, metric: BadgeMetric) -> i64 {
        match metric {
            BadgeMetric::TripsCompleted => self.trips_completed,
            BadgeMetric::CatchesLogged => self.catches_logged,
            BadgeMetric::SpeciesCount => self.species_count,
            BadgeMetric::ReviewsWritten => self.reviews_written,
            BadgeMetric::BiggestCatchGrams => self.biggest_catch_grams,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BadgeDefinition {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub rarity: String,
    pub points: i32,
    pub criterion_metric: Option<String>,
    pub criterion_threshold: Option<i64>,
    pub active: bool,
    pub created_at: i64,
}

impl BadgeDefinition {
    pub fn rarity(&self) -> BadgeRarity {
        BadgeRarity::from_db(&self.rarity).unwrap_or(BadgeRarity::Common)
    }

    /// Effective points after rarity multiplier
    pub fn weighted_points(&self) -> i64 {
        i64::from(self.points) * self.rarity().multiplier()
    }

    /// Whether the metrics satisfy the automatic criterion.
    /// Badges without a criterion are only granted manually.
    pub fn is_earned_by(&self, metrics: &UserMetrics) -> bool {
        let (Some(metric), Some(threshold)) = (
            self.criterion_metric.as_deref().and_then(BadgeMetric::from_db),
            self.criterion_threshold,
        ) else {
            return false;
        };
        metrics.value(metric) >= threshold
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeCriterion {
    pub metric: BadgeMetric,
    pub threshold: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BadgeCreate {
    #[validate(length(min = 2, max = 64))]
    pub code: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    #[validate(range(min = 0, max = 10_000))]
    pub points: i32,
    pub criterion: Option<BadgeCriterion>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BadgeUpdate {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub category: Option<BadgeCategory>,
    pub rarity: Option<BadgeRarity>,
    #[validate(range(min = 0, max = 10_000))]
    pub points: Option<i32>,
    pub criterion: Option<BadgeCriterion>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reward {
    pub id: i64,
    pub user_id: i64,
    pub badge_id: i64,
    pub reason: Option<String>,
    pub awarded_at: i64,
}

/// Reward joined with its badge, as shown in the inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RewardWithBadge {
    pub id: i64,
    pub badge_id: i64,
    pub code: String,
    pub name: String,
    pub category: String,
    pub rarity: String,
    pub points: i32,
    pub reason: Option<String>,
    pub awarded_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RewardGrant {
    pub user_id: i64,
    pub badge_id: i64,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistributeRequest {
    #[serde(default)]
    pub dry_run: bool,
    /// Restrict distribution to one user
    pub user_id: Option<i64>,
}

/// A user's badges with point and count summaries
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewardInventory {
    pub total_points: i64,
    pub by_rarity: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub rewards: Vec<RewardWithBadge>,
}

impl RewardInventory {
    pub fn new(rewards: Vec<RewardWithBadge>) -> Self {
        let mut inventory = Self::default();
        for r in &rewards {
            let rarity = BadgeRarity::from_db(&r.rarity).unwrap_or(BadgeRarity::Common);
            inventory.total_points += i64::from(r.points) * rarity.multiplier();
            *inventory.by_rarity.entry(r.rarity.clone()).or_default() += 1;
            *inventory.by_category.entry(r.category.clone()).or_default() += 1;
        }
        inventory.rewards = rewards;
        inventory
    }
}

/// One award the distribution run would make
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAward {
    pub user_id: i64,
    pub badge_id: i64,
    pub badge_code: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DistributionReport {
    pub dry_run: bool,
    pub users_evaluated: usize,
    pub planned: Vec<PlannedAward>,
    /// Awards actually written (always 0 on a dry run)
    pub awarded: usize,
}

/// Awards due: every active badge whose criterion the user meets and that
/// the user does not hold yet
pub fn plan_distribution(
    badges: &[BadgeDefinition],
    metrics: &[UserMetrics],
    held: &HashMap<i64, HashSet<i64>>,
) -> Vec<PlannedAward> {
    let mut planned = Vec::new();
    for m in metrics {
        let owned = held.get(&m.user_id);
        for badge in badges.iter().filter(|b| b.active) {
            if owned.is_some_and(|o| o.contains(&badge.id)) || !badge.is_earned_by(m) {
                continue;
            }
            planned.push(PlannedAward {
                user_id: m.user_id,
                badge_id: badge.id,
                badge_code: badge.code.clone(),
            });
        }
    }
    planned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(metric: Option<&str>, threshold: Option<i64>) -> BadgeDefinition {
        BadgeDefinition {
            id: 1,
            code: "first_fish".into(),
            name: "First Fish".into(),
            description: None,
            category: "milestone".into(),
            rarity: "rare".into(),
            points: 20,
            criterion_metric: metric.map(String::from),
            criterion_threshold: threshold,
            active: true,
            created_at: 0,
        }
    }

    #[test]
    fn weighted_points_apply_rarity() {
        assert_eq!(badge(None, None).weighted_points(), 60);
        assert_eq!(BadgeRarity::Legendary.multiplier(), 10);
    }

    #[test]
    fn criterion_evaluation() {
        let metrics = UserMetrics {
            catches_logged: 3,
            ..Default::default()
        };
        assert!(badge(Some("catches_logged"), Some(1)).is_earned_by(&metrics));
        assert!(badge(Some("catches_logged"), Some(3)).is_earned_by(&metrics));
        assert!(!badge(Some("catches_logged"), Some(4)).is_earned_by(&metrics));
        assert!(!badge(None, None).is_earned_by(&metrics));
        assert!(!badge(Some("unknown_metric"), Some(0)).is_earned_by(&metrics));
    }

    #[test]
    fn rarity_order() {
        assert!(BadgeRarity::Legendary > BadgeRarity::Common);
        assert_eq!(BadgeRarity::from_db("epic"), Some(BadgeRarity::Epic));
    }

    #[test]
    fn inventory_totals() {
        let reward = |id: i64, rarity: &str, category: &str, points: i32| RewardWithBadge {
            id,
            badge_id: id,
            code: format!("b{id}"),
            name: "Badge".into(),
            category: category.into(),
            rarity: rarity.into(),
            points,
            reason: None,
            awarded_at: 0,
        };
        let inv = RewardInventory::new(vec![
            reward(1, "common", "milestone", 10),
            reward(2, "epic", "species", 20),
            reward(3, "epic", "milestone", 1),
        ]);
        assert_eq!(inv.total_points, 10 + 100 + 5);
        assert_eq!(inv.by_rarity["epic"], 2);
        assert_eq!(inv.by_category["milestone"], 2);
        assert_eq!(inv.rewards.len(), 3);
    }

    #[test]
    fn distribution_skips_held_and_inactive() {
        let mut inactive = badge(Some("catches_logged"), Some(1));
        inactive.id = 2;
        inactive.active = false;
        let badges = vec![badge(Some("catches_logged"), Some(1)), inactive];
        let metrics = vec![
            UserMetrics { user_id: 10, catches_logged: 5, ..Default::default() },
            UserMetrics { user_id: 11, catches_logged: 5, ..Default::default() },
            UserMetrics { user_id: 12, ..Default::default() },
        ];
        let mut held = HashMap::new();
        held.insert(11, HashSet::from([1]));

        let planned = plan_distribution(&badges, &metrics, &held);
        assert_eq!(
            planned,
            vec![PlannedAward { user_id: 10, badge_id: 1, badge_code: "first_fish".into() }]
        );
    }
}
