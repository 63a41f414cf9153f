//! Fishing diary entries and their catches

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FishCatch {
    #[validate(length(min = 1, max = 80))]
    pub species: String,
    #[validate(range(min = 1, max = 1_000_000))]
    pub weight_grams: Option<i64>,
    #[validate(range(min = 1, max = 10_000))]
    pub length_mm: Option<i32>,
    #[serde(default)]
    pub released: bool,
    #[validate(length(max = 80))]
    pub bait: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiaryEntry {
    pub id: i64,
    pub user_id: i64,
    pub trip_id: Option<i64>,
    pub entry_date: NaiveDate,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub weather_summary: Option<String>,
    pub notes: Option<String>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub catches: Vec<FishCatch>,
    pub photo_keys: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DiaryEntryInput {
    pub trip_id: Option<i64>,
    pub entry_date: NaiveDate,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(length(max = 200))]
    pub weather_summary: Option<String>,
    #[validate(length(max = 10_000))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200), nested)]
    pub catches: Vec<FishCatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiaryStats {
    pub entries: usize,
    pub catches: usize,
    pub released: usize,
    pub release_rate: Option<f64>,
    pub species: BTreeMap<String, usize>,
    pub biggest_catch: Option<FishCatch>,
    pub total_weight_grams: i64,
}

/// Aggregate a user's diary. Species names are case-folded so "Snapper"
/// and "snapper" count together.
pub fn diary_stats(entries: &[DiaryEntry]) -> DiaryStats {
    let mut stats = DiaryStats {
        entries: entries.len(),
        ..Default::default()
    };

    for catch in entries.iter().flat_map(|e| &e.catches) {
        stats.catches += 1;
        if catch.released {
            stats.released += 1;
        }
        *stats
            .species
            .entry(catch.species.trim().to_lowercase())
            .or_default() += 1;
        if let Some(w) = catch.weight_grams {
            stats.total_weight_grams += w;
            let bigger = stats
                .biggest_catch
                .as_ref()
                .is_none_or(|b| w > b.weight_grams.unwrap_or(0));
            if bigger {
                stats.biggest_catch = Some(catch.clone());
            }
        }
    }

    if stats.catches > 0 {
        stats.release_rate = Some(stats.released as f64 / stats.catches as f64);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catch(species: &str, weight: Option<i64>, released: bool) -> FishCatch {
        FishCatch {
            species: species.into(),
            weight_grams: weight,
            length_mm: None,
            released,
            bait: None,
        }
    }

    fn entry(catches: Vec<FishCatch>) -> DiaryEntry {
        DiaryEntry {
            id: 1,
            user_id: 1,
            trip_id: None,
            entry_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            location: None,
            latitude: None,
            longitude: None,
            weather_summary: None,
            notes: None,
            catches,
            photo_keys: vec![],
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn stats_aggregate_across_entries() {
        let entries = vec![
            entry(vec![catch("Snapper", Some(1200), true), catch("grouper", Some(4300), false)]),
            entry(vec![catch("snapper ", None, true)]),
            entry(vec![]),
        ];
        let stats = diary_stats(&entries);
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.catches, 3);
        assert_eq!(stats.released, 2);
        assert_eq!(stats.species.get("snapper"), Some(&2));
        assert_eq!(stats.total_weight_grams, 5500);
        assert_eq!(stats.biggest_catch.unwrap().species, "grouper");
        assert!((stats.release_rate.unwrap() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_diary() {
        let stats = diary_stats(&[]);
        assert_eq!(stats.catches, 0);
        assert_eq!(stats.release_rate, None);
        assert!(stats.biggest_catch.is_none());
    }

    #[test]
    fn nested_catch_validation() {
        let input = DiaryEntryInput {
            trip_id: None,
            entry_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            location: None,
            latitude: None,
            longitude: None,
            weather_summary: None,
            notes: None,
            catches: vec![catch("", Some(0), false)],
        };
        assert!(input.validate().is_err());
    }
}
