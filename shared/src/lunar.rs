//! Moon phase approximation for the fishing calendar
//!
//! Uses the mean synodic month from a known new moon. Accurate to within
//! about a day, which is what a fishing forecast needs.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mean synodic month in days
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;

/// New moon of 2000-01-06 18:14 UTC
fn reference_new_moon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 6, 18, 14, 0)
        .single()
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    const ALL: [MoonPhase; 8] = [
        Self::NewMoon,
        Self::WaxingCrescent,
        Self::FirstQuarter,
        Self::WaxingGibbous,
        Self::FullMoon,
        Self::WaningGibbous,
        Self::LastQuarter,
        Self::WaningCrescent,
    ];

    /// Nearest of the eight phases for a moon age in days
    pub fn from_age(age_days: f64) -> Self {
        let idx = (age_days / SYNODIC_MONTH_DAYS * 8.0 + 0.5).floor() as i64;
        Self::ALL[idx.rem_euclid(8) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LunarDay {
    pub date: NaiveDate,
    /// Days since the last new moon
    pub moon_age_days: f64,
    pub phase: MoonPhase,
    /// Lit fraction of the disc, 0.0 ..= 1.0
    pub illumination: f64,
    /// 1 (poor) ..= 5 (best), peaking at new and full moon
    pub fishing_rating: u8,
}

/// Moon age at an instant, in `0.0..SYNODIC_MONTH_DAYS`
pub fn moon_age(at: DateTime<Utc>) -> f64 {
    let elapsed_days = (at - reference_new_moon()).num_seconds() as f64 / 86_400.0;
    elapsed_days.rem_euclid(SYNODIC_MONTH_DAYS)
}

/// Lunar data for a calendar day, evaluated at noon UTC
pub fn lunar_day(date: NaiveDate) -> LunarDay {
    let noon = date
        .and_hms_opt(12, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_default();
    let age = moon_age(noon);
    let angle = 2.0 * PI * age / SYNODIC_MONTH_DAYS;

    LunarDay {
        date,
        moon_age_days: (age * 100.0).round() / 100.0,
        phase: MoonPhase::from_age(age),
        illumination: ((1.0 - angle.cos()) / 2.0 * 1000.0).round() / 1000.0,
        fishing_rating: 1 + (4.0 * angle.cos().abs()).round() as u8,
    }
}

/// Consecutive days starting at `from`
pub fn lunar_calendar(from: NaiveDate, days: u32) -> Vec<LunarDay> {
    from.iter_days().take(days as usize).map(lunar_day).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn known_new_moon() {
        // New moon 2024-01-11 11:57 UTC
        let day = lunar_day(date(2024, 1, 11));
        assert_eq!(day.phase, MoonPhase::NewMoon);
        assert!(day.illumination < 0.05);
        assert_eq!(day.fishing_rating, 5);
    }

    #[test]
    fn known_full_moon() {
        // Full moon 2024-01-25 17:54 UTC
        let day = lunar_day(date(2024, 1, 25));
        assert_eq!(day.phase, MoonPhase::FullMoon);
        assert!(day.illumination > 0.95);
        assert_eq!(day.fishing_rating, 5);
    }

    #[test]
    fn quarter_moon_rates_low() {
        // First quarter 2024-01-18 03:53 UTC
        let day = lunar_day(date(2024, 1, 18));
        assert_eq!(day.phase, MoonPhase::FirstQuarter);
        assert!(day.fishing_rating <= 2);
    }

    #[test]
    fn phase_buckets_wrap() {
        assert_eq!(MoonPhase::from_age(0.0), MoonPhase::NewMoon);
        assert_eq!(MoonPhase::from_age(SYNODIC_MONTH_DAYS - 0.5), MoonPhase::NewMoon);
        assert_eq!(MoonPhase::from_age(SYNODIC_MONTH_DAYS / 2.0), MoonPhase::FullMoon);
    }

    #[test]
    fn calendar_length() {
        let days = lunar_calendar(date(2025, 12, 30), 5);
        assert_eq!(days.len(), 5);
        assert_eq!(days[4].date, date(2026, 1, 3));
    }

    #[test]
    fn age_before_reference_is_positive() {
        let age = moon_age(Utc.with_ymd_and_hms(1999, 6, 1, 0, 0, 0).unwrap());
        assert!((0.0..SYNODIC_MONTH_DAYS).contains(&age));
    }
}
