//! Marine / lunar calendar and weather proxy

use axum::routing::get;
use axum::{Json, Router, extract::State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::lunar::{LunarDay, lunar_calendar};
use std::collections::HashMap;
use validator::Validate;

use super::{ApiResult, AppQuery};
use crate::state::AppState;
use crate::weather::DailyForecast;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/calendar", get(calendar))
        .route("/api/weather", get(weather))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CalendarQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,
    /// First day; today (UTC) when unset
    pub from: Option<NaiveDate>,
    #[validate(range(min = 1, max = 31))]
    pub days: Option<u32>,
}

impl CalendarQuery {
    /// First day, last day and day count. Ranges running past the last
    /// representable date are out of range.
    fn window(&self) -> Result<(NaiveDate, NaiveDate, u32), AppError> {
        let from = self
            .from
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let days = self.days.unwrap_or(7);
        let to = from
            .checked_add_signed(chrono::Duration::days(i64::from(days.max(1)) - 1))
            .ok_or_else(|| {
                AppError::new(ErrorCode::ValueOutOfRange).with_detail("from", from.to_string())
            })?;
        Ok((from, to, days))
    }
}

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    #[serde(flatten)]
    pub lunar: LunarDay,
    pub forecast: Option<DailyForecast>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub weather_available: bool,
    pub days: Vec<CalendarDay>,
}

fn merge_calendar(lunar: Vec<LunarDay>, forecast: Option<Vec<DailyForecast>>) -> CalendarResponse {
    let weather_available = forecast.is_some();
    let mut by_date: HashMap<NaiveDate, DailyForecast> = forecast
        .unwrap_or_default()
        .into_iter()
        .map(|f| (f.date, f))
        .collect();
    CalendarResponse {
        weather_available,
        days: lunar
            .into_iter()
            .map(|l| CalendarDay {
                forecast: by_date.remove(&l.date),
                lunar: l,
            })
            .collect(),
    }
}

/// GET /api/calendar: weather failures degrade to lunar-only days
pub async fn calendar(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CalendarQuery>,
) -> ApiResult<CalendarResponse> {
    query.validate()?;
    let (from, to, days) = query.window()?;
    let lunar = lunar_calendar(from, days);

    let forecast = match state.weather.daily(query.lat, query.lon, from, to).await {
        Ok(f) => Some(f),
        Err(e) => {
            tracing::warn!(error = %e, lat = query.lat, lon = query.lon, "Weather unavailable, lunar only");
            None
        }
    };
    Ok(Json(merge_calendar(lunar, forecast)))
}

/// GET /api/weather
pub async fn weather(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CalendarQuery>,
) -> ApiResult<Vec<DailyForecast>> {
    query.validate()?;
    let (from, to, _) = query.window()?;
    let forecast = state
        .weather
        .daily(query.lat, query.lon, from, to)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Weather request failed");
            AppError::new(ErrorCode::WeatherUnavailable)
        })?;
    Ok(Json(forecast))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn forecast(day: u32) -> DailyForecast {
        DailyForecast {
            date: date(day),
            temperature_max_c: Some(30.0),
            temperature_min_c: Some(22.0),
            precipitation_mm: None,
            wind_speed_max_kmh: Some(12.0),
            wave_height_max_m: None,
        }
    }

    #[test]
    fn forecast_attaches_by_date() {
        let lunar = lunar_calendar(date(1), 3);
        let merged = merge_calendar(lunar, Some(vec![forecast(2)]));
        assert!(merged.weather_available);
        assert!(merged.days[0].forecast.is_none());
        assert_eq!(merged.days[1].forecast.as_ref().map(|f| f.date), Some(date(2)));
        assert_eq!(merged.days.len(), 3);
    }

    #[test]
    fn degrades_without_weather() {
        let merged = merge_calendar(lunar_calendar(date(1), 2), None);
        assert!(!merged.weather_available);
        assert!(merged.days.iter().all(|d| d.forecast.is_none()));
    }

    #[test]
    fn query_limits() {
        let query = CalendarQuery {
            lat: 24.5,
            lon: -81.8,
            from: None,
            days: Some(45),
        };
        assert!(query.validate().is_err());
        let ok = CalendarQuery { days: None, ..query };
        assert!(ok.validate().is_ok());
        let (from, to, days) = ok.window().unwrap();
        assert_eq!(days, 7);
        assert_eq!(to - from, chrono::Duration::days(6));
    }

    #[test]
    fn window_past_last_date_is_out_of_range() {
        let query = CalendarQuery {
            lat: 0.0,
            lon: 0.0,
            from: "+262142-12-30".parse().ok(),
            days: Some(7),
        };
        assert!(query.from.is_some());
        let err = query.window().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);

        let last_day = CalendarQuery { days: Some(1), ..query };
        let (from, to, _) = last_day.window().unwrap();
        assert_eq!(from, to);
    }
}
