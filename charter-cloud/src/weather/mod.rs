//! Weather and marine forecast client (open-meteo compatible API)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("weather api returned {0}")]
    Status(u16),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature_max_c: Option<f64>,
    pub temperature_min_c: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub wind_speed_max_kmh: Option<f64>,
    /// Only for coastal/offshore coordinates
    pub wave_height_max_m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: ForecastDaily,
}

#[derive(Debug, Deserialize)]
struct ForecastDaily {
    time: Vec<NaiveDate>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct MarineResponse {
    daily: MarineDaily,
}

#[derive(Debug, Deserialize)]
struct MarineDaily {
    time: Vec<NaiveDate>,
    #[serde(default)]
    wave_height_max: Vec<Option<f64>>,
}

fn at(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values.get(idx).copied().flatten()
}

fn merge_daily(forecast: ForecastDaily, marine: Option<MarineDaily>) -> Vec<DailyForecast> {
    let waves: HashMap<NaiveDate, f64> = marine
        .map(|m| {
            m.time
                .iter()
                .enumerate()
                .filter_map(|(i, d)| at(&m.wave_height_max, i).map(|w| (*d, w)))
                .collect()
        })
        .unwrap_or_default();

    forecast
        .time
        .iter()
        .enumerate()
        .map(|(i, date)| DailyForecast {
            date: *date,
            temperature_max_c: at(&forecast.temperature_2m_max, i),
            temperature_min_c: at(&forecast.temperature_2m_min, i),
            precipitation_mm: at(&forecast.precipitation_sum, i),
            wind_speed_max_kmh: at(&forecast.wind_speed_10m_max, i),
            wave_height_max_m: waves.get(date).copied(),
        })
        .collect()
}

#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    forecast_base: String,
    marine_base: String,
}

impl WeatherClient {
    pub fn new(forecast_base: &str, marine_base: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(8))
            .build()
            .unwrap_or_default();
        Self {
            http,
            forecast_base: forecast_base.trim_end_matches('/').to_string(),
            marine_base: marine_base.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let resp = self.http.get(url).query(query).send().await?;
        if !resp.status().is_success() {
            return Err(WeatherError::Status(resp.status().as_u16()));
        }
        Ok(resp.json().await?)
    }

    /// Daily forecast for `from..=to`. The marine part is best effort: inland
    /// coordinates have no wave data and the marine API rejects them.
    pub async fn daily(
        &self,
        lat: f64,
        lon: f64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        let base_query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("timezone", "UTC".to_string()),
            ("start_date", from.to_string()),
            ("end_date", to.to_string()),
        ];

        let mut query = base_query.to_vec();
        query.push((
            "daily",
            "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max".into(),
        ));
        let forecast: ForecastResponse = self
            .fetch(format!("{}/v1/forecast", self.forecast_base), &query)
            .await?;

        let mut marine_query = base_query.to_vec();
        marine_query.push(("daily", "wave_height_max".into()));
        let marine = match self
            .fetch::<MarineResponse>(format!("{}/v1/marine", self.marine_base), &marine_query)
            .await
        {
            Ok(m) => Some(m.daily),
            Err(e) => {
                tracing::debug!(error = %e, lat, lon, "Marine forecast unavailable");
                None
            }
        };

        Ok(merge_daily(forecast.daily, marine))
    }
}
