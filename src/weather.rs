//! Weather forecast client
//!
//! Talks to a WeatherAPI-compatible `forecast.json` endpoint and reduces the
//! response to a single-day [`WeatherReport`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, Local, NaiveDate};
use reqwest::{StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::cache::PersistentCache;
use crate::config::WeatherConfig;
use crate::http::{self, check_status};
use crate::models::{Place, WeatherReport};
use crate::{AssistantError, ErrorCode, Result};

const SERVICE: &str = crate::error::WEATHER_SERVICE;
/// Furthest day ahead the provider forecasts
pub const MAX_FORECAST_DAYS: u64 = 14;

/// Weather API client
pub struct WeatherApiClient {
    client: ClientWithMiddleware,
    config: WeatherConfig,
    cache: Option<Arc<PersistentCache>>,
    cache_ttl: Duration,
}

impl WeatherApiClient {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            config.max_retries,
        )?;
        Ok(Self {
            client,
            config,
            cache: None,
            cache_ttl: Duration::ZERO,
        })
    }

    /// Cache successful reports for `ttl`
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PersistentCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Forecast for a place, by coordinates when known and by name otherwise
    pub async fn forecast_for_place(
        &self,
        place: &Place,
        date: NaiveDate,
    ) -> Result<WeatherReport> {
        let query = match &place.coordinates {
            Some(c) => format!("{},{}", c.latitude, c.longitude),
            None => place.name.clone(),
        };
        let mut report = self.forecast(&query, date).await?;
        report.location = place.name.clone();
        Ok(report)
    }

    /// Single-day forecast for a free-text location
    #[instrument(skip(self), fields(location = location))]
    pub async fn forecast(&self, location: &str, date: NaiveDate) -> Result<WeatherReport> {
        let location = location.trim();
        if location.is_empty() {
            return Err(AssistantError::validation("Location cannot be empty"));
        }
        validate_date(date, Local::now().date_naive())?;

        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AssistantError::config(
                "Weather API key is not configured (set weather.api_key or WEATHER_API_KEY)",
            )
        })?;

        let cache_key = format!("weather:{}:{}", location.to_lowercase(), date);
        if let Some(cached) = self.cached(&cache_key).await {
            debug!("Using cached forecast for '{}' on {}", location, date);
            return Ok(cached);
        }

        info!("Getting forecast for '{}' on {}", location, date);
        let start_time = Instant::now();

        let url = Url::parse_with_params(
            &format!("{}/forecast.json", self.config.base_url.trim_end_matches('/')),
            &[
                ("key", api_key),
                ("q", location),
                ("dt", &date.format("%Y-%m-%d").to_string()),
                ("days", "1"),
            ],
        )
        .map_err(|e| AssistantError::config(format!("Invalid weather base URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| http::network_error(SERVICE, &e))?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(provider_error(location, &body));
        }
        let response = check_status(response, SERVICE).await?;

        let body: ForecastResponse = response.json().await.map_err(|e| {
            AssistantError::api_with_context(
                format!("Invalid weather data received: {e}"),
                ErrorCode::ApiInvalidResponse,
                HashMap::from([("location".to_string(), location.to_string())]),
            )
        })?;

        let report = body.into_report(location, date)?;

        let elapsed = start_time.elapsed();
        info!("Retrieved forecast in {:.3}s", elapsed.as_secs_f64());
        if elapsed.as_secs() > 5 {
            warn!("Slow weather API response: {:.3}s", elapsed.as_secs_f64());
        }

        self.store(&cache_key, &report).await;
        Ok(report)
    }

    async fn cached(&self, key: &str) -> Option<WeatherReport> {
        let cache = self.cache.as_ref()?;
        match cache.get::<WeatherReport>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Weather cache read failed: {e}");
                None
            }
        }
    }

    async fn store(&self, key: &str, report: &WeatherReport) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(key, report.clone(), self.cache_ttl).await {
                warn!("Weather cache write failed: {e}");
            }
        }
    }
}

/// Reject dates outside the forecast window. One day of slack covers time zones.
pub fn validate_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    let earliest = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    let latest = today
        .checked_add_days(Days::new(MAX_FORECAST_DAYS))
        .unwrap_or(today);
    if date < earliest || date > latest {
        return Err(AssistantError::validation(format!(
            "Forecasts are only available from {earliest} to {latest}, got {date}"
        )));
    }
    Ok(())
}

fn provider_error(location: &str, body: &str) -> AssistantError {
    let parsed = serde_json::from_str::<ProviderErrorBody>(body).ok();
    let (code, message) = match parsed {
        // 1006: no matching location
        Some(ProviderErrorBody { error }) if error.code == Some(1006) => {
            (ErrorCode::ApiNotFound, error.message)
        }
        Some(ProviderErrorBody { error }) => (ErrorCode::ApiInvalidResponse, error.message),
        None => (ErrorCode::ApiInvalidResponse, "Bad request".to_string()),
    };
    warn!("Weather provider rejected '{}': {}", location, message);
    AssistantError::api_with_context(
        message,
        code,
        HashMap::from([
            ("location".to_string(), location.to_string()),
            ("status_code".to_string(), "400".to_string()),
        ]),
    )
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    code: Option<u32>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    forecast: Option<Forecast>,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    #[serde(default)]
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    day: Day,
}

#[derive(Debug, Deserialize)]
struct Day {
    maxtemp_c: f32,
    mintemp_c: f32,
    avghumidity: f32,
    maxwind_kph: f32,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

impl ForecastResponse {
    fn into_report(self, location: &str, date: NaiveDate) -> Result<WeatherReport> {
        let day = self
            .forecast
            .and_then(|f| f.forecastday.into_iter().next())
            .map(|d| d.day)
            .ok_or_else(|| {
                AssistantError::api_with_context(
                    "Weather data not found",
                    ErrorCode::ApiNotFound,
                    HashMap::from([("location".to_string(), location.to_string())]),
                )
            })?;

        Ok(WeatherReport {
            location: location.to_string(),
            date,
            condition: day.condition.text.trim().to_string(),
            max_temp_c: day.maxtemp_c,
            min_temp_c: day.mintemp_c,
            avg_humidity: day.avghumidity,
            max_wind_kph: day.maxwind_kph,
        })
    }
}
