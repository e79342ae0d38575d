//! # WillyWeather Client
//!
//! Fetches station forecasts and observations from the WillyWeather v2 API and
//! hands them to [`crate::forecast`] for summarizing.
//!
//! ## Request Flow
//! 1. **Cache**: every forecast request is looked up in the injected [`Cache`]
//!    first, keyed by station and query (never by URL, which embeds the API key)
//! 2. **Fetch**: GET `{base}/{key}/locations/{id}/weather.json`
//! 3. **Decode**: JSON → [`ForecastResponse`] with every field optional
//!
//! ## Forecast Gaps
//! Tide-only locations often carry no weather or wind forecast. The station
//! summary fills these from the station the observations came from, and failing
//! that, from the nearest station found by a geographic search.
//!
//! ## Fan-out
//! [`WillyWeatherClient::observations`] fetches every saved station at once.
//! One station failing yields a `None` in its slot; the batch always completes.

use crate::{
    cache::{Cache, FileCache, MemoryCache, NoCache},
    config::{Config, StationConfig},
    forecast::{self, ForecastResponse, LocationMatch, NamedPlace, StationInfo, StationObservation},
    local_time::DstPolicy,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::{env, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Per-request network timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Forecast reuse when no TTL is configured (10 minutes)
const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Search types for a weather forecast station
const WEATHER_STATION_TYPES: &str = "5";

/// Search types for wind: bay/inlet and ocean stations
const WIND_STATION_TYPES: &str = "14,1";

/// Errors that can occur while talking to WillyWeather.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, TLS, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status
    #[error("request for {resource} failed with status {status}")]
    Status {
        resource: String,
        status: reqwest::StatusCode,
    },

    /// Body is not the JSON shape we expect
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured key variable is unset
    #[error("API key not set; export {0}")]
    MissingApiKey(String),
}

/// Forecast sections the API can include.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForecastKind {
    Weather,
    Wind,
    Tides,
}

impl ForecastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ForecastKind::Weather => "weather",
            ForecastKind::Wind => "wind",
            ForecastKind::Tides => "tides",
        }
    }
}

fn forecast_query(kinds: &[ForecastKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    locations: Vec<NamedPlace>,
}

#[derive(Clone)]
pub struct WillyWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: Arc<dyn Cache<ForecastResponse>>,
    ttl: Duration,
    dst_policy: DstPolicy,
}

impl WillyWeatherClient {
    /// Uncached client against `base_url`.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(WillyWeatherClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            cache: Arc::new(NoCache),
            ttl: DEFAULT_TTL,
            dst_policy: DstPolicy::default(),
        })
    }

    /// Client configured from `config`, reading the key from its env variable.
    ///
    /// Forecasts are cached on disk when `api.cache_path` is set, otherwise in memory.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let api_key = env::var(&config.api.key_env)
            .map_err(|_| FetchError::MissingApiKey(config.api.key_env.clone()))?;

        let cache: Arc<dyn Cache<ForecastResponse>> = match &config.api.cache_path {
            Some(dir) => Arc::new(FileCache::new(dir)),
            None => Arc::new(MemoryCache::new()),
        };

        Ok(Self::new(&config.api.base_url, &api_key)?
            .with_cache(cache, config.api.cache_ttl())
            .with_dst_policy(config.display.dst_policy))
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache<ForecastResponse>>, ttl: Duration) -> Self {
        self.cache = cache;
        self.ttl = ttl;
        self
    }

    pub fn with_dst_policy(mut self, policy: DstPolicy) -> Self {
        self.dst_policy = policy;
        self
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_key, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .http
            .get(self.api_url(resource))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource: resource.to_string(),
                status,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the given forecast sections (and optionally observations) for a location.
    pub async fn forecast(
        &self,
        station_id: &str,
        kinds: &[ForecastKind],
        observational: bool,
    ) -> Result<ForecastResponse, FetchError> {
        let forecasts = forecast_query(kinds);
        let cache_key = format!("{station_id}-{forecasts}-{observational}");
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(station_id, forecasts = %forecasts, "forecast cache hit");
            return Ok(cached);
        }

        let mut query = Vec::new();
        if !forecasts.is_empty() {
            query.push(("forecasts", forecasts.clone()));
        }
        if observational {
            query.push(("observational", "true".to_string()));
        }

        let resource = format!("locations/{station_id}/weather.json");
        let response: ForecastResponse = self.get_json(&resource, &query).await?;

        self.cache.put(&cache_key, response.clone(), self.ttl);
        Ok(response)
    }

    /// Locations whose name matches `query`, as the vendor ranks them.
    pub async fn search_locations(&self, query: &str) -> Result<Vec<LocationMatch>, FetchError> {
        let matches: Vec<LocationMatch> = self
            .get_json("locations", &[("search", query.to_string())])
            .await?;
        debug!(query, matches = matches.len(), "location search");
        Ok(matches)
    }

    /// Nearest location of the given search types (e.g. `"14,1"`).
    pub async fn search_nearby(
        &self,
        lat: f64,
        lng: f64,
        types: &str,
    ) -> Result<Option<NamedPlace>, FetchError> {
        let query = [
            ("lat", lat.to_string()),
            ("lng", lng.to_string()),
            ("types", types.to_string()),
            ("limit", "1".to_string()),
        ];
        let search: SearchResponse = self.get_json("search.json", &query).await?;
        Ok(search.locations.into_iter().next())
    }

    /// Forecast from `station`, or `None` with a warning on any failure.
    async fn forecast_from(
        &self,
        station: &NamedPlace,
        kinds: &[ForecastKind],
    ) -> Option<ForecastResponse> {
        let id = station.id?.to_string();
        match self.forecast(&id, kinds, false).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(station = %id, error = %e, "fallback forecast failed");
                None
            }
        }
    }

    /// Nearest station of `types`, then its forecast; `None` on any failure.
    async fn nearby_forecast(
        &self,
        (lat, lng): (f64, f64),
        types: &str,
        kind: ForecastKind,
    ) -> Option<ForecastResponse> {
        let nearby = match self.search_nearby(lat, lng, types).await {
            Ok(found) => found?,
            Err(e) => {
                warn!(types, error = %e, "nearby station search failed");
                return None;
            }
        };
        info!(
            kind = kind.as_str(),
            station = nearby.name.as_deref().unwrap_or("?"),
            "using nearby station forecast"
        );
        self.forecast_from(&nearby, &[kind]).await
    }

    /// Fill missing weather and wind forecasts from other stations.
    pub async fn fill_forecast_gaps(&self, response: &mut ForecastResponse) {
        let temp_station = response.temperature_station().cloned();
        let wind_station = response.wind_station().cloned();

        // Observation stations first: one call when both gaps share a station
        match (&temp_station, &wind_station) {
            (Some(temp), Some(wind))
                if !response.has_weather_day()
                    && !response.has_wind_day()
                    && temp.id.is_some()
                    && temp.id == wind.id =>
            {
                let kinds = [ForecastKind::Weather, ForecastKind::Wind];
                if let Some(found) = self.forecast_from(temp, &kinds).await {
                    response.set_weather(found.weather().cloned());
                    response.set_wind(found.wind().cloned());
                }
            }
            _ => {
                if let Some(temp) = temp_station.as_ref().filter(|_| !response.has_weather_day()) {
                    if let Some(found) = self.forecast_from(temp, &[ForecastKind::Weather]).await {
                        if found.weather().is_some() {
                            response.set_weather(found.weather().cloned());
                        }
                    }
                }
                if let Some(wind) = wind_station.as_ref().filter(|_| !response.has_wind_day()) {
                    if let Some(found) = self.forecast_from(wind, &[ForecastKind::Wind]).await {
                        if found.wind().is_some() {
                            response.set_wind(found.wind().cloned());
                        }
                    }
                }
            }
        }

        // Then the nearest stations by coordinates
        let Some(coordinates) = response.coordinates() else {
            return;
        };
        if !response.has_weather_day() {
            if let Some(found) = self
                .nearby_forecast(coordinates, WEATHER_STATION_TYPES, ForecastKind::Weather)
                .await
            {
                if found.weather().is_some() {
                    response.set_weather(found.weather().cloned());
                }
            }
        }
        if !response.has_wind_day() {
            if let Some(found) = self
                .nearby_forecast(coordinates, WIND_STATION_TYPES, ForecastKind::Wind)
                .await
            {
                if found.wind().is_some() {
                    response.set_wind(found.wind().cloned());
                }
            }
        }
    }

    /// Full detail summary for a saved station at `now`.
    pub async fn station_info(
        &self,
        station: &StationConfig,
        now: DateTime<Utc>,
    ) -> Result<StationInfo, FetchError> {
        let kinds = [ForecastKind::Tides, ForecastKind::Weather, ForecastKind::Wind];
        let mut response = self.forecast(&station.id, &kinds, true).await?;
        apply_zone_override(&mut response, station);

        self.fill_forecast_gaps(&mut response).await;
        Ok(forecast::station_info(&response, now, self.dst_policy))
    }

    /// Latest wind observation for a saved station.
    pub async fn observation(
        &self,
        station: &StationConfig,
    ) -> Result<StationObservation, FetchError> {
        let mut response = self.forecast(&station.id, &[], true).await?;
        apply_zone_override(&mut response, station);
        Ok(StationObservation::from_response(
            &station.id,
            &station.name,
            &response,
        ))
    }

    /// Observations for every station, concurrently, in input order.
    pub async fn observations(&self, stations: &[StationConfig]) -> Vec<Option<StationObservation>> {
        let mut tasks = JoinSet::new();
        for (index, station) in stations.iter().cloned().enumerate() {
            let client = self.clone();
            tasks.spawn(async move {
                let result = client.observation(&station).await;
                (index, station.id, result)
            });
        }

        let mut rows = vec![None; stations.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(row))) => rows[index] = Some(row),
                Ok((_, id, Err(e))) => warn!(station = %id, error = %e, "observation fetch failed"),
                Err(e) => warn!(error = %e, "observation task aborted"),
            }
        }
        rows
    }
}

/// Use the configured zone when the API response carries none.
fn apply_zone_override(response: &mut ForecastResponse, station: &StationConfig) {
    if response.time_zone().is_some() {
        return;
    }
    if let Some(zone) = &station.time_zone {
        response
            .location
            .get_or_insert_with(Default::default)
            .time_zone = Some(zone.clone());
    }
}
