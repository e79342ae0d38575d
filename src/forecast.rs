//! # WillyWeather Forecast Documents
//!
//! Typed view of the vendor's `weather.json` response. Every vendor field is
//! optional here: stations differ wildly in what they report (many have no tide
//! gauge, some no wind forecast), and a missing field must surface as an
//! explicit [`TideError::MissingField`] or an absent summary value rather than a
//! silently undefined lookup.
//!
//! ## Response Shape (abridged)
//! ```json
//! {
//!   "location": { "lat": -33.8, "lng": 151.2, "timeZone": "Australia/Sydney" },
//!   "forecasts": {
//!     "tides": {
//!       "days": [{ "entries": [{ "dateTime": "2024-01-01 05:12:00", "height": 1.62, "type": "high" }] }],
//!       "tideLocation": { "name": "Fort Denison" }
//!     },
//!     "weather": { "days": [{ "entries": [{ "min": 19, "max": 27 }] }] },
//!     "wind": { "days": [{ "speedMin": 8.2, "speedMax": 31.5 }] }
//!   },
//!   "observational": {
//!     "observations": {
//!       "temperature": { "temperature": 22.4, "apparentTemperature": 21.0 },
//!       "wind": { "speed": 24.1, "gustSpeed": 33.3, "direction": 45, "directionText": "NE" }
//!     },
//!     "stations": { "temperature": { "id": 17, "name": "Observatory Hill" } },
//!     "issueDateTime": "2024-01-01 10:30:00"
//!   }
//! }
//! ```
//!
//! ## Conversion
//! Tide entries are resolved to UTC in the location's zone and the resulting
//! sequence is validated before it reaches [`crate::tide_state`]. A bad tide
//! sequence only drops the tide section of a station summary.

use crate::{
    local_time::{self, DstPolicy},
    tide_state::{self, TideDirection, TideStatus},
    units, TideError, TideEvent, TideKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::warn;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub location: Option<Location>,
    pub forecasts: Option<Forecasts>,
    pub observational: Option<Observational>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub time_zone: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecasts {
    pub tides: Option<TideForecast>,
    pub weather: Option<WeatherForecast>,
    pub wind: Option<WindForecast>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideForecast {
    #[serde(default)]
    pub days: Vec<TideDay>,
    pub tide_location: Option<NamedPlace>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TideDay {
    #[serde(default)]
    pub entries: Vec<RawTideEntry>,
}

/// Tide entry as the vendor sends it: local wall-clock time, no offset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTideEntry {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date_time: Option<String>,
    pub height: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedPlace {
    pub id: Option<u64>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    #[serde(default)]
    pub days: Vec<WeatherDay>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    #[serde(default)]
    pub entries: Vec<WeatherEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherEntry {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WindForecast {
    #[serde(default)]
    pub days: Vec<WindDay>,
}

/// Daily wind range lives on the day, not on its entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindDay {
    pub speed_min: Option<f64>,
    pub speed_max: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observational {
    pub observations: Option<Observations>,
    pub stations: Option<ObservationStations>,
    pub issue_date_time: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Observations {
    pub temperature: Option<TemperatureObservation>,
    pub wind: Option<WindObservation>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureObservation {
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
}

/// Observed wind; speeds are km/h.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindObservation {
    pub speed: Option<f64>,
    pub gust_speed: Option<f64>,
    pub direction: Option<f64>,
    pub direction_text: Option<String>,
}

/// Stations the observations were taken from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationStations {
    pub temperature: Option<NamedPlace>,
    pub wind: Option<NamedPlace>,
}

impl ForecastResponse {
    pub fn time_zone(&self) -> Option<&str> {
        self.location.as_ref()?.time_zone.as_deref()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let location = self.location.as_ref()?;
        Some((location.lat?, location.lng?))
    }

    pub fn tides(&self) -> Option<&TideForecast> {
        self.forecasts.as_ref()?.tides.as_ref()
    }

    pub fn weather(&self) -> Option<&WeatherForecast> {
        self.forecasts.as_ref()?.weather.as_ref()
    }

    pub fn wind(&self) -> Option<&WindForecast> {
        self.forecasts.as_ref()?.wind.as_ref()
    }

    pub fn has_weather_day(&self) -> bool {
        self.weather().is_some_and(|w| !w.days.is_empty())
    }

    pub fn has_wind_day(&self) -> bool {
        self.wind().is_some_and(|w| !w.days.is_empty())
    }

    fn observations(&self) -> Option<&Observations> {
        self.observational.as_ref()?.observations.as_ref()
    }

    /// Station that supplied the temperature observation.
    pub fn temperature_station(&self) -> Option<&NamedPlace> {
        self.observational.as_ref()?.stations.as_ref()?.temperature.as_ref()
    }

    /// Station that supplied the wind observation.
    pub fn wind_station(&self) -> Option<&NamedPlace> {
        self.observational.as_ref()?.stations.as_ref()?.wind.as_ref()
    }

    /// Replace the weather forecast, creating the `forecasts` object if needed.
    pub fn set_weather(&mut self, weather: Option<WeatherForecast>) {
        self.forecasts.get_or_insert_with(Forecasts::default).weather = weather;
    }

    /// Replace the wind forecast, creating the `forecasts` object if needed.
    pub fn set_wind(&mut self, wind: Option<WindForecast>) {
        self.forecasts.get_or_insert_with(Forecasts::default).wind = wind;
    }
}

impl TideKind {
    /// Parse the vendor's `"high"` / `"low"`.
    pub fn from_vendor(kind: &str) -> Result<Self, TideError> {
        match kind {
            "high" => Ok(TideKind::High),
            "low" => Ok(TideKind::Low),
            other => Err(TideError::UnknownTideKind(other.to_string())),
        }
    }
}

impl RawTideEntry {
    /// Anchor this entry in UTC using the station's zone.
    pub fn resolve(&self, zone: &str, policy: DstPolicy) -> Result<TideEvent, TideError> {
        let kind = self.kind.as_deref().ok_or(TideError::MissingField("type"))?;
        let date_time = self
            .date_time
            .as_deref()
            .ok_or(TideError::MissingField("dateTime"))?;
        let height_m = self.height.ok_or(TideError::MissingField("height"))?;

        Ok(TideEvent {
            kind: TideKind::from_vendor(kind)?,
            instant: local_time::resolve_local_time_with(date_time, zone, policy)?,
            height_m,
        })
    }
}

/// Resolve every entry of every forecast day and validate the sequence.
pub fn tide_events(
    forecast: &TideForecast,
    zone: &str,
    policy: DstPolicy,
) -> Result<Vec<TideEvent>, TideError> {
    let events = forecast
        .days
        .iter()
        .flat_map(|day| day.entries.iter())
        .map(|entry| entry.resolve(zone, policy))
        .collect::<Result<Vec<_>, _>>()?;
    tide_state::validate_sequence(&events)?;
    Ok(events)
}

/// Tide section of a station summary, in the shape the dashboard consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideInfo {
    pub status: TideDirection,
    pub previous_tide: TideEvent,
    pub next_tide: TideEvent,
    pub tide_chart_data: Vec<TideEvent>,
}

impl TideInfo {
    /// `None` for an unknown status.
    pub fn from_status(status: &TideStatus) -> Option<Self> {
        match (status.is_known(), status.previous, status.next) {
            (true, Some(previous_tide), Some(next_tide)) => Some(TideInfo {
                status: status.direction,
                previous_tide,
                next_tide,
                tide_chart_data: status.chart_window.clone(),
            }),
            _ => None,
        }
    }
}

/// Everything the station detail view shows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tide_data: Option<TideInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tide_location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_max: Option<f64>,
}

impl StationInfo {
    /// True when the station reported nothing worth showing.
    pub fn is_empty(&self) -> bool {
        *self == StationInfo::default()
    }
}

/// Tide section for `response` at `now`, or `None` when the station has no
/// usable tide data. Conversion failures are logged, never propagated.
pub fn tide_info(
    response: &ForecastResponse,
    now: DateTime<Utc>,
    policy: DstPolicy,
) -> Option<TideInfo> {
    let forecast = response.tides().filter(|t| !t.days.is_empty())?;
    let zone = response.time_zone()?;

    match tide_events(forecast, zone, policy) {
        Ok(events) => TideInfo::from_status(&tide_state::compute_tide_status(&events, now)),
        Err(e) => {
            warn!(zone, error = %e, "discarding tide forecast");
            None
        }
    }
}

/// Summarize a forecast response for the station detail view.
pub fn station_info(
    response: &ForecastResponse,
    now: DateTime<Utc>,
    policy: DstPolicy,
) -> StationInfo {
    let mut info = StationInfo::default();

    if let Some(tide_data) = tide_info(response, now, policy) {
        info.tide_data = Some(tide_data);
        info.tide_location_name = response
            .tides()
            .and_then(|t| t.tide_location.as_ref())
            .and_then(|place| place.name.clone());
    }

    // Today's range sits on the first entry of the first weather day
    if let Some(entry) = response
        .weather()
        .and_then(|w| w.days.first())
        .and_then(|day| day.entries.first())
    {
        info.temp_min = entry.min;
        info.temp_max = entry.max;
    }

    if let Some(day) = response.wind().and_then(|w| w.days.first()) {
        info.wind_min = day.speed_min;
        info.wind_max = day.speed_max;
    }

    if let Some(temperature) = response.observations().and_then(|o| o.temperature.as_ref()) {
        info.current_temp = temperature.temperature;
        info.apparent_temp = temperature.apparent_temperature;
    }

    info
}

/// One row of the saved-stations list: the latest wind observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationObservation {
    pub id: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub direction_text: String,
    pub direction_degrees: f64,
    /// Knots
    pub wind_speed: f64,
    /// Knots
    pub wind_gust: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl StationObservation {
    /// Build a list row; missing wind readings show as calm from "N/A".
    pub fn from_response(id: &str, name: &str, response: &ForecastResponse) -> Self {
        let wind = response.observations().and_then(|o| o.wind.as_ref());
        let location = response.location.as_ref();

        StationObservation {
            id: id.to_string(),
            location: name.to_string(),
            lat: location.and_then(|l| l.lat),
            lng: location.and_then(|l| l.lng),
            direction_text: wind
                .and_then(|w| w.direction_text.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            direction_degrees: wind.and_then(|w| w.direction).unwrap_or(0.0),
            wind_speed: units::kmh_to_knots(wind.and_then(|w| w.speed).unwrap_or(0.0)),
            wind_gust: units::kmh_to_knots(wind.and_then(|w| w.gust_speed).unwrap_or(0.0)),
            observation_time: response
                .observational
                .as_ref()
                .and_then(|o| o.issue_date_time.clone()),
            time_zone: response.time_zone().map(str::to_string),
        }
    }

    /// Observation time anchored in the station's zone, when both are known.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        let local = self.observation_time.as_deref()?;
        let zone = self.time_zone.as_deref()?;
        local_time::resolve_local_time(local, zone).ok()
    }
}

/// Ordering of the saved-stations list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// By station name, A to Z
    #[default]
    Alphabetical,
    /// Windiest first
    WindSpeed,
    /// North to south
    Latitude,
    /// Most recent observation first
    LastUpdated,
}

/// Missing values sort after present ones.
fn present_first<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl SortOrder {
    pub fn compare(self, a: &StationObservation, b: &StationObservation) -> Ordering {
        match self {
            SortOrder::Alphabetical => a.location.to_lowercase().cmp(&b.location.to_lowercase()),
            SortOrder::WindSpeed => b.wind_speed.total_cmp(&a.wind_speed),
            SortOrder::Latitude => present_first(a.lat, b.lat, |a, b| b.total_cmp(&a)),
            SortOrder::LastUpdated => {
                present_first(a.observed_at(), b.observed_at(), |a, b| b.cmp(&a))
            }
        }
    }
}

/// Sort observation rows in place; ties keep their saved order.
pub fn sort_observations(rows: &mut [StationObservation], order: SortOrder) {
    rows.sort_by(|a, b| order.compare(a, b));
}

/// One hit of the vendor's location search by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationMatch {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}
