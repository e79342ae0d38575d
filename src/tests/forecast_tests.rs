//! # Forecast Pipeline Tests
//!
//! Feeds a captured-style WillyWeather response through the vendor boundary
//! and checks the station summary and observation row it produces.

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;
use tempfile::tempdir;

use crate::{
    cache::{Cache, FileCache},
    forecast::{station_info, tide_events, ForecastResponse, StationObservation},
    local_time::DstPolicy,
    TideDirection, TideKind,
};

/// Manly, mid-January (AEDT, UTC+11), with tides spanning two forecast days.
const MANLY_RESPONSE: &str = r#"{
    "location": {
        "id": 4988,
        "name": "Manly",
        "region": "Sydney",
        "lat": -33.7969,
        "lng": 151.2840,
        "timeZone": "Australia/Sydney"
    },
    "forecasts": {
        "tides": {
            "days": [
                {
                    "dateTime": "2024-01-15 00:00:00",
                    "entries": [
                        { "dateTime": "2024-01-15 05:00:00", "height": 0.3, "type": "low" },
                        { "dateTime": "2024-01-15 11:15:00", "height": 1.7, "type": "high" },
                        { "dateTime": "2024-01-15 17:30:00", "height": 0.4, "type": "low" }
                    ]
                },
                {
                    "dateTime": "2024-01-16 00:00:00",
                    "entries": [
                        { "dateTime": "2024-01-16 00:10:00", "height": 1.5, "type": "high" }
                    ]
                }
            ],
            "tideLocation": { "id": 7, "name": "Sydney (Fort Denison)", "distance": 6.2 }
        },
        "weather": {
            "days": [
                { "dateTime": "2024-01-15 00:00:00", "entries": [ { "min": 19, "max": 27, "precis": "Sunny" } ] }
            ]
        },
        "wind": {
            "days": [
                { "dateTime": "2024-01-15 00:00:00", "speedMin": 9, "speedMax": 24, "entries": [] }
            ]
        }
    },
    "observational": {
        "observations": {
            "temperature": { "temperature": 23.4, "apparentTemperature": 24.1 },
            "wind": { "speed": 18.52, "gustSpeed": 27.78, "direction": 45, "directionText": "NE" }
        },
        "stations": {
            "temperature": { "id": 1200, "name": "Sydney Harbour" },
            "wind": { "id": 1201, "name": "North Head" }
        },
        "issueDateTime": "2024-01-15 08:00:00"
    }
}"#;

fn manly() -> ForecastResponse {
    serde_json::from_str(MANLY_RESPONSE).expect("fixture should parse")
}

/// 08:00 in Sydney on 15 January 2024.
fn sydney_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 14, 21, 0, 0).unwrap()
}

/// Tide entries from every day resolve to UTC in order.
#[test]
fn tide_entries_resolve_across_days() {
    let response = manly();
    let events = tide_events(
        response.tides().unwrap(),
        "Australia/Sydney",
        DstPolicy::Compatible,
    )
    .unwrap();

    let instants: Vec<String> = events.iter().map(|e| e.instant.to_rfc3339()).collect();
    assert_eq!(
        instants,
        [
            "2024-01-14T18:00:00+00:00",
            "2024-01-15T00:15:00+00:00",
            "2024-01-15T06:30:00+00:00",
            "2024-01-15T13:10:00+00:00",
        ]
    );
    assert_eq!(events[3].kind, TideKind::High);
}

/// The station summary combines tides, today's forecast and the latest observation.
#[test]
fn station_summary_from_full_response() {
    let info = station_info(&manly(), sydney_morning(), DstPolicy::Compatible);

    let tides = info.tide_data.as_ref().expect("tide data should be present");
    assert_eq!(tides.status, TideDirection::Rising);
    assert_eq!(tides.previous_tide.kind, TideKind::Low);
    assert_eq!(tides.next_tide.kind, TideKind::High);
    assert_eq!(tides.tide_chart_data.len(), 3);
    assert_eq!(info.tide_location_name.as_deref(), Some("Sydney (Fort Denison)"));

    assert_eq!(info.temp_min, Some(19.0));
    assert_eq!(info.temp_max, Some(27.0));
    assert_eq!(info.wind_min, Some(9.0));
    assert_eq!(info.wind_max, Some(24.0));
    assert_eq!(info.current_temp, Some(23.4));
    assert_eq!(info.apparent_temp, Some(24.1));
}

/// The serialized summary uses the dashboard's camelCase keys and UTC instants.
#[test]
fn station_summary_json_shape() {
    let info = station_info(&manly(), sydney_morning(), DstPolicy::Compatible);
    let json = serde_json::to_value(&info).unwrap();

    assert_eq!(json["tideData"]["status"], "rising");
    assert_eq!(json["tideData"]["previousTide"]["type"], "low");
    assert_eq!(json["tideData"]["previousTide"]["dateTime"], "2024-01-14T18:00:00Z");
    assert_eq!(json["tideData"]["tideChartData"].as_array().unwrap().len(), 3);
    assert_eq!(json["tempMax"], 27.0);
}

/// Without a time zone the tides cannot be anchored, but the rest still shows.
#[test]
fn missing_time_zone_drops_only_tides() {
    let mut response = manly();
    response.location.as_mut().unwrap().time_zone = None;

    let info = station_info(&response, sydney_morning(), DstPolicy::Compatible);
    assert_eq!(info.tide_data, None);
    assert_eq!(info.tide_location_name, None);
    assert_eq!(info.temp_max, Some(27.0));
    assert!(!info.is_empty());
}

/// A repeated low is a vendor error: the tide section is discarded.
#[test]
fn malformed_tides_are_discarded() {
    let mut response = manly();
    let days = &mut response.forecasts.as_mut().unwrap().tides.as_mut().unwrap().days;
    days[0].entries[1].kind = Some("low".to_string());

    let info = station_info(&response, sydney_morning(), DstPolicy::Compatible);
    assert_eq!(info.tide_data, None);
    assert_eq!(info.wind_max, Some(24.0));
}

/// Before the first listed tide the status is unknown, so no tide section.
#[test]
fn tides_unknown_before_first_event() {
    let early = Utc.with_ymd_and_hms(2024, 1, 14, 12, 0, 0).unwrap();
    let info = station_info(&manly(), early, DstPolicy::Compatible);
    assert_eq!(info.tide_data, None);
}

/// Observed km/h speeds are reported in knots.
#[test]
fn observation_row_in_knots() {
    let row = StationObservation::from_response("4988", "Manly", &manly());

    assert_eq!(row.location, "Manly");
    assert_eq!(row.direction_text, "NE");
    assert_eq!(row.direction_degrees, 45.0);
    assert!((row.wind_speed - 10.0).abs() < 1e-9, "Got {}", row.wind_speed);
    assert!((row.wind_gust - 15.0).abs() < 1e-9, "Got {}", row.wind_gust);
    assert_eq!(row.observation_time.as_deref(), Some("2024-01-15 08:00:00"));
    assert_eq!(row.time_zone.as_deref(), Some("Australia/Sydney"));
}

/// Forecast responses survive the on-disk cache.
#[test]
fn file_cache_keeps_forecast() {
    let dir = tempdir().unwrap();
    let cache: FileCache<ForecastResponse> = FileCache::new(dir.path());

    cache.put("4988-tides,weather,wind-", manly(), Duration::from_secs(600));
    let cached = cache
        .get("4988-tides,weather,wind-")
        .expect("entry should still be fresh");

    assert_eq!(cached.time_zone(), Some("Australia/Sydney"));
    assert_eq!(cached.tides().unwrap().days.len(), 2);
    assert_eq!(cached.wind_station().and_then(|s| s.name.as_deref()), Some("North Head"));
}
