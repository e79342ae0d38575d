//! Wind speed units and small display helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const KMH_PER_KNOT: f64 = 1.852;
const MPH_PER_KNOT: f64 = 1.15078;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedUnit {
    #[default]
    #[serde(rename = "knots")]
    Knots,
    #[serde(rename = "km/h")]
    Kmh,
    #[serde(rename = "mph")]
    Mph,
}

impl SpeedUnit {
    pub fn label(self) -> &'static str {
        match self {
            SpeedUnit::Knots => "knots",
            SpeedUnit::Kmh => "km/h",
            SpeedUnit::Mph => "mph",
        }
    }

    fn per_knot(self) -> f64 {
        match self {
            SpeedUnit::Knots => 1.0,
            SpeedUnit::Kmh => KMH_PER_KNOT,
            SpeedUnit::Mph => MPH_PER_KNOT,
        }
    }
}

/// Wind speed and gust rendered as a rounded range, e.g. `"12 - 18"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpeedRange {
    pub range_value: String,
    pub unit_label: &'static str,
}

pub fn convert_speed(speed_knots: f64, gust_knots: f64, unit: SpeedUnit) -> SpeedRange {
    let factor = unit.per_knot();
    SpeedRange {
        range_value: format!(
            "{} - {}",
            (speed_knots * factor).round(),
            (gust_knots * factor).round()
        ),
        unit_label: unit.label(),
    }
}

pub fn kmh_to_knots(kmh: f64) -> f64 {
    kmh / KMH_PER_KNOT
}

/// Strength band used to colour a wind reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindClass {
    Light,
    Moderate,
    Strong,
}

pub fn wind_speed_class(speed_knots: f64) -> WindClass {
    if speed_knots < 10.0 {
        WindClass::Light
    } else if speed_knots < 20.0 {
        WindClass::Moderate
    } else {
        WindClass::Strong
    }
}

/// "in 2h 5m" / "in 40m" until `target`. Past targets read as "in 0m".
pub fn format_time_until(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (target - now).num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("in {hours}h {minutes}m")
    } else {
        format!("in {minutes}m")
    }
}
