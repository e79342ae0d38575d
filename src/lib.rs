//! # Wind Sniff Core Library
//!
//! This library provides the data structures and computations behind the Wind
//! sniff station monitor: live wind observations, temperature, and the tide
//! status for every saved WillyWeather station.
//!
//! ## Design Philosophy
//!
//! ### Pure Tide Engine
//! The tide engine is a set of pure functions with no shared state:
//! - **Local-time resolution** ([`local_time`]): the vendor reports tide times as naive
//!   wall-clock strings; these are anchored to UTC using the station's IANA zone
//! - **Tide state** ([`tide_state`]): the bracketing high/low events around "now"
//!   decide whether the tide is rising or falling
//! - **Interpolation** ([`interpolate`]): a half-cosine between the bracketing
//!   extrema estimates the live height and draws the chart curve
//!
//! Everything is recomputed from freshly fetched input on every request, so the
//! functions are safe to call from any number of tasks at once.
//!
//! ### Data Flow
//! 1. **Fetch**: [`client`] pulls station forecasts (cached through [`cache`])
//! 2. **Validate**: [`forecast`] maps the vendor JSON onto optional-field structs and
//!    converts tide entries to [`TideEvent`]s, rejecting malformed sequences
//! 3. **Compute**: [`tide_state`] and [`interpolate`] derive status and curve
//! 4. **Display**: [`renderer`] prints a text report and an ASCII tide chart
//!
//! ## Core Types
//! - [`TideEvent`]: one high or low tide, anchored in UTC
//! - [`Sample`] / [`TideSeries`]: the interpolated chart curve relative to "now"

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
pub mod interpolate;
pub mod local_time;
pub mod renderer;
pub mod tide_state;
pub mod units;

#[cfg(test)]
mod tests;

pub use error::TideError;
pub use interpolate::{estimate_height, tide_curve};
pub use local_time::{resolve_local_time, resolve_local_time_with, DstPolicy};
pub use tide_state::{compute_tide_status, TideDirection, TideStatus};

/// Which extremum of the tide curve an event marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideKind {
    High,
    Low,
}

impl TideKind {
    /// The kind that must follow this one in a physical tide sequence.
    pub fn opposite(self) -> Self {
        match self {
            TideKind::High => TideKind::Low,
            TideKind::Low => TideKind::High,
        }
    }

    /// Display label, e.g. "High".
    pub fn label(self) -> &'static str {
        match self {
            TideKind::High => "High",
            TideKind::Low => "Low",
        }
    }
}

/// A single high or low tide.
///
/// Serialized with the vendor's field names so API consumers see the same shape
/// they would from the forecast feed, except that `dateTime` is an RFC 3339 UTC
/// instant rather than a naive local string.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use wind_sniff_lib::{TideEvent, TideKind};
///
/// let low = TideEvent {
///     kind: TideKind::Low,
///     instant: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     height_m: 0.2,
/// };
/// assert_eq!(low.kind.opposite(), TideKind::High);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideEvent {
    #[serde(rename = "type")]
    pub kind: TideKind,
    #[serde(rename = "dateTime")]
    pub instant: DateTime<Utc>,
    /// Height in metres above the station datum; may be negative
    #[serde(rename = "height")]
    pub height_m: f64,
}

/// One point of the interpolated tide curve.
///
/// Time is stored as minutes relative to the reference instant:
/// - Negative values: past (e.g., -60 = 1 hour ago)
/// - Zero: "now"
/// - Positive values: future
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Minutes relative to the reference instant
    pub mins_rel: i32,
    /// Estimated tide height in metres
    pub height_m: f64,
}

/// Chart curve spanning a tide window.
///
/// # Example
/// ```
/// use wind_sniff_lib::{Sample, TideSeries};
///
/// let series = TideSeries {
///     samples: vec![
///         Sample { mins_rel: -10, height_m: 1.1 },
///         Sample { mins_rel: 0, height_m: 1.2 },
///     ],
///     now: Some(Sample { mins_rel: 0, height_m: 1.2 }),
/// };
/// assert_eq!(series.samples.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TideSeries {
    /// Evenly spaced samples, oldest first
    pub samples: Vec<Sample>,
    /// Interpolated height at the reference instant, when it lies inside the window
    pub now: Option<Sample>,
}

impl TideSeries {
    /// Lowest and highest sampled heights, or `None` for an empty series.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        if self.samples.is_empty() {
            return None;
        }
        Some(
            self.samples
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), s| {
                    (min.min(s.height_m), max.max(s.height_m))
                }),
        )
    }
}
