//! # Tide State
//!
//! Classifies the tide as rising or falling from the high/low events that
//! bracket a reference instant, and picks the events shown on the chart.
//!
//! Direction depends only on the kind of the preceding extremum: after a low
//! the water rises, after a high it falls. That only holds when the events
//! alternate, so [`validate_sequence`] is applied wherever untrusted data
//! enters the engine.

use crate::{interpolate, TideError, TideEvent, TideKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events kept on each side of the next tide for the chart.
pub const CHART_SPAN: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideDirection {
    Rising,
    Falling,
    /// Reference instant is not bracketed by two events
    Unknown,
}

/// Tide summary relative to a reference instant.
///
/// An `Unknown` status is a valid answer meaning "not enough data", not a
/// failure; it carries no events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideStatus {
    pub direction: TideDirection,
    /// Latest event at or before the reference instant
    pub previous: Option<TideEvent>,
    /// Earliest event strictly after the reference instant
    pub next: Option<TideEvent>,
    /// Up to two events before and two from `next` onwards, in order
    pub chart_window: Vec<TideEvent>,
}

impl TideStatus {
    pub fn unknown() -> Self {
        TideStatus {
            direction: TideDirection::Unknown,
            previous: None,
            next: None,
            chart_window: Vec::new(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.direction != TideDirection::Unknown
    }

    /// Interpolated height at `now` between the bracketing events.
    pub fn estimated_height(&self, now: DateTime<Utc>) -> Option<f64> {
        match (&self.previous, &self.next) {
            (Some(previous), Some(next)) => Some(interpolate::estimate_height(now, previous, next)),
            _ => None,
        }
    }
}

/// Index of the first event strictly after `now`.
///
/// An event at exactly `now` counts as already past.
pub fn next_event_index(events: &[TideEvent], now: DateTime<Utc>) -> Option<usize> {
    events.iter().position(|event| event.instant > now)
}

/// Classify the tide at `now`.
///
/// Returns [`TideStatus::unknown`] when `now` is before the first event or at/after
/// the last one. Expects chronological input; use [`checked_tide_status`] for
/// untrusted sequences.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use wind_sniff_lib::{compute_tide_status, TideDirection, TideEvent, TideKind};
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
/// let events = [
///     TideEvent { kind: TideKind::Low, instant: at(0), height_m: 0.2 },
///     TideEvent { kind: TideKind::High, instant: at(6), height_m: 1.8 },
/// ];
/// let status = compute_tide_status(&events, at(3));
/// assert_eq!(status.direction, TideDirection::Rising);
/// ```
pub fn compute_tide_status(events: &[TideEvent], now: DateTime<Utc>) -> TideStatus {
    let index = match next_event_index(events, now) {
        Some(index) if index > 0 => index,
        _ => return TideStatus::unknown(),
    };

    let previous = events[index - 1];
    let next = events[index];
    let direction = match previous.kind {
        TideKind::Low => TideDirection::Rising,
        TideKind::High => TideDirection::Falling,
    };

    let start = index.saturating_sub(CHART_SPAN);
    let end = (index + CHART_SPAN).min(events.len());

    TideStatus {
        direction,
        previous: Some(previous),
        next: Some(next),
        chart_window: events[start..end].to_vec(),
    }
}

/// [`compute_tide_status`] against the current wall-clock time.
pub fn current_tide_status(events: &[TideEvent]) -> TideStatus {
    compute_tide_status(events, Utc::now())
}

/// Check that instants strictly increase and kinds alternate.
pub fn validate_sequence(events: &[TideEvent]) -> Result<(), TideError> {
    for (offset, pair) in events.windows(2).enumerate() {
        let index = offset + 1;
        if pair[1].instant <= pair[0].instant {
            return Err(TideError::MalformedTideSequence {
                index,
                reason: "event is not after its predecessor",
            });
        }
        if pair[1].kind == pair[0].kind {
            return Err(TideError::MalformedTideSequence {
                index,
                reason: "consecutive events share a kind",
            });
        }
    }
    Ok(())
}

/// Validate, then classify.
pub fn checked_tide_status(
    events: &[TideEvent],
    now: DateTime<Utc>,
) -> Result<TideStatus, TideError> {
    validate_sequence(events)?;
    Ok(compute_tide_status(events, now))
}
