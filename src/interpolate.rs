//! # Tide Height Interpolation
//!
//! Real tide curves are close to sinusoidal between a high and a low, so the
//! height between two extrema is estimated with a half-cosine rather than a
//! straight line:
//!
//! ```text
//! t        = (now - previous) / (next - previous)
//! estimate = midpoint - amplitude * cos(t * π)
//! ```
//!
//! with `midpoint` the mean of the two heights and `amplitude` half their
//! difference. The curve leaves each extremum flat and is steepest halfway.

use crate::{Sample, TideEvent, TideSeries};
use chrono::{DateTime, Duration, Utc};
use std::f64::consts::PI;

/// Chart resolution when the caller has no preference.
pub const DEFAULT_STEP_MINUTES: i64 = 10;

/// Estimate the tide height at `now` between two consecutive extrema.
///
/// Returns the exact event height at either end. Outside
/// `[previous.instant, next.instant]` the mean of the two heights is returned
/// instead of extrapolating, as it is for two events at the same instant.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use wind_sniff_lib::{estimate_height, TideEvent, TideKind};
///
/// let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
/// let low = TideEvent { kind: TideKind::Low, instant: at(0), height_m: 0.2 };
/// let high = TideEvent { kind: TideKind::High, instant: at(6), height_m: 1.8 };
///
/// assert!((estimate_height(at(3), &low, &high) - 1.0).abs() < 1e-9);
/// ```
pub fn estimate_height(now: DateTime<Utc>, previous: &TideEvent, next: &TideEvent) -> f64 {
    let midpoint = (previous.height_m + next.height_m) / 2.0;

    if now < previous.instant || now > next.instant || previous.instant == next.instant {
        return midpoint;
    }
    if now == previous.instant {
        return previous.height_m;
    }
    if now == next.instant {
        return next.height_m;
    }

    let total = (next.instant - previous.instant).num_milliseconds() as f64;
    let elapsed = (now - previous.instant).num_milliseconds() as f64;
    let t = elapsed / total;

    let amplitude = (next.height_m - previous.height_m) / 2.0;
    let estimate = midpoint - amplitude * (t * PI).cos();

    let low = previous.height_m.min(next.height_m);
    let high = previous.height_m.max(next.height_m);
    estimate.clamp(low, high)
}

/// Height at `at` from whichever consecutive pair in `window` brackets it.
fn height_within(window: &[TideEvent], at: DateTime<Utc>) -> Option<f64> {
    window
        .windows(2)
        .find(|w| w[0].instant <= at && at <= w[1].instant)
        .map(|w| estimate_height(at, &w[0], &w[1]))
}

/// Sample a smooth tide curve across a chart window.
///
/// Samples start at the first event and are `step` apart, ending exactly on
/// the last event. `mins_rel` is measured from `now`. Windows with fewer than
/// two events produce an empty series; a non-positive `step` falls back to
/// [`DEFAULT_STEP_MINUTES`].
pub fn tide_curve(window: &[TideEvent], now: DateTime<Utc>, step: Duration) -> TideSeries {
    let (first, last) = match (window.first(), window.last()) {
        (Some(first), Some(last)) if window.len() >= 2 => (first, last),
        _ => return TideSeries::default(),
    };
    let step = if step > Duration::zero() {
        step
    } else {
        Duration::minutes(DEFAULT_STEP_MINUTES)
    };

    let sample_at = |at: DateTime<Utc>| {
        height_within(window, at).map(|height_m| Sample {
            mins_rel: (at - now).num_minutes() as i32,
            height_m,
        })
    };

    let span = last.instant - first.instant;
    let count = (span.num_seconds() / step.num_seconds().max(1)) as usize + 2;
    let mut samples = Vec::with_capacity(count);

    let mut at = first.instant;
    while at < last.instant {
        samples.extend(sample_at(at));
        at += step;
    }
    samples.extend(sample_at(last.instant));

    let now_sample = if first.instant <= now && now <= last.instant {
        sample_at(now)
    } else {
        None
    };

    TideSeries {
        samples,
        now: now_sample,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TideKind;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn low() -> TideEvent {
        TideEvent {
            kind: TideKind::Low,
            instant: at(0, 0),
            height_m: 0.2,
        }
    }

    fn high() -> TideEvent {
        TideEvent {
            kind: TideKind::High,
            instant: at(6, 0),
            height_m: 1.8,
        }
    }

    #[test]
    fn endpoints_are_exact() {
        assert_eq!(estimate_height(at(0, 0), &low(), &high()), 0.2);
        assert_eq!(estimate_height(at(6, 0), &low(), &high()), 1.8);
    }

    #[test]
    fn midpoint_at_half_time() {
        let estimate = estimate_height(at(3, 0), &low(), &high());
        assert!((estimate - 1.0).abs() < 1e-9, "got {estimate}");
    }

    #[test]
    fn cosine_not_linear() {
        // A quarter of the way through, cosine sits below the straight line
        let estimate = estimate_height(at(1, 30), &low(), &high());
        let linear = 0.2 + 1.6 * 0.25;
        assert!(estimate < linear);
        let expected = 0.2 + 1.6 * (1.0 - (PI / 4.0).cos()) / 2.0;
        assert!((estimate - expected).abs() < 1e-9);
    }

    #[test]
    fn stays_within_bounds_on_falling_tide() {
        let high_first = TideEvent {
            instant: at(0, 0),
            ..high()
        };
        let low_after = TideEvent {
            instant: at(6, 0),
            ..low()
        };
        for minute in 0..=360 {
            let now = at(0, 0) + Duration::minutes(minute);
            let h = estimate_height(now, &high_first, &low_after);
            assert!((0.2..=1.8).contains(&h), "{h} out of bounds at {minute}");
        }
    }

    #[test]
    fn outside_interval_returns_mean() {
        let before = estimate_height(at(0, 0) - Duration::hours(1), &low(), &high());
        let after = estimate_height(at(7, 0), &low(), &high());
        assert_eq!(before, 1.0);
        assert_eq!(after, 1.0);
    }

    #[test]
    fn curve_covers_window_at_step() {
        let window = [low(), high()];
        let series = tide_curve(&window, at(3, 0), Duration::minutes(10));

        assert_eq!(series.samples.len(), 37);
        assert_eq!(series.samples.first().unwrap().mins_rel, -180);
        assert_eq!(series.samples.last().unwrap().mins_rel, 180);
        assert_eq!(series.samples.first().unwrap().height_m, 0.2);
        assert_eq!(series.samples.last().unwrap().height_m, 1.8);

        for pair in series.samples.windows(2) {
            assert_eq!(pair[1].mins_rel - pair[0].mins_rel, 10);
            assert!(pair[1].height_m >= pair[0].height_m);
        }

        let now = series.now.expect("now lies inside the window");
        assert_eq!(now.mins_rel, 0);
        assert!((now.height_m - 1.0).abs() < 1e-9);
    }

    #[test]
    fn curve_turns_at_each_extremum() {
        let third = TideEvent {
            kind: TideKind::Low,
            instant: at(12, 0),
            height_m: 0.4,
        };
        let window = [low(), high(), third];
        let series = tide_curve(&window, at(20, 0), Duration::minutes(30));

        let peak = series
            .samples
            .iter()
            .fold(f64::NEG_INFINITY, |a, s| a.max(s.height_m));
        assert_eq!(peak, 1.8);
        assert_eq!(series.now, None);
        assert_eq!(series.bounds(), Some((0.2, 1.8)));
    }

    #[test]
    fn short_windows_produce_nothing() {
        assert_eq!(tide_curve(&[], at(0, 0), Duration::minutes(10)), TideSeries::default());
        assert!(tide_curve(&[low()], at(0, 0), Duration::minutes(10))
            .samples
            .is_empty());
    }

    #[test]
    fn non_positive_step_uses_default() {
        let series = tide_curve(&[low(), high()], at(0, 0), Duration::zero());
        assert_eq!(series.samples[1].mins_rel, DEFAULT_STEP_MINUTES as i32);
    }

    #[test]
    fn zero_length_interval_gives_mean() {
        let mut simultaneous = high();
        simultaneous.instant = low().instant;
        assert!((estimate_height(at(0, 0), &low(), &simultaneous) - 1.0).abs() < 1e-9);
    }
}
