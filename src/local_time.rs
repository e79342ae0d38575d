//! # Local-Time Resolution
//!
//! WillyWeather reports tide times as naive wall-clock strings such as
//! `"2024-04-07 02:30:00"`, with no UTC offset. This module anchors them to an
//! absolute instant using the station's IANA zone.
//!
//! ## Offset by Reprojection
//! The zone offset is discovered without ever asking "parse this as zone X":
//! 1. Read the naive string as if it were UTC, giving a pseudo-instant `P`
//! 2. Render `P` on the zone's wall clock
//! 3. Read that rendering as UTC again, giving `Q`
//! 4. The shift `P - Q` is the negated zone offset; the instant is `P + (P - Q)`
//!
//! A single pass can pick the wrong side of a transition when `P` and the true
//! instant straddle it, so [`reproject`] repeats step 2-4 at the first estimate.
//!
//! ## Daylight-Saving Transitions
//! Readings inside a spring-forward gap do not exist and readings inside a
//! fall-back overlap exist twice. [`DstPolicy`] decides what happens to both.

use crate::TideError;
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Vendor timestamp layout, e.g. `2024-01-01 13:45:00`
pub const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const LOCAL_LEN: usize = 19;

/// How to resolve wall-clock readings that a DST transition skips or repeats.
///
/// `Compatible` matches the behaviour of most calendar software: the first
/// occurrence of a repeated reading, and a skipped reading pushed forward by the
/// length of the gap (02:30 in a 02:00 → 03:00 jump becomes 03:30).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DstPolicy {
    #[default]
    Compatible,
    /// Repeated: first occurrence. Skipped: shifted back before the gap.
    Earlier,
    /// Repeated: second occurrence. Skipped: shifted forward past the gap.
    Later,
    /// Both cases are errors.
    Reject,
}

/// Look up an IANA zone identifier such as `"Australia/Sydney"`.
pub fn parse_zone(zone: &str) -> Result<Tz, TideError> {
    zone.parse::<Tz>()
        .map_err(|_| TideError::InvalidTimeZone(zone.to_string()))
}

/// Parse a `YYYY-MM-DD HH:MM:SS` wall-clock string.
///
/// Every field must be zero-padded to its full width. Hour `24` and leap
/// second `60` are rejected rather than rolled over.
pub fn parse_local(local: &str) -> Result<NaiveDateTime, TideError> {
    let malformed = || TideError::MalformedTimestamp(local.to_string());
    if local.len() != LOCAL_LEN || !local.is_ascii() {
        return Err(malformed());
    }
    let naive = NaiveDateTime::parse_from_str(local, LOCAL_FORMAT).map_err(|_| malformed())?;

    // chrono accepts padded or short fields and leap seconds; the vendor layout does not
    if naive.nanosecond() != 0 || naive.format(LOCAL_FORMAT).to_string() != local {
        return Err(malformed());
    }
    Ok(naive)
}

/// The shift `P - Q` for a pseudo-instant: how far the zone's wall clock is
/// behind UTC at `pseudo` read as a UTC instant.
///
/// Adding the shift to a wall-clock reading turns it into UTC.
pub fn zone_shift(pseudo: NaiveDateTime, tz: &Tz) -> Duration {
    let rendered = tz.from_utc_datetime(&pseudo).naive_local();
    pseudo - rendered
}

/// Anchor a wall-clock reading by reprojection, refining once at the first estimate.
///
/// Exact for every reading that exists exactly once in the zone. Gap and overlap
/// readings go through [`resolve_naive`] instead.
pub fn reproject(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    let estimate = naive + zone_shift(naive, tz);
    (naive + zone_shift(estimate, tz)).and_utc()
}

/// Resolve a local timestamp using [`DstPolicy::Compatible`].
///
/// # Example
/// ```
/// use wind_sniff_lib::resolve_local_time;
///
/// let instant = resolve_local_time("2024-07-01 12:00:00", "Australia/Sydney").unwrap();
/// assert_eq!(instant.to_rfc3339(), "2024-07-01T02:00:00+00:00");
/// ```
pub fn resolve_local_time(local: &str, zone: &str) -> Result<DateTime<Utc>, TideError> {
    resolve_local_time_with(local, zone, DstPolicy::Compatible)
}

/// Resolve a local timestamp in `zone`, applying `policy` at DST transitions.
pub fn resolve_local_time_with(
    local: &str,
    zone: &str,
    policy: DstPolicy,
) -> Result<DateTime<Utc>, TideError> {
    let tz = parse_zone(zone)?;
    let naive = parse_local(local)?;
    resolve_naive(naive, &tz, policy)
}

/// Resolve an already parsed wall-clock reading.
pub fn resolve_naive(
    naive: NaiveDateTime,
    tz: &Tz,
    policy: DstPolicy,
) -> Result<DateTime<Utc>, TideError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(_) => Ok(reproject(naive, tz)),
        LocalResult::Ambiguous(a, b) => {
            let (first, second) = if a <= b { (a, b) } else { (b, a) };
            match policy {
                DstPolicy::Compatible | DstPolicy::Earlier => Ok(first.with_timezone(&Utc)),
                DstPolicy::Later => Ok(second.with_timezone(&Utc)),
                DstPolicy::Reject => Err(TideError::AmbiguousLocalTime {
                    local: naive.format(LOCAL_FORMAT).to_string(),
                    zone: tz.name().to_string(),
                }),
            }
        }
        LocalResult::None => {
            // Offsets a day either side are clear of the transition.
            let day = Duration::days(1);
            let shift = match policy {
                DstPolicy::Compatible | DstPolicy::Later => zone_shift(naive - day, tz),
                DstPolicy::Earlier => zone_shift(naive + day, tz),
                DstPolicy::Reject => {
                    return Err(TideError::NonexistentLocalTime {
                        local: naive.format(LOCAL_FORMAT).to_string(),
                        zone: tz.name().to_string(),
                    })
                }
            };
            Ok((naive + shift).and_utc())
        }
    }
}

/// Render an instant on the zone's wall clock as `YYYY-MM-DD HH:MM:SS`.
pub fn format_local(instant: DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format(LOCAL_FORMAT).to_string()
}

/// Render an instant as `HH:MM` on the zone's wall clock.
pub fn format_clock(instant: DateTime<Utc>, tz: &Tz) -> String {
    instant.with_timezone(tz).format("%H:%M").to_string()
}
