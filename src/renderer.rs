//! # Station Report Rendering
//!
//! Renders station summaries as plain text for the terminal: a wind line, the
//! temperature, the tide status with the previous and next tide, and an ASCII
//! tide chart with the current height marked.
//!
//! Renderers return `String`s; printing is left to the caller.

use crate::{
    config::StationConfig,
    forecast::{StationInfo, StationObservation, TideInfo},
    interpolate,
    local_time::{self, format_clock},
    tide_state::TideDirection,
    units::{self, SpeedUnit},
    TideSeries,
};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

/// Chart height in text rows
const ROWS: usize = 12;

/// Space reserved for Y-axis labels, including the axis line
const Y_AXIS_WIDTH: usize = 7;

/// Tide height with two decimals, e.g. `1.62m`
pub fn format_height(height_m: f64) -> String {
    format!("{height_m:.2}m")
}

/// Signed offset from now, e.g. `-3h10m`, `+45m`, `now`
pub fn format_offset(mins_rel: i32) -> String {
    if mins_rel == 0 {
        return "now".to_string();
    }
    let sign = if mins_rel < 0 { '-' } else { '+' };
    let (hours, minutes) = (mins_rel.abs() / 60, mins_rel.abs() % 60);
    match (hours, minutes) {
        (0, m) => format!("{sign}{m}m"),
        (h, 0) => format!("{sign}{h}h"),
        (h, m) => format!("{sign}{h}h{m}m"),
    }
}

/// Write `text` into `line` starting at `column`, clipped to the line.
fn put_text(line: &mut [char], column: usize, text: &str) {
    for (slot, ch) in line.iter_mut().skip(column).zip(text.chars()) {
        *slot = ch;
    }
}

/// Render a tide curve as an ASCII chart.
///
/// Samples are plotted left to right, one column each. The interpolated
/// height at "now" is marked with `X`.
pub fn render_chart(series: &TideSeries) -> String {
    let (min_height, max_height) = match series.bounds() {
        Some(bounds) if series.samples.len() >= 2 => bounds,
        _ => return "Not enough tide data to display chart.\n".to_string(),
    };
    let sample_count = series.samples.len();
    let range = max_height - min_height;

    let height_to_row = |height_m: f64| {
        let normalized = if range > 0.0 {
            (height_m - min_height) / range
        } else {
            0.5
        };
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    };

    let mut grid = vec![vec![' '; sample_count + Y_AXIS_WIDTH]; ROWS];

    // Y-axis: labels at top, middle and bottom, axis line on every row
    for height_m in [max_height, (max_height + min_height) / 2.0, min_height] {
        let label = format!("{:>width$}", format_height(height_m), width = Y_AXIS_WIDTH - 1);
        put_text(&mut grid[height_to_row(height_m)], 0, &label);
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    for (column, sample) in series.samples.iter().enumerate() {
        grid[height_to_row(sample.height_m)][column + Y_AXIS_WIDTH] = '•';
    }

    // "Now" sits in the column of the sample closest to mins_rel == 0
    let now_column = series.now.map(|now| {
        let column = series
            .samples
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.mins_rel.abs())
            .map(|(i, _)| i)
            .unwrap_or(0);
        grid[height_to_row(now.height_m)][column + Y_AXIS_WIDTH] = 'X';
        column
    });

    let mut out = String::new();
    for row in grid {
        out.push_str(&format!("{}\n", row.into_iter().collect::<String>().trim_end()));
    }

    // Hour ticks below the chart
    let step = (series.samples[1].mins_rel - series.samples[0].mins_rel).max(1);
    let ticks_every = (60 / step).max(1) as usize;
    let ticks: String = (0..sample_count)
        .map(|i| if i % ticks_every == 0 { '|' } else { ' ' })
        .collect();
    out.push_str(&format!("{}{}\n", " ".repeat(Y_AXIS_WIDTH), ticks.trim_end()));

    // Time labels: window start, now, window end
    let mut labels = vec![' '; sample_count + Y_AXIS_WIDTH];
    let first = format_offset(series.samples[0].mins_rel);
    let last = format_offset(series.samples[sample_count - 1].mins_rel);
    put_text(&mut labels, Y_AXIS_WIDTH, &first);
    if let Some(column) = now_column {
        let start = (column + Y_AXIS_WIDTH).saturating_sub(1);
        if start > Y_AXIS_WIDTH + first.len() {
            put_text(&mut labels, start, "Now");
        }
    }
    put_text(
        &mut labels,
        (sample_count + Y_AXIS_WIDTH).saturating_sub(last.len()),
        &last,
    );
    out.push_str(&format!("{}\n", labels.into_iter().collect::<String>().trim_end()));

    out
}

fn direction_line(direction: TideDirection) -> &'static str {
    match direction {
        TideDirection::Rising => "↑ Currently rising",
        TideDirection::Falling => "↓ Currently falling",
        TideDirection::Unknown => "Currently unknown",
    }
}

fn render_tides(out: &mut String, tide: &TideInfo, tz: &Tz, now: DateTime<Utc>, step: Duration) {
    let previous = &tide.previous_tide;
    let next = &tide.next_tide;

    out.push_str(&format!(
        "  Last {} Tide: {} ({})\n",
        previous.kind.label(),
        format_clock(previous.instant, tz),
        format_height(previous.height_m)
    ));
    out.push_str(&format!("  {}\n", direction_line(tide.status)));
    out.push_str(&format!(
        "  Next {} Tide {} at {}, height {}\n",
        next.kind.label(),
        units::format_time_until(next.instant, now),
        format_clock(next.instant, tz),
        format_height(next.height_m)
    ));

    let series = interpolate::tide_curve(&tide.tide_chart_data, now, step);
    if let Some(current) = series.now {
        out.push_str(&format!("  Now: {}\n", format_height(current.height_m)));
    }
    out.push('\n');
    out.push_str(&render_chart(&series));
}

/// Render one station's full report.
///
/// Times are shown on the station's wall clock: the zone from the observation,
/// then the configured zone, then UTC.
pub fn render_station(
    station: &StationConfig,
    observation: Option<&StationObservation>,
    info: &StationInfo,
    now: DateTime<Utc>,
    unit: SpeedUnit,
    chart_step: Duration,
) -> String {
    let tz = observation
        .and_then(|o| o.time_zone.as_deref())
        .or(station.time_zone.as_deref())
        .and_then(|zone| local_time::parse_zone(zone).ok())
        .unwrap_or(Tz::UTC);

    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", station.name, station.id));

    match observation {
        Some(obs) => {
            let speed = units::convert_speed(obs.wind_speed, obs.wind_gust, unit);
            out.push_str(&format!(
                "  Wind: {} {} {} ({:?})\n",
                obs.direction_text,
                speed.range_value,
                speed.unit_label,
                units::wind_speed_class(obs.wind_speed)
            ));
        }
        None => out.push_str("  Wind: no observation\n"),
    }

    if let (Some(min), Some(max)) = (info.wind_min, info.wind_max) {
        // Forecast wind range is reported in km/h
        let range = units::convert_speed(
            units::kmh_to_knots(min),
            units::kmh_to_knots(max),
            unit,
        );
        out.push_str(&format!("  Wind today: {} {}\n", range.range_value, range.unit_label));
    }

    if let Some(current) = info.current_temp {
        out.push_str(&format!("  Temperature: {current:.1}°C"));
        if let Some(apparent) = info.apparent_temp {
            out.push_str(&format!(" (feels like {apparent:.1}°C)"));
        }
        out.push('\n');
    }
    if let (Some(min), Some(max)) = (info.temp_min, info.temp_max) {
        out.push_str(&format!("  Today: {min:.0}°C - {max:.0}°C\n"));
    }

    if let Some(tide) = &info.tide_data {
        match &info.tide_location_name {
            Some(name) if *name != station.name => {
                out.push_str(&format!("  Tides for {name}\n"));
            }
            _ => out.push_str("  Tides\n"),
        }
        render_tides(&mut out, tide, &tz, now, chart_step);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sample, TideEvent, TideKind};
    use chrono::TimeZone;

    fn test_series() -> TideSeries {
        TideSeries {
            samples: vec![
                Sample {
                    mins_rel: -20,
                    height_m: 1.0,
                },
                Sample {
                    mins_rel: -10,
                    height_m: 2.0,
                },
                Sample {
                    mins_rel: 0,
                    height_m: 3.0,
                },
                Sample {
                    mins_rel: 10,
                    height_m: 2.0,
                },
                Sample {
                    mins_rel: 20,
                    height_m: 1.0,
                },
            ],
            now: Some(Sample {
                mins_rel: 0,
                height_m: 3.0,
            }),
        }
    }

    #[test]
    fn test_format_height() {
        assert_eq!(format_height(1.624), "1.62m");
        assert_eq!(format_height(-0.1), "-0.10m");
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(0), "now");
        assert_eq!(format_offset(-190), "-3h10m");
        assert_eq!(format_offset(120), "+2h");
        assert_eq!(format_offset(45), "+45m");
    }

    /// Two hours either side of a peak at "now", every 10 minutes
    fn peaked_series() -> TideSeries {
        let samples: Vec<Sample> = (-12..=12)
            .map(|i| Sample {
                mins_rel: i * 10,
                height_m: 3.0 - (i * 10).abs() as f64 / 60.0,
            })
            .collect();
        TideSeries {
            now: Some(samples[12]),
            samples,
        }
    }

    #[test]
    fn test_ascii_chart_marks_now() {
        let chart = render_chart(&peaked_series());
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), ROWS + 2);

        // Peak is at the top row and is also "now"
        assert!(lines[0].contains('X'));
        assert!(lines[0].starts_with(" 3.00m│"));
        assert!(lines[ROWS - 1].starts_with(" 1.00m│"));
        assert!(lines[ROWS + 1].contains("-2h"));
        assert!(lines[ROWS + 1].contains("Now"));
        assert!(lines[ROWS + 1].ends_with("+2h"));
    }

    #[test]
    fn test_ascii_chart_without_now() {
        let mut series = test_series();
        series.now = None;
        let chart = render_chart(&series);
        assert!(!chart.contains('X'));
        assert!(!chart.contains("Now"));
    }

    #[test]
    fn test_flat_series_renders() {
        let series = TideSeries {
            samples: vec![
                Sample {
                    mins_rel: 0,
                    height_m: 1.0,
                },
                Sample {
                    mins_rel: 10,
                    height_m: 1.0,
                },
            ],
            now: None,
        };
        assert_eq!(render_chart(&series).lines().count(), ROWS + 2);
    }

    #[test]
    fn test_not_enough_data() {
        assert!(render_chart(&TideSeries::default()).starts_with("Not enough tide data"));
    }

    #[test]
    fn test_station_report() {
        let at = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
        let low = TideEvent {
            kind: TideKind::Low,
            instant: at(0),
            height_m: 0.2,
        };
        let high = TideEvent {
            kind: TideKind::High,
            instant: at(6),
            height_m: 1.8,
        };
        let info = StationInfo {
            tide_data: Some(TideInfo {
                status: TideDirection::Rising,
                previous_tide: low,
                next_tide: high,
                tide_chart_data: vec![low, high],
            }),
            tide_location_name: Some("Fort Denison".to_string()),
            current_temp: Some(22.4),
            ..StationInfo::default()
        };
        let station = StationConfig {
            id: "4988".to_string(),
            name: "Manly".to_string(),
            time_zone: Some("Australia/Sydney".to_string()),
        };

        let report = render_station(
            &station,
            None,
            &info,
            at(3),
            SpeedUnit::Knots,
            Duration::minutes(10),
        );

        assert!(report.starts_with("Manly (4988)"));
        assert!(report.contains("Wind: no observation"));
        assert!(report.contains("Temperature: 22.4°C"));
        assert!(report.contains("Tides for Fort Denison"));
        assert!(report.contains("Last Low Tide: 11:00 (0.20m)"));
        assert!(report.contains("↑ Currently rising"));
        assert!(report.contains("Next High Tide in 3h 0m at 17:00, height 1.80m"));
        assert!(report.contains("Now: 1.00m"));
        assert!(report.contains('X'));
    }
}
