//! # Wind Sniff Entry Point
//!
//! Fetches the latest wind observation and the station summary (tides,
//! temperature, wind forecast) for every saved station and prints them.
//!
//! ```text
//! wind-sniff [--json] [--config PATH]     report every saved station
//! wind-sniff --search TERM                find station ids by name
//! wind-sniff --add ID                     save a station to the config file
//! ```
//!
//! The API key is read from the environment variable named in the config
//! (`WILLYWEATHER_API_KEY` by default). Set `RUST_LOG=debug` for request logs.

use anyhow::Context;
use chrono::Utc;
use std::{cmp::Ordering, env};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use wind_sniff_lib::{
    client::WillyWeatherClient,
    config::{Config, StationConfig, CONFIG_FILE},
    forecast::{SortOrder, StationInfo, StationObservation},
    renderer::render_station,
};

/// What the invocation asks for.
enum Command {
    Report,
    Search(String),
    Add(String),
}

/// Command line options.
struct Args {
    command: Command,
    json: bool,
    config_path: String,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        command: Command::Report,
        json: false,
        config_path: CONFIG_FILE.to_string(),
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--config" => {
                args.config_path = iter.next().context("--config needs a path")?;
            }
            "--search" => {
                args.command = Command::Search(iter.next().context("--search needs a term")?);
            }
            "--add" => {
                args.command = Command::Add(iter.next().context("--add needs a station id")?);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

/// Print vendor locations matching `term`, one per line.
fn search(rt: &tokio::runtime::Runtime, client: &WillyWeatherClient, term: &str) -> anyhow::Result<()> {
    let matches = rt.block_on(client.search_locations(term))?;
    if matches.is_empty() {
        println!("No locations match {term:?}");
    }
    for place in matches {
        println!(
            "{:>8}  {}{}",
            place.id.map(|id| id.to_string()).unwrap_or_default(),
            place.name.as_deref().unwrap_or("?"),
            place.state.map(|state| format!(", {state}")).unwrap_or_default()
        );
    }
    Ok(())
}

/// Look up station `id` and append it to the config file.
fn add_station(
    rt: &tokio::runtime::Runtime,
    client: &WillyWeatherClient,
    mut config: Config,
    path: &str,
    id: &str,
) -> anyhow::Result<()> {
    if config.station(id).is_some() {
        println!("Station {id} is already saved");
        return Ok(());
    }
    let response = rt.block_on(client.forecast(id, &[], false))?;
    let location = response.location.unwrap_or_default();
    let station = StationConfig {
        id: id.to_string(),
        name: location.name.unwrap_or_else(|| id.to_string()),
        time_zone: location.time_zone,
    };
    println!("Saved {} ({})", station.name, station.id);
    config.stations.push(station);
    config.save_to_path(path)
}

/// Observed rows first in the configured order, stations without an observation last.
fn compare_rows(
    order: SortOrder,
    a: Option<&StationObservation>,
    b: Option<&StationObservation>,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => order.compare(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = parse_args()?;
    let config = Config::load_from_path(&args.config_path);
    let client = WillyWeatherClient::from_config(&config)?;

    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;

    match &args.command {
        Command::Search(term) => return search(&rt, &client, term),
        Command::Add(id) => return add_station(&rt, &client, config, &args.config_path, id),
        Command::Report => {}
    }

    if config.stations.is_empty() {
        warn!(path = %args.config_path, "no stations configured; add one with --add ID");
        return Ok(());
    }

    let now = Utc::now();
    let (observations, infos) = rt.block_on(async {
        let observations = client.observations(&config.stations).await;

        // Station summaries are independent: a failure only blanks that station
        let mut infos = Vec::with_capacity(config.stations.len());
        for station in &config.stations {
            let info = client
                .station_info(station, now)
                .await
                .unwrap_or_else(|error| {
                    warn!(station = %station.id, %error, "station info unavailable");
                    StationInfo::default()
                });
            infos.push(info);
        }
        (observations, infos)
    });
    info!(stations = config.stations.len(), "fetched station data");

    let mut rows: Vec<_> = config
        .stations
        .iter()
        .zip(observations)
        .zip(infos)
        .map(|((station, observation), info)| (station, observation, info))
        .collect();
    rows.sort_by(|a, b| compare_rows(config.display.sort_order, a.1.as_ref(), b.1.as_ref()));

    if args.json {
        let report: Vec<_> = rows
            .iter()
            .map(|(station, observation, info)| {
                serde_json::json!({
                    "station": station,
                    "observation": observation,
                    "info": info,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let chart_step = config.display.chart_step();
    for (station, observation, info) in &rows {
        if info.is_empty() && observation.is_none() {
            println!("{} ({}): no data available\n", station.name, station.id);
            continue;
        }
        println!(
            "{}",
            render_station(
                station,
                observation.as_ref(),
                info,
                now,
                config.display.speed_unit,
                chart_step,
            )
        );
    }

    Ok(())
}
