//! Field renderer service.
//!
//! Reads a station observation feed, renders the interpolated temperature
//! field for a fixed view and writes PNG frames. With `--watch` the feed is
//! re-read on an interval and every delivery replaces the previous snapshot.

mod feed;
mod sink;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use field_common::GeoBounds;
use field_engine::{load_boundary_or_unclipped, ColorRamp, EngineConfig, FieldStyle};
use render_scheduler::{RenderScheduler, TickOutcome, ViewState};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::sink::PngSink;

#[derive(Parser, Debug)]
#[command(name = "field-renderer")]
#[command(about = "Render interpolated station temperature fields to PNG")]
struct Args {
    /// Station feed (JSON array of station records)
    #[arg(short, long, env = "FIELD_STATIONS")]
    stations: PathBuf,

    /// Boundary GeoJSON used to clip the field
    #[arg(short, long, env = "FIELD_BOUNDARY")]
    boundary: Option<PathBuf>,

    /// View bounds as "south,west,north,east"
    #[arg(long, default_value = "55.0,10.5,69.5,24.5", env = "FIELD_BOUNDS")]
    bounds: String,

    /// View zoom level
    #[arg(short, long, default_value = "6")]
    zoom: u8,

    /// View width in pixels
    #[arg(long, default_value = "800")]
    width: usize,

    /// View height in pixels
    #[arg(long, default_value = "600")]
    height: usize,

    /// Directory frames are written to
    #[arg(short, long, default_value = "frames", env = "FIELD_OUTPUT_DIR")]
    output: PathBuf,

    /// Engine configuration (YAML)
    #[arg(short, long, env = "FIELD_CONFIG")]
    config: Option<PathBuf>,

    /// Color ramp (JSON)
    #[arg(long, env = "FIELD_RAMP")]
    ramp: Option<PathBuf>,

    /// Keep running and re-read the feed every interval
    #[arg(long)]
    watch: bool,

    /// Feed refresh interval in seconds
    #[arg(long, default_value = "60", env = "FIELD_INTERVAL_SECS")]
    interval_secs: u64,

    /// Sample on the main thread instead of a worker
    #[arg(long)]
    inline: bool,

    /// Log an estimate at "lat,lon" after every delivery
    #[arg(long)]
    probe: Vec<String>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    if args.json_logs {
        fmt().with_env_filter(filter).with_target(true).json().init();
    } else {
        fmt().with_env_filter(filter).with_target(true).init();
    }

    let config = load_config(&args)?;
    let bounds = GeoBounds::from_query_string(&args.bounds)
        .with_context(|| format!("invalid --bounds {}", args.bounds))?;
    let probes = args
        .probe
        .iter()
        .map(|p| parse_probe(p))
        .collect::<Result<Vec<_>>>()?;

    let mut style = FieldStyle::from_config(&config);
    if let Some(path) = &args.ramp {
        style = style.with_ramp(ColorRamp::from_file(path)?);
    }

    info!(
        stations = %args.stations.display(),
        output = %args.output.display(),
        watch = args.watch,
        "Starting field renderer"
    );

    let sink = PngSink::new(args.output.clone());
    let mut scheduler = if args.inline {
        RenderScheduler::new(config.clone(), sink)
    } else {
        RenderScheduler::with_worker(config.clone(), sink)
    };
    scheduler.set_style(style);
    if let Some(path) = &args.boundary {
        scheduler.set_boundary(load_boundary_or_unclipped(path));
    }
    scheduler.set_view(ViewState::new(bounds, args.zoom, args.width, args.height));

    let mut interval = tokio::time::interval(Duration::from_secs(args.interval_secs.max(1)));
    loop {
        interval.tick().await;

        match feed::load(&args.stations, Utc::now(), config.stale_after()) {
            Ok(delivery) => {
                let s = &delivery.summary;
                info!(
                    total = s.total,
                    fresh = s.fresh,
                    stale = s.stale,
                    warmest = ?s.warmest,
                    coldest = ?s.coldest,
                    newest = ?s.newest,
                    "Feed delivery"
                );
                scheduler.set_observations(&delivery.observations);
            }
            // A failed refresh keeps the previous snapshot on display.
            Err(e) if args.watch => warn!(error = %e, "Feed refresh failed"),
            Err(e) => return Err(e),
        }

        if let TickOutcome::Dispatched(id) = scheduler.tick() {
            info!(id, "Waiting for worker");
            scheduler.next_result().await;
        }

        for &(lat, lon) in &probes {
            match scheduler.estimate(lat, lon) {
                Some(value) => info!(lat, lon, value, "Probe"),
                None => info!(lat, lon, "Probe: no estimate"),
            }
        }

        if !args.watch {
            break;
        }
    }

    let metrics = scheduler.metrics().clone();
    let sink = scheduler.into_target();
    info!(
        frames = sink.written(),
        failures = sink.failures(),
        dispatched = metrics.dispatched,
        skipped = metrics.skipped_unchanged,
        "Field renderer finished"
    );

    if sink.failures() > 0 {
        anyhow::bail!("{} frame(s) could not be written", sink.failures());
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_yaml_file(path)?,
        None => EngineConfig::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

fn parse_probe(s: &str) -> Result<(f64, f64)> {
    let (lat, lon) = s
        .split_once(',')
        .with_context(|| format!("probe '{}' must be 'lat,lon'", s))?;
    Ok((
        lat.trim().parse().with_context(|| format!("invalid probe latitude '{}'", lat))?,
        lon.trim().parse().with_context(|| format!("invalid probe longitude '{}'", lon))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe() {
        assert_eq!(parse_probe("59.33, 18.07").unwrap(), (59.33, 18.07));
        assert!(parse_probe("59.33").is_err());
        assert!(parse_probe("north,18").is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["field-renderer", "--stations", "feed.json"]).unwrap();
        assert_eq!(args.zoom, 6);
        assert_eq!((args.width, args.height), (800, 600));
        assert_eq!(args.interval_secs, 60);
        assert!(!args.watch);
        assert!(GeoBounds::from_query_string(&args.bounds).is_ok());
    }
}
