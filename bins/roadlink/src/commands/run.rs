//! `run` and `config`

use anyhow::Result;
use clap::Args;
use roadlink_cli::output::{format_count, format_duration, Status};
use roadlink_cli::progress::{finish_error, finish_success, progress_bar};
use roadlink_cli::render::{print_diff, print_message};
use roadlink_core::config::Config;
use roadlink_core::feed::Diff;
use roadlink_core::registry::Peer;
use roadlink_core::router::{LocalSender, Message};
use roadlink_geo::{format_distance, GeoPoint};
use roadlink_sim::{Simulation, TickReport};
use roadlink_telemetry::{metrics, names, observe_diff, observe_message, TelemetryConfig, Timer};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to a configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulated ticks
    #[arg(short, long, default_value_t = 30)]
    ticks: u64,

    /// Seed for the simulated drivers (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Visibility range in meters
    #[arg(short, long)]
    range: Option<f64>,

    /// Starting latitude
    #[arg(long, allow_negative_numbers = true, default_value_t = 51.5074)]
    lat: f64,

    /// Starting longitude
    #[arg(long, allow_negative_numbers = true, default_value_t = -0.1278)]
    lng: f64,

    /// Message to send right after start (repeatable)
    #[arg(long = "say", value_name = "TEXT")]
    messages: Vec<String>,

    /// Display name of the local driver
    #[arg(long, default_value = "You")]
    name: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    session_id: &'a str,
    seed: u64,
    start: &'a Diff,
    sent: &'a [Message],
    ticks: &'a [TickReport],
    visible: &'a [Peer],
    metrics: serde_json::Value,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.map(|p| p.to_string_lossy().into_owned());
    Ok(Config::load(path.as_deref())?)
}

pub fn show_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    match &config.path {
        Some(source) => println!("# loaded from {}", source),
        None => println!("# built-in defaults"),
    }
    print!("{}", toml::to_string_pretty(&config.schema)?);
    Ok(())
}

pub fn run(args: RunArgs) -> Result<()> {
    let mut schema = load_config(args.config.as_deref())?.schema;
    if let Some(range) = args.range {
        schema.proximity.range_meters = range;
    }
    let seed = args.seed.or(schema.simulation.seed).unwrap_or_else(rand::random);

    let mut telemetry = TelemetryConfig::from(&schema.telemetry);
    telemetry.json = args.json;
    if args.verbose {
        telemetry.log_level = "debug".to_string();
    }
    roadlink_telemetry::init_with_config(telemetry)?;

    let start = GeoPoint::try_new(args.lat, args.lng)?;
    let sender = LocalSender::new("driver_local", args.name.as_str());
    let mut sim = Simulation::new(&schema, sender, start, seed)?;
    sim.session_mut().subscribe(|diff| observe_diff(metrics(), diff));
    sim.session_mut().on_message(|message| observe_message(metrics(), message));

    info!(seed, ticks = args.ticks, %start, "Simulation starting");
    let start_diff = sim.start()?;

    let mut sent = Vec::with_capacity(args.messages.len());
    for text in &args.messages {
        sent.push(sim.send(text)?);
    }

    if args.json {
        let mut reports = Vec::new();
        for _ in 0..args.ticks {
            reports.push(timed_tick(&mut sim)?);
        }
        let visible = sim.session().feed().visible()?;
        let summary = RunSummary {
            session_id: roadlink_telemetry::session_id(),
            seed,
            start: &start_diff,
            sent: &sent,
            ticks: &reports,
            visible: &visible,
            metrics: metrics().export_json(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    Status::header(&format!(
        "Driving from {} · range {} · seed {}",
        start,
        format_distance(schema.proximity.range_meters).trim_end_matches(" away"),
        seed
    ));
    print_diff(&start_diff, Some(&start));
    for message in &sent {
        print_message(message);
    }

    let pb = progress_bar(args.ticks, "Driving");
    for _ in 0..args.ticks {
        let report = match timed_tick(&mut sim) {
            Ok(report) => report,
            Err(e) => {
                finish_error(&pb, "Simulation aborted");
                return Err(e);
            }
        };
        pb.inc(1);

        if report.diffs.is_empty() && report.messages.is_empty() && report.location_error.is_none() {
            continue;
        }
        let observer = sim.session().feed().observer().ok();
        pb.suspend(|| {
            Status::info(&format!("tick {}", report.tick));
            if let Some(error) = &report.location_error {
                Status::warning(&error.to_string());
            }
            for diff in &report.diffs {
                print_diff(diff, observer.as_ref());
            }
            for message in &report.messages {
                print_message(message);
            }
        });
    }
    finish_success(&pb, "Drive finished");

    let session = sim.session();
    let visible = session.feed().visible()?;
    let driven = Duration::from_millis(schema.simulation.tick_ms.saturating_mul(args.ticks));
    Status::success(&format!(
        "{} nearby, {} tracked, {} exchanged over {} of driving",
        format_count(visible.len(), "driver", "drivers"),
        format_count(session.registry().len(), "peer", "peers"),
        format_count(session.router().message_count(), "message", "messages"),
        format_duration(driven),
    ));
    let dropped = metrics().counter(names::REPLIES_DROPPED);
    if dropped > 0 {
        Status::warning(&format!(
            "{} from drivers who had already left",
            format_count(dropped as usize, "reply dropped", "replies dropped")
        ));
    }
    Ok(())
}

fn timed_tick(sim: &mut Simulation) -> Result<TickReport> {
    let timer = Timer::start(names::TICK_MS);
    let report = sim.tick()?;
    timer.stop();

    let session = sim.session();
    metrics().gauge(names::PEERS_TRACKED, session.registry().len() as u64);
    metrics().gauge(
        names::PEERS_VISIBLE,
        session.feed().visible().map_or(0, |v| v.len() as u64),
    );
    metrics().increment_by(names::REPLIES_DROPPED, report.dropped_replies as u64);
    Ok(report)
}
