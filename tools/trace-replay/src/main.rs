use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, ValueEnum};
use geo::Point;

use slug_chase_core::config::{ChaseConfig, FilterConfig};
use slug_chase_core::events::GameEvent;
use slug_chase_core::session::ChaseSession;

/// Replay a recorded GPS trace through a chase session.
///
/// The trace is one fix per line: `lon,lat,unix_seconds`. Lines starting
/// with `#` are ignored.
#[derive(Parser)]
struct Args {
    /// Trace file to replay
    trace: PathBuf,

    #[arg(long, value_enum, default_value_t = Preset::Standard)]
    preset: Preset,

    #[arg(long, value_enum, default_value_t = Filter::TwoStage)]
    filter: Filter,

    /// Keep ticking this many seconds after the trace ends
    #[arg(long, default_value_t = 0)]
    linger: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Standard,
    Relaxed,
    Drill,
}

#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    TwoStage,
    Windowed,
}

fn parse_trace(text: &str) -> anyhow::Result<Vec<(Point, DateTime<Utc>)>> {
    let mut fixes = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split(',');
        let mut field = |name: &str| {
            fields
                .next()
                .with_context(|| format!("line {}: missing {name}", number + 1))?
                .trim()
                .parse::<f64>()
                .with_context(|| format!("line {}: bad {name}", number + 1))
        };

        let lon = field("longitude")?;
        let lat = field("latitude")?;
        let seconds = field("timestamp")?;
        let at = Utc
            .timestamp_millis_opt((seconds * 1000.0) as i64)
            .single()
            .with_context(|| format!("line {}: timestamp out of range", number + 1))?;

        fixes.push((Point::new(lon, lat), at));
    }

    if fixes.is_empty() {
        bail!("trace contains no fixes");
    }
    if fixes.windows(2).any(|pair| pair[1].1 < pair[0].1) {
        bail!("trace timestamps must be non-decreasing");
    }
    Ok(fixes)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let chase = match args.preset {
        Preset::Standard => ChaseConfig::standard(),
        Preset::Relaxed => ChaseConfig::relaxed(),
        Preset::Drill => ChaseConfig::drill(),
    };
    let filter = match args.filter {
        Filter::TwoStage => FilterConfig::two_stage(),
        Filter::Windowed => FilterConfig::windowed(),
    };

    let text = fs::read_to_string(&args.trace)
        .with_context(|| format!("reading {}", args.trace.display()))?;
    let fixes = parse_trace(&text)?;
    log::info!("replaying {} fixes", fixes.len());

    let mut session = ChaseSession::new(chase, filter);
    let mut events = session.subscribe_events();

    let start = fixes[0].1;
    let end = fixes[fixes.len() - 1].1 + chrono::Duration::seconds(args.linger as i64);
    let mut pending = fixes.into_iter().peekable();

    let mut now = start;
    while now <= end && !session.is_captured() {
        while let Some((point, at)) = pending.next_if(|(_, at)| *at <= now) {
            session.handle_fix(Some(point), at);
        }
        session.tick(now);

        while let Ok(event) = events.try_recv() {
            match event {
                GameEvent::CoinsAwarded { count } => log::info!("earned {count} coins"),
                GameEvent::Captured { separation_m } => {
                    log::info!("caught at {separation_m:.2} m")
                }
                GameEvent::SpeedUpdated { kmh } => log::debug!("player speed {kmh:.1} km/h"),
                GameEvent::SeparationUpdated { meters } => {
                    log::debug!("slug is {meters:.1} m away")
                }
                _ => {}
            }
        }

        now += chrono::Duration::seconds(1);
    }

    let summary = session.finish(now);
    println!(
        "{}: {:.0} m in {:.0} s, {} coins",
        if summary.captured { "caught" } else { "escaped" },
        summary.distance_m,
        summary.duration_s,
        summary.coins,
    );

    Ok(())
}
