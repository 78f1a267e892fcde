use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use urban_thermal::{
    engine::{EngineBuilder, EngineSettings},
    map::{AllocationReport, CityMap},
    rng::RngManager,
    scenario::{Scenario, ScenarioLoader},
    snapshot::SnapshotWriter,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "City block layout and diurnal thermal map")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/small_town.yaml", conflicts_with = "input")]
    scenario: PathBuf,

    /// Path to a plain-text `Key: value` input file
    #[arg(long)]
    input: Option<PathBuf>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Hour of day (0-24) for the single thermal view
    #[arg(long)]
    hour: Option<f64>,

    /// Number of timeline frames to evaluate (0 skips the timeline)
    #[arg(long)]
    frames: Option<u64>,

    /// Hours advanced per timeline frame
    #[arg(long)]
    hours_per_frame: Option<f64>,

    /// Write a snapshot every N frames (0 disables)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Serve the timeline over HTTP instead of running it in place
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = init_tracing();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(cli.input.as_ref().unwrap_or(&cli.scenario))?;
    apply_overrides(&mut scenario, &cli)?;
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        filter
            .reload(EnvFilter::new(&scenario.log_level))
            .context("failed to apply scenario log level")?;
    }

    let frames = cli.frames.unwrap_or(scenario.timeline.frames);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_frames);
    let snapshot_dir = cli
        .snapshot_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
        return runtime.block_on(web::run(WebServerConfig {
            scenario,
            frames,
            snapshot_interval,
            snapshot_dir,
            host: cli.host,
            port: cli.port,
        }));
    }

    let mut rng = RngManager::new(scenario.seed);
    let (mut map, report) = scenario.build_map(&mut rng)?;
    print_summary(&scenario, &map, &report);

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        timeline: scenario.timeline,
        snapshot_interval_frames: snapshot_interval,
        snapshot_dir: snapshot_dir.clone(),
    };
    let mut engine = EngineBuilder::new(settings).build();

    let view = engine.evaluate(&mut map, 0, scenario.hour);
    if let Some(stats) = view.stats {
        println!(
            "Thermal view at {:.2} h: min {:.1}°C, max {:.1}°C, mean {:.1}°C",
            scenario.hour, stats.min, stats.max, stats.mean
        );
    }
    for block in map.blocks() {
        println!("  {block}");
    }
    if snapshot_interval > 0 {
        let path = SnapshotWriter::new(&snapshot_dir, 1).write_named(&view, "view")?;
        println!("View written to {}", path.display());
    }

    if frames > 0 {
        let mut peak = f64::NEG_INFINITY;
        engine.run_with_hook(&mut map, frames, |snapshot, _| {
            if let Some(stats) = snapshot.stats {
                peak = peak.max(stats.max);
            }
        })?;
        println!(
            "Timeline of {} frames ({} h per frame) completed, hottest pixel {:.1}°C",
            frames, scenario.timeline.hours_per_frame, peak
        );
    }
    Ok(())
}

fn apply_overrides(scenario: &mut Scenario, cli: &Cli) -> Result<()> {
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    if let Some(hour) = cli.hour {
        scenario.hour = hour;
    }
    if let Some(hours_per_frame) = cli.hours_per_frame {
        scenario.timeline.hours_per_frame = hours_per_frame;
    }
    scenario.validate().context("invalid command line override")?;
    Ok(())
}

/// Starts logging from `RUST_LOG` (or `info`) before anything is loaded. The
/// returned handle swaps in the scenario's level once it is known.
fn init_tracing() -> reload::Handle<EnvFilter, Registry> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
    handle
}

fn print_summary(scenario: &Scenario, map: &CityMap, report: &AllocationReport) {
    println!("Map configuration for '{}'", scenario.name);
    println!("  Map shape         {}", map.shape());
    println!("  Block size        {} px", map.block_size());
    println!("  Houses added      {}", report.houses_placed);
    println!("  Trees added       {}", report.trees_placed);
    println!("  Requested houses  {}", report.houses_requested);
    println!("  Requested trees   {}", report.trees_requested);
    println!("  House capacity    {}", report.house_capacity);
    println!("  Tree capacity     {}", report.tree_capacity);
    if report.house_shortfall() > 0 {
        println!(
            "Only {} houses could be added due to space limitations.",
            report.houses_placed
        );
    }
    if report.tree_shortfall() > 0 {
        println!(
            "Only {} trees could be added due to space limitations.",
            report.trees_placed
        );
    }
}
