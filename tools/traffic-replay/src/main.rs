//! traffic-replay: run a traffic scenario headless and print snapshots.
//!
//! Usage:
//!   traffic-replay scenario.json --ticks 600 --dt 0.1 --every 10 > run.jsonl
//!
//! Snapshots go to stdout as one JSON document per line, events are
//! logged to stderr. Set RUST_LOG to change the log level.
//!
//! `--grid` takes a `TerrainGrid` serialized as JSON (header, elevations
//! in metres, optional packed water mask).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process;

use aitraffic_sim::{Scenario, SimConfig, TrafficManager};
use aitraffic_terrain::{FlatGround, GroundQuery, TerrainGrid};
use tracing_subscriber::EnvFilter;

struct Options {
    scenario: String,
    ticks: u64,
    dt: f64,
    seed: u64,
    every: u64,
    ground: Box<dyn GroundQuery>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || matches!(args[1].as_str(), "help" | "--help" | "-h") {
        print_usage();
        process::exit(1);
    }

    let options = match parse_options(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {message}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(message) = run(options) {
        eprintln!("Error: {message}");
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!(
        "traffic-replay: run an AI traffic scenario without a viewer\n\
         \n\
         Usage: traffic-replay <scenario.json> [options]\n\
         \n\
           --ticks <N>        Number of ticks to run (default: 600)\n\
           --dt <secs>        Tick length in seconds (default: 0.1)\n\
           --seed <N>         RNG seed (default: 42)\n\
           --every <N>        Print a snapshot every N ticks (default: 10)\n\
           --ground <ft>      Flat land at this elevation (default: 0)\n\
           --sea              Open sea instead of land\n\
           --grid <file>      Terrain grid JSON; off-grid points have no ground\n\
         \n\
         Example:\n\
         \n\
           RUST_LOG=debug traffic-replay harbour.json --ticks 3000 --every 50 > harbour.jsonl\n"
    );
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{flag} needs a value"))?;
    value.parse().map_err(|_| format!("invalid value for {flag}: {value}"))
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        scenario: args[0].clone(),
        ticks: 600,
        dt: 0.1,
        seed: SimConfig::default().seed,
        every: 10,
        ground: Box::new(FlatGround::default()),
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1);
        match flag {
            "--ticks" => options.ticks = parse_value(flag, value)?,
            "--dt" => options.dt = parse_value(flag, value)?,
            "--seed" => options.seed = parse_value(flag, value)?,
            "--every" => options.every = parse_value::<u64>(flag, value)?.max(1),
            "--ground" => options.ground = Box::new(FlatGround::new(parse_value(flag, value)?)),
            "--grid" => {
                let path = value.ok_or_else(|| format!("{flag} needs a value"))?;
                options.ground = Box::new(load_grid(path)?);
            }
            "--sea" => {
                options.ground = Box::new(FlatGround::sea());
                i += 1;
                continue;
            }
            other => return Err(format!("unknown option: {other}")),
        }
        i += 2;
    }

    if !options.dt.is_finite() || options.dt < 0.0 {
        return Err(format!("--dt must be a non-negative number, got {}", options.dt));
    }
    Ok(options)
}

fn load_grid(path: &str) -> Result<TerrainGrid, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {path}: {e}"))?;
    let grid: TerrainGrid =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| format!("failed to parse {path}: {e}"))?;
    let h = &grid.header;
    let cells = h.width as usize * h.height as usize;
    if grid.elevations.len() != cells {
        return Err(format!(
            "{path}: {}x{} grid needs {cells} elevations, found {}",
            h.width,
            h.height,
            grid.elevations.len()
        ));
    }
    tracing::info!(
        path,
        width = h.width,
        height = h.height,
        cell_size = h.cell_size,
        "terrain grid loaded"
    );
    Ok(grid)
}

fn run(options: Options) -> Result<(), String> {
    let scenario =
        Scenario::load(&options.scenario).map_err(|e| format!("failed to load {}: {e}", options.scenario))?;

    let config = SimConfig {
        seed: options.seed,
        ..Default::default()
    };
    let mut manager = TrafficManager::with_ground(config, options.ground);
    let spawned = scenario.spawn_into(&mut manager);
    tracing::info!(
        scenario = %scenario.name,
        entities = spawned.len(),
        ticks = options.ticks,
        dt = options.dt,
        seed = options.seed,
        "replay starting"
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for tick in 1..=options.ticks {
        manager.tick(options.dt, &scenario.viewer);

        for event in manager.drain_events() {
            tracing::debug!(tick, event = ?event, "traffic event");
        }

        if tick % options.every == 0 || tick == options.ticks {
            let line = serde_json::to_string(&manager.snapshot()).map_err(|e| format!("encode failed: {e}"))?;
            writeln!(out, "{line}").map_err(|e| format!("write failed: {e}"))?;
        }
    }
    out.flush().map_err(|e| format!("write failed: {e}"))?;

    tracing::info!(remaining = manager.len(), elapsed_secs = manager.time().elapsed_secs, "replay finished");
    Ok(())
}
