//! grid_city — command-line demo for the frostline engine.
//!
//! Loads a synthetic 4 × 4 block grid in Gangnam, Seoul, attaches the
//! built-in hazard scores (or a user-supplied risk CSV), and then either
//! routes between two coordinates or plans a snow-plow coverage route.
//! Results are printed as JSON.
//!
//! ```text
//! grid_city route 37.5000 127.0300 37.5036 127.0345 --mode safe
//! grid_city cover gangnam 37.5012 127.0315 --untrained
//! ```

mod network;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fl_core::{EngineConfig, GeoPoint};
use fl_coverage::PolicyTable;
use fl_engine::Engine;
use fl_spatial::TravelMode;

use network::{build_grid, RISK_CSV};

#[derive(Parser)]
#[command(about = "Hazard-aware routing and snow-plow coverage on a synthetic street grid")]
struct Cli {
    /// JSON engine configuration; omitted fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-segment risk CSV (defaults to the built-in grid dataset)
    #[arg(long)]
    risk_csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route between two coordinates
    Route {
        start_lat: f64,
        start_lon: f64,
        end_lat:   f64,
        end_lon:   f64,

        /// `fast` (shortest) or `safe` (hazard-penalised)
        #[arg(long, default_value_t = TravelMode::Fast)]
        mode: TravelMode,
    },

    /// Plan a coverage route around a depot
    Cover {
        /// Subdivision whose policy model guides the plow
        subdivision: String,
        lat:         f64,
        lon:         f64,

        /// Use an empty policy (frontier heuristic only) if no model is on disk
        #[arg(long)]
        untrained: bool,
    },
}

fn main() -> Result<()> {
    colog::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            serde_json::from_reader::<_, EngineConfig>(BufReader::new(file))
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(csv) = cli.risk_csv {
        config.risk_csv = Some(csv);
    }
    if config.risk_csv.is_none() {
        let path = std::env::temp_dir().join("grid_city_risk.csv");
        std::fs::write(&path, RISK_CSV)
            .with_context(|| format!("writing built-in risk data to {}", path.display()))?;
        config.risk_csv = Some(path);
    }

    let engine = Engine::new(config)?;
    engine.load(build_grid())?;

    match cli.command {
        Command::Route { start_lat, start_lon, end_lat, end_lon, mode } => {
            let start = GeoPoint::new(start_lat, start_lon);
            let end = GeoPoint::new(end_lat, end_lon);
            match engine.find_path(start, end, mode)? {
                Some(report) => {
                    log::info!(
                        "{mode} route: {} points, risk level {}, {} danger segments",
                        report.path.len(),
                        report.stats.risk_level,
                        report.stats.danger_count
                    );
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                None => {
                    log::warn!("no route from {start} to {end}");
                    println!("null");
                }
            }
        }

        Command::Cover { subdivision, lat, lon, untrained } => {
            let model = engine.config().policy_dir.join(format!("q_table_{subdivision}.json"));
            if untrained && !model.is_file() {
                log::info!("no model on disk for {subdivision:?}; using an empty policy");
                engine.insert_policy(PolicyTable::empty(subdivision.clone()));
            }
            let plan = engine.plan_coverage(&subdivision, GeoPoint::new(lat, lon))?;
            log::info!(
                "coverage: {} steps, {}/{} roads ({:.0}%), back at depot: {}",
                plan.steps,
                plan.covered_edges,
                plan.total_edges,
                plan.coverage_ratio() * 100.0,
                plan.returned_to_start
            );
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }

    Ok(())
}
