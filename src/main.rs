use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pathguard::{
    engine::EngineBuilder,
    scenario::ScenarioLoader,
    web::{self, WebServerConfig},
    world::TowerKind,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Pathguard tower-defense simulation")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/reference.yaml")]
    scenario: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run headless on a simulated clock and print a summary
    Run {
        /// Simulated seconds (uses scenario duration when omitted)
        #[arg(long)]
        seconds: Option<u64>,

        /// Tower placed at a random tile before the run; repeatable
        #[arg(long = "tower")]
        towers: Vec<TowerKind>,

        /// Override snapshot interval in ticks
        #[arg(long)]
        snapshot_interval: Option<u64>,

        /// Directory for snapshots
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
    /// Serve the live game over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    init_tracing(&scenario.logging.level);

    match cli.command {
        Command::Run {
            seconds,
            towers,
            snapshot_interval,
            snapshot_dir,
        } => {
            if let Some(interval) = snapshot_interval {
                scenario.snapshot.interval_ticks = interval;
            }
            if let Some(dir) = snapshot_dir {
                scenario.snapshot.output_dir = dir.to_string_lossy().into_owned();
            }

            let mut world = scenario.build_world();
            let mut engine = EngineBuilder::new(scenario.engine_settings())
                .with_default_systems()
                .build();
            for kind in towers {
                let outcome = engine.place_tower(&mut world, kind);
                info!(%kind, ?outcome, "initial placement");
            }

            let duration = scenario.duration(seconds);
            let summary = engine.run_for(&mut world, &scenario.timing, duration, |_, _| {})?;
            let economy = world.economy();
            println!(
                "Scenario '{}' ran {:.1}s: {} ticks, {} spawns, {} kills, {} leaks. \
                 Gold {}, lives {}, level {}{}",
                scenario.name,
                summary.elapsed.as_secs_f64(),
                summary.ticks,
                summary.spawns,
                world.total_kills(),
                world.total_leaks(),
                economy.gold,
                economy.lives,
                economy.level,
                if summary.game_over { " (defeated)" } else { "" }
            );
            Ok(())
        }
        Command::Serve { host, port } => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(web::run(WebServerConfig {
                scenario,
                host,
                port,
            }))
        }
    }
}
