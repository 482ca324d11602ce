use std::{
    fs,
    path::{Path as FsPath, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{
    config::{GameRules, LoggingConfig, SnapshotConfig, StartingEconomy, TimingConfig},
    engine::EngineSettings,
    grid::{Grid, MapLayout, Path, TilePos},
    world::World,
};

fn default_name() -> String {
    "reference".to_string()
}

fn default_duration_secs() -> u64 {
    60
}

fn default_width() -> u32 {
    12
}

fn default_height() -> u32 {
    16
}

/// Largest board a scenario may describe, in tiles.
pub const MAX_MAP_TILES: u64 = 1 << 20;

fn default_path() -> Path {
    Path::reference()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("map must be at least 1x1, got {width}x{height}")]
    EmptyMap { width: u32, height: u32 },
    #[error("map {width}x{height} exceeds {max} tiles")]
    MapTooLarge { width: u32, height: u32, max: u64 },
    #[error("path needs at least two nodes, got {0}")]
    PathTooShort(usize),
    #[error("path node {index} at ({x}, {y}) lies outside the {width}x{height} map")]
    NodeOutOfBounds {
        index: usize,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("timing periods must be positive (tick {tick_ms} ms, spawn {spawn_interval_ms} ms)")]
    ZeroPeriod { tick_ms: u64, spawn_interval_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_path")]
    pub path: Path,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            path: default_path(),
        }
    }
}

/// A complete game setup: board, rules, timing and ambient settings.
/// Every section is optional in YAML and falls back to the reference game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub economy: StartingEconomy,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub rules: GameRules,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::reference()
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<FsPath>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<FsPath>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml_str(&data)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// The built-in game: 12 x 16 board, 100 gold, 10 lives, 16 ms frames and
    /// a spawn every 4 s.
    pub fn reference() -> Self {
        Self {
            name: default_name(),
            description: None,
            seed: 0,
            duration_secs: default_duration_secs(),
            map: MapConfig::default(),
            economy: StartingEconomy::default(),
            timing: TimingConfig::default(),
            rules: GameRules::default(),
            snapshot: SnapshotConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(data: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(data).context("Invalid scenario YAML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Rejects maps an enemy cannot walk. Diagonal or skipping steps are
    /// allowed but logged.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let MapConfig {
            width,
            height,
            path,
        } = &self.map;
        if *width == 0 || *height == 0 {
            return Err(ScenarioError::EmptyMap {
                width: *width,
                height: *height,
            });
        }
        if u64::from(*width) * u64::from(*height) > MAX_MAP_TILES {
            return Err(ScenarioError::MapTooLarge {
                width: *width,
                height: *height,
                max: MAX_MAP_TILES,
            });
        }
        if path.len() < 2 {
            return Err(ScenarioError::PathTooShort(path.len()));
        }
        if let Some((index, node)) = path
            .nodes()
            .iter()
            .enumerate()
            .find(|(_, node)| node.x >= *width || node.y >= *height)
        {
            return Err(ScenarioError::NodeOutOfBounds {
                index,
                x: node.x,
                y: node.y,
                width: *width,
                height: *height,
            });
        }
        if self.timing.tick_ms == 0 || self.timing.spawn_interval_ms == 0 {
            return Err(ScenarioError::ZeroPeriod {
                tick_ms: self.timing.tick_ms,
                spawn_interval_ms: self.timing.spawn_interval_ms,
            });
        }

        for index in path.irregular_steps() {
            let (from, to): (TilePos, TilePos) = (path.nodes()[index], path.nodes()[index + 1]);
            warn!(
                scenario = %self.name,
                index,
                from_x = from.x,
                from_y = from.y,
                to_x = to.x,
                to_y = to.y,
                "path step is not a single axis-aligned move"
            );
        }
        Ok(())
    }

    pub fn layout(&self) -> MapLayout {
        MapLayout::new(
            Grid::new(self.map.width, self.map.height),
            self.map.path.clone(),
        )
    }

    pub fn build_world(&self) -> World {
        World::new(self.layout(), self.rules.clone(), &self.economy)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            scenario_name: self.name.clone(),
            seed: self.seed,
            snapshot_interval_ticks: self.snapshot.interval_ticks,
            snapshot_dir: PathBuf::from(&self.snapshot.output_dir),
        }
    }

    pub fn duration(&self, override_secs: Option<u64>) -> Duration {
        Duration::from_secs(override_secs.unwrap_or(self.duration_secs))
    }
}
