//! Read-only views of the world handed to renderers, plus periodic JSON dumps.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    economy::EconomySnapshot,
    grid::TilePos,
    world::{EntityId, TowerKind},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub x: u32,
    pub y: u32,
    pub walkable: bool,
    pub on_path: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub width: u32,
    pub height: u32,
    pub path: Vec<TilePos>,
    pub tiles: Vec<TileSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerSnapshot {
    pub id: EntityId,
    pub x: u32,
    pub y: u32,
    pub kind: TowerKind,
    pub cooldown: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub path_index: usize,
    pub hp: f64,
    pub poison: u32,
    pub slow: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub target: EntityId,
    pub damage: f64,
    pub aoe: bool,
    pub slow: bool,
    pub poison: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub wave: u32,
    pub game_over: bool,
    pub map: MapSnapshot,
    pub towers: Vec<TowerSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub economy: EconomySnapshot,
}

#[derive(Serialize)]
struct FrameDump<'a> {
    written_at: DateTime<Utc>,
    #[serde(flatten)]
    snapshot: &'a WorldSnapshot,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to write frame dump to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode frame dump: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes `<dir>/<scenario>/tick_NNNNNN.json` every `interval_ticks` ticks.
pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval_ticks: u64,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>, interval_ticks: u64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval_ticks,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_ticks > 0
    }

    pub fn should_write(&self, tick: u64) -> bool {
        self.is_enabled() && tick > 0 && tick % self.interval_ticks == 0
    }

    pub fn maybe_write(&self, snapshot: &WorldSnapshot) -> Result<Option<PathBuf>, SnapshotError> {
        if !self.should_write(snapshot.tick) {
            return Ok(None);
        }

        let dir = self.output_dir.join(&snapshot.scenario);
        fs::create_dir_all(&dir).map_err(|source| SnapshotError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(format!("tick_{:06}.json", snapshot.tick));
        let dump = FrameDump {
            written_at: Utc::now(),
            snapshot,
        };
        let json = serde_json::to_string_pretty(&dump)?;
        fs::write(&path, json).map_err(|source| SnapshotError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{TowerKind, World};

    #[test]
    fn interval_gates_writes() {
        let writer = SnapshotWriter::new("unused", 30);
        assert!(!writer.should_write(0));
        assert!(!writer.should_write(29));
        assert!(writer.should_write(30));
        assert!(!writer.should_write(31));
        assert!(writer.should_write(60));

        let disabled = SnapshotWriter::new("unused", 0);
        assert!(!disabled.should_write(30));
    }

    #[test]
    fn snapshot_marks_path_tiles() {
        let world = World::reference();
        let snapshot = world.snapshot("reference");
        assert_eq!(snapshot.map.tiles.len(), 12 * 16);
        assert_eq!(
            snapshot.map.tiles.iter().filter(|tile| tile.on_path).count(),
            16
        );
        assert_eq!(snapshot.economy.gold, 100);
        assert_eq!(snapshot.economy.lives, 10);
        assert_eq!(snapshot.economy.level, 1);
        assert!(!snapshot.game_over);
    }

    #[test]
    fn projectile_view_carries_damage_and_flags() {
        let mut world = World::reference();
        world.place_tower_at(TowerKind::Slow, 1, 7);
        let target = world.spawn_enemy().unwrap();
        let tower = world.towers()[0].clone();
        world.spawn_projectile(&tower, target, 7.0);

        let snapshot = world.snapshot("reference");
        let projectile = &snapshot.projectiles[0];
        assert_eq!(projectile.target, target);
        assert_eq!(projectile.damage, 7.0);
        assert_eq!((projectile.x, projectile.y), (1.0, 7.0));
        assert!(projectile.slow && !projectile.aoe && !projectile.poison);
    }
}
