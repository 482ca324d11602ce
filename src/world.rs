use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::{GameRules, StartingEconomy},
    economy::{Economy, UpgradeKind},
    grid::{MapLayout, TilePos},
    snapshot::{
        EnemySnapshot, MapSnapshot, ProjectileSnapshot, TileSnapshot, TowerSnapshot,
        WorldSnapshot,
    },
};

/// Stable handle for towers, enemies and projectiles. Ids are never reused, so a
/// stale handle can only miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TowerKind {
    Basic,
    Sniper,
    Aoe,
    Slow,
    Poison,
}

impl TowerKind {
    pub const ALL: [TowerKind; 5] = [
        TowerKind::Basic,
        TowerKind::Sniper,
        TowerKind::Aoe,
        TowerKind::Slow,
        TowerKind::Poison,
    ];

    pub fn cooldown_ticks(self, rules: &GameRules) -> u32 {
        match self {
            TowerKind::Sniper => rules.sniper_cooldown_ticks,
            _ => rules.cooldown_ticks,
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TowerKind::Basic => "basic",
            TowerKind::Sniper => "sniper",
            TowerKind::Aoe => "aoe",
            TowerKind::Slow => "slow",
            TowerKind::Poison => "poison",
        };
        f.write_str(label)
    }
}

impl FromStr for TowerKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        TowerKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == wanted)
            .ok_or_else(|| format!("unknown tower kind '{wanted}'"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tower {
    pub id: EntityId,
    pub pos: TilePos,
    pub kind: TowerKind,
    /// Ticks left before the tower may fire again.
    pub cooldown: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    /// Index of the path node the enemy last reached.
    pub path_index: usize,
    pub hp: f64,
    /// Remaining poison ticks; 0 when inactive.
    pub poison: u32,
    /// Remaining slow ticks; 0 when inactive.
    pub slow: u32,
}

impl Enemy {
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub target: EntityId,
    pub damage: f64,
    pub aoe: bool,
    pub slow: bool,
    pub poison: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    OutOfBounds,
    OnPath,
    Occupied,
    InsufficientGold,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RejectReason::OutOfBounds => "tile out of bounds",
            RejectReason::OnPath => "tile is on the path",
            RejectReason::Occupied => "tile already holds a tower",
            RejectReason::InsufficientGold => "not enough gold",
        };
        f.write_str(label)
    }
}

/// Result of a placement command. Rejections leave the world untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlacementOutcome {
    Placed { id: EntityId, x: u32, y: u32 },
    Rejected { reason: RejectReason },
}

impl PlacementOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementOutcome::Placed { .. })
    }

    pub fn tower_id(&self) -> Option<EntityId> {
        match self {
            PlacementOutcome::Placed { id, .. } => Some(*id),
            PlacementOutcome::Rejected { .. } => None,
        }
    }
}

/// Something that happened since the last tick report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    TowerPlaced {
        id: EntityId,
        kind: TowerKind,
        x: u32,
        y: u32,
    },
    UpgradePurchased {
        kind: UpgradeKind,
        level: u32,
    },
    EnemySpawned {
        id: EntityId,
        wave: u32,
        hp: f64,
    },
    EnemyLeaked {
        id: EntityId,
        lives: u32,
    },
    EnemyKilled {
        id: EntityId,
    },
    ProjectileFired {
        id: EntityId,
        tower: EntityId,
        target: EntityId,
    },
    ProjectileImpact {
        id: EntityId,
        target: EntityId,
        hits: usize,
    },
    ProjectileLost {
        id: EntityId,
        target: EntityId,
    },
}

#[derive(Debug, Clone, Default)]
pub struct BookkeepingState {
    pub total_kills: u64,
    pub total_leaks: u64,
    pub economy_changed: bool,
}

/// The whole simulation state: map, entity store, economy and wave counter.
pub struct World {
    next_entity: u64,
    tick: u64,
    wave: u32,
    pub(crate) rules: GameRules,
    pub(crate) layout: MapLayout,
    pub(crate) economy: Economy,
    pub(crate) towers: Vec<Tower>,
    pub(crate) enemies: BTreeMap<EntityId, Enemy>,
    pub(crate) projectiles: BTreeMap<EntityId, Projectile>,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) bookkeeping: BookkeepingState,
}

impl World {
    pub fn new(layout: MapLayout, rules: GameRules, start: &StartingEconomy) -> Self {
        Self {
            next_entity: 0,
            tick: 0,
            wave: 0,
            rules,
            layout,
            economy: Economy::new(start),
            towers: Vec::new(),
            enemies: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            events: Vec::new(),
            bookkeeping: BookkeepingState::default(),
        }
    }

    /// Reference board, rules and starting economy.
    pub fn reference() -> Self {
        Self::new(
            MapLayout::reference(),
            GameRules::default(),
            &StartingEconomy::default(),
        )
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_time(&mut self) {
        self.tick += 1;
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn layout(&self) -> &MapLayout {
        &self.layout
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn economy_mut(&mut self) -> &mut Economy {
        &mut self.economy
    }

    pub fn is_over(&self) -> bool {
        self.economy.is_defeated()
    }

    pub fn total_kills(&self) -> u64 {
        self.bookkeeping.total_kills
    }

    pub fn total_leaks(&self) -> u64 {
        self.bookkeeping.total_leaks
    }

    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    pub fn tower(&self, id: EntityId) -> Option<&Tower> {
        self.towers.iter().find(|tower| tower.id == id)
    }

    /// Live enemies in spawn order.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.get_mut(&id)
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    /// Places a tower on a uniformly sampled tile.
    pub fn place_tower<R: Rng>(&mut self, kind: TowerKind, rng: &mut R) -> PlacementOutcome {
        let x = rng.gen_range(0..self.layout.grid.width());
        let y = rng.gen_range(0..self.layout.grid.height());
        self.place_tower_at(kind, x, y)
    }

    pub fn place_tower_at(&mut self, kind: TowerKind, x: u32, y: u32) -> PlacementOutcome {
        let rejection = if !self.layout.grid.in_bounds(x, y) {
            Some(RejectReason::OutOfBounds)
        } else if self.layout.is_on_path(x, y) {
            Some(RejectReason::OnPath)
        } else if self.towers.iter().any(|t| t.pos.x == x && t.pos.y == y) {
            Some(RejectReason::Occupied)
        } else if !self.economy.can_afford(self.rules.tower_cost) {
            Some(RejectReason::InsufficientGold)
        } else {
            None
        };
        if let Some(reason) = rejection {
            debug!(%kind, x, y, %reason, "placement rejected");
            return PlacementOutcome::Rejected { reason };
        }

        self.economy.spend(self.rules.tower_cost);
        let id = self.allocate();
        self.towers.push(Tower {
            id,
            pos: TilePos::new(x, y),
            kind,
            cooldown: 0,
        });
        self.events.push(GameEvent::TowerPlaced { id, kind, x, y });
        debug!(%id, %kind, x, y, gold = self.economy.gold, "tower placed");
        PlacementOutcome::Placed { id, x, y }
    }

    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> bool {
        if !self.economy.purchase_upgrade(kind, &self.rules) {
            debug!(%kind, gold = self.economy.gold, "upgrade not affordable");
            return false;
        }
        let level = self.economy.upgrade_level(kind);
        self.events.push(GameEvent::UpgradePurchased { kind, level });
        debug!(%kind, level, gold = self.economy.gold, "upgrade purchased");
        true
    }

    /// Spawns one enemy at the first path node, scaled by the current wave,
    /// then advances the wave counter.
    pub fn spawn_enemy(&mut self) -> Option<EntityId> {
        let spawn = self.layout.path.spawn()?;
        let wave = self.wave;
        let hp = self.rules.enemy_hp(wave);
        let id = self.allocate();
        let (x, y) = spawn.as_point();
        self.enemies.insert(
            id,
            Enemy {
                id,
                x,
                y,
                path_index: 0,
                hp,
                poison: 0,
                slow: 0,
            },
        );
        self.wave += 1;
        self.events.push(GameEvent::EnemySpawned { id, wave, hp });
        debug!(%id, wave, hp, "enemy spawned");
        Some(id)
    }

    pub(crate) fn spawn_projectile(
        &mut self,
        tower: &Tower,
        target: EntityId,
        damage: f64,
    ) -> EntityId {
        let id = self.allocate();
        let (x, y) = tower.pos.as_point();
        self.projectiles.insert(
            id,
            Projectile {
                id,
                x,
                y,
                target,
                damage,
                aoe: tower.kind == TowerKind::Aoe,
                slow: tower.kind == TowerKind::Slow,
                poison: tower.kind == TowerKind::Poison,
            },
        );
        self.events.push(GameEvent::ProjectileFired {
            id,
            tower: tower.id,
            target,
        });
        id
    }

    /// Subtracts `amount` from the enemy's hp. Enemies at or below zero are
    /// removed at once and credited as kills. Returns true on a kill.
    pub fn damage_enemy(&mut self, id: EntityId, amount: f64) -> bool {
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return false;
        };
        enemy.hp -= amount;
        if enemy.hp > 0.0 {
            return false;
        }
        self.enemies.remove(&id);
        self.economy.record_kill(&self.rules);
        self.bookkeeping.total_kills += 1;
        self.events.push(GameEvent::EnemyKilled { id });
        debug!(%id, xp = self.economy.xp, "enemy killed");
        true
    }

    /// Removes an enemy that walked off the end of the path and costs a life.
    pub(crate) fn leak_enemy(&mut self, id: EntityId) {
        if self.enemies.remove(&id).is_none() {
            return;
        }
        self.economy.lose_life();
        self.bookkeeping.total_leaks += 1;
        self.events.push(GameEvent::EnemyLeaked {
            id,
            lives: self.economy.lives,
        });
        debug!(%id, lives = self.economy.lives, "enemy leaked");
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let grid = &self.layout.grid;
        let tiles = grid
            .tiles()
            .map(|tile| TileSnapshot {
                x: tile.x,
                y: tile.y,
                walkable: tile.walkable,
                on_path: self.layout.is_on_path(tile.x, tile.y),
            })
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick,
            wave: self.wave,
            game_over: self.is_over(),
            map: MapSnapshot {
                width: grid.width(),
                height: grid.height(),
                path: self.layout.path.nodes().to_vec(),
                tiles,
            },
            towers: self
                .towers
                .iter()
                .map(|tower| TowerSnapshot {
                    id: tower.id,
                    x: tower.pos.x,
                    y: tower.pos.y,
                    kind: tower.kind,
                    cooldown: tower.cooldown,
                })
                .collect(),
            enemies: self
                .enemies
                .values()
                .map(|enemy| EnemySnapshot {
                    id: enemy.id,
                    x: enemy.x,
                    y: enemy.y,
                    path_index: enemy.path_index,
                    hp: enemy.hp,
                    poison: enemy.poison,
                    slow: enemy.slow,
                })
                .collect(),
            projectiles: self
                .projectiles
                .values()
                .map(|projectile| ProjectileSnapshot {
                    id: projectile.id,
                    x: projectile.x,
                    y: projectile.y,
                    target: projectile.target,
                    damage: projectile.damage,
                    aoe: projectile.aoe,
                    slow: projectile.slow,
                    poison: projectile.poison,
                })
                .collect(),
            economy: self.economy.snapshot(),
        }
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }
}
