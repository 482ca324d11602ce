//! Tunable rules, timing and ambient settings shared by scenarios.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_tower_cost() -> u32 {
    25
}

fn default_range_upgrade_cost() -> u32 {
    25
}

fn default_damage_upgrade_cost() -> u32 {
    30
}

fn default_base_range() -> f64 {
    2.0
}

fn default_range_per_level() -> f64 {
    0.5
}

fn default_base_damage() -> f64 {
    5.0
}

fn default_damage_per_level() -> f64 {
    2.0
}

fn default_cooldown_ticks() -> u32 {
    30
}

fn default_sniper_cooldown_ticks() -> u32 {
    60
}

fn default_enemy_step() -> f64 {
    0.05
}

fn default_slow_factor() -> f64 {
    0.5
}

fn default_waypoint_epsilon() -> f64 {
    0.1
}

fn default_projectile_step() -> f64 {
    0.1
}

fn default_impact_epsilon() -> f64 {
    0.2
}

fn default_splash_radius() -> f64 {
    1.5
}

fn default_poison_ticks() -> u32 {
    3
}

fn default_poison_damage() -> f64 {
    0.5
}

fn default_slow_ticks() -> u32 {
    60
}

fn default_base_hp() -> f64 {
    10.0
}

fn default_hp_per_wave() -> f64 {
    2.0
}

fn default_boss_wave_every() -> u32 {
    5
}

fn default_boss_bonus_hp() -> f64 {
    10.0
}

fn default_xp_per_level() -> u32 {
    10
}

/// Every numeric rule of the simulation. Defaults reproduce the reference game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    #[serde(default = "default_tower_cost")]
    pub tower_cost: u32,
    #[serde(default = "default_range_upgrade_cost")]
    pub range_upgrade_cost: u32,
    #[serde(default = "default_damage_upgrade_cost")]
    pub damage_upgrade_cost: u32,
    #[serde(default = "default_base_range")]
    pub base_range: f64,
    #[serde(default = "default_range_per_level")]
    pub range_per_level: f64,
    #[serde(default = "default_base_damage")]
    pub base_damage: f64,
    #[serde(default = "default_damage_per_level")]
    pub damage_per_level: f64,
    #[serde(default = "default_cooldown_ticks")]
    pub cooldown_ticks: u32,
    #[serde(default = "default_sniper_cooldown_ticks")]
    pub sniper_cooldown_ticks: u32,
    /// Fraction of the remaining vector to the next node covered per tick.
    #[serde(default = "default_enemy_step")]
    pub enemy_step: f64,
    /// Multiplier on `enemy_step` while an enemy is slowed. 1.0 makes slow inert.
    #[serde(default = "default_slow_factor")]
    pub slow_factor: f64,
    #[serde(default = "default_waypoint_epsilon")]
    pub waypoint_epsilon: f64,
    #[serde(default = "default_projectile_step")]
    pub projectile_step: f64,
    #[serde(default = "default_impact_epsilon")]
    pub impact_epsilon: f64,
    #[serde(default = "default_splash_radius")]
    pub splash_radius: f64,
    #[serde(default = "default_poison_ticks")]
    pub poison_ticks: u32,
    #[serde(default = "default_poison_damage")]
    pub poison_damage: f64,
    #[serde(default = "default_slow_ticks")]
    pub slow_ticks: u32,
    #[serde(default = "default_base_hp")]
    pub base_hp: f64,
    #[serde(default = "default_hp_per_wave")]
    pub hp_per_wave: f64,
    #[serde(default = "default_boss_wave_every")]
    pub boss_wave_every: u32,
    #[serde(default = "default_boss_bonus_hp")]
    pub boss_bonus_hp: f64,
    /// Gold credited per kill.
    #[serde(default)]
    pub kill_bounty: u32,
    #[serde(default = "default_xp_per_level")]
    pub xp_per_level: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            tower_cost: default_tower_cost(),
            range_upgrade_cost: default_range_upgrade_cost(),
            damage_upgrade_cost: default_damage_upgrade_cost(),
            base_range: default_base_range(),
            range_per_level: default_range_per_level(),
            base_damage: default_base_damage(),
            damage_per_level: default_damage_per_level(),
            cooldown_ticks: default_cooldown_ticks(),
            sniper_cooldown_ticks: default_sniper_cooldown_ticks(),
            enemy_step: default_enemy_step(),
            slow_factor: default_slow_factor(),
            waypoint_epsilon: default_waypoint_epsilon(),
            projectile_step: default_projectile_step(),
            impact_epsilon: default_impact_epsilon(),
            splash_radius: default_splash_radius(),
            poison_ticks: default_poison_ticks(),
            poison_damage: default_poison_damage(),
            slow_ticks: default_slow_ticks(),
            base_hp: default_base_hp(),
            hp_per_wave: default_hp_per_wave(),
            boss_wave_every: default_boss_wave_every(),
            boss_bonus_hp: default_boss_bonus_hp(),
            kill_bounty: 0,
            xp_per_level: default_xp_per_level(),
        }
    }
}

impl GameRules {
    /// Hit points for an enemy spawned during `wave`. Wave 0 never gets the bonus.
    pub fn enemy_hp(&self, wave: u32) -> f64 {
        let mut hp = self.base_hp + wave as f64 * self.hp_per_wave;
        if wave > 0 && self.boss_wave_every > 0 && wave % self.boss_wave_every == 0 {
            hp += self.boss_bonus_hp;
        }
        hp
    }
}

fn default_tick_ms() -> u64 {
    16
}

fn default_spawn_interval_ms() -> u64 {
    4_000
}

/// The two independent cadences: simulation frames and enemy spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_spawn_interval_ms")]
    pub spawn_interval_ms: u64,
}

impl TimingConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn spawn_period(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms.max(1))
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            spawn_interval_ms: default_spawn_interval_ms(),
        }
    }
}

fn default_gold() -> u32 {
    100
}

fn default_lives() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingEconomy {
    #[serde(default = "default_gold")]
    pub gold: u32,
    #[serde(default = "default_lives")]
    pub lives: u32,
}

impl Default for StartingEconomy {
    fn default() -> Self {
        Self {
            gold: default_gold(),
            lives: default_lives(),
        }
    }
}

fn default_dump_dir() -> String {
    "snapshots".to_string()
}

/// Periodic JSON frame dumps. An interval of 0 disables them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub interval_ticks: u64,
    #[serde(default = "default_dump_dir")]
    pub output_dir: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            interval_ticks: 0,
            output_dir: default_dump_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
