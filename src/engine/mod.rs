mod timeline;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, trace};

pub use timeline::{Cadence, Timeline, TimelineEvent};

use crate::{
    config::TimingConfig,
    rng::{RngManager, SystemRng, PLACEMENT_STREAM},
    snapshot::{SnapshotWriter, WorldSnapshot},
    systems::{
        BookkeepingSystem, EffectsSystem, MovementSystem, ProjectileSystem, TargetingSystem,
    },
    world::{EntityId, GameEvent, PlacementOutcome, TowerKind, World},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Appends the standard pipeline: movement, targeting, projectiles,
    /// effects, bookkeeping.
    pub fn with_default_systems(self) -> Self {
        self.with_system(MovementSystem::new())
            .with_system(TargetingSystem::new())
            .with_system(ProjectileSystem::new())
            .with_system(EffectsSystem::new())
            .with_system(BookkeepingSystem::new())
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
        }
    }
}

/// What one tick produced.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub events: Vec<GameEvent>,
    pub economy_changed: bool,
    pub dump_path: Option<PathBuf>,
}

/// Totals for a timed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub ticks: u64,
    pub spawns: u64,
    pub elapsed: Duration,
    pub game_over: bool,
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    /// Runs every system once, in registration order.
    pub fn tick(&mut self, world: &mut World) -> Result<TickReport> {
        let current_tick = world.tick();
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick: current_tick,
                scenario_name: &self.settings.scenario_name,
            };
            system
                .run(&ctx, world, &mut rng_stream)
                .with_context(|| format!("system '{}' failed", system.name()))?;
        }
        world.advance_time();

        let dump_path = if self.snapshot_writer.should_write(world.tick()) {
            let snapshot = world.snapshot(&self.settings.scenario_name);
            self.snapshot_writer.maybe_write(&snapshot)?
        } else {
            None
        };

        let report = TickReport {
            tick: world.tick(),
            events: world.drain_events(),
            economy_changed: world.bookkeeping.economy_changed,
            dump_path,
        };
        trace!(
            tick = report.tick,
            events = report.events.len(),
            enemies = world.enemy_count(),
            projectiles = world.projectile_count(),
            "tick complete"
        );
        Ok(report)
    }

    /// Fires the spawn cadence once.
    pub fn spawn(&mut self, world: &mut World) -> Option<EntityId> {
        world.spawn_enemy()
    }

    /// Places a tower on a random tile drawn from the engine's placement stream.
    pub fn place_tower(&mut self, world: &mut World, kind: TowerKind) -> PlacementOutcome {
        let mut rng = self.rng.stream(PLACEMENT_STREAM);
        world.place_tower(kind, &mut rng)
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            if world.is_over() {
                break;
            }
            self.tick(world)?;
        }
        Ok(())
    }

    /// Advances `timeline` to `until`, ticking and spawning on their own
    /// cadences. `hook` sees the snapshot after every tick. Stops early once
    /// the player runs out of lives.
    pub fn run_timeline<F>(
        &mut self,
        world: &mut World,
        timeline: &mut Timeline,
        until: Duration,
        mut hook: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(&WorldSnapshot, &TickReport),
    {
        let mut summary = RunSummary::default();
        while let Some(event) = timeline.next_before(until) {
            match event {
                TimelineEvent::Frame => {
                    let report = self.tick(world)?;
                    summary.ticks += 1;
                    let snapshot = world.snapshot(&self.settings.scenario_name);
                    hook(&snapshot, &report);
                }
                TimelineEvent::Spawn => {
                    if self.spawn(world).is_some() {
                        summary.spawns += 1;
                    }
                }
            }
            if world.is_over() {
                info!(tick = world.tick(), wave = world.wave(), "no lives left, stopping");
                summary.game_over = true;
                break;
            }
        }
        summary.elapsed = timeline.now();
        debug!(
            ticks = summary.ticks,
            spawns = summary.spawns,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "timeline advanced"
        );
        Ok(summary)
    }

    /// Runs a fresh timeline built from `timing` for `duration`.
    pub fn run_for<F>(
        &mut self,
        world: &mut World,
        timing: &TimingConfig,
        duration: Duration,
        hook: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(&WorldSnapshot, &TickReport),
    {
        let mut timeline = Timeline::new(timing.tick_period(), timing.spawn_period());
        self.run_timeline(world, &mut timeline, duration, hook)
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub scenario_name: &'a str,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
