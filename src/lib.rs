//! Headless tower-defense simulation: a fixed path, towers that fire homing
//! projectiles, enemies spawned on their own clock, and a small economy.

pub mod config;
pub mod economy;
pub mod engine;
pub mod grid;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod web;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, RunSummary, TickReport};
pub use scenario::{Scenario, ScenarioLoader};
pub use snapshot::WorldSnapshot;
pub use world::{EntityId, GameEvent, PlacementOutcome, TowerKind, World};
