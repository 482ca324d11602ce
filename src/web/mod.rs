//! HTTP front end for a live game.
//!
//! Two interval tasks drive the shared [`Session`]: one ticks the simulation on
//! the frame period, the other spawns on the spawn period. Command handlers
//! take the same lock, so every mutation is serialized.

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::broadcast,
    time::{interval, MissedTickBehavior},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::{
    config::TimingConfig,
    economy::{EconomySnapshot, UpgradeKind},
    engine::{Engine, EngineBuilder, TickReport},
    scenario::Scenario,
    snapshot::WorldSnapshot,
    world::{EntityId, PlacementOutcome, TowerKind, World},
};

/// World plus the engine that advances it.
pub struct Session {
    pub world: World,
    pub engine: Engine,
}

impl Session {
    pub fn new(scenario: &Scenario) -> Self {
        Self {
            world: scenario.build_world(),
            engine: EngineBuilder::new(scenario.engine_settings())
                .with_default_systems()
                .build(),
        }
    }

    /// One frame. Returns `None` once the game is over.
    pub fn frame(&mut self) -> Result<Option<(TickReport, WorldSnapshot)>> {
        if self.world.is_over() {
            return Ok(None);
        }
        let report = self.engine.tick(&mut self.world)?;
        let snapshot = self.world.snapshot(self.engine.scenario_name());
        Ok(Some((report, snapshot)))
    }

    pub fn spawn(&mut self) -> Option<EntityId> {
        if self.world.is_over() {
            return None;
        }
        self.engine.spawn(&mut self.world)
    }

    pub fn place_tower(&mut self, request: &PlaceTowerRequest) -> PlacementOutcome {
        match (request.x, request.y) {
            (Some(x), Some(y)) => self.world.place_tower_at(request.kind, x, y),
            _ => self.engine.place_tower(&mut self.world, request.kind),
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.snapshot(self.engine.scenario_name())
    }
}

#[derive(Debug, Clone)]
struct Broadcast {
    event: &'static str,
    data: String,
}

#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
    broadcaster: broadcast::Sender<Broadcast>,
    scenario_name: String,
}

impl AppState {
    pub fn new(scenario: &Scenario) -> Self {
        let (tx, _) = broadcast::channel::<Broadcast>(512);
        Self {
            session: Arc::new(Mutex::new(Session::new(scenario))),
            broadcaster: tx,
            scenario_name: scenario.name.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Advances one frame and broadcasts it. Economy changes, including
    /// those made by commands since the last frame, go out once here.
    /// Returns false once the game is over.
    fn step(&self) -> Result<bool> {
        let outcome = self.lock().frame()?;
        let Some((report, snapshot)) = outcome else {
            return Ok(false);
        };
        if report.economy_changed {
            self.publish("economy", &snapshot.economy);
        }
        self.publish("frame", &snapshot);
        Ok(true)
    }

    fn publish(&self, event: &'static str, value: &impl Serialize) {
        match serde_json::to_string(value) {
            Ok(data) => {
                // No subscribers is fine.
                let _ = self.broadcaster.send(Broadcast { event, data });
            }
            Err(err) => warn!(event, error = %err, "failed to encode broadcast"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub snapshot: WorldSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceTowerRequest {
    pub kind: TowerKind,
    #[serde(default)]
    pub x: Option<u32>,
    #[serde(default)]
    pub y: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeRequest {
    pub kind: UpgradeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeResponse {
    pub purchased: bool,
    pub economy: EconomySnapshot,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub host: String,
    pub port: u16,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/events", get(stream_events))
        .route("/api/towers", post(place_tower))
        .route("/api/upgrades", post(purchase_upgrade))
        .with_state(state)
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        host,
        port,
    } = config;

    let state = AppState::new(&scenario);
    tokio::spawn(frame_loop(state.clone(), scenario.timing.clone()));
    tokio::spawn(spawn_loop(state.clone(), scenario.timing.clone()));

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, scenario = %scenario.name, "serving game API (Ctrl+C to stop)");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn frame_loop(state: AppState, timing: TimingConfig) {
    let mut ticker = interval(timing.tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        match state.step() {
            Ok(true) => {}
            Ok(false) => {
                info!(scenario = %state.scenario_name, "game over, frame loop stopped");
                break;
            }
            Err(err) => {
                error!(error = ?err, "simulation tick failed");
                break;
            }
        }
    }
}

async fn spawn_loop(state: AppState, timing: TimingConfig) {
    let mut ticker = interval(timing.spawn_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the first spawn is one period in.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let mut session = state.lock();
        if session.world.is_over() {
            break;
        }
        if let Some(id) = session.spawn() {
            debug!(%id, wave = session.world.wave(), "spawn timer fired");
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl+C");
        return;
    }
    info!("shutting down");
}

async fn latest_state(State(state): State<AppState>) -> Json<StateEnvelope> {
    let snapshot = state.lock().snapshot();
    Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        snapshot,
    })
}

async fn place_tower(
    State(state): State<AppState>,
    Json(request): Json<PlaceTowerRequest>,
) -> Json<PlacementOutcome> {
    let outcome = state.lock().place_tower(&request);
    Json(outcome)
}

async fn purchase_upgrade(
    State(state): State<AppState>,
    Json(request): Json<UpgradeRequest>,
) -> Json<UpgradeResponse> {
    let mut session = state.lock();
    let purchased = session.world.purchase_upgrade(request.kind);
    Json(UpgradeResponse {
        purchased,
        economy: session.world.economy().snapshot(),
    })
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(msg) => Some(Ok(Event::default().event(msg.event).data(msg.data))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
