use std::time::Duration;

use pathguard::{
    engine::{EngineBuilder, Timeline},
    scenario::{Scenario, ScenarioLoader},
};
use tempfile::tempdir;

fn loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn reference_scenario() -> Scenario {
    loader()
        .load("scenarios/reference.yaml")
        .expect("reference scenario should load")
}

#[test]
fn fixture_matches_built_in_game() {
    let scenario = reference_scenario();
    let reference = Scenario::reference();
    assert_eq!(scenario.map, reference.map);
    assert_eq!(scenario.rules, reference.rules);
    assert_eq!(scenario.timing, reference.timing);
    assert_eq!(scenario.economy, reference.economy);
    assert_eq!(scenario.seed, 42);
}

#[test]
fn missing_scenario_names_the_file() {
    let err = loader().load("scenarios/nope.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("nope.yaml"));
}

#[test]
fn spawns_follow_their_own_clock() {
    let scenario = reference_scenario();
    let mut world = scenario.build_world();
    let mut engine = EngineBuilder::new(scenario.engine_settings())
        .with_default_systems()
        .build();

    let mut hook_ticks = Vec::new();
    let summary = engine
        .run_for(
            &mut world,
            &scenario.timing,
            Duration::from_secs(12),
            |snapshot, report| {
                assert_eq!(snapshot.tick, report.tick);
                hook_ticks.push(snapshot.tick);
            },
        )
        .expect("run succeeds");

    assert_eq!(summary.ticks, 750);
    assert_eq!(summary.spawns, 2);
    assert!(!summary.game_over);
    assert_eq!(world.wave(), 2);
    assert_eq!(world.tick(), 750);
    assert_eq!(hook_ticks.first().copied(), Some(1));
    assert_eq!(hook_ticks.last().copied(), Some(750));
}

#[test]
fn timeline_can_be_advanced_in_slices() {
    let scenario = reference_scenario();
    let mut world = scenario.build_world();
    let mut engine = EngineBuilder::new(scenario.engine_settings())
        .with_default_systems()
        .build();
    let mut timeline = Timeline::new(
        scenario.timing.tick_period(),
        scenario.timing.spawn_period(),
    );

    let mut ticks = 0;
    let mut spawns = 0;
    for secs in 1..=12 {
        let summary = engine
            .run_timeline(&mut world, &mut timeline, Duration::from_secs(secs), |_, _| {})
            .expect("run succeeds");
        ticks += summary.ticks;
        spawns += summary.spawns;
    }
    assert_eq!(ticks, 750);
    assert_eq!(spawns, 2);
}

#[test]
fn frame_dumps_land_under_scenario_directory() {
    let scenario = reference_scenario();
    let temp = tempdir().expect("tempdir");
    let mut settings = scenario.engine_settings();
    settings.snapshot_interval_ticks = 10;
    settings.snapshot_dir = temp.path().to_path_buf();

    let mut world = scenario.build_world();
    let mut engine = EngineBuilder::new(settings).with_default_systems().build();
    engine.spawn(&mut world);

    let mut dumped = Vec::new();
    for _ in 0..50 {
        let report = engine.tick(&mut world).expect("tick");
        if let Some(path) = report.dump_path {
            dumped.push(path);
        }
    }

    let dir = temp.path().join("reference");
    let expected: Vec<_> = [10, 20, 30, 40, 50]
        .iter()
        .map(|tick| dir.join(format!("tick_{tick:06}.json")))
        .collect();
    assert_eq!(dumped, expected);

    let raw = std::fs::read_to_string(&expected[0]).expect("dump readable");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("dump is JSON");
    assert_eq!(value["tick"], 10);
    assert_eq!(value["scenario"], "reference");
    assert_eq!(value["enemies"].as_array().map(Vec::len), Some(1));
    assert!(value["written_at"].is_string());
}
