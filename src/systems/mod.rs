mod bookkeeping;
mod effects;
mod movement;
mod projectiles;
mod targeting;

pub use bookkeeping::BookkeepingSystem;
pub use effects::EffectsSystem;
pub use movement::MovementSystem;
pub use projectiles::ProjectileSystem;
pub use targeting::TargetingSystem;

#[cfg(test)]
pub(crate) fn run_once(system: &mut dyn crate::engine::System, world: &mut crate::world::World) {
    let mut rng = crate::rng::RngManager::new(0);
    let ctx = crate::engine::SystemContext {
        tick: world.tick(),
        scenario_name: "test",
    };
    let name = system.name().to_string();
    let mut stream = rng.stream(&name);
    system.run(&ctx, world, &mut stream).expect("system runs");
}
