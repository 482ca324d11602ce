use anyhow::Result;
use tracing::trace;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{EntityId, Tower, World},
};

/// Cooldown countdown and firing. A tower with nothing in range keeps a zero
/// cooldown and tries again next tick.
pub struct TargetingSystem;

impl TargetingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TargetingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TargetingSystem {
    fn name(&self) -> &str {
        "targeting"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let range = world.economy.effective_range(&world.rules);
        let damage = world.economy.effective_damage(&world.rules);
        let mut volleys: Vec<(Tower, EntityId)> = Vec::new();

        for tower in world.towers.iter_mut() {
            if tower.cooldown > 0 {
                tower.cooldown -= 1;
                continue;
            }
            let (tx, ty) = tower.pos.as_point();
            // First enemy in spawn order wins.
            let target = world
                .enemies
                .values()
                .find(|enemy| enemy.distance_to(tx, ty) < range);
            if let Some(enemy) = target {
                tower.cooldown = tower.kind.cooldown_ticks(&world.rules);
                volleys.push((tower.clone(), enemy.id));
            }
        }

        for (tower, target) in volleys {
            let projectile = world.spawn_projectile(&tower, target, damage);
            trace!(
                tick = ctx.tick,
                tower = %tower.id,
                %target,
                %projectile,
                "tower fired"
            );
        }
        Ok(())
    }
}
