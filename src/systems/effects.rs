use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{EntityId, World},
};

/// Poison and slow countdown. Runs after projectile resolution, so a poison
/// applied this tick also ticks this tick.
pub struct EffectsSystem;

impl EffectsSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EffectsSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EffectsSystem {
    fn name(&self) -> &str {
        "effects"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let mut poisoned: Vec<EntityId> = Vec::new();
        for enemy in world.enemies.values_mut() {
            if enemy.poison > 0 {
                enemy.poison -= 1;
                poisoned.push(enemy.id);
            }
            if enemy.slow > 0 {
                enemy.slow -= 1;
            }
        }

        let dose = world.rules.poison_damage;
        for id in poisoned {
            world.damage_enemy(id, dose);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::run_once;

    #[test]
    fn poison_burns_half_a_point_per_tick_until_spent() {
        let mut world = World::reference();
        let id = world.spawn_enemy().unwrap();
        world.enemy_mut(id).unwrap().poison = 3;
        let mut system = EffectsSystem::new();
        for _ in 0..5 {
            run_once(&mut system, &mut world);
        }
        let enemy = world.enemy(id).unwrap();
        assert_eq!(enemy.hp, 8.5);
        assert_eq!(enemy.poison, 0);
    }

    #[test]
    fn slow_counts_down_without_touching_hp() {
        let mut world = World::reference();
        let id = world.spawn_enemy().unwrap();
        world.enemy_mut(id).unwrap().slow = 2;
        let mut system = EffectsSystem::new();
        run_once(&mut system, &mut world);
        assert_eq!(world.enemy(id).unwrap().slow, 1);
        run_once(&mut system, &mut world);
        run_once(&mut system, &mut world);
        let enemy = world.enemy(id).unwrap();
        assert_eq!(enemy.slow, 0);
        assert_eq!(enemy.hp, 10.0);
    }

    #[test]
    fn poison_can_finish_an_enemy() {
        let mut world = World::reference();
        let id = world.spawn_enemy().unwrap();
        let enemy = world.enemy_mut(id).unwrap();
        enemy.hp = 0.5;
        enemy.poison = 3;
        run_once(&mut EffectsSystem::new(), &mut world);
        assert!(world.enemy(id).is_none());
        assert_eq!(world.total_kills(), 1);
    }
}
