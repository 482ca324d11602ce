use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{EntityId, World},
};

/// Walks enemies along the path and removes the ones that reach its end.
///
/// Each tick an enemy covers `enemy_step` of the remaining vector to its next
/// node, so it eases into every node rather than moving at constant speed.
pub struct MovementSystem;

impl MovementSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let rules = &world.rules;
        let path = &world.layout.path;
        let mut leaked: Vec<EntityId> = Vec::new();

        for enemy in world.enemies.values_mut() {
            let Some(next) = path.get(enemy.path_index + 1) else {
                leaked.push(enemy.id);
                continue;
            };
            let (tx, ty) = next.as_point();
            let step = if enemy.slow > 0 {
                rules.enemy_step * rules.slow_factor
            } else {
                rules.enemy_step
            };
            enemy.x += (tx - enemy.x) * step;
            enemy.y += (ty - enemy.y) * step;
            if (enemy.x - tx).abs() < rules.waypoint_epsilon
                && (enemy.y - ty).abs() < rules.waypoint_epsilon
            {
                enemy.path_index += 1;
            }
        }

        for id in leaked {
            world.leak_enemy(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::run_once;

    #[test]
    fn enemies_close_five_percent_of_the_gap() {
        let mut world = World::reference();
        let id = world.spawn_enemy().unwrap();
        run_once(&mut MovementSystem::new(), &mut world);
        let enemy = world.enemy(id).unwrap();
        assert!((enemy.x - 0.05).abs() < 1e-12);
        assert_eq!(enemy.y, 8.0);
        assert_eq!(enemy.path_index, 0);
    }

    #[test]
    fn reaching_a_node_advances_the_index() {
        let mut world = World::reference();
        let id = world.spawn_enemy().unwrap();
        world.enemy_mut(id).unwrap().x = 0.95;
        run_once(&mut MovementSystem::new(), &mut world);
        assert_eq!(world.enemy(id).unwrap().path_index, 1);
    }

    #[test]
    fn slowed_enemies_move_half_as_far() {
        let mut world = World::reference();
        let plain = world.spawn_enemy().unwrap();
        let slowed = world.spawn_enemy().unwrap();
        world.enemy_mut(slowed).unwrap().slow = 60;
        run_once(&mut MovementSystem::new(), &mut world);
        let plain_x = world.enemy(plain).unwrap().x;
        let slowed_x = world.enemy(slowed).unwrap().x;
        assert!((plain_x - 0.05).abs() < 1e-12);
        assert!((slowed_x - 0.025).abs() < 1e-12);
        assert_eq!(world.enemy(slowed).unwrap().slow, 60);
    }

    #[test]
    fn enemy_past_last_node_leaks_one_life() {
        let mut world = World::reference();
        let leaving = world.spawn_enemy().unwrap();
        let staying = world.spawn_enemy().unwrap();
        let last = world.layout().path.len() - 1;
        world.enemy_mut(leaving).unwrap().path_index = last;
        run_once(&mut MovementSystem::new(), &mut world);
        assert!(world.enemy(leaving).is_none());
        assert!(world.enemy(staying).is_some());
        assert_eq!(world.economy().lives, 9);
        assert_eq!(world.total_leaks(), 1);
    }
}
