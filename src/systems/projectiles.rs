use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{EntityId, GameEvent, Projectile, World},
};

/// Homing flight and impact resolution.
///
/// Projectiles chase the target's current position, closing `projectile_step`
/// of the gap per tick. A projectile whose target has died or leaked is
/// dropped without effect.
pub struct ProjectileSystem;

impl ProjectileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProjectileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ProjectileSystem {
    fn name(&self) -> &str {
        "projectiles"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let ids: Vec<EntityId> = world.projectiles.keys().copied().collect();
        for id in ids {
            let Some(projectile) = world.projectiles.get_mut(&id) else {
                continue;
            };
            let target = projectile.target;
            let Some((ex, ey)) = world.enemies.get(&target).map(|e| (e.x, e.y)) else {
                world.projectiles.remove(&id);
                world.events.push(GameEvent::ProjectileLost { id, target });
                continue;
            };

            let step = world.rules.projectile_step;
            projectile.x += (ex - projectile.x) * step;
            projectile.y += (ey - projectile.y) * step;
            let epsilon = world.rules.impact_epsilon;
            if (projectile.x - ex).abs() < epsilon && (projectile.y - ey).abs() < epsilon {
                if let Some(projectile) = world.projectiles.remove(&id) {
                    resolve_impact(world, &projectile, (ex, ey));
                }
            }
        }
        Ok(())
    }
}

fn resolve_impact(world: &mut World, projectile: &Projectile, (tx, ty): (f64, f64)) {
    let hits = if projectile.aoe {
        let radius = world.rules.splash_radius;
        let splashed: Vec<EntityId> = world
            .enemies
            .values()
            .filter(|enemy| enemy.distance_to(tx, ty) < radius)
            .map(|enemy| enemy.id)
            .collect();
        for enemy in &splashed {
            world.damage_enemy(*enemy, projectile.damage);
        }
        splashed.len()
    } else {
        let killed = world.damage_enemy(projectile.target, projectile.damage);
        if !killed {
            let (poison_ticks, slow_ticks) = (world.rules.poison_ticks, world.rules.slow_ticks);
            if let Some(enemy) = world.enemies.get_mut(&projectile.target) {
                if projectile.poison {
                    enemy.poison = poison_ticks;
                }
                if projectile.slow {
                    enemy.slow = slow_ticks;
                }
            }
        }
        1
    };
    world.events.push(GameEvent::ProjectileImpact {
        id: projectile.id,
        target: projectile.target,
        hits,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::run_once;
    use crate::world::TowerKind;

    fn world_with_enemy_at(x: f64, y: f64) -> (World, EntityId) {
        let mut world = World::reference();
        let id = world.spawn_enemy().unwrap();
        let enemy = world.enemy_mut(id).unwrap();
        enemy.x = x;
        enemy.y = y;
        (world, id)
    }

    fn fire(world: &mut World, kind: TowerKind, target: EntityId) -> EntityId {
        let tower = world
            .towers()
            .iter()
            .find(|tower| tower.kind == kind)
            .cloned()
            .expect("tower placed");
        let id = world.spawn_projectile(&tower, target, 5.0);
        // Start on top of the target so the next step impacts.
        let (x, y) = {
            let enemy = world.enemy(target).unwrap();
            (enemy.x, enemy.y)
        };
        let projectile = world.projectiles.get_mut(&id).unwrap();
        projectile.x = x;
        projectile.y = y;
        id
    }

    #[test]
    fn projectile_homes_on_current_target_position() {
        let (mut world, target) = world_with_enemy_at(5.0, 5.0);
        world.place_tower_at(TowerKind::Basic, 0, 0);
        let tower = world.towers()[0].clone();
        let id = world.spawn_projectile(&tower, target, 5.0);
        run_once(&mut ProjectileSystem::new(), &mut world);
        let projectile = world.projectiles.get(&id).unwrap();
        assert!((projectile.x - 0.5).abs() < 1e-12);
        assert!((projectile.y - 0.5).abs() < 1e-12);

        world.enemy_mut(target).unwrap().x = 10.5;
        run_once(&mut ProjectileSystem::new(), &mut world);
        let projectile = world.projectiles.get(&id).unwrap();
        assert!((projectile.x - 1.5).abs() < 1e-12);
        assert!((projectile.y - 0.95).abs() < 1e-12);
    }

    #[test]
    fn single_target_hit_applies_poison_and_removes_projectile() {
        let (mut world, target) = world_with_enemy_at(5.0, 5.0);
        world.place_tower_at(TowerKind::Poison, 0, 0);
        fire(&mut world, TowerKind::Poison, target);
        run_once(&mut ProjectileSystem::new(), &mut world);
        let enemy = world.enemy(target).unwrap();
        assert_eq!(enemy.hp, 5.0);
        assert_eq!(enemy.poison, 3);
        assert_eq!(enemy.slow, 0);
        assert_eq!(world.projectile_count(), 0);
    }

    #[test]
    fn slow_overwrites_rather_than_stacks() {
        let (mut world, target) = world_with_enemy_at(5.0, 5.0);
        world.enemy_mut(target).unwrap().hp = 100.0;
        world.enemy_mut(target).unwrap().slow = 12;
        world.place_tower_at(TowerKind::Slow, 0, 0);
        fire(&mut world, TowerKind::Slow, target);
        run_once(&mut ProjectileSystem::new(), &mut world);
        assert_eq!(world.enemy(target).unwrap().slow, 60);
    }

    #[test]
    fn splash_hits_everything_within_radius_including_target() {
        let (mut world, target) = world_with_enemy_at(5.0, 5.0);
        let near = world.spawn_enemy().unwrap();
        let diagonal = world.spawn_enemy().unwrap();
        let far = world.spawn_enemy().unwrap();
        for (id, x, y) in [(near, 5.0, 6.0), (diagonal, 6.0, 6.0), (far, 5.0, 7.0)] {
            let enemy = world.enemy_mut(id).unwrap();
            enemy.x = x;
            enemy.y = y;
            enemy.hp = 20.0;
        }
        world.enemy_mut(target).unwrap().hp = 20.0;
        world.place_tower_at(TowerKind::Aoe, 0, 0);
        let shot = fire(&mut world, TowerKind::Aoe, target);
        run_once(&mut ProjectileSystem::new(), &mut world);

        assert_eq!(world.enemy(target).unwrap().hp, 15.0);
        assert_eq!(world.enemy(near).unwrap().hp, 15.0);
        assert_eq!(world.enemy(diagonal).unwrap().hp, 15.0);
        assert_eq!(world.enemy(far).unwrap().hp, 20.0);
        assert!(world
            .drain_events()
            .contains(&GameEvent::ProjectileImpact {
                id: shot,
                target,
                hits: 3
            }));
    }

    #[test]
    fn lethal_hit_prunes_enemy_and_orphans_followers() {
        let (mut world, target) = world_with_enemy_at(5.0, 5.0);
        world.enemy_mut(target).unwrap().hp = 5.0;
        world.place_tower_at(TowerKind::Basic, 0, 0);
        fire(&mut world, TowerKind::Basic, target);
        let follower = {
            let tower = world.towers()[0].clone();
            world.spawn_projectile(&tower, target, 5.0)
        };
        run_once(&mut ProjectileSystem::new(), &mut world);

        assert!(world.enemy(target).is_none());
        assert_eq!(world.economy().xp, 1);
        assert!(world.projectiles.get(&follower).is_none());
        assert!(world
            .drain_events()
            .contains(&GameEvent::ProjectileLost {
                id: follower,
                target
            }));
    }
}
