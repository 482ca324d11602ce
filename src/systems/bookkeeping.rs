use anyhow::Result;
use tracing::debug;

use crate::{
    economy::EconomySnapshot,
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Last system in the pipeline. Flags ticks whose economy differs from the
/// previous tick so the UI only gets pushed real changes.
pub struct BookkeepingSystem {
    last_economy: Option<EconomySnapshot>,
}

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self { last_economy: None }
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let current = world.economy.snapshot();
        let changed = self.last_economy.as_ref() != Some(&current);
        if changed {
            debug!(
                tick = ctx.tick,
                gold = current.gold,
                lives = current.lives,
                xp = current.xp,
                level = current.level,
                "economy changed"
            );
            self.last_economy = Some(current);
        }
        world.bookkeeping.economy_changed = changed;
        Ok(())
    }
}
