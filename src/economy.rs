use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{GameRules, StartingEconomy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Range,
    Damage,
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeKind::Range => write!(f, "range"),
            UpgradeKind::Damage => write!(f, "damage"),
        }
    }
}

impl FromStr for UpgradeKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "range" => Ok(UpgradeKind::Range),
            "damage" => Ok(UpgradeKind::Damage),
            other => Err(format!("unknown upgrade kind '{other}'")),
        }
    }
}

/// Player resources. Mutated by placement, upgrades, leaks and kills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Economy {
    pub gold: u32,
    pub lives: u32,
    pub xp: u32,
    pub level: u32,
    pub range_level: u32,
    pub damage_level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeLevels {
    pub range: u32,
    pub damage: u32,
}

/// Read-only view handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub gold: u32,
    pub lives: u32,
    pub xp: u32,
    pub level: u32,
    pub upgrades: UpgradeLevels,
}

impl Economy {
    pub fn new(start: &StartingEconomy) -> Self {
        Self {
            gold: start.gold,
            lives: start.lives,
            xp: 0,
            level: 1,
            range_level: 0,
            damage_level: 0,
        }
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        self.gold >= cost
    }

    /// Deducts `cost` when affordable. Returns false and leaves gold untouched otherwise.
    pub fn spend(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.gold -= cost;
        true
    }

    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }

    pub fn is_defeated(&self) -> bool {
        self.lives == 0
    }

    pub fn upgrade_cost(kind: UpgradeKind, rules: &GameRules) -> u32 {
        match kind {
            UpgradeKind::Range => rules.range_upgrade_cost,
            UpgradeKind::Damage => rules.damage_upgrade_cost,
        }
    }

    pub fn upgrade_level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Range => self.range_level,
            UpgradeKind::Damage => self.damage_level,
        }
    }

    pub fn purchase_upgrade(&mut self, kind: UpgradeKind, rules: &GameRules) -> bool {
        if !self.spend(Self::upgrade_cost(kind, rules)) {
            return false;
        }
        match kind {
            UpgradeKind::Range => self.range_level += 1,
            UpgradeKind::Damage => self.damage_level += 1,
        }
        true
    }

    /// Credits a kill: one xp, the configured bounty, and any level earned.
    pub fn record_kill(&mut self, rules: &GameRules) {
        self.xp = self.xp.saturating_add(1);
        self.gold = self.gold.saturating_add(rules.kill_bounty);
        if rules.xp_per_level > 0 {
            self.level = 1 + self.xp / rules.xp_per_level;
        }
    }

    pub fn effective_range(&self, rules: &GameRules) -> f64 {
        rules.base_range + self.range_level as f64 * rules.range_per_level
    }

    pub fn effective_damage(&self, rules: &GameRules) -> f64 {
        rules.base_damage + self.damage_level as f64 * rules.damage_per_level
    }

    pub fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            gold: self.gold,
            lives: self.lives,
            xp: self.xp,
            level: self.level,
            upgrades: UpgradeLevels {
                range: self.range_level,
                damage: self.damage_level,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economy_with_gold(gold: u32) -> Economy {
        Economy::new(&StartingEconomy { gold, lives: 10 })
    }

    #[test]
    fn spend_refuses_overdraft() {
        let mut economy = economy_with_gold(20);
        assert!(!economy.spend(25));
        assert_eq!(economy.gold, 20);
        assert!(economy.spend(20));
        assert_eq!(economy.gold, 0);
    }

    #[test]
    fn upgrades_cost_fixed_gold() {
        let rules = GameRules::default();
        let mut economy = economy_with_gold(100);
        assert!(economy.purchase_upgrade(UpgradeKind::Range, &rules));
        assert!(economy.purchase_upgrade(UpgradeKind::Damage, &rules));
        assert_eq!(economy.gold, 45);
        assert_eq!(economy.range_level, 1);
        assert_eq!(economy.damage_level, 1);
        assert_eq!(economy.effective_range(&rules), 2.5);
        assert_eq!(economy.effective_damage(&rules), 7.0);
    }

    #[test]
    fn unaffordable_upgrade_changes_nothing() {
        let rules = GameRules::default();
        let mut economy = economy_with_gold(29);
        let before = economy.clone();
        assert!(!economy.purchase_upgrade(UpgradeKind::Damage, &rules));
        assert_eq!(economy, before);
    }

    #[test]
    fn lives_saturate_at_zero() {
        let mut economy = Economy::new(&StartingEconomy { gold: 0, lives: 1 });
        economy.lose_life();
        economy.lose_life();
        assert_eq!(economy.lives, 0);
        assert!(economy.is_defeated());
    }

    #[test]
    fn kills_grant_xp_bounty_and_levels() {
        let rules = GameRules {
            kill_bounty: 2,
            xp_per_level: 3,
            ..GameRules::default()
        };
        let mut economy = economy_with_gold(0);
        for _ in 0..7 {
            economy.record_kill(&rules);
        }
        assert_eq!(economy.xp, 7);
        assert_eq!(economy.gold, 14);
        assert_eq!(economy.level, 3);
    }

    #[test]
    fn upgrade_kind_parses_case_insensitively() {
        assert_eq!("Range".parse::<UpgradeKind>(), Ok(UpgradeKind::Range));
        assert_eq!(" damage ".parse::<UpgradeKind>(), Ok(UpgradeKind::Damage));
        assert!("speed".parse::<UpgradeKind>().is_err());
    }
}
