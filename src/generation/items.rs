//! # Item Generation
//!
//! The weapon catalog and rarity-weighted random drops.

use crate::game::Weapon;
use crate::{CrawlError, CrawlResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Every weapon that can drop, in catalog order. The first entry is the
/// starting weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponCatalog {
    weapons: Vec<Weapon>,
}

impl WeaponCatalog {
    /// Creates a catalog. It must hold at least one weapon and no weapon
    /// may have zero weight.
    pub fn new(weapons: Vec<Weapon>) -> CrawlResult<Self> {
        if weapons.is_empty() {
            return Err(CrawlError::InvalidConfig(
                "weapon catalog is empty".to_string(),
            ));
        }
        if let Some(weapon) = weapons.iter().find(|weapon| weapon.rarity == 0) {
            return Err(CrawlError::InvalidConfig(format!(
                "weapon '{}' has rarity 0",
                weapon.name
            )));
        }
        Ok(Self { weapons })
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    /// Catalog entry 0, un-rolled.
    pub fn starting_weapon(&self) -> Weapon {
        self.weapons[0].clone()
    }

    /// Sum of all rarity weights.
    pub fn total_weight(&self) -> u32 {
        self.weapons.iter().map(|weapon| weapon.rarity).sum()
    }

    /// Picks a weapon with probability proportional to its rarity weight:
    /// draws `pick` in `1..=total` and returns the first weapon whose
    /// running weight reaches it.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Weapon {
        let pick = rng.gen_range(1..=self.total_weight());
        let mut running = 0;
        for weapon in &self.weapons {
            running += weapon.rarity;
            if running >= pick {
                return weapon;
            }
        }
        &self.weapons[self.weapons.len() - 1]
    }

    /// A weighted pick with its stats rolled, ready for the inventory.
    pub fn random_rolled<R: Rng + ?Sized>(&self, rng: &mut R) -> Weapon {
        let mut weapon = self.pick(rng).clone();
        weapon.roll(rng);
        weapon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::WeaponKind;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn weapon(name: &str, rarity: u32) -> Weapon {
        Weapon {
            name: name.to_string(),
            kind: WeaponKind::Bow,
            damage: 10.0,
            crit_rate: 0.1,
            crit_damage: 1.5,
            dot_turns: 1,
            dot_damage: 0.2,
            rarity,
        }
    }

    #[test]
    fn test_catalog_validation() {
        assert!(WeaponCatalog::new(Vec::new()).is_err());
        assert!(WeaponCatalog::new(vec![weapon("Broken", 0)]).is_err());
        let catalog = WeaponCatalog::new(vec![weapon("Common", 3), weapon("Rare", 1)]).unwrap();
        assert_eq!(catalog.total_weight(), 4);
        assert_eq!(catalog.starting_weapon().name, "Common");
    }

    #[test]
    fn test_pick_is_weighted() {
        let catalog = WeaponCatalog::new(vec![weapon("Common", 3), weapon("Rare", 1)]).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..4000 {
            *counts.entry(catalog.pick(&mut rng).name.clone()).or_default() += 1;
        }
        let common = counts["Common"];
        let rare = counts["Rare"];
        assert!(common > rare * 2, "common {common}, rare {rare}");
    }

    #[test]
    fn test_lowest_pick_hits_first_weapon() {
        let catalog = WeaponCatalog::new(vec![weapon("First", 1), weapon("Second", 2)]).unwrap();
        let mut rng = StepRng::new(0, 0);
        assert_eq!(catalog.pick(&mut rng).name, "First");
    }

    #[test]
    fn test_random_rolled_changes_stats_within_bounds() {
        let catalog = WeaponCatalog::new(vec![weapon("Only", 2)]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let rolled = catalog.random_rolled(&mut rng);
            assert!(rolled.damage >= 7.5 && rolled.damage <= 12.5);
            assert_eq!(rolled.rarity, 2);
        }
        // The catalog entry itself is untouched
        assert_eq!(catalog.weapons()[0].damage, 10.0);
    }
}
