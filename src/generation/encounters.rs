//! # Encounter Generation
//!
//! Builds the enemy roster of a fight cave from the preset's per-category
//! archetype ranges.

use crate::game::{enemy_id_from_rng, CaveCategory, Enemy};
use crate::settings::{CaveSetup, DifficultyConfig, EnemyTemplate};
use crate::{CrawlError, CrawlResult};
use rand::Rng;
use std::collections::BTreeMap;

/// Instantiates enemy rosters for fight caves.
#[derive(Debug, Clone, Copy)]
pub struct EncounterFactory<'a> {
    setup: &'a CaveSetup,
    archetypes: &'a BTreeMap<String, EnemyTemplate>,
}

impl<'a> EncounterFactory<'a> {
    pub fn new(setup: &'a CaveSetup, archetypes: &'a BTreeMap<String, EnemyTemplate>) -> Self {
        Self { setup, archetypes }
    }

    /// Creates a factory from a difficulty preset.
    pub fn from_difficulty(difficulty: &'a DifficultyConfig) -> Self {
        Self::new(&difficulty.caves_setup, &difficulty.enemies)
    }

    /// Builds the roster for a cave category.
    ///
    /// Archetypes are spawned in declaration order, each with a count drawn
    /// uniformly from its inclusive range. Every enemy gets its own copy of
    /// the template's stats. Non-fight categories yield an empty roster.
    pub fn build_roster<R: Rng + ?Sized>(
        &self,
        category: CaveCategory,
        rng: &mut R,
    ) -> CrawlResult<Vec<Enemy>> {
        let mut roster = Vec::new();
        for range in self.setup.ranges_for(category) {
            let template = self.archetypes.get(&range.archetype).ok_or_else(|| {
                CrawlError::InvalidConfig(format!("unknown enemy archetype '{}'", range.archetype))
            })?;
            let count = rng.gen_range(range.min..=range.max.max(range.min));
            for _ in 0..count {
                let id = enemy_id_from_rng(rng);
                roster.push(Enemy::from_template(&range.archetype, template, id));
            }
        }
        Ok(roster)
    }
}
