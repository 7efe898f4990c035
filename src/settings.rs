//! # Settings
//!
//! Difficulty presets: player starting stats, cave quotas, enemy rosters,
//! enemy archetypes and the weapon catalog.
//!
//! Settings are plain JSON. A default set ships with the crate in
//! `assets/settings.json`; [`Settings::load_from_path`] reads a replacement.

use crate::game::{CaveCategory, Weapon};
use crate::{CrawlError, CrawlResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const BUILTIN_SETTINGS: &str = include_str!("../assets/settings.json");

/// Difficulty presets selectable from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(CrawlError::InvalidConfig(format!(
                "unknown difficulty '{other}'"
            ))),
        }
    }
}

/// All difficulty presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub easy: DifficultyConfig,
    pub normal: DifficultyConfig,
    pub hard: DifficultyConfig,
}

impl Settings {
    /// The settings bundled with the crate.
    pub fn builtin() -> CrawlResult<Self> {
        Self::from_json(BUILTIN_SETTINGS)
    }

    /// Parses and validates settings from a JSON string.
    pub fn from_json(json: &str) -> CrawlResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and validates settings from a JSON file.
    pub fn load_from_path(path: impl AsRef<Path>) -> CrawlResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the settings back to pretty JSON.
    pub fn to_json(&self) -> CrawlResult<String> {
        serde_json::to_string_pretty(self).map_err(CrawlError::from)
    }

    /// Returns the preset for a difficulty.
    pub fn difficulty(&self, difficulty: Difficulty) -> &DifficultyConfig {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Normal => &self.normal,
            Difficulty::Hard => &self.hard,
        }
    }

    /// Validates every preset.
    pub fn validate(&self) -> CrawlResult<()> {
        for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            self.difficulty(difficulty).validate().map_err(|e| match e {
                CrawlError::InvalidConfig(reason) => {
                    CrawlError::InvalidConfig(format!("{difficulty}: {reason}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

/// One difficulty preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyConfig {
    pub player: PlayerConfig,
    pub caves: CaveQuotas,
    pub caves_setup: CaveSetup,
    /// Enemy archetypes by name
    pub enemies: BTreeMap<String, EnemyTemplate>,
    /// Weapon catalog; the first entry is the starting weapon
    pub weapons: Vec<Weapon>,
}

impl DifficultyConfig {
    /// Checks quotas, roster ranges, archetype references and the catalog.
    pub fn validate(&self) -> CrawlResult<()> {
        for (category, quota) in self.caves.quotas() {
            if !quota.is_finite() || quota < 0.0 {
                return Err(CrawlError::InvalidConfig(format!(
                    "quota for {category:?} must be a non-negative number, got {quota}"
                )));
            }
        }

        for category in [CaveCategory::Boss, CaveCategory::Fight] {
            for range in self.caves_setup.ranges_for(category) {
                if range.min > range.max {
                    return Err(CrawlError::InvalidConfig(format!(
                        "{:?} roster range for '{}' has min {} above max {}",
                        category, range.archetype, range.min, range.max
                    )));
                }
                if !self.enemies.contains_key(&range.archetype) {
                    return Err(CrawlError::InvalidConfig(format!(
                        "{:?} roster references unknown archetype '{}'",
                        category, range.archetype
                    )));
                }
            }
        }

        if self.weapons.is_empty() {
            return Err(CrawlError::InvalidConfig(
                "weapon catalog is empty".to_string(),
            ));
        }
        if let Some(weapon) = self.weapons.iter().find(|w| w.rarity == 0) {
            return Err(CrawlError::InvalidConfig(format!(
                "weapon '{}' has rarity 0",
                weapon.name
            )));
        }

        Ok(())
    }
}

/// Starting stats for the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub max_health: f64,
    pub health: f64,
    pub coins: u32,
}

/// Per-category cave quotas. Fractional quotas are rounded stochastically
/// on every generation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaveQuotas {
    /// Minimum number of dead ends a maze must have to be accepted
    pub min: usize,
    #[serde(default)]
    pub boss: f64,
    #[serde(default)]
    pub teleport: f64,
    #[serde(default)]
    pub shop: f64,
    #[serde(default)]
    pub instant_death: f64,
    #[serde(default)]
    pub fight: f64,
    #[serde(default)]
    pub treasure: f64,
}

impl CaveQuotas {
    /// Quotas in the fixed order caves are handed out.
    pub fn quotas(&self) -> [(CaveCategory, f64); 6] {
        [
            (CaveCategory::Boss, self.boss),
            (CaveCategory::Teleport, self.teleport),
            (CaveCategory::Shop, self.shop),
            (CaveCategory::InstantDeath, self.instant_death),
            (CaveCategory::Fight, self.fight),
            (CaveCategory::Treasure, self.treasure),
        ]
    }
}

/// Enemy rosters for the fight categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaveSetup {
    #[serde(default)]
    pub boss: Vec<ArchetypeRange>,
    #[serde(default)]
    pub fight: Vec<ArchetypeRange>,
}

impl CaveSetup {
    /// Roster ranges for a category; empty for non-fight categories.
    pub fn ranges_for(&self, category: CaveCategory) -> &[ArchetypeRange] {
        match category {
            CaveCategory::Boss => &self.boss,
            CaveCategory::Fight => &self.fight,
            _ => &[],
        }
    }
}

/// How many of one archetype a roster spawns, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeRange {
    pub archetype: String,
    pub min: u32,
    pub max: u32,
}

/// Base stats every instance of an enemy archetype starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub health: f64,
    pub max_health: f64,
    pub damage: f64,
    pub crit_rate: f64,
    pub crit_damage: f64,
    pub dot_turns: u32,
    pub dot_damage: f64,
    pub heal_amount: f64,
    pub coins: u32,
    pub chances: ActionChances,
}

/// Cumulative probability thresholds for enemy actions. A roll picks the
/// first action whose threshold exceeds it; buff is the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionChances {
    pub melee: f64,
    pub ranged: f64,
    pub magic: f64,
    pub heal: f64,
}

impl ActionChances {
    /// Thresholds that always pick a melee attack.
    pub fn always_melee() -> Self {
        Self {
            melee: 1.0,
            ranged: 1.0,
            magic: 1.0,
            heal: 1.0,
        }
    }

    /// Thresholds in resolution order.
    pub fn thresholds(&self) -> [f64; 4] {
        [self.melee, self.ranged, self.magic, self.heal]
    }
}
