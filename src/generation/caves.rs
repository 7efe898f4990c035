//! # Cave Placement
//!
//! Turns the dead ends of a carved maze into caves: stochastic rounding of
//! the preset's quotas, rejection of mazes with too few dead ends, and a
//! shuffled hand-out of categories.

use crate::config;
use crate::game::{Cave, CaveCategory, Grid, NodeType, Position};
use crate::generation::{utils, EncounterFactory, GenerationConfig, Generator, MazeCarver};
use crate::settings::{CaveQuotas, DifficultyConfig};
use crate::{CrawlError, CrawlResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A generated maze together with its cave positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaveLayout {
    pub grid: Grid,
    /// Every dead end, in the shuffled order categories were handed out in
    pub caves: Vec<Position>,
}

impl CaveLayout {
    /// Number of caves of a category.
    pub fn count(&self, category: CaveCategory) -> usize {
        self.caves
            .iter()
            .filter_map(|pos| self.grid.cave(*pos))
            .filter(|cave| cave.category == category)
            .count()
    }
}

/// Places caves on dead ends, regenerating the maze until enough exist.
#[derive(Debug, Clone)]
pub struct CaveAssigner<'a> {
    quotas: &'a CaveQuotas,
    encounters: EncounterFactory<'a>,
    carver: MazeCarver,
    max_regenerations: u32,
}

impl<'a> CaveAssigner<'a> {
    pub fn new(difficulty: &'a DifficultyConfig) -> Self {
        Self {
            quotas: &difficulty.caves,
            encounters: EncounterFactory::from_difficulty(difficulty),
            carver: MazeCarver::new(),
            max_regenerations: config::MAX_REGENERATIONS,
        }
    }

    /// Caps the number of full regenerations before giving up.
    pub fn with_max_regenerations(mut self, max_regenerations: u32) -> Self {
        self.max_regenerations = max_regenerations;
        self
    }

    /// Carves a maze from `start` and places caves on it.
    ///
    /// A maze with fewer dead ends than the preset minimum is thrown away
    /// and carved again from the continuing random stream. After
    /// `max_regenerations` rejected retries this fails with
    /// [`CrawlError::GenerationFailed`].
    pub fn assign<R: Rng + ?Sized>(
        &self,
        width: u32,
        height: u32,
        start: Position,
        rng: &mut R,
    ) -> CrawlResult<CaveLayout> {
        for attempt in 0..=self.max_regenerations {
            let mut grid = self.carver.carve(width, height, start, rng)?;
            let counts = self.round_quotas(rng);

            let mut candidates = Vec::new();
            for pos in grid.positions_of(NodeType::DeadEnd) {
                if let Some(node) = grid.get_mut(pos) {
                    node.cave = Some(Cave::new());
                    candidates.push(pos);
                }
            }

            if candidates.len() < self.quotas.min {
                log::debug!(
                    "Attempt {}: {} dead ends, {} required; regenerating",
                    attempt + 1,
                    candidates.len(),
                    self.quotas.min
                );
                continue;
            }

            candidates.shuffle(rng);
            Self::hand_out(&mut grid, &candidates, &counts);
            self.set_up_caves(&mut grid, &candidates, rng)?;

            log::info!(
                "Placed {} caves in a {}x{} maze after {} attempt(s)",
                candidates.len(),
                width,
                height,
                attempt + 1
            );
            return Ok(CaveLayout {
                grid,
                caves: candidates,
            });
        }

        log::error!(
            "Gave up placing caves after {} regenerations",
            self.max_regenerations
        );
        Err(CrawlError::GenerationFailed(format!(
            "no {}x{} maze with at least {} dead ends after {} regenerations",
            width, height, self.quotas.min, self.max_regenerations
        )))
    }

    /// Rounds every fractional quota, in hand-out order.
    fn round_quotas<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<(CaveCategory, usize)> {
        self.quotas
            .quotas()
            .into_iter()
            .map(|(category, quota)| (category, crate::utils::stochastic_round(quota, rng)))
            .collect()
    }

    /// Walks the shuffled candidates handing out categories. The cursor is
    /// bumped before each slot is read, so the first candidate is never
    /// handed a category; running past the end leaves later categories
    /// short.
    fn hand_out(grid: &mut Grid, candidates: &[Position], counts: &[(CaveCategory, usize)]) {
        let mut cursor = 0;
        for &(category, count) in counts {
            for _ in 0..count {
                cursor += 1;
                let Some(&pos) = candidates.get(cursor) else {
                    log::debug!("Ran out of dead ends while placing {category:?} caves");
                    return;
                };
                if let Some(cave) = grid.cave_mut(pos) {
                    cave.category = category;
                }
            }
        }
    }

    /// Spawns rosters and rewards for fight caves.
    fn set_up_caves<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid,
        candidates: &[Position],
        rng: &mut R,
    ) -> CrawlResult<()> {
        for &pos in candidates {
            let Some(cave) = grid.cave_mut(pos) else {
                continue;
            };
            cave.reward = match cave.category {
                CaveCategory::Fight => config::FIGHT_REWARD,
                CaveCategory::Boss => config::BOSS_REWARD,
                _ => 0,
            };
            if cave.category.is_fight() {
                cave.enemies = self.encounters.build_roster(cave.category, rng)?;
            }
        }
        Ok(())
    }
}

impl Generator<CaveLayout> for CaveAssigner<'_> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> CrawlResult<CaveLayout> {
        config.validate()?;
        let start = utils::random_start(config.width, config.height, rng);
        self.clone()
            .with_max_regenerations(config.max_regenerations)
            .assign(config.width, config.height, start, rng)
    }

    fn validate(&self, layout: &CaveLayout, _config: &GenerationConfig) -> CrawlResult<()> {
        utils::validate_grid(&layout.grid)?;
        if layout.caves.len() < self.quotas.min {
            return Err(CrawlError::GenerationFailed(format!(
                "{} caves placed, {} required",
                layout.caves.len(),
                self.quotas.min
            )));
        }
        for pos in &layout.caves {
            if layout.grid.node_type(*pos) != Some(NodeType::DeadEnd) {
                return Err(CrawlError::GenerationFailed(format!(
                    "cave at {pos:?} is not on a dead end"
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "CaveAssigner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Difficulty, Settings};
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;

    fn dead_end_strip() -> (Grid, Vec<Position>) {
        let mut grid = Grid::new(9, 1, Position::origin());
        let candidates: Vec<Position> = (0..4).map(|i| Position::new(i * 2, 0)).collect();
        for pos in &candidates {
            grid.set_node_type(*pos, NodeType::DeadEnd).unwrap();
            grid.get_mut(*pos).unwrap().cave = Some(Cave::new());
        }
        (grid, candidates)
    }

    #[test]
    fn test_hand_out_skips_first_slot() {
        let (mut grid, candidates) = dead_end_strip();
        let counts = vec![(CaveCategory::Boss, 1), (CaveCategory::Shop, 2)];
        CaveAssigner::hand_out(&mut grid, &candidates, &counts);

        let categories: Vec<CaveCategory> = candidates
            .iter()
            .map(|pos| grid.cave(*pos).unwrap().category)
            .collect();
        assert_eq!(
            categories,
            vec![
                CaveCategory::Treasure,
                CaveCategory::Boss,
                CaveCategory::Shop,
                CaveCategory::Shop,
            ]
        );
    }

    #[test]
    fn test_hand_out_under_fills_silently() {
        let (mut grid, candidates) = dead_end_strip();
        let counts = vec![(CaveCategory::Fight, 5), (CaveCategory::Boss, 1)];
        CaveAssigner::hand_out(&mut grid, &candidates, &counts);

        let fights = candidates
            .iter()
            .filter(|pos| grid.cave(**pos).unwrap().category == CaveCategory::Fight)
            .count();
        assert_eq!(fights, 3);
        assert!(candidates
            .iter()
            .all(|pos| grid.cave(*pos).unwrap().category != CaveCategory::Boss));
    }

    #[test]
    fn test_round_quotas_order() {
        let settings = Settings::builtin().unwrap();
        let assigner = CaveAssigner::new(settings.difficulty(Difficulty::Normal));
        let mut rng = StepRng::new(0, 0);
        let counts = assigner.round_quotas(&mut rng);
        assert_eq!(counts[0], (CaveCategory::Boss, 1));
        assert_eq!(counts[4].0, CaveCategory::Fight);
        // A zero roll always rounds fractional quotas up
        assert_eq!(counts[4].1, settings.normal.caves.fight.ceil() as usize);
    }

    #[test]
    fn test_assign_places_rosters_and_rewards() {
        let settings = Settings::builtin().unwrap();
        let assigner = CaveAssigner::new(settings.difficulty(Difficulty::Normal));
        let mut rng = StdRng::seed_from_u64(99);
        let layout = assigner.assign(25, 15, Position::new(0, 0), &mut rng).unwrap();

        assert!(layout.caves.len() >= settings.normal.caves.min);
        for pos in &layout.caves {
            let cave = layout.grid.cave(*pos).unwrap();
            match cave.category {
                CaveCategory::Fight => assert_eq!(cave.reward, config::FIGHT_REWARD),
                CaveCategory::Boss => {
                    assert_eq!(cave.reward, config::BOSS_REWARD);
                    assert!(!cave.enemies.is_empty());
                }
                _ => {
                    assert_eq!(cave.reward, 0);
                    assert!(cave.enemies.is_empty());
                }
            }
        }
        assert_eq!(layout.count(CaveCategory::Boss), 1);
        assert!(assigner
            .validate(&layout, &GenerationConfig::default())
            .is_ok());
    }

    #[test]
    fn test_impossible_minimum_gives_up() {
        let mut settings = Settings::builtin().unwrap();
        settings.easy.caves.min = 1000;
        let assigner =
            CaveAssigner::new(settings.difficulty(Difficulty::Easy)).with_max_regenerations(3);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            assigner.assign(9, 9, Position::origin(), &mut rng),
            Err(CrawlError::GenerationFailed(_))
        ));
    }

    #[test]
    fn test_generator_is_deterministic() {
        let settings = Settings::builtin().unwrap();
        let assigner = CaveAssigner::new(settings.difficulty(Difficulty::Hard));
        let config = GenerationConfig::new(31337);
        let a = assigner.generate(&config, &mut utils::create_rng(&config)).unwrap();
        let b = assigner.generate(&config, &mut utils::create_rng(&config)).unwrap();
        assert_eq!(a, b);
        assert_eq!(assigner.generator_type(), "CaveAssigner");
    }
}
