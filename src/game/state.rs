//! # Game State Module
//!
//! The session owner: one maze, one player and at most one running fight.
//!
//! [`GameState`] routes player commands into the maze (movement, fog of war,
//! cave triggers), the shop, the inventory and the combat sequencer. It is
//! the only place that holds the session's random stream, so a seed fully
//! determines a run given the same sequence of commands.

use crate::game::{
    CaveCategory, CaveOutcome, CombatContext, CombatSession, CombatStatus, Direction, EnemyId,
    GameEvent, GameStatistics, Grid, Player, Position,
};
use crate::generation::{generate_maze, utils, CaveLayout, GenerationConfig, WeaponCatalog};
use crate::settings::{Difficulty, DifficultyConfig, Settings};
use crate::{config, CrawlError, CrawlResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the session stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionState {
    Playing,
    /// The boss cave was cleared
    Won,
    /// The player died; carries the reason shown on the game over screen
    Died(String),
}

impl CompletionState {
    pub fn is_over(&self) -> bool {
        !matches!(self, CompletionState::Playing)
    }

    /// Text for the game over screen.
    pub fn message(&self) -> Option<&str> {
        match self {
            CompletionState::Playing => None,
            CompletionState::Won => Some("You Have Beaten The Game!"),
            CompletionState::Died(reason) => Some(reason),
        }
    }
}

/// Approximate distances from the player to the nearest cave of each
/// dangerous kind, bucketed to steps of five cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProximityReport {
    pub fight: Option<u32>,
    pub teleport: Option<u32>,
    pub boss: Option<u32>,
}

impl fmt::Display for ProximityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [("Orc", self.fight), ("Bat", self.teleport), ("Boss", self.boss)]
            .into_iter()
            .filter_map(|(label, distance)| distance.map(|d| format!("{label} ~{d}m.")))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Central game state for one crawl.
#[derive(Debug, Clone)]
pub struct GameState {
    pub difficulty: Difficulty,
    preset: DifficultyConfig,
    pub generation: GenerationConfig,
    pub grid: Grid,
    /// Every cave position, in the order categories were handed out
    pub caves: Vec<Position>,
    pub player: Player,
    catalog: WeaponCatalog,
    combat: Option<CombatSession>,
    shop_open: bool,
    pub completion_state: CompletionState,
    pub statistics: GameStatistics,
    events: Vec<GameEvent>,
    rng: StdRng,
}

impl GameState {
    /// Starts a new crawl on the given difficulty.
    ///
    /// The start room is drawn first, then the maze is carved from it and
    /// the caves are placed. The area around the start is revealed.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::{Difficulty, GameState, GenerationConfig, Settings};
    ///
    /// let settings = Settings::builtin().unwrap();
    /// let state = GameState::new_session(&settings, Difficulty::Normal, GenerationConfig::new(5)).unwrap();
    /// assert!(state.grid.is_visible(state.player.position));
    /// assert!(!state.completion_state.is_over());
    /// ```
    pub fn new_session(
        settings: &Settings,
        difficulty: Difficulty,
        generation: GenerationConfig,
    ) -> CrawlResult<Self> {
        Self::from_preset(settings.difficulty(difficulty).clone(), difficulty, generation)
    }

    fn from_preset(
        preset: DifficultyConfig,
        difficulty: Difficulty,
        generation: GenerationConfig,
    ) -> CrawlResult<Self> {
        generation.validate()?;
        preset.validate()?;

        let mut rng = utils::create_rng(&generation);
        let catalog = WeaponCatalog::new(preset.weapons.clone())?;
        let start = utils::random_start(generation.width, generation.height, &mut rng);
        let player = Player::new(start, &preset.player, catalog.starting_weapon());
        let layout = generate_maze(
            generation.width,
            generation.height,
            start,
            &preset,
            generation.max_regenerations,
            &mut rng,
        )?;

        info!(
            "Started a {} crawl with seed {} ({} caves)",
            difficulty,
            generation.seed,
            layout.caves.len()
        );
        Ok(Self::assemble(preset, difficulty, generation, layout, player, catalog, rng))
    }

    /// Builds a session around a hand-made layout, with the player at the
    /// grid's start cell. Used for scripted scenarios.
    pub fn with_layout(
        preset: DifficultyConfig,
        difficulty: Difficulty,
        layout: CaveLayout,
        seed: u64,
    ) -> CrawlResult<Self> {
        let generation =
            GenerationConfig::new(seed).with_size(layout.grid.width, layout.grid.height);
        let rng = utils::create_rng(&generation);
        let catalog = WeaponCatalog::new(preset.weapons.clone())?;
        let player = Player::new(layout.grid.start, &preset.player, catalog.starting_weapon());
        Ok(Self::assemble(preset, difficulty, generation, layout, player, catalog, rng))
    }

    fn assemble(
        preset: DifficultyConfig,
        difficulty: Difficulty,
        generation: GenerationConfig,
        layout: CaveLayout,
        player: Player,
        catalog: WeaponCatalog,
        rng: StdRng,
    ) -> Self {
        let mut state = Self {
            difficulty,
            preset,
            generation,
            grid: layout.grid,
            caves: layout.caves,
            player,
            catalog,
            combat: None,
            shop_open: false,
            completion_state: CompletionState::Playing,
            statistics: GameStatistics::new(),
            events: Vec::new(),
            rng,
        };
        state.grid.reveal_around(state.player.position, config::REVEAL_RADIUS);
        state
    }

    /// Throws the current crawl away and starts a fresh one on the same
    /// difficulty, seeded from the current random stream.
    pub fn restart(&mut self) -> CrawlResult<()> {
        let generation = GenerationConfig {
            seed: self.rng.gen(),
            ..self.generation.clone()
        };
        *self = Self::from_preset(self.preset.clone(), self.difficulty, generation)?;
        Ok(())
    }

    /// Moves the player one cell.
    ///
    /// Ignored while a cave screen holds the player or after game over.
    /// Walls and the maze border block the move. A successful move reveals
    /// the surroundings and triggers whatever cave the player stepped into.
    pub fn move_player(&mut self, direction: Direction) -> CrawlResult<bool> {
        if self.completion_state.is_over() || !self.player.can_move {
            debug!("Movement locked, ignoring move {direction:?}");
            return Ok(false);
        }

        let from = self.player.position;
        let to = from.step(direction, 1);
        if !self.grid.is_passable(to) {
            return Ok(false);
        }

        self.player.position = to;
        self.push_event(GameEvent::PlayerMoved { from, to });
        self.grid.reveal_around(to, config::REVEAL_RADIUS);
        self.resolve_cave()?;
        Ok(true)
    }

    /// Takes one step along the shortest route to `target` through explored
    /// cells. Returns false if the target is hidden, a wall, the player's own
    /// cell or unreachable.
    pub fn walk_towards(&mut self, target: Position) -> CrawlResult<bool> {
        if !self.grid.is_passable(target) || !self.grid.is_visible(target) {
            return Ok(false);
        }
        let from = self.player.position;
        if from == target {
            return Ok(false);
        }

        let grid = &self.grid;
        let next = crate::utils::first_step(grid, from, target, |pos| grid.is_visible(pos));
        match next.and_then(|next| Direction::from_delta(next - from)) {
            Some(direction) => self.move_player(direction),
            None => Ok(false),
        }
    }

    /// Resolves the cave under the player, following teleports.
    fn resolve_cave(&mut self) -> CrawlResult<()> {
        let mut hops = 0;
        loop {
            let position = self.player.position;
            let Some(cave) = self.grid.cave_mut(position) else {
                return Ok(());
            };
            let outcome = cave.trigger();
            if outcome != CaveOutcome::Nothing {
                self.statistics.caves_visited += 1;
                debug!("Triggered {outcome:?} at {position:?}");
            }

            match outcome {
                CaveOutcome::StartCombat => return self.start_combat(position),
                CaveOutcome::Teleport => {
                    if hops >= self.caves.len() {
                        warn!("Stopped a teleport chain after {hops} hops");
                        return Ok(());
                    }
                    hops += 1;
                    let landing = self.caves[self.rng.gen_range(0..self.caves.len())];
                    self.push_event(GameEvent::warning("A bat sent you to a random location"));
                    self.player.position = landing;
                    self.grid.reveal_around(landing, config::REVEAL_RADIUS);
                }
                CaveOutcome::OpenShop => {
                    self.shop_open = true;
                    self.player.can_move = false;
                    self.push_event(GameEvent::info("You found a shop"));
                    return Ok(());
                }
                CaveOutcome::InstantDeath => {
                    self.game_over(CompletionState::Died(
                        "You fell into a bottomless hole".to_string(),
                    ));
                    return Ok(());
                }
                CaveOutcome::Treasure => {
                    self.collect_treasure();
                    return Ok(());
                }
                CaveOutcome::Nothing => return Ok(()),
            }
        }
    }

    fn collect_treasure(&mut self) {
        self.push_event(GameEvent::info("You Received a Reward"));
        self.add_random_weapon();
        self.player.max_health += config::HEALTH_BOOST;
        self.player.health += config::HEALTH_BOOST;
    }

    fn add_random_weapon(&mut self) -> bool {
        if self.player.inventory.len() >= config::INVENTORY_CAPACITY {
            self.push_event(GameEvent::warning("Inventory Full"));
            return false;
        }
        let weapon = self.catalog.random_rolled(&mut self.rng);
        info!("Player picked up {}", weapon.name);
        self.player.add_weapon(weapon)
    }

    fn start_combat(&mut self, position: Position) -> CrawlResult<()> {
        let cave = self.grid.cave_mut(position).ok_or_else(|| {
            CrawlError::InvalidState(format!("no cave at {position:?} to fight in"))
        })?;
        let mut ctx = CombatContext {
            player: &mut self.player,
            cave,
            rng: &mut self.rng,
        };
        let mut session = CombatSession::start(position, &mut ctx);
        session.begin(&mut ctx)?;
        self.combat = Some(session);
        self.settle_combat();
        Ok(())
    }

    /// Runs `f` against the live combat session with the player, the cave and
    /// the random stream split out, then folds the session's events and any
    /// terminal outcome back into the game. Returns `None` without a fight.
    fn with_combat<T, F>(&mut self, f: F) -> CrawlResult<Option<T>>
    where
        F: FnOnce(&mut CombatSession, &mut CombatContext<'_, StdRng>) -> CrawlResult<T>,
    {
        let Some(session) = self.combat.as_mut() else {
            return Ok(None);
        };
        let position = session.cave_position();
        let cave = self.grid.cave_mut(position).ok_or_else(|| {
            CrawlError::InvalidState(format!("combat at {position:?} has no cave"))
        })?;
        let mut ctx = CombatContext {
            player: &mut self.player,
            cave,
            rng: &mut self.rng,
        };
        let result = f(session, &mut ctx)?;
        self.settle_combat();
        Ok(Some(result))
    }

    fn settle_combat(&mut self) {
        let Some(session) = self.combat.as_mut() else {
            return;
        };
        let events = session.drain_events();
        let outcome = session.outcome();
        for event in events {
            self.push_event(event);
        }

        let Some(status) = outcome else {
            return;
        };
        self.combat = None;
        match status {
            CombatStatus::Victory => self.game_over(CompletionState::Won),
            CombatStatus::Defeat => self.game_over(CompletionState::Died("You Died".to_string())),
            _ => {}
        }
    }

    /// Attacks an enemy of the current fight. Returns false when there is no
    /// fight or the attack was not accepted.
    pub fn attack(&mut self, target: EnemyId) -> CrawlResult<bool> {
        Ok(self
            .with_combat(|session, ctx| Ok(session.player_attack(target, ctx)))?
            .unwrap_or(false))
    }

    /// Attacks the enemy at `slot` in the roster.
    pub fn attack_slot(&mut self, slot: usize) -> CrawlResult<bool> {
        let target = self
            .combat
            .as_ref()
            .and_then(|session| session.enemies().get(slot))
            .map(|enemy| enemy.id);
        match target {
            Some(id) => self.attack(id),
            None => Ok(false),
        }
    }

    /// Leaves the current fight on the player's turn.
    pub fn retreat(&mut self) -> CrawlResult<bool> {
        Ok(self
            .with_combat(|session, ctx| Ok(session.retreat(ctx)))?
            .unwrap_or(false))
    }

    /// Reports that the pending attack animation finished. Returns whether
    /// an animation was pending.
    pub fn finish_animation(&mut self) -> CrawlResult<bool> {
        Ok(self
            .with_combat(|session, ctx| {
                let pending = session.pending_animation().is_some();
                session.finish_animation(ctx)?;
                Ok(pending)
            })?
            .unwrap_or(false))
    }

    /// Finishes animations until the fight needs the player again or ends.
    /// For front-ends that do not animate.
    pub fn settle_animations(&mut self) -> CrawlResult<()> {
        while self.finish_animation()? {}
        Ok(())
    }

    pub fn combat(&self) -> Option<&CombatSession> {
        self.combat.as_ref()
    }

    /// The live fight, for scripted encounters and tests.
    pub fn combat_mut(&mut self) -> Option<&mut CombatSession> {
        self.combat.as_mut()
    }

    pub fn in_combat(&self) -> bool {
        self.combat.is_some()
    }

    pub fn shop_open(&self) -> bool {
        self.shop_open
    }

    /// Buys a healing potion restoring 30% of max health.
    pub fn buy_heal(&mut self) -> bool {
        if !self.charge(config::HEAL_POTION_PRICE) {
            return false;
        }
        let restored = self.player.health + config::HEAL_POTION_FRACTION * self.player.max_health;
        self.player.health = restored.min(self.player.max_health);
        true
    }

    /// Buys a permanent +50 max health (and current health).
    pub fn buy_health_buff(&mut self) -> bool {
        if !self.charge(config::HEALTH_BUFF_PRICE) {
            return false;
        }
        self.player.max_health += config::HEALTH_BOOST;
        self.player.health += config::HEALTH_BOOST;
        true
    }

    /// Buys a random rolled weapon. A full inventory refuses the purchase
    /// before any coins are taken.
    pub fn buy_weapon(&mut self) -> bool {
        if !self.shop_open {
            return false;
        }
        if self.player.inventory.len() >= config::INVENTORY_CAPACITY {
            self.push_event(GameEvent::warning("Inventory Full"));
            return false;
        }
        self.charge(config::WEAPON_PRICE) && self.add_random_weapon()
    }

    pub fn leave_shop(&mut self) -> bool {
        if !self.shop_open {
            return false;
        }
        self.shop_open = false;
        self.player.can_move = true;
        true
    }

    fn charge(&mut self, price: u32) -> bool {
        if !self.shop_open {
            return false;
        }
        if self.player.coins < price {
            self.push_event(GameEvent::warning("Insufficient Coins"));
            return false;
        }
        self.player.coins -= price;
        true
    }

    /// Equips the weapon at `index`.
    ///
    /// During a fight this is only accepted on the player's turn and costs
    /// the turn.
    pub fn equip_weapon(&mut self, index: usize) -> CrawlResult<bool> {
        if self.combat.as_ref().is_some_and(|session| !session.awaiting_player()) {
            return Ok(false);
        }
        if !self.player.equip(index) {
            return Ok(false);
        }
        info!("Equipped {}", self.player.weapon().name);
        self.with_combat(|session, ctx| session.end_player_turn(ctx))?;
        Ok(true)
    }

    /// Drops the weapon at `index`. The equipped weapon stays.
    pub fn discard_weapon(&mut self, index: usize) -> bool {
        match self.player.discard(index) {
            Some(weapon) => {
                info!("Dropped {}", weapon.name);
                true
            }
            None => false,
        }
    }

    /// Distances to the nearest armed fight cave, teleport and boss.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::ProximityReport;
    ///
    /// let report = ProximityReport { fight: Some(5), teleport: None, boss: Some(20) };
    /// assert_eq!(report.to_string(), "Orc ~5m. Boss ~20m.");
    /// ```
    pub fn proximity_report(&self) -> ProximityReport {
        let nearest = |category: CaveCategory| {
            self.caves
                .iter()
                .filter(|pos| {
                    self.grid
                        .cave(**pos)
                        .is_some_and(|cave| cave.category == category)
                })
                .map(|pos| self.player.position.euclidean_distance(*pos))
                .min_by(|a, b| a.total_cmp(b))
                .map(|distance| crate::utils::distance_bucket(distance, 5))
        };
        ProximityReport {
            fight: nearest(CaveCategory::Fight),
            teleport: nearest(CaveCategory::Teleport),
            boss: nearest(CaveCategory::Boss),
        }
    }

    fn game_over(&mut self, state: CompletionState) {
        if let Some(message) = state.message() {
            self.push_event(GameEvent::critical(message));
        }
        info!("Game over: {state:?}");
        self.player.can_move = false;
        self.completion_state = state;
    }

    fn push_event(&mut self, event: GameEvent) {
        self.statistics.update_from_event(&event);
        self.events.push(event);
    }

    /// Takes all events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
