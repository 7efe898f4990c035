//! # Autopilot Module
//!
//! Debug functionality for playing a crawl without input: walk to the
//! nearest treasure or fight cave, then to the boss, and always strike the
//! first enemy of the roster.

use crate::game::{CaveCategory, Direction, GameState, Position};
use crate::input::PlayerInput;
use crate::utils::shortest_path_where;
use crate::config;

/// Autopilot state for smoke-testing sessions.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    /// Whether the autopilot is currently driving
    pub enabled: bool,
    /// Remaining cells of the route being followed, next step first
    pub current_path: Vec<Position>,
    /// Cave the route leads to
    pub target: Option<Position>,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles the autopilot on/off.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.current_path.clear();
            self.target = None;
        }
        self.enabled
    }

    /// Picks the next command, or `None` when there is nothing left to do.
    ///
    /// Animations are not handled here; the caller settles them after every
    /// command.
    pub fn next_input(&mut self, state: &GameState) -> Option<PlayerInput> {
        if !self.enabled || state.completion_state.is_over() {
            return None;
        }

        if let Some(session) = state.combat() {
            return session.awaiting_player().then_some(PlayerInput::Attack(0));
        }

        if state.shop_open() {
            let wounded = state.player.health < state.player.max_health / 2.0;
            if wounded && state.player.coins >= config::HEAL_POTION_PRICE {
                return Some(PlayerInput::BuyHeal);
            }
            return Some(PlayerInput::LeaveShop);
        }

        let position = state.player.position;
        if self.current_path.first() != Some(&position) || self.current_path.len() < 2 {
            self.plan_route(state);
        }
        if self.current_path.len() < 2 {
            return None;
        }

        self.current_path.remove(0);
        let next = *self.current_path.first()?;
        match Direction::from_delta(next - position) {
            Some(direction) => Some(PlayerInput::Move(direction)),
            None => {
                self.current_path.clear();
                None
            }
        }
    }

    /// Routes to the closest treasure or fight cave, or to the boss once
    /// none are left. Routes never end in a teleport, a hole or a shop.
    fn plan_route(&mut self, state: &GameState) {
        self.current_path.clear();
        self.target = None;

        for wanted in [
            &[CaveCategory::Treasure, CaveCategory::Fight][..],
            &[CaveCategory::Boss][..],
        ] {
            let route = state
                .caves
                .iter()
                .filter(|pos| {
                    state
                        .grid
                        .cave(**pos)
                        .is_some_and(|cave| wanted.contains(&cave.category))
                })
                .filter_map(|goal| {
                    shortest_path_where(&state.grid, state.player.position, *goal, |pos| {
                        pos == *goal || state.grid.cave(pos).is_none()
                    })
                })
                .min_by_key(|path| path.len());

            if let Some(path) = route {
                log::debug!("Autopilot heading for {:?}", path.last());
                self.target = path.last().copied();
                self.current_path = path;
                return;
            }
        }
    }
}
