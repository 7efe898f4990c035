//! # Input Module
//!
//! Input handling and command parsing for player interactions.

pub mod commands;

pub use commands::*;

use crate::game::{Direction, GameState};
use crate::CrawlResult;

/// Input handler for processing player commands.
///
/// Turns lines of text into [`PlayerInput`]s and applies the ones that act
/// on the game.
pub struct InputHandler {
    /// Whether to enable Vi-style movement keys (hjkl)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::{InputHandler, PlayerInput, Direction};
    ///
    /// let input_handler = InputHandler::new();
    /// assert_eq!(input_handler.parse("k").unwrap(), PlayerInput::Move(Direction::North));
    /// ```
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: true,
        }
    }

    /// Parses a line, accepting hjkl movement when enabled.
    pub fn parse(&self, line: &str) -> CrawlResult<PlayerInput> {
        if self.vi_keys_enabled {
            let direction = match line.trim() {
                "h" => Some(Direction::West),
                "j" => Some(Direction::South),
                "k" => Some(Direction::North),
                "l" => Some(Direction::East),
                _ => None,
            };
            if let Some(direction) = direction {
                return Ok(PlayerInput::Move(direction));
            }
        }
        parse_command(line)
    }

    /// Applies an input to the game. Returns whether the game accepted it;
    /// display-only inputs return false.
    ///
    /// Attack animations are settled immediately since the text front-end
    /// does not animate.
    pub fn execute(&self, input: PlayerInput, game_state: &mut GameState) -> CrawlResult<bool> {
        let accepted = match input {
            PlayerInput::Move(direction) => game_state.move_player(direction)?,
            PlayerInput::WalkTo(target) => game_state.walk_towards(target)?,
            PlayerInput::Attack(slot) => game_state.attack_slot(slot)?,
            PlayerInput::Retreat => game_state.retreat()?,
            PlayerInput::BuyHeal => game_state.buy_heal(),
            PlayerInput::BuyBuff => game_state.buy_health_buff(),
            PlayerInput::BuyWeapon => game_state.buy_weapon(),
            PlayerInput::LeaveShop => game_state.leave_shop(),
            PlayerInput::Equip(slot) => game_state.equip_weapon(slot)?,
            PlayerInput::Drop(slot) => game_state.discard_weapon(slot),
            PlayerInput::NewGame => {
                game_state.restart()?;
                true
            }
            PlayerInput::ShowMap
            | PlayerInput::ShowInventory
            | PlayerInput::Help
            | PlayerInput::Quit => false,
        };
        game_state.settle_animations()?;
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationConfig;
    use crate::settings::{Difficulty, Settings};

    #[test]
    fn test_vi_keys_toggle() {
        let mut handler = InputHandler::new();
        assert_eq!(
            handler.parse("h").unwrap(),
            PlayerInput::Move(Direction::West)
        );
        handler.vi_keys_enabled = false;
        assert!(handler.parse("h").is_err());
    }

    #[test]
    fn test_execute_display_inputs_change_nothing() {
        let settings = Settings::builtin().unwrap();
        let mut state =
            GameState::new_session(&settings, Difficulty::Normal, GenerationConfig::new(4)).unwrap();
        let handler = InputHandler::new();
        let position = state.player.position;
        assert!(!handler.execute(PlayerInput::ShowMap, &mut state).unwrap());
        assert!(!handler.execute(PlayerInput::Attack(0), &mut state).unwrap());
        assert_eq!(state.player.position, position);
    }
}
