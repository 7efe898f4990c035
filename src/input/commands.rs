//! # Command Definitions
//!
//! Text commands understood by the terminal front-end.

use crate::game::{Direction, Position};
use crate::{CrawlError, CrawlResult};

/// Player input types that can be processed by the input handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Move one cell
    Move(Direction),
    /// Step toward an explored cell
    WalkTo(Position),
    /// Attack the enemy at a roster slot (zero-based)
    Attack(usize),
    Retreat,
    BuyHeal,
    BuyBuff,
    BuyWeapon,
    LeaveShop,
    /// Equip the weapon at an inventory slot (zero-based)
    Equip(usize),
    /// Drop the weapon at an inventory slot (zero-based)
    Drop(usize),
    ShowMap,
    ShowInventory,
    Help,
    /// Start a new game (when game has ended)
    NewGame,
    Quit,
}

/// Help text listing every command.
pub const HELP: &str = "\
w/a/s/d        move north/west/south/east
goto X Y       step toward an explored cell
attack N       attack enemy N
retreat        leave the fight
buy heal|buff|weapon
leave          leave the shop
equip N        equip inventory slot N
drop N         drop inventory slot N
map | inv | help | new | quit";

/// Parses one line of input. Slot numbers are one-based on the command line.
///
/// # Examples
///
/// ```
/// use cavecrawl::{parse_command, Direction, PlayerInput};
///
/// assert_eq!(parse_command("w").unwrap(), PlayerInput::Move(Direction::North));
/// assert_eq!(parse_command("attack 2").unwrap(), PlayerInput::Attack(1));
/// assert!(parse_command("dance").is_err());
/// ```
pub fn parse_command(line: &str) -> CrawlResult<PlayerInput> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Err(CrawlError::InvalidAction("empty command".to_string()));
    };

    let input = match (verb.to_ascii_lowercase().as_str(), args) {
        ("w" | "north", []) => PlayerInput::Move(Direction::North),
        ("a" | "west", []) => PlayerInput::Move(Direction::West),
        ("s" | "south", []) => PlayerInput::Move(Direction::South),
        ("d" | "east", []) => PlayerInput::Move(Direction::East),
        ("goto", [x, y]) => PlayerInput::WalkTo(Position::new(number(x)?, number(y)?)),
        ("attack" | "f", [slot]) => PlayerInput::Attack(slot_index(slot)?),
        ("attack" | "f", []) => PlayerInput::Attack(0),
        ("retreat" | "r", []) => PlayerInput::Retreat,
        ("buy", ["heal"]) => PlayerInput::BuyHeal,
        ("buy", ["buff"]) => PlayerInput::BuyBuff,
        ("buy", ["weapon"]) => PlayerInput::BuyWeapon,
        ("leave", []) => PlayerInput::LeaveShop,
        ("equip" | "e", [slot]) => PlayerInput::Equip(slot_index(slot)?),
        ("drop", [slot]) => PlayerInput::Drop(slot_index(slot)?),
        ("map" | "m", []) => PlayerInput::ShowMap,
        ("inv" | "i", []) => PlayerInput::ShowInventory,
        ("help" | "?", []) => PlayerInput::Help,
        ("new", []) => PlayerInput::NewGame,
        ("quit" | "q", []) => PlayerInput::Quit,
        _ => {
            return Err(CrawlError::InvalidAction(format!(
                "unknown command '{}'",
                line.trim()
            )))
        }
    };
    Ok(input)
}

fn number(word: &str) -> CrawlResult<i32> {
    word.parse()
        .map_err(|_| CrawlError::InvalidAction(format!("'{word}' is not a number")))
}

fn slot_index(word: &str) -> CrawlResult<usize> {
    match word.parse::<usize>() {
        Ok(slot) if slot > 0 => Ok(slot - 1),
        _ => Err(CrawlError::InvalidAction(format!(
            "'{word}' is not a slot number"
        ))),
    }
}
