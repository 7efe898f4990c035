//! # User Interface Elements
//!
//! The status line shown under the map.

use crate::game::{GameState, ProximityReport};
use std::fmt;

/// Snapshot of the player's vital stats.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub health: f64,
    pub max_health: f64,
    pub coins: u32,
    pub weapon: String,
    pub damage: f64,
    pub proximity: ProximityReport,
}

impl StatusLine {
    pub fn from_state(game_state: &GameState) -> Self {
        let player = &game_state.player;
        Self {
            health: player.health,
            max_health: player.max_health,
            coins: player.coins,
            weapon: player.weapon().name.clone(),
            damage: player.damage,
            proximity: game_state.proximity_report(),
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HP {:.0}/{:.0} | Coins {} | {} ({})",
            self.health, self.max_health, self.coins, self.weapon, self.damage
        )?;
        let proximity = self.proximity.to_string();
        if !proximity.is_empty() {
            write!(f, " | {proximity}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_format() {
        let line = StatusLine {
            health: 72.4,
            max_health: 100.0,
            coins: 15,
            weapon: "Rusty Sword".to_string(),
            damage: 12.0,
            proximity: ProximityReport {
                fight: Some(10),
                teleport: None,
                boss: None,
            },
        };
        assert_eq!(
            line.to_string(),
            "HP 72/100 | Coins 15 | Rusty Sword (12) | Orc ~10m."
        );

        let quiet = StatusLine {
            proximity: ProximityReport::default(),
            ..line
        };
        assert_eq!(quiet.to_string(), "HP 72/100 | Coins 15 | Rusty Sword (12)");
    }
}
