//! # Game Events
//!
//! Everything the core reports to the presentation layer. The core never
//! draws anything itself; it queues events and the front-end drains them.

use crate::game::{CombatStatus, EnemyId, Participant};
use serde::{Deserialize, Serialize};

/// How prominently a message should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageImportance {
    Info,
    Warning,
    Critical,
}

/// Action animations the presentation plays. Attack animations block the
/// turn sequence until the presentation reports them finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Animation {
    Sword,
    Bow,
    Wand,
    /// Death animation ending in a dead pose
    Death,
}

/// Events emitted by the game core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Text for the alert line
    Message {
        text: String,
        importance: MessageImportance,
    },
    /// The player moved one cell
    PlayerMoved { from: crate::Position, to: crate::Position },
    /// Damage landed on a participant
    DamageDealt {
        target: Participant,
        amount: f64,
        critical: bool,
        /// Damage came from a DOT tick rather than a strike
        over_time: bool,
    },
    /// A participant started an action animation
    AnimationStarted {
        actor: Participant,
        animation: Animation,
    },
    /// An enemy's health crossed zero; it stays on the roster until the
    /// next turn advance
    EnemyFell { enemy: EnemyId },
    /// A dead enemy left the roster
    EnemyRemoved { enemy: EnemyId },
    EnemyHealed {
        healer: EnemyId,
        target: EnemyId,
        amount: f64,
    },
    EnemyBuffed {
        buffer: EnemyId,
        target: EnemyId,
        damage: f64,
    },
    /// Coins credited to the player
    CoinsAwarded { amount: u32 },
    /// The player's health dropped to zero
    PlayerDied,
    /// A combat session reached a terminal status
    CombatEnded { status: CombatStatus },
}

impl GameEvent {
    pub fn info(text: impl Into<String>) -> Self {
        GameEvent::Message {
            text: text.into(),
            importance: MessageImportance::Info,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        GameEvent::Message {
            text: text.into(),
            importance: MessageImportance::Warning,
        }
    }

    pub fn critical(text: impl Into<String>) -> Self {
        GameEvent::Message {
            text: text.into(),
            importance: MessageImportance::Critical,
        }
    }

    /// Message text, if this is a message event.
    pub fn message_text(&self) -> Option<&str> {
        match self {
            GameEvent::Message { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Running totals for the end-of-game summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub steps_taken: u64,
    pub enemies_defeated: u32,
    pub damage_dealt: f64,
    pub damage_taken: f64,
    pub coins_earned: u64,
    pub caves_visited: u32,
}

impl GameStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PlayerMoved { .. } => {
                self.steps_taken += 1;
            }
            GameEvent::DamageDealt {
                target: Participant::Player,
                amount,
                ..
            } => {
                self.damage_taken += amount;
            }
            GameEvent::DamageDealt {
                target: Participant::Enemy(_),
                amount,
                over_time: false,
                ..
            } => {
                self.damage_dealt += amount;
            }
            GameEvent::EnemyRemoved { .. } => {
                self.enemies_defeated += 1;
            }
            GameEvent::CoinsAwarded { amount } => {
                self.coins_earned += u64::from(*amount);
            }
            _ => {}
        }
    }
}
