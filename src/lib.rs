//! # Cavecrawl
//!
//! The rules engine of a maze-crawling roguelike.
//!
//! ## Architecture Overview
//!
//! The crate is split along the two subsystems that carry all of the game's
//! state-machine logic, plus the session owner that ties them together:
//!
//! - **Generation**: a randomized depth-first maze carver, the cave assigner
//!   that turns dead ends into special rooms, and the encounter factory that
//!   populates fight caves with enemies
//! - **Combat**: a rotating turn order over one player and N enemies, with
//!   damage over time, critical hits and probabilistic enemy actions
//! - **Game State**: the explicit session owner handling movement, fog of war,
//!   cave triggers, the shop and the inventory
//! - **Rendering / Input**: a thin text front-end used by the binary
//!
//! Presentation is an external collaborator. The core reports what happened
//! through [`GameEvent`]s and waits for the presentation to report that an
//! action animation finished before the next turn resolves.

pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod settings;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use settings::*;

// Explicit re-exports for commonly used types
pub use game::{
    // From actions
    EnemyAction,
    // From combat
    CombatContext,
    CombatSession,
    CombatStatus,
    Participant,
    // From entities
    Combatant,
    DotStack,
    Enemy,
    EnemyId,
    Player,
    Weapon,
    WeaponKind,
    // From events
    Animation,
    GameEvent,
    MessageImportance,
    // From state
    CompletionState,
    GameState,
    // From world
    Cave,
    CaveCategory,
    CaveOutcome,
    Grid,
    MazeNode,
    NodeType,
    Direction,
    Position,
};

pub use generation::{
    CaveAssigner, CaveLayout, EncounterFactory, GenerationConfig, Generator, MazeCarver,
    WeaponCatalog,
};

pub use rendering::{AsciiRenderer, StatusLine};

/// Core error type for the Cavecrawl engine.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Settings are malformed or contradictory
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type used throughout the Cavecrawl codebase.
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default maze width in cells
    pub const DEFAULT_MAZE_WIDTH: u32 = 25;

    /// Default maze height in cells
    pub const DEFAULT_MAZE_HEIGHT: u32 = 15;

    /// Full regenerations attempted before cave placement gives up
    pub const MAX_REGENERATIONS: u32 = 100;

    /// Steps of corridor revealed around the player
    pub const REVEAL_RADIUS: u32 = 5;

    /// Maximum number of weapons the player can carry
    pub const INVENTORY_CAPACITY: usize = 20;

    /// Coins paid out by a regular fight cave once cleared
    pub const FIGHT_REWARD: u32 = 20;

    /// Coins paid out by the boss cave once cleared
    pub const BOSS_REWARD: u32 = 500;

    /// Max health and health granted by treasure caves and the health buff
    pub const HEALTH_BOOST: f64 = 50.0;

    /// Enemy damage multiplier applied by a buff action
    pub const BUFF_MULTIPLIER: f64 = 1.2;

    /// Shop price of a healing potion
    pub const HEAL_POTION_PRICE: u32 = 10;

    /// Fraction of max health restored by a healing potion
    pub const HEAL_POTION_FRACTION: f64 = 0.3;

    /// Shop price of the permanent health buff
    pub const HEALTH_BUFF_PRICE: u32 = 10;

    /// Shop price of a random weapon
    pub const WEAPON_PRICE: u32 = 15;
}
