//! # Display Management
//!
//! Plain-text rendering of the maze, the current cave screen and the message
//! log.

use crate::game::{
    CaveCategory, GameEvent, GameState, NodeType, Participant, Position,
};
use crate::rendering::StatusLine;

/// Text display for the terminal front-end.
///
/// Draws the explored part of the maze and keeps a rolling log of messages
/// built from drained [`GameEvent`]s.
#[derive(Debug, Clone)]
pub struct AsciiRenderer {
    /// Message history
    pub messages: Vec<String>,
    /// Maximum number of messages to keep
    pub max_messages: usize,
    /// Show what every cave holds instead of a plain marker
    pub reveal_caves: bool,
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            max_messages: 100,
            reveal_caves: false,
        }
    }

    /// Draws the maze, one line per row.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::{AsciiRenderer, Difficulty, GameState, GenerationConfig, Settings};
    ///
    /// let settings = Settings::builtin().unwrap();
    /// let state = GameState::new_session(&settings, Difficulty::Easy, GenerationConfig::new(1)).unwrap();
    /// let map = AsciiRenderer::new().render_map(&state);
    /// assert_eq!(map.lines().count(), 15);
    /// assert_eq!(map.matches('@').count(), 1);
    /// ```
    pub fn render_map(&self, game_state: &GameState) -> String {
        let grid = &game_state.grid;
        let mut out = String::with_capacity(((grid.width + 1) * grid.height) as usize);
        for y in 0..grid.height as i32 {
            for x in 0..grid.width as i32 {
                out.push(self.glyph(game_state, Position::new(x, y)));
            }
            out.push('\n');
        }
        out
    }

    fn glyph(&self, game_state: &GameState, pos: Position) -> char {
        if pos == game_state.player.position {
            return '@';
        }
        let Some(node) = game_state.grid.get(pos) else {
            return ' ';
        };
        if !node.visible {
            return '?';
        }
        if let Some(cave) = &node.cave {
            if !self.reveal_caves {
                return if cave.category == CaveCategory::Empty { '.' } else { 'o' };
            }
            return match cave.category {
                CaveCategory::Boss => 'B',
                CaveCategory::Teleport => 'T',
                CaveCategory::Shop => '$',
                CaveCategory::InstantDeath => 'X',
                CaveCategory::Fight => 'F',
                CaveCategory::Treasure => '*',
                CaveCategory::Empty => '.',
            };
        }
        match node.node_type {
            NodeType::Wall => '#',
            NodeType::Start => 'S',
            NodeType::Normal | NodeType::DeadEnd => '.',
        }
    }

    /// The fight roster with one-based slot numbers, or the shop menu.
    pub fn render_cave_screen(&self, game_state: &GameState) -> Option<String> {
        if let Some(session) = game_state.combat() {
            let mut lines = Vec::new();
            for (slot, enemy) in session.enemies().iter().enumerate() {
                let marker = if session.current_turn() == Participant::Enemy(enemy.id) {
                    '>'
                } else {
                    ' '
                };
                lines.push(format!(
                    "{marker}{}. {} {:.0}/{:.0}",
                    slot + 1,
                    enemy.name,
                    enemy.health,
                    enemy.max_health
                ));
            }
            if session.awaiting_player() {
                lines.push("Your turn: attack N | retreat | equip N".to_string());
            }
            return Some(lines.join("\n"));
        }
        if game_state.shop_open() {
            return Some(
                [
                    "Buy Health Buff (10 coins)   buy buff",
                    "Buy Healing Potion (10 coins) buy heal",
                    "Buy Random Weapon (15 coins) buy weapon",
                    "Exit                         leave",
                ]
                .join("\n"),
            );
        }
        None
    }

    /// One line per carried weapon, the equipped one marked.
    pub fn render_inventory(&self, game_state: &GameState) -> String {
        game_state
            .player
            .inventory
            .iter()
            .enumerate()
            .map(|(slot, weapon)| {
                let marker = if slot == game_state.player.equipped { '*' } else { ' ' };
                format!("{marker}{:>2}. {}", slot + 1, weapon.info().join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full frame: map, status line, cave screen and the latest messages.
    pub fn render(&self, game_state: &GameState) -> String {
        let mut frame = self.render_map(game_state);
        frame.push_str(&StatusLine::from_state(game_state).to_string());
        frame.push('\n');
        if let Some(screen) = self.render_cave_screen(game_state) {
            frame.push_str(&screen);
            frame.push('\n');
        }
        for message in self.recent_messages(3) {
            frame.push_str(message);
            frame.push('\n');
        }
        frame
    }

    /// Logs a batch of drained events.
    pub fn record(&mut self, game_state: &GameState, events: &[GameEvent]) {
        for event in events {
            if let Some(message) = describe(game_state, event) {
                self.add_message(message);
            }
        }
    }

    pub fn add_message(&mut self, message: String) {
        self.messages.push(message);

        // Keep only the most recent messages
        if self.messages.len() > self.max_messages {
            self.messages.remove(0);
        }
    }

    pub fn recent_messages(&self, count: usize) -> &[String] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }
}

fn describe(game_state: &GameState, event: &GameEvent) -> Option<String> {
    let name = |participant: Participant| match participant {
        Participant::Player => "You".to_string(),
        Participant::Enemy(id) => game_state
            .combat()
            .and_then(|session| session.enemy(id))
            .map(|enemy| enemy.name.clone())
            .unwrap_or_else(|| "Enemy".to_string()),
    };

    match event {
        GameEvent::Message { text, .. } => Some(text.clone()),
        GameEvent::DamageDealt {
            target,
            amount,
            critical,
            over_time,
        } => {
            let suffix = match (critical, over_time) {
                (_, true) => " over time",
                (true, false) => " (critical)",
                _ => "",
            };
            Some(format!("{} took {:.1} damage{}", name(*target), amount, suffix))
        }
        GameEvent::EnemyHealed { target, amount, .. } => Some(format!(
            "{} healed for {:.1}",
            name(Participant::Enemy(*target)),
            amount
        )),
        GameEvent::CoinsAwarded { amount } => Some(format!("+{amount} coins")),
        GameEvent::PlayerDied => Some("You collapse".to_string()),
        _ => None,
    }
}
