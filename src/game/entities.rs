//! # Entity Definitions
//!
//! The player, enemies and weapons, plus the [`Combatant`] trait shared by
//! everything that can take damage over time.

use crate::settings::{ActionChances, EnemyTemplate, PlayerConfig};
use crate::{config, Position};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Unique identifier for enemies.
pub type EnemyId = Uuid;

/// Generates a fresh random enemy id.
pub fn new_enemy_id() -> EnemyId {
    Uuid::new_v4()
}

/// Derives an enemy id from a random stream, so seeded generation stays
/// reproducible down to the ids.
pub fn enemy_id_from_rng<R: Rng + ?Sized>(rng: &mut R) -> EnemyId {
    Uuid::from_u128(rng.gen::<u128>())
}

/// A damage-over-time stack: `amount` is applied once per owner's turn
/// until `remaining` reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DotStack {
    pub amount: f64,
    pub remaining: u32,
}

impl DotStack {
    pub fn new(amount: f64, remaining: u32) -> Self {
        Self { amount, remaining }
    }
}

/// Anything with health that damage-over-time can be applied to.
pub trait Combatant {
    /// Current health.
    fn health(&self) -> f64;

    /// Overwrites current health.
    fn set_health(&mut self, health: f64);

    /// Active damage-over-time stacks.
    fn dots_mut(&mut self) -> &mut Vec<DotStack>;

    /// Whether the combatant is down.
    fn is_defeated(&self) -> bool {
        self.health() <= 0.0
    }

    /// Subtracts `amount` from current health.
    fn take_damage(&mut self, amount: f64) {
        let health = self.health();
        self.set_health(health - amount);
    }

    /// Appends a new damage-over-time stack.
    fn add_dot(&mut self, amount: f64, ticks: u32) {
        self.dots_mut().push(DotStack::new(amount, ticks));
    }

    /// Drops expired stacks, then applies every remaining stack once and
    /// decrements its tick count. Returns the amounts applied, in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::{Combatant, DotStack, Enemy};
    /// # use cavecrawl::settings::{ActionChances, EnemyTemplate};
    /// # let template = EnemyTemplate {
    /// #     health: 10.0, max_health: 10.0, damage: 1.0, crit_rate: 0.0, crit_damage: 1.0,
    /// #     dot_turns: 0, dot_damage: 0.0, heal_amount: 0.0, coins: 0,
    /// #     chances: ActionChances::always_melee(),
    /// # };
    /// let mut enemy = Enemy::from_template("Orc Grunt", &template, cavecrawl::new_enemy_id());
    /// enemy.add_dot(2.0, 1);
    /// assert_eq!(enemy.tick_dots(), vec![2.0]);
    /// assert_eq!(enemy.health, 8.0);
    /// // The spent stack lingers with zero ticks until the next tick drops it.
    /// assert!(enemy.tick_dots().is_empty());
    /// ```
    fn tick_dots(&mut self) -> Vec<f64> {
        let dots = self.dots_mut();
        dots.retain(|dot| dot.remaining > 0);
        let mut applied = Vec::with_capacity(dots.len());
        for dot in dots.iter_mut() {
            applied.push(dot.amount);
            dot.remaining -= 1;
        }
        for amount in &applied {
            self.take_damage(*amount);
        }
        applied
    }
}

/// A hostile combatant spawned into a fight cave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EnemyId,
    pub name: String,
    pub health: f64,
    pub max_health: f64,
    pub damage: f64,
    pub crit_rate: f64,
    pub crit_damage: f64,
    pub dot_turns: u32,
    pub dot_damage: f64,
    pub heal_amount: f64,
    pub coin_reward: u32,
    pub action_chances: ActionChances,
    pub dots: Vec<DotStack>,
    /// Set once the coin reward has been paid out
    pub bounty_claimed: bool,
}

impl Enemy {
    /// Instantiates an enemy from an archetype template. Every instance
    /// owns its own copy of the template's stats.
    pub fn from_template(name: &str, template: &EnemyTemplate, id: EnemyId) -> Self {
        Self {
            id,
            name: name.to_string(),
            health: template.health,
            max_health: template.max_health,
            damage: template.damage,
            crit_rate: template.crit_rate,
            crit_damage: template.crit_damage,
            dot_turns: template.dot_turns,
            dot_damage: template.dot_damage,
            heal_amount: template.heal_amount,
            coin_reward: template.coins,
            action_chances: template.chances.clone(),
            dots: Vec::new(),
            bounty_claimed: false,
        }
    }

    /// Returns the coin reward the first time it is called and `None`
    /// afterwards.
    pub fn claim_bounty(&mut self) -> Option<u32> {
        if self.bounty_claimed {
            return None;
        }
        self.bounty_claimed = true;
        Some(self.coin_reward)
    }

    /// Stat lines shown when the presentation hovers over the enemy.
    pub fn info(&self) -> Vec<String> {
        let mut lines = vec![self.name.clone(), format!("Dam: {}", self.damage)];
        if self.crit_rate != 0.0 {
            lines.push(format!("CritRate: {}%", round_percent(self.crit_rate)));
            lines.push(format!("CritDam: {}%", round_percent(self.crit_damage)));
        }
        if self.dot_turns != 0 {
            lines.push(format!("DOTTurns: {}", self.dot_turns));
            lines.push(format!("DOTDam: {}%", round_percent(self.dot_damage)));
        }
        lines
    }
}

impl Combatant for Enemy {
    fn health(&self) -> f64 {
        self.health
    }

    fn set_health(&mut self, health: f64) {
        self.health = health;
    }

    fn dots_mut(&mut self) -> &mut Vec<DotStack> {
        &mut self.dots
    }
}

/// Weapon families. Swords are the heavy melee category: wielding one lets
/// the enemies act first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    Sword,
    Bow,
    Wand,
}

impl WeaponKind {
    /// Whether the weapon is slow enough to hand the enemies the first turn.
    pub fn is_heavy(self) -> bool {
        matches!(self, WeaponKind::Sword)
    }
}

/// A weapon the player can carry and equip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub kind: WeaponKind,
    pub damage: f64,
    pub crit_rate: f64,
    pub crit_damage: f64,
    pub dot_turns: u32,
    pub dot_damage: f64,
    /// Drop weight: 1 is the rarest tier, 3 the most common
    pub rarity: u32,
}

impl Weapon {
    /// Randomly rescales damage, crit rate, crit damage and DOT damage by a
    /// factor in `[0.75, 1.25]`, rounded to two decimals.
    pub fn roll<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for stat in [
            &mut self.damage,
            &mut self.crit_rate,
            &mut self.crit_damage,
            &mut self.dot_damage,
        ] {
            *stat = crate::utils::round_to(*stat * rng.gen_range(0.75..=1.25), 2);
        }
    }

    /// Inventory ordering: rarity, then kind, then strongest first.
    pub fn inventory_order(&self, other: &Weapon) -> Ordering {
        self.rarity
            .cmp(&other.rarity)
            .then(self.kind.cmp(&other.kind))
            .then(
                other
                    .damage
                    .partial_cmp(&self.damage)
                    .unwrap_or(Ordering::Equal),
            )
    }

    /// Stat lines shown when the presentation hovers over the weapon.
    pub fn info(&self) -> Vec<String> {
        let mut lines = vec![self.name.clone(), format!("Dam: {}", self.damage)];
        if self.crit_rate != 0.0 {
            lines.push(format!("CritRate: {}%", round_percent(self.crit_rate)));
            lines.push(format!("CritDam: {}%", round_percent(self.crit_damage)));
        }
        if self.dot_turns != 0 {
            lines.push(format!("DOTTurns: {}", self.dot_turns));
            lines.push(format!("DOTDam: {}%", round_percent(self.dot_damage)));
        }
        lines
    }
}

fn round_percent(ratio: f64) -> f64 {
    crate::utils::round_to(ratio * 100.0, 2)
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: Position,
    pub health: f64,
    pub max_health: f64,
    pub coins: u32,
    /// Base attack damage, copied from the equipped weapon
    pub damage: f64,
    pub dots: Vec<DotStack>,
    /// Cleared while a cave screen (combat, shop) holds the player
    pub can_move: bool,
    pub in_combat: bool,
    pub inventory: Vec<Weapon>,
    pub equipped: usize,
}

impl Player {
    /// Creates a player with the configured starting stats holding a single
    /// equipped weapon.
    pub fn new(position: Position, config: &PlayerConfig, weapon: Weapon) -> Self {
        Self {
            position,
            health: config.health,
            max_health: config.max_health,
            coins: config.coins,
            damage: weapon.damage,
            dots: Vec::new(),
            can_move: true,
            in_combat: false,
            inventory: vec![weapon],
            equipped: 0,
        }
    }

    /// The currently equipped weapon.
    pub fn weapon(&self) -> &Weapon {
        &self.inventory[self.equipped]
    }

    /// Equips the weapon at `index`. Returns false if the index is out of
    /// range or the weapon is already equipped.
    pub fn equip(&mut self, index: usize) -> bool {
        if index >= self.inventory.len() || index == self.equipped {
            return false;
        }
        self.equipped = index;
        self.damage = self.inventory[index].damage;
        true
    }

    /// Adds a weapon and re-sorts the inventory. Returns false when the
    /// inventory is full.
    pub fn add_weapon(&mut self, weapon: Weapon) -> bool {
        if self.inventory.len() >= config::INVENTORY_CAPACITY {
            return false;
        }
        self.inventory.push(weapon);
        self.sort_inventory();
        true
    }

    /// Removes the weapon at `index`. The equipped weapon cannot be dropped.
    pub fn discard(&mut self, index: usize) -> Option<Weapon> {
        if index >= self.inventory.len() || index == self.equipped {
            return None;
        }
        let weapon = self.inventory.remove(index);
        if index < self.equipped {
            self.equipped -= 1;
        }
        Some(weapon)
    }

    fn sort_inventory(&mut self) {
        let equipped = self.equipped;
        let mut tagged: Vec<(bool, Weapon)> = self
            .inventory
            .drain(..)
            .enumerate()
            .map(|(index, weapon)| (index == equipped, weapon))
            .collect();
        tagged.sort_by(|a, b| a.1.inventory_order(&b.1));
        self.equipped = tagged.iter().position(|(is_equipped, _)| *is_equipped).unwrap_or(0);
        self.inventory = tagged.into_iter().map(|(_, weapon)| weapon).collect();
    }
}

impl Combatant for Player {
    fn health(&self) -> f64 {
        self.health
    }

    fn set_health(&mut self, health: f64) {
        self.health = health;
    }

    fn dots_mut(&mut self) -> &mut Vec<DotStack> {
        &mut self.dots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn template() -> EnemyTemplate {
        EnemyTemplate {
            health: 30.0,
            max_health: 30.0,
            damage: 4.0,
            crit_rate: 0.1,
            crit_damage: 1.5,
            dot_turns: 2,
            dot_damage: 0.25,
            heal_amount: 5.0,
            coins: 7,
            chances: ActionChances::always_melee(),
        }
    }

    fn weapon(name: &str, kind: WeaponKind, damage: f64, rarity: u32) -> Weapon {
        Weapon {
            name: name.to_string(),
            kind,
            damage,
            crit_rate: 0.0,
            crit_damage: 1.0,
            dot_turns: 0,
            dot_damage: 0.0,
            rarity,
        }
    }

    fn player_config() -> PlayerConfig {
        PlayerConfig {
            max_health: 100.0,
            health: 100.0,
            coins: 0,
        }
    }

    #[test]
    fn test_enemy_instances_are_independent() {
        let template = template();
        let mut a = Enemy::from_template("Orc Grunt", &template, new_enemy_id());
        let b = Enemy::from_template("Orc Grunt", &template, new_enemy_id());
        a.take_damage(10.0);
        a.add_dot(1.0, 3);
        assert_eq!(a.health, 20.0);
        assert_eq!(b.health, 30.0);
        assert!(b.dots.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_bounty_paid_once() {
        let mut enemy = Enemy::from_template("Orc Grunt", &template(), new_enemy_id());
        assert_eq!(enemy.claim_bounty(), Some(7));
        assert_eq!(enemy.claim_bounty(), None);
    }

    #[test]
    fn test_dot_ticks_and_expiry() {
        let mut enemy = Enemy::from_template("Orc Grunt", &template(), new_enemy_id());
        enemy.add_dot(3.0, 2);
        enemy.add_dot(1.0, 0);

        assert_eq!(enemy.tick_dots(), vec![3.0]);
        assert_eq!(enemy.health, 27.0);
        assert_eq!(enemy.tick_dots(), vec![3.0]);
        assert_eq!(enemy.health, 24.0);
        assert!(enemy.tick_dots().is_empty());
        assert!(enemy.dots.is_empty());
    }

    #[test]
    fn test_enemy_info_lines() {
        let enemy = Enemy::from_template("Orc Mage", &template(), new_enemy_id());
        let info = enemy.info();
        assert_eq!(info[0], "Orc Mage");
        assert!(info.iter().any(|line| line.starts_with("CritRate")));
        assert!(info.iter().any(|line| line.starts_with("DOTTurns: 2")));
    }

    #[test]
    fn test_weapon_roll_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let base = Weapon {
            crit_rate: 0.2,
            crit_damage: 2.0,
            dot_damage: 0.5,
            ..weapon("Longsword", WeaponKind::Sword, 10.0, 1)
        };
        for _ in 0..50 {
            let mut rolled = base.clone();
            rolled.roll(&mut rng);
            assert!(rolled.damage >= 7.5 && rolled.damage <= 12.5);
            assert!(rolled.crit_damage >= 1.5 && rolled.crit_damage <= 2.5);
            assert_eq!(rolled.dot_turns, base.dot_turns);
        }
    }

    #[test]
    fn test_inventory_sorting_tracks_equipped() {
        let mut player = Player::new(
            Position::origin(),
            &player_config(),
            weapon("Wand", WeaponKind::Wand, 3.0, 2),
        );
        assert!(player.add_weapon(weapon("Dagger", WeaponKind::Sword, 2.0, 1)));
        assert!(player.add_weapon(weapon("Claymore", WeaponKind::Sword, 9.0, 1)));

        let names: Vec<&str> = player.inventory.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Claymore", "Dagger", "Wand"]);
        assert_eq!(player.weapon().name, "Wand");
        assert_eq!(player.damage, 3.0);
    }

    #[test]
    fn test_equip_and_discard() {
        let mut player = Player::new(
            Position::origin(),
            &player_config(),
            weapon("Bow", WeaponKind::Bow, 5.0, 1),
        );
        player.add_weapon(weapon("Staff", WeaponKind::Wand, 8.0, 3));
        assert!(!player.equip(player.equipped));
        assert!(player.equip(1));
        assert_eq!(player.damage, 8.0);
        assert!(player.discard(1).is_none());
        assert_eq!(player.discard(0).map(|w| w.name), Some("Bow".to_string()));
        assert_eq!(player.equipped, 0);
        assert_eq!(player.weapon().name, "Staff");
    }

    #[test]
    fn test_inventory_capacity() {
        let mut player = Player::new(
            Position::origin(),
            &player_config(),
            weapon("Bow", WeaponKind::Bow, 5.0, 1),
        );
        for i in 1..config::INVENTORY_CAPACITY {
            assert!(player.add_weapon(weapon(&format!("Bow {i}"), WeaponKind::Bow, 1.0, 1)));
        }
        assert!(!player.add_weapon(weapon("One too many", WeaponKind::Bow, 1.0, 1)));
        assert_eq!(player.inventory.len(), config::INVENTORY_CAPACITY);
    }
}
