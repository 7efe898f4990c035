//! # Combat Actions
//!
//! Per-turn resolution: the player's strike and the enemies' probabilistic
//! action pick.

use crate::config;
use crate::game::{
    Animation, CombatContext, CombatSession, Combatant, EnemyId, GameEvent, Participant,
    PendingAnimation, TurnResolution, WeaponKind,
};
use crate::settings::ActionChances;
use crate::{CrawlError, CrawlResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What an enemy does with its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyAction {
    Melee,
    Ranged,
    Magic,
    /// Restore health to a random ally
    Heal,
    /// Permanently raise a random ally's damage
    Buff,
}

impl EnemyAction {
    /// Actions with a configurable threshold, in resolution order. Buff is
    /// the fallback when no threshold matches.
    pub const THRESHOLD_ORDER: [EnemyAction; 4] = [
        EnemyAction::Melee,
        EnemyAction::Ranged,
        EnemyAction::Magic,
        EnemyAction::Heal,
    ];

    /// Picks the first action whose cumulative threshold exceeds `roll`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::EnemyAction;
    /// use cavecrawl::settings::ActionChances;
    ///
    /// let chances = ActionChances { melee: 0.4, ranged: 0.6, magic: 0.8, heal: 0.9 };
    /// assert_eq!(EnemyAction::choose(&chances, 0.1), EnemyAction::Melee);
    /// assert_eq!(EnemyAction::choose(&chances, 0.85), EnemyAction::Heal);
    /// assert_eq!(EnemyAction::choose(&chances, 0.95), EnemyAction::Buff);
    /// ```
    pub fn choose(chances: &ActionChances, roll: f64) -> Self {
        Self::THRESHOLD_ORDER
            .into_iter()
            .zip(chances.thresholds())
            .find(|(_, threshold)| roll < *threshold)
            .map(|(action, _)| action)
            .unwrap_or(EnemyAction::Buff)
    }

    /// Whether the action damages the player.
    pub fn is_attack(self) -> bool {
        matches!(
            self,
            EnemyAction::Melee | EnemyAction::Ranged | EnemyAction::Magic
        )
    }

    pub fn animation(self) -> Animation {
        match self {
            EnemyAction::Melee => Animation::Sword,
            EnemyAction::Ranged => Animation::Bow,
            EnemyAction::Magic | EnemyAction::Heal | EnemyAction::Buff => Animation::Wand,
        }
    }
}

impl WeaponKind {
    /// Attack animation played when the player strikes with this weapon.
    pub fn animation(self) -> Animation {
        match self {
            WeaponKind::Sword => Animation::Sword,
            WeaponKind::Bow => Animation::Bow,
            WeaponKind::Wand => Animation::Wand,
        }
    }
}

impl CombatSession {
    /// Resolves the player's strike on the enemy at `index`. The turn index
    /// has already moved on.
    pub(crate) fn strike_enemy<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        ctx: &mut CombatContext<'_, R>,
    ) {
        let weapon = ctx.player.weapon();
        let (kind, crit_rate, crit_damage, dot_damage, dot_turns) = (
            weapon.kind,
            weapon.crit_rate,
            weapon.crit_damage,
            weapon.dot_damage,
            weapon.dot_turns,
        );
        let base = ctx.player.damage;

        let critical = ctx.rng.gen::<f64>() < crit_rate;
        let amount = if critical { base * crit_damage } else { base };

        let enemy = &mut self.enemies[index];
        let id = enemy.id;
        enemy.take_damage(amount);
        self.events.push(GameEvent::DamageDealt {
            target: Participant::Enemy(id),
            amount,
            critical,
            over_time: false,
        });

        if enemy.is_defeated() {
            self.events.push(GameEvent::EnemyFell { enemy: id });
            self.events.push(GameEvent::AnimationStarted {
                actor: Participant::Enemy(id),
                animation: Animation::Death,
            });
        }

        enemy.add_dot(base * dot_damage, dot_turns);

        let pending = PendingAnimation {
            actor: Participant::Player,
            animation: kind.animation(),
        };
        self.events.push(GameEvent::AnimationStarted {
            actor: pending.actor,
            animation: pending.animation,
        });
        self.pending = Some(pending);
    }

    /// Runs one enemy's turn: step the turn index, tick its DOT stacks and,
    /// if it is still standing, pick and resolve an action.
    pub(crate) fn resolve_enemy_turn<R: Rng + ?Sized>(
        &mut self,
        id: EnemyId,
        ctx: &mut CombatContext<'_, R>,
    ) -> CrawlResult<TurnResolution> {
        let index = self
            .enemies
            .iter()
            .position(|enemy| enemy.id == id)
            .ok_or_else(|| {
                log::error!("Enemy {id} holds a turn but is not on the roster");
                CrawlError::InvalidState(format!("enemy {id} is not on the roster"))
            })?;

        self.step_turn();

        let enemy = &mut self.enemies[index];
        let was_standing = !enemy.is_defeated();
        for amount in enemy.tick_dots() {
            self.events.push(GameEvent::DamageDealt {
                target: Participant::Enemy(id),
                amount,
                critical: false,
                over_time: true,
            });
        }
        if was_standing && enemy.is_defeated() {
            self.events.push(GameEvent::EnemyFell { enemy: id });
        }

        // An enemy left at exactly zero still gets its action
        if enemy.health < 0.0 {
            return Ok(TurnResolution::Complete);
        }

        let action = EnemyAction::choose(&enemy.action_chances, ctx.rng.gen::<f64>());
        log::debug!("{} ({id}) chose {:?}", enemy.name, action);

        let resolution = match action {
            EnemyAction::Melee | EnemyAction::Ranged | EnemyAction::Magic => {
                self.enemy_attack(index, action, ctx);
                TurnResolution::AwaitAnimation
            }
            EnemyAction::Heal => {
                self.enemy_heal(index, ctx);
                TurnResolution::Complete
            }
            EnemyAction::Buff => {
                self.enemy_buff(index, ctx);
                TurnResolution::Complete
            }
        };
        Ok(resolution)
    }

    /// Melee, ranged and magic attacks resolve identically; only the
    /// animation differs.
    fn enemy_attack<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        action: EnemyAction,
        ctx: &mut CombatContext<'_, R>,
    ) {
        let enemy = &self.enemies[index];
        let critical = ctx.rng.gen::<f64>() < enemy.crit_rate;
        let amount = if critical {
            enemy.damage * enemy.crit_damage
        } else {
            enemy.damage
        };

        ctx.player.take_damage(amount);
        ctx.player
            .add_dot(enemy.damage * enemy.dot_damage, enemy.dot_turns);

        let pending = PendingAnimation {
            actor: Participant::Enemy(enemy.id),
            animation: action.animation(),
        };
        self.events.push(GameEvent::DamageDealt {
            target: Participant::Player,
            amount,
            critical,
            over_time: false,
        });
        self.events.push(GameEvent::AnimationStarted {
            actor: pending.actor,
            animation: pending.animation,
        });
        self.pending = Some(pending);
    }

    /// Heals a random ally, possibly the healer itself. Health never rises
    /// above max, and a heal never lowers it.
    fn enemy_heal<R: Rng + ?Sized>(&mut self, healer: usize, ctx: &mut CombatContext<'_, R>) {
        let target = ctx.rng.gen_range(0..self.enemies.len());
        let heal_amount = self.enemies[healer].heal_amount;
        let healer_id = self.enemies[healer].id;

        let ally = &mut self.enemies[target];
        let before = ally.health;
        let ceiling = ally.max_health.max(before);
        ally.health = (before + heal_amount).min(ceiling);

        self.events.push(GameEvent::EnemyHealed {
            healer: healer_id,
            target: ally.id,
            amount: ally.health - before,
        });
    }

    /// Multiplies a random ally's damage. Buffs stack without limit.
    fn enemy_buff<R: Rng + ?Sized>(&mut self, buffer: usize, ctx: &mut CombatContext<'_, R>) {
        let target = ctx.rng.gen_range(0..self.enemies.len());
        let buffer_id = self.enemies[buffer].id;
        let buffer_name = self.enemies[buffer].name.clone();

        let ally = &mut self.enemies[target];
        ally.damage *= config::BUFF_MULTIPLIER;

        self.events
            .push(GameEvent::info(format!("{buffer_name} buffed {}", ally.name)));
        self.events.push(GameEvent::EnemyBuffed {
            buffer: buffer_id,
            target: ally.id,
            damage: ally.damage,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cave, CaveCategory, CombatStatus, Enemy, Player, Position, Weapon};
    use crate::settings::{EnemyTemplate, PlayerConfig};
    use rand::rngs::mock::StepRng;

    fn template(chances: ActionChances) -> EnemyTemplate {
        EnemyTemplate {
            health: 40.0,
            max_health: 40.0,
            damage: 10.0,
            crit_rate: 0.0,
            crit_damage: 2.0,
            dot_turns: 2,
            dot_damage: 0.5,
            heal_amount: 15.0,
            coins: 5,
            chances,
        }
    }

    fn heal_only() -> ActionChances {
        ActionChances {
            melee: 0.0,
            ranged: 0.0,
            magic: 0.0,
            heal: 1.0,
        }
    }

    fn buff_only() -> ActionChances {
        ActionChances {
            melee: 0.0,
            ranged: 0.0,
            magic: 0.0,
            heal: 0.0,
        }
    }

    fn hero() -> Player {
        let weapon = Weapon {
            name: "Apprentice Wand".to_string(),
            kind: WeaponKind::Wand,
            damage: 4.0,
            crit_rate: 1.0,
            crit_damage: 1.5,
            dot_turns: 3,
            dot_damage: 0.5,
            rarity: 3,
        };
        let config = PlayerConfig {
            max_health: 100.0,
            health: 100.0,
            coins: 0,
        };
        Player::new(Position::origin(), &config, weapon)
    }

    /// A session with the enemy roster in place and the index on the given
    /// enemy, ready for `resolve_enemy_turn`.
    fn session_for(enemies: Vec<Enemy>, player: &mut Player, cave: &mut Cave) -> CombatSession {
        cave.enemies = enemies;
        let mut rng = StepRng::new(0, 0);
        let mut ctx = CombatContext {
            player,
            cave,
            rng: &mut rng,
        };
        let mut session = CombatSession::start(Position::origin(), &mut ctx);
        session.status = CombatStatus::InProgress;
        session
    }

    fn fight_cave() -> Cave {
        Cave {
            category: CaveCategory::Fight,
            reward: 20,
            enemies: Vec::new(),
        }
    }

    #[test]
    fn test_choose_follows_threshold_order() {
        let chances = ActionChances {
            melee: 0.25,
            ranged: 0.5,
            magic: 0.75,
            heal: 0.9,
        };
        assert_eq!(EnemyAction::choose(&chances, 0.0), EnemyAction::Melee);
        assert_eq!(EnemyAction::choose(&chances, 0.25), EnemyAction::Ranged);
        assert_eq!(EnemyAction::choose(&chances, 0.6), EnemyAction::Magic);
        assert_eq!(EnemyAction::choose(&chances, 0.8), EnemyAction::Heal);
        assert_eq!(EnemyAction::choose(&chances, 0.99), EnemyAction::Buff);
        assert_eq!(EnemyAction::choose(&buff_only(), 0.0), EnemyAction::Buff);
    }

    #[test]
    fn test_heal_at_max_health_is_noop() {
        let enemy = Enemy::from_template("Orc Mage", &template(heal_only()), crate::game::new_enemy_id());
        let id = enemy.id;
        let mut player = hero();
        let mut cave = fight_cave();
        let mut session = session_for(vec![enemy], &mut player, &mut cave);

        let mut rng = StepRng::new(0, 0);
        let mut ctx = CombatContext {
            player: &mut player,
            cave: &mut cave,
            rng: &mut rng,
        };
        let resolution = session.resolve_enemy_turn(id, &mut ctx).unwrap();
        assert_eq!(resolution, TurnResolution::Complete);
        assert_eq!(session.enemies()[0].health, 40.0);
        assert!(session.pending_animation().is_none());
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut enemy = Enemy::from_template("Orc Mage", &template(heal_only()), crate::game::new_enemy_id());
        enemy.health = 30.0;
        let id = enemy.id;
        let mut player = hero();
        let mut cave = fight_cave();
        let mut session = session_for(vec![enemy], &mut player, &mut cave);

        let mut rng = StepRng::new(0, 0);
        let mut ctx = CombatContext {
            player: &mut player,
            cave: &mut cave,
            rng: &mut rng,
        };
        session.resolve_enemy_turn(id, &mut ctx).unwrap();
        assert_eq!(session.enemies()[0].health, 40.0);
        assert!(session.drain_events().contains(&GameEvent::EnemyHealed {
            healer: id,
            target: id,
            amount: 10.0,
        }));
    }

    #[test]
    fn test_buff_stacks_without_cap() {
        let enemy = Enemy::from_template("Orc Leader", &template(buff_only()), crate::game::new_enemy_id());
        let id = enemy.id;
        let mut player = hero();
        let mut cave = fight_cave();
        let mut session = session_for(vec![enemy], &mut player, &mut cave);

        let mut rng = StepRng::new(0, 0);
        let mut ctx = CombatContext {
            player: &mut player,
            cave: &mut cave,
            rng: &mut rng,
        };
        for _ in 0..3 {
            session.resolve_enemy_turn(id, &mut ctx).unwrap();
        }
        let expected = 10.0 * config::BUFF_MULTIPLIER.powi(3);
        assert!((session.enemies()[0].damage - expected).abs() < 1e-9);
        let messages: Vec<String> = session
            .drain_events()
            .iter()
            .filter_map(|event| event.message_text().map(str::to_string))
            .collect();
        assert!(messages.contains(&"Orc Leader buffed Orc Leader".to_string()));
    }

    #[test]
    fn test_enemy_attack_applies_damage_and_dot() {
        let enemy = Enemy::from_template(
            "Orc Soldier",
            &template(ActionChances::always_melee()),
            crate::game::new_enemy_id(),
        );
        let id = enemy.id;
        let mut player = hero();
        let mut cave = fight_cave();
        let mut session = session_for(vec![enemy], &mut player, &mut cave);

        let mut rng = StepRng::new(0, 0);
        let mut ctx = CombatContext {
            player: &mut player,
            cave: &mut cave,
            rng: &mut rng,
        };
        let resolution = session.resolve_enemy_turn(id, &mut ctx).unwrap();
        assert_eq!(resolution, TurnResolution::AwaitAnimation);
        assert_eq!(ctx.player.health, 90.0);
        assert_eq!(ctx.player.dots, vec![crate::game::DotStack::new(5.0, 2)]);
        assert_eq!(
            session.pending_animation(),
            Some(PendingAnimation {
                actor: Participant::Enemy(id),
                animation: Animation::Sword,
            })
        );
    }

    #[test]
    fn test_enemy_killed_by_dot_skips_action() {
        let mut enemy = Enemy::from_template(
            "Orc Grunt",
            &template(ActionChances::always_melee()),
            crate::game::new_enemy_id(),
        );
        enemy.health = 3.0;
        enemy.add_dot(5.0, 1);
        let id = enemy.id;
        let mut player = hero();
        let mut cave = fight_cave();
        let mut session = session_for(vec![enemy], &mut player, &mut cave);

        let mut rng = StepRng::new(0, 0);
        let mut ctx = CombatContext {
            player: &mut player,
            cave: &mut cave,
            rng: &mut rng,
        };
        let resolution = session.resolve_enemy_turn(id, &mut ctx).unwrap();
        assert_eq!(resolution, TurnResolution::Complete);
        assert_eq!(ctx.player.health, 100.0);
        assert!(session.drain_events().contains(&GameEvent::EnemyFell { enemy: id }));
    }

    #[test]
    fn test_player_strike_crit_and_dot() {
        let enemy = Enemy::from_template(
            "Orc Grunt",
            &template(ActionChances::always_melee()),
            crate::game::new_enemy_id(),
        );
        let mut player = hero();
        let mut cave = fight_cave();
        let mut session = session_for(vec![enemy], &mut player, &mut cave);

        let mut rng = StepRng::new(0, 0);
        let mut ctx = CombatContext {
            player: &mut player,
            cave: &mut cave,
            rng: &mut rng,
        };
        session.strike_enemy(0, &mut ctx);
        // crit_rate 1.0 always crits: 4 × 1.5
        assert_eq!(session.enemies()[0].health, 34.0);
        assert_eq!(session.enemies()[0].dots, vec![crate::game::DotStack::new(2.0, 3)]);
        assert_eq!(
            session.pending_animation().map(|p| p.animation),
            Some(Animation::Wand)
        );
    }
}
