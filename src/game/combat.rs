//! # Combat
//!
//! The turn sequencer for a single fight: a rotating turn order over the
//! player and the enemies of one cave.
//!
//! A session owns the cave's roster for its lifetime. Every completed action
//! ends in [`CombatSession::advance`], which prunes defeated enemies, checks
//! for terminal conditions and dispatches the next turn. Attacks leave an
//! animation pending; the presentation reports it finished through
//! [`CombatSession::finish_animation`], which is the only way the sequence
//! resumes after an attack.

use crate::game::{
    Animation, Cave, CaveCategory, Combatant, Enemy, EnemyId, GameEvent, Player, Position,
};
use crate::{CrawlError, CrawlResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A slot in the turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Participant {
    Player,
    Enemy(EnemyId),
}

/// Lifecycle of a combat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStatus {
    /// Created but not yet begun
    Idle,
    InProgress,
    /// The boss cave was cleared
    Victory,
    /// The player died
    Defeat,
    /// The player left, or a regular cave was cleared
    Retreated,
}

impl CombatStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CombatStatus::Victory | CombatStatus::Defeat | CombatStatus::Retreated
        )
    }
}

/// An attack animation the sequence is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAnimation {
    pub actor: Participant,
    pub animation: Animation,
}

/// Mutable state outside the session that a turn touches.
pub struct CombatContext<'a, R: Rng + ?Sized> {
    pub player: &'a mut Player,
    /// The cave the fight takes place in
    pub cave: &'a mut Cave,
    pub rng: &'a mut R,
}

/// What an enemy turn left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnResolution {
    /// The turn finished; the sequence may continue right away
    Complete,
    /// An animation is pending; the sequence resumes on its completion
    AwaitAnimation,
}

/// A single fight between the player and one cave's enemies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatSession {
    pub(crate) turn_order: Vec<Participant>,
    pub(crate) turn_index: usize,
    pub(crate) current_turn: Participant,
    pub(crate) enemies: Vec<Enemy>,
    cave_position: Position,
    pub(crate) status: CombatStatus,
    pub(crate) pending: Option<PendingAnimation>,
    pub(crate) events: Vec<GameEvent>,
}

impl CombatSession {
    /// Takes the cave's roster and sets up the turn order.
    ///
    /// A heavy weapon lets the enemies act first (`[enemies.., player]`);
    /// otherwise the player opens (`[player, enemies..]`). The player is
    /// locked out of movement until the session closes.
    pub fn start<R: Rng + ?Sized>(
        cave_position: Position,
        ctx: &mut CombatContext<'_, R>,
    ) -> Self {
        let enemies = std::mem::take(&mut ctx.cave.enemies);
        let enemy_slots = enemies.iter().map(|enemy| Participant::Enemy(enemy.id));

        let turn_order: Vec<Participant> = if ctx.player.weapon().kind.is_heavy() {
            enemy_slots.chain(std::iter::once(Participant::Player)).collect()
        } else {
            std::iter::once(Participant::Player).chain(enemy_slots).collect()
        };

        ctx.player.can_move = false;
        ctx.player.in_combat = true;

        log::info!(
            "Combat started at {:?} against {} enemies",
            cave_position,
            enemies.len()
        );

        Self {
            current_turn: turn_order[0],
            turn_order,
            turn_index: 0,
            enemies,
            cave_position,
            status: CombatStatus::Idle,
            pending: None,
            events: vec![GameEvent::info("Press enemy to attack!")],
        }
    }

    /// Moves the session into progress and dispatches the first turn.
    pub fn begin<R: Rng + ?Sized>(&mut self, ctx: &mut CombatContext<'_, R>) -> CrawlResult<()> {
        if self.status != CombatStatus::Idle {
            log::debug!("Ignoring begin on a session in state {:?}", self.status);
            return Ok(());
        }
        self.status = CombatStatus::InProgress;
        self.advance(ctx)
    }

    /// Advances the sequence after a completed action.
    ///
    /// Enemy turns that finish without an animation are resolved in the same
    /// call; the loop stops at the player's turn, at a pending animation or
    /// at a terminal status.
    pub fn advance<R: Rng + ?Sized>(&mut self, ctx: &mut CombatContext<'_, R>) -> CrawlResult<()> {
        if self.status != CombatStatus::InProgress {
            log::debug!("Ignoring advance on a session in state {:?}", self.status);
            return Ok(());
        }

        loop {
            self.verify_roster()?;

            if ctx.player.is_defeated() {
                self.defeat();
                return Ok(());
            }

            self.prune_defeated(ctx.player);

            if self.enemies.is_empty() {
                self.conclude(ctx);
                return Ok(());
            }

            self.current_turn = self.turn_order[self.turn_index];
            match self.current_turn {
                Participant::Player => {
                    for amount in ctx.player.tick_dots() {
                        self.events.push(GameEvent::DamageDealt {
                            target: Participant::Player,
                            amount,
                            critical: false,
                            over_time: true,
                        });
                    }
                    if ctx.player.is_defeated() {
                        self.defeat();
                    }
                    return Ok(());
                }
                Participant::Enemy(id) => match self.resolve_enemy_turn(id, ctx)? {
                    TurnResolution::Complete => continue,
                    TurnResolution::AwaitAnimation => return Ok(()),
                },
            }
        }
    }

    /// Strikes `target` with the equipped weapon.
    ///
    /// Only accepted on the player's turn with no animation pending; anything
    /// else is ignored and returns false. The turn index moves on before the
    /// strike resolves, and a target knocked to zero stays on the roster
    /// until the next advance.
    pub fn player_attack<R: Rng + ?Sized>(
        &mut self,
        target: EnemyId,
        ctx: &mut CombatContext<'_, R>,
    ) -> bool {
        if !self.awaiting_player() {
            log::debug!("Ignoring out-of-turn attack on {target}");
            return false;
        }
        let Some(index) = self.enemies.iter().position(|enemy| enemy.id == target) else {
            log::debug!("Ignoring attack on unknown enemy {target}");
            return false;
        };

        self.step_turn();
        self.strike_enemy(index, ctx);
        true
    }

    /// Reports that the pending attack animation finished and resumes the
    /// sequence. Calls without a pending animation are ignored.
    pub fn finish_animation<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut CombatContext<'_, R>,
    ) -> CrawlResult<()> {
        match self.pending.take() {
            Some(_) => self.advance(ctx),
            None => {
                log::debug!("No animation pending, nothing to finish");
                Ok(())
            }
        }
    }

    /// Leaves the fight. Surviving enemies go back to the cave with their
    /// current health and DOT stacks. Ignored unless it is the player's turn.
    pub fn retreat<R: Rng + ?Sized>(&mut self, ctx: &mut CombatContext<'_, R>) -> bool {
        if !self.awaiting_player() {
            log::debug!("Ignoring out-of-turn retreat");
            return false;
        }
        self.status = CombatStatus::Retreated;
        self.close(ctx);
        log::info!("Player retreated from {:?}", self.cave_position);
        true
    }

    /// Passes the player's turn without attacking, e.g. after swapping
    /// weapons mid-fight. Ignored unless it is the player's turn.
    pub fn end_player_turn<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut CombatContext<'_, R>,
    ) -> CrawlResult<bool> {
        if !self.awaiting_player() {
            log::debug!("Ignoring out-of-turn pass");
            return Ok(false);
        }
        self.step_turn();
        self.advance(ctx)?;
        Ok(true)
    }

    pub fn status(&self) -> CombatStatus {
        self.status
    }

    /// The terminal status, or `None` while the fight is still running.
    pub fn outcome(&self) -> Option<CombatStatus> {
        self.status.is_terminal().then_some(self.status)
    }

    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the session is waiting for a player command.
    pub fn awaiting_player(&self) -> bool {
        self.status == CombatStatus::InProgress
            && self.current_turn == Participant::Player
            && self.pending.is_none()
    }

    pub fn current_turn(&self) -> Participant {
        self.current_turn
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn turn_order(&self) -> &[Participant] {
        &self.turn_order
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    /// Direct access to the live roster, for scripted encounters and tests.
    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn cave_position(&self) -> Position {
        self.cave_position
    }

    pub fn pending_animation(&self) -> Option<PendingAnimation> {
        self.pending
    }

    /// Takes all events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Moves the turn index to the next slot.
    pub(crate) fn step_turn(&mut self) {
        if self.turn_order.is_empty() {
            return;
        }
        self.turn_index = (self.turn_index + 1) % self.turn_order.len();
        self.current_turn = self.turn_order[self.turn_index];
    }

    /// Checks that the turn order and the roster describe the same fight.
    fn verify_roster(&self) -> CrawlResult<()> {
        let violation = if self.turn_index >= self.turn_order.len() {
            Some(format!(
                "turn index {} out of range for {} participants",
                self.turn_index,
                self.turn_order.len()
            ))
        } else if self
            .turn_order
            .iter()
            .filter(|p| **p == Participant::Player)
            .count()
            != 1
        {
            Some("turn order must hold the player exactly once".to_string())
        } else {
            let mut seen = HashSet::new();
            let duplicate = self.turn_order.iter().find(|p| !seen.insert(**p));
            let enemy_slots = self.turn_order.len() - 1;
            match duplicate {
                Some(participant) => Some(format!("{participant:?} appears twice in turn order")),
                None if enemy_slots != self.enemies.len() => Some(format!(
                    "turn order has {} enemy slots but {} enemies are alive",
                    enemy_slots,
                    self.enemies.len()
                )),
                None => self
                    .enemies
                    .iter()
                    .find(|enemy| !seen.contains(&Participant::Enemy(enemy.id)))
                    .map(|enemy| format!("enemy {} is missing from turn order", enemy.id)),
            }
        };

        match violation {
            Some(reason) => {
                log::error!("Combat roster invariant violated: {reason}");
                Err(CrawlError::InvalidState(reason))
            }
            None => Ok(()),
        }
    }

    /// Credits and removes every defeated enemy, rebasing the turn index
    /// onto the shrunk turn order.
    fn prune_defeated(&mut self, player: &mut Player) {
        let fallen: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|enemy| enemy.is_defeated())
            .map(|enemy| enemy.id)
            .collect();
        if fallen.is_empty() {
            return;
        }

        for id in &fallen {
            self.events.push(GameEvent::EnemyRemoved { enemy: *id });
        }

        let mut preceding = 0;
        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.is_defeated()) {
            if let Some(coins) = enemy.claim_bounty() {
                player.coins += coins;
                self.events.push(GameEvent::CoinsAwarded { amount: coins });
            }
            let slot = Participant::Enemy(enemy.id);
            if let Some(index) = self.turn_order.iter().position(|p| *p == slot) {
                if index < self.turn_index {
                    preceding += 1;
                }
            }
        }

        self.enemies.retain(|enemy| !enemy.is_defeated());
        self.turn_order
            .retain(|p| !matches!(p, Participant::Enemy(id) if fallen.contains(id)));
        self.turn_index = (self.turn_index - preceding) % self.turn_order.len();

        log::debug!(
            "Removed {} defeated enemies, {} remain, turn index {}",
            fallen.len(),
            self.enemies.len(),
            self.turn_index
        );
    }

    fn defeat(&mut self) {
        self.status = CombatStatus::Defeat;
        self.pending = None;
        self.events.push(GameEvent::AnimationStarted {
            actor: Participant::Player,
            animation: Animation::Death,
        });
        self.events.push(GameEvent::PlayerDied);
        self.events.push(GameEvent::CombatEnded {
            status: CombatStatus::Defeat,
        });
        log::info!("Player died in combat at {:?}", self.cave_position);
    }

    /// Pays out the cleared cave and ends the session.
    fn conclude<R: Rng + ?Sized>(&mut self, ctx: &mut CombatContext<'_, R>) {
        let boss = ctx.cave.category == CaveCategory::Boss;
        let reward = ctx.cave.reward;
        if reward > 0 {
            ctx.player.coins += reward;
            self.events.push(GameEvent::CoinsAwarded { amount: reward });
        }
        ctx.cave.neutralize();

        self.status = if boss {
            CombatStatus::Victory
        } else {
            CombatStatus::Retreated
        };
        self.close(ctx);
        log::info!(
            "Cave at {:?} cleared, session ended as {:?}",
            self.cave_position,
            self.status
        );
    }

    /// Hands the survivors back to the cave and releases the player.
    fn close<R: Rng + ?Sized>(&mut self, ctx: &mut CombatContext<'_, R>) {
        ctx.player.dots.clear();
        ctx.player.can_move = true;
        ctx.player.in_combat = false;
        ctx.cave.enemies = std::mem::take(&mut self.enemies);
        self.turn_order.retain(|p| *p == Participant::Player);
        self.turn_index = 0;
        self.current_turn = Participant::Player;
        self.pending = None;
        self.events.push(GameEvent::CombatEnded {
            status: self.status,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Weapon, WeaponKind};
    use crate::settings::{ActionChances, EnemyTemplate, PlayerConfig};
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grunt(health: f64) -> Enemy {
        let template = EnemyTemplate {
            health,
            max_health: health,
            damage: 2.0,
            crit_rate: 0.0,
            crit_damage: 1.0,
            dot_turns: 0,
            dot_damage: 0.0,
            heal_amount: 0.0,
            coins: 3,
            chances: ActionChances::always_melee(),
        };
        Enemy::from_template("Orc Grunt", &template, crate::game::new_enemy_id())
    }

    fn player(kind: WeaponKind, damage: f64) -> Player {
        let weapon = Weapon {
            name: "Test Weapon".to_string(),
            kind,
            damage,
            crit_rate: 0.0,
            crit_damage: 1.0,
            dot_turns: 0,
            dot_damage: 0.0,
            rarity: 3,
        };
        let config = PlayerConfig {
            max_health: 100.0,
            health: 100.0,
            coins: 0,
        };
        Player::new(Position::origin(), &config, weapon)
    }

    fn fight_cave(enemies: Vec<Enemy>) -> Cave {
        Cave {
            category: CaveCategory::Fight,
            reward: 20,
            enemies,
        }
    }

    #[test]
    fn test_turn_order_depends_on_weapon() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cave = fight_cave(vec![grunt(10.0), grunt(10.0)]);

        let mut bow_player = player(WeaponKind::Bow, 5.0);
        let mut ctx = CombatContext {
            player: &mut bow_player,
            cave: &mut cave,
            rng: &mut rng,
        };
        let session = CombatSession::start(Position::origin(), &mut ctx);
        assert_eq!(session.turn_order()[0], Participant::Player);
        assert!(ctx.cave.enemies.is_empty());
        assert!(!ctx.player.can_move);

        let mut cave = fight_cave(vec![grunt(10.0), grunt(10.0)]);
        let mut sword_player = player(WeaponKind::Sword, 5.0);
        let mut ctx = CombatContext {
            player: &mut sword_player,
            cave: &mut cave,
            rng: &mut rng,
        };
        let session = CombatSession::start(Position::origin(), &mut ctx);
        assert_eq!(session.turn_order().last(), Some(&Participant::Player));
        assert_eq!(session.turn_order().len(), 3);
    }

    #[test]
    fn test_rebase_after_consecutive_deaths_before_index() {
        let mut rng = StepRng::new(0, 0);
        let enemies = vec![grunt(10.0), grunt(10.0), grunt(10.0), grunt(10.0)];
        let survivor = enemies[2].id;
        let mut cave = fight_cave(enemies);
        let mut hero = player(WeaponKind::Sword, 5.0);
        let mut ctx = CombatContext {
            player: &mut hero,
            cave: &mut cave,
            rng: &mut rng,
        };
        let mut session = CombatSession::start(Position::origin(), &mut ctx);
        session.status = CombatStatus::InProgress;

        // [e0, e1, e2, e3, player]; e0 and e1 fall, e3 is also down, e2 is next
        session.turn_index = 2;
        session.enemies[0].health = 0.0;
        session.enemies[1].health = -4.0;
        session.enemies[3].health = 0.0;

        session.prune_defeated(ctx.player);
        assert_eq!(
            session.turn_order(),
            &[Participant::Enemy(survivor), Participant::Player]
        );
        assert_eq!(session.turn_index(), 0);
        assert_eq!(ctx.player.coins, 9);
    }

    #[test]
    fn test_rebase_wraps_when_last_slot_falls() {
        let mut rng = StepRng::new(0, 0);
        let mut cave = fight_cave(vec![grunt(10.0), grunt(10.0)]);
        let mut hero = player(WeaponKind::Bow, 5.0);
        let mut ctx = CombatContext {
            player: &mut hero,
            cave: &mut cave,
            rng: &mut rng,
        };
        let mut session = CombatSession::start(Position::origin(), &mut ctx);
        session.status = CombatStatus::InProgress;

        // [player, e0, e1] with e1 next and falling
        session.turn_index = 2;
        session.enemies[1].health = -1.0;
        session.prune_defeated(ctx.player);
        assert_eq!(session.turn_order().len(), 2);
        assert_eq!(session.turn_index(), 0);
        assert_eq!(session.turn_order()[session.turn_index()], Participant::Player);
    }

    #[test]
    fn test_invariant_violation_is_reported() {
        let mut rng = StepRng::new(0, 0);
        let mut cave = fight_cave(vec![grunt(10.0)]);
        let mut hero = player(WeaponKind::Bow, 5.0);
        let mut ctx = CombatContext {
            player: &mut hero,
            cave: &mut cave,
            rng: &mut rng,
        };
        let mut session = CombatSession::start(Position::origin(), &mut ctx);
        session.begin(&mut ctx).unwrap();

        session.turn_index = 7;
        assert!(matches!(
            session.advance(&mut ctx),
            Err(CrawlError::InvalidState(_))
        ));

        session.turn_index = 0;
        session.turn_order.push(Participant::Player);
        assert!(session.advance(&mut ctx).is_err());

        session.turn_order.pop();
        session.enemies.push(grunt(4.0));
        let err = session.advance(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("enemy slots"));
    }

    #[test]
    fn test_out_of_turn_actions_are_ignored() {
        let mut rng = StepRng::new(0, 0);
        let mut cave = fight_cave(vec![grunt(50.0)]);
        let target = cave.enemies[0].id;
        let mut hero = player(WeaponKind::Bow, 5.0);
        let mut ctx = CombatContext {
            player: &mut hero,
            cave: &mut cave,
            rng: &mut rng,
        };
        let mut session = CombatSession::start(Position::origin(), &mut ctx);

        // Not begun yet
        assert!(!session.player_attack(target, &mut ctx));

        session.begin(&mut ctx).unwrap();
        assert!(session.player_attack(target, &mut ctx));
        // Animation pending: a second attack and a retreat are both ignored
        assert!(!session.player_attack(target, &mut ctx));
        assert!(!session.retreat(&mut ctx));
        assert_eq!(session.enemies()[0].health, 45.0);
    }

    #[test]
    fn test_retreat_returns_survivors_to_cave() {
        let mut rng = StepRng::new(0, 0);
        let mut cave = fight_cave(vec![grunt(50.0), grunt(50.0)]);
        let target = cave.enemies[1].id;
        let mut hero = player(WeaponKind::Bow, 5.0);
        hero.add_dot(1.0, 3);
        let mut ctx = CombatContext {
            player: &mut hero,
            cave: &mut cave,
            rng: &mut rng,
        };
        let mut session = CombatSession::start(Position::origin(), &mut ctx);
        session.begin(&mut ctx).unwrap();
        assert!(session.player_attack(target, &mut ctx));
        session.finish_animation(&mut ctx).unwrap();
        // Both grunts swing; wait out both animations
        while !session.awaiting_player() {
            session.finish_animation(&mut ctx).unwrap();
        }

        assert!(session.retreat(&mut ctx));
        assert_eq!(session.outcome(), Some(CombatStatus::Retreated));
        assert_eq!(ctx.cave.enemies.len(), 2);
        assert_eq!(ctx.cave.enemies[1].health, 45.0);
        assert_eq!(ctx.cave.category, CaveCategory::Fight);
        assert!(ctx.player.can_move);
        assert!(ctx.player.dots.is_empty());
    }

    #[test]
    fn test_clearing_regular_cave_closes_session() {
        let mut rng = StepRng::new(0, 0);
        let mut cave = fight_cave(vec![grunt(5.0)]);
        let target = cave.enemies[0].id;
        let mut hero = player(WeaponKind::Wand, 5.0);
        let mut ctx = CombatContext {
            player: &mut hero,
            cave: &mut cave,
            rng: &mut rng,
        };
        let mut session = CombatSession::start(Position::origin(), &mut ctx);
        session.begin(&mut ctx).unwrap();
        assert!(session.player_attack(target, &mut ctx));
        session.finish_animation(&mut ctx).unwrap();

        assert_eq!(session.outcome(), Some(CombatStatus::Retreated));
        assert_eq!(ctx.player.coins, 3 + 20);
        assert_eq!(ctx.cave.category, CaveCategory::Empty);
        assert_eq!(ctx.cave.reward, 0);
        assert!(ctx.cave.enemies.is_empty());
        assert!(!ctx.player.in_combat);

        let events = session.drain_events();
        assert!(events.contains(&GameEvent::EnemyFell { enemy: target }));
        assert!(events.contains(&GameEvent::EnemyRemoved { enemy: target }));
    }

    #[test]
    fn test_player_dot_can_kill_on_own_turn() {
        let mut rng = StepRng::new(0, 0);
        let mut cave = fight_cave(vec![grunt(50.0)]);
        let mut hero = player(WeaponKind::Bow, 5.0);
        hero.health = 2.0;
        hero.add_dot(3.0, 1);
        let mut ctx = CombatContext {
            player: &mut hero,
            cave: &mut cave,
            rng: &mut rng,
        };
        let mut session = CombatSession::start(Position::origin(), &mut ctx);
        session.begin(&mut ctx).unwrap();
        assert_eq!(session.status(), CombatStatus::Defeat);
        assert!(session.drain_events().contains(&GameEvent::PlayerDied));
    }

    #[test]
    fn test_finish_animation_without_pending_is_ignored() {
        let mut rng = StepRng::new(0, 0);
        let mut cave = fight_cave(vec![grunt(50.0)]);
        let mut hero = player(WeaponKind::Bow, 5.0);
        let mut ctx = CombatContext {
            player: &mut hero,
            cave: &mut cave,
            rng: &mut rng,
        };
        let mut session = CombatSession::start(Position::origin(), &mut ctx);
        session.begin(&mut ctx).unwrap();
        let index = session.turn_index();
        session.finish_animation(&mut ctx).unwrap();
        assert_eq!(session.turn_index(), index);
        assert!(session.awaiting_player());
    }
}
