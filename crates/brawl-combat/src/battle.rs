//! Battle orchestration.
//!
//! A [`Battle`] owns both fighters, their inputs, the health/score ledger and
//! the round clock. Each [`Battle::tick`] runs one fixed step: inputs observe
//! the battle, the fighters update (player one first), then the round is
//! sequenced through knock-out, victory and time-over.

use std::sync::Arc;

use brawl_common::{Direction, PlayerSlot, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::combat::{BattleLedger, CombatListener, HitEvent, SoundCue};
use crate::config::BattleConfig;
use crate::events::{BattleEvent, EventBus};
use crate::fighter::{Fighter, FighterProfile, TickContext};
use crate::geometry::{FrameTime, FRAME_TIME_MS};
use crate::input::{InputProvider, Observation};
use crate::roster::{self, ProfileError};
use crate::stage::Arena;
use crate::state::FighterState;

/// Errors that can occur while setting up a battle.
#[derive(Debug, Error)]
pub enum BattleError {
    /// A fighter could not be loaded
    #[error("failed to load fighter for player {slot}: {source}")]
    Fighter {
        /// Slot being loaded
        slot: PlayerSlot,
        /// Underlying error
        #[source]
        source: ProfileError,
    },

    /// A fighter would start with its push box outside the stage
    #[error("player {slot} spawns outside the stage")]
    SpawnOutsideStage {
        /// Offending slot
        slot: PlayerSlot,
    },
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// One player won
    Winner(PlayerSlot),
    /// Time ran out with equal health
    Draw,
}

impl RoundOutcome {
    /// Winning slot, if any.
    #[must_use]
    pub const fn winner(self) -> Option<PlayerSlot> {
        match self {
            Self::Winner(slot) => Some(slot),
            Self::Draw => None,
        }
    }
}

/// Where the round is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Both fighters are in play
    Fighting,
    /// The loser is going down
    KnockOut {
        /// Fighter being knocked out
        loser: PlayerSlot,
    },
    /// The winner is celebrating
    Victory {
        /// Winner
        winner: PlayerSlot,
        /// When the winner was declared (milliseconds)
        since: f64,
    },
    /// Nothing more happens
    Over(RoundOutcome),
}

impl RoundPhase {
    /// Whether the round has finished.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        matches!(self, Self::Over(_))
    }
}

// ============================================================================
// Round clock
// ============================================================================

/// Countdown shown to the players.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundClock {
    remaining: u32,
    delay_ms: f64,
    last_count_ms: Option<f64>,
    frozen: bool,
}

impl RoundClock {
    /// Creates a clock with `counts` counts of `delay_ms` each.
    #[must_use]
    pub const fn new(counts: u32, delay_ms: f64) -> Self {
        Self {
            remaining: counts,
            delay_ms,
            last_count_ms: None,
            frozen: false,
        }
    }

    /// Counts left.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether the clock has stopped for good.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Stop counting.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Advance to `now`. Returns the new count when one elapsed.
    ///
    /// The clock starts on its first update and freezes itself at zero.
    pub fn update(&mut self, now: f64) -> Option<u32> {
        if self.frozen || self.remaining == 0 {
            return None;
        }
        let Some(last) = self.last_count_ms else {
            self.last_count_ms = Some(now);
            return None;
        };
        if now <= last + self.delay_ms {
            return None;
        }

        self.last_count_ms = Some(now);
        self.remaining -= 1;
        if self.remaining == 0 {
            self.frozen = true;
        }
        Some(self.remaining)
    }
}

// ============================================================================
// Listener
// ============================================================================

/// Forwards combat callbacks to the ledger and the event bus.
struct RoundListener<'a> {
    ledger: &'a mut BattleLedger,
    events: &'a EventBus,
    scoring: bool,
    hit: bool,
}

impl CombatListener for RoundListener<'_> {
    fn on_attack_hit(&mut self, event: &HitEvent) {
        self.hit = true;
        if self.scoring {
            self.ledger.apply_hit(event);
        }
        self.events.publish(BattleEvent::Hit(*event));
    }

    fn on_sound_cue(&mut self, slot: PlayerSlot, cue: SoundCue) {
        self.events.publish(BattleEvent::Sound { slot, cue });
    }
}

// ============================================================================
// Battle
// ============================================================================

/// One round between two fighters.
pub struct Battle {
    config: BattleConfig,
    arena: Arena,
    fighters: [Fighter; 2],
    inputs: [Box<dyn InputProvider>; 2],
    ledger: BattleLedger,
    clock: RoundClock,
    phase: RoundPhase,
    hit_stop_until: f64,
    rng: fastrand::Rng,
    events: EventBus,
}

impl std::fmt::Debug for Battle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battle")
            .field("arena", &self.arena)
            .field("fighters", &self.fighters)
            .field("ledger", &self.ledger)
            .field("clock", &self.clock)
            .field("phase", &self.phase)
            .field("hit_stop_until", &self.hit_stop_until)
            .finish_non_exhaustive()
    }
}

impl Battle {
    /// Sets up a round. Player one spawns facing right, player two facing left.
    pub fn new(
        config: BattleConfig,
        profiles: [Arc<FighterProfile>; 2],
        inputs: [Box<dyn InputProvider>; 2],
    ) -> Result<Self, BattleError> {
        let arena = config.arena();
        let [spawn_one, spawn_two] = config.spawns();
        let [profile_one, profile_two] = profiles;
        let fighters = [
            Fighter::new(PlayerSlot::One, profile_one, spawn_one, Direction::Right),
            Fighter::new(PlayerSlot::Two, profile_two, spawn_two, Direction::Left),
        ];
        for fighter in &fighters {
            if !arena.viewport.contains_rect(&fighter.push_box()) {
                return Err(BattleError::SpawnOutsideStage {
                    slot: fighter.slot(),
                });
            }
        }

        let ledger = BattleLedger::new(
            [fighters[0].name(), fighters[1].name()],
            config.max_hit_points,
        );
        let rng = config
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

        info!(
            one = fighters[0].name(),
            two = fighters[1].name(),
            "Round start"
        );

        Ok(Self {
            arena,
            fighters,
            inputs,
            ledger,
            clock: RoundClock::new(config.round_time, config.clock_delay_ms),
            phase: RoundPhase::Fighting,
            hit_stop_until: 0.0,
            rng,
            events: EventBus::new(config.event_capacity),
            config,
        })
    }

    /// Sets up a round with the fighters named in the configuration.
    pub fn from_config(
        config: BattleConfig,
        inputs: [Box<dyn InputProvider>; 2],
    ) -> Result<Self, BattleError> {
        let load = |slot: PlayerSlot| {
            roster::resolve(&config.fighters[slot.index()])
                .map_err(|source| BattleError::Fighter { slot, source })
        };
        let profiles = [load(PlayerSlot::One)?, load(PlayerSlot::Two)?];
        Self::new(config, profiles, inputs)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Round phase.
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Health and score.
    #[must_use]
    pub fn ledger(&self) -> &BattleLedger {
        &self.ledger
    }

    /// Fighter in `slot`.
    #[must_use]
    pub fn fighter(&self, slot: PlayerSlot) -> &Fighter {
        &self.fighters[slot.index()]
    }

    /// Mutable fighter in `slot`, for hosts that script positions.
    pub fn fighter_mut(&mut self, slot: PlayerSlot) -> &mut Fighter {
        &mut self.fighters[slot.index()]
    }

    /// Round clock.
    #[must_use]
    pub fn clock(&self) -> &RoundClock {
        &self.clock
    }

    /// Event bus the battle publishes to.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Stage bounds.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Move the play area (camera scroll).
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.arena.viewport = viewport;
    }

    /// Whether fighters are frozen by a recent hit at `now`.
    #[must_use]
    pub fn in_hit_stop(&self, now: f64) -> bool {
        now < self.hit_stop_until
    }

    /// Configuration the battle was built with.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance one fixed step.
    pub fn tick(&mut self, time: FrameTime) {
        if self.phase.is_over() {
            return;
        }

        self.prepare_inputs(time);

        let before = [self.fighters[0].state(), self.fighters[1].state()];
        if self.in_hit_stop(time.previous) {
            for fighter in &mut self.fighters {
                fighter.update_hurt_shake(time, self.hit_stop_until);
            }
        } else {
            self.update_fighters(time);
        }

        self.update_round(time);

        for (fighter, previous) in self.fighters.iter().zip(before) {
            if fighter.state() != previous {
                self.events.publish(BattleEvent::StateChanged {
                    slot: fighter.slot(),
                    state: fighter.state(),
                });
            }
        }
    }

    fn prepare_inputs(&mut self, time: FrameTime) {
        for slot in PlayerSlot::ALL {
            let observation = self.observe(slot);
            self.inputs[slot.index()].prepare(&observation, time);
        }
    }

    /// What `slot` can see of the battle.
    #[must_use]
    pub fn observe(&self, slot: PlayerSlot) -> Observation {
        let me = &self.fighters[slot.index()];
        let them = &self.fighters[slot.opponent().index()];
        Observation {
            slot,
            position: me.position(),
            opponent_position: them.position(),
            state: me.state(),
            opponent_state: them.state(),
            direction: me.direction(),
            hit_points: self.ledger.hit_points(slot),
            opponent_hit_points: self.ledger.hit_points(slot.opponent()),
            time_remaining: self.clock.remaining(),
        }
    }

    fn update_fighters(&mut self, time: FrameTime) {
        let mut listener = RoundListener {
            ledger: &mut self.ledger,
            events: &self.events,
            scoring: self.phase == RoundPhase::Fighting,
            hit: false,
        };
        let [one, two] = &mut self.fighters;
        let [input_one, input_two] = &mut self.inputs;

        let mut ctx = TickContext {
            time,
            arena: &self.arena,
            input: &mut **input_one,
            listener: &mut listener,
            rng: &mut self.rng,
        };
        one.update(two, &mut ctx);

        let mut ctx = TickContext {
            time,
            arena: &self.arena,
            input: &mut **input_two,
            listener: &mut listener,
            rng: &mut self.rng,
        };
        two.update(one, &mut ctx);

        if listener.hit {
            self.hit_stop_until =
                time.previous + f64::from(self.config.hit_stop_frames) * FRAME_TIME_MS;
        }
    }

    fn update_round(&mut self, time: FrameTime) {
        match self.phase {
            RoundPhase::Fighting => {
                if let Some(loser) = PlayerSlot::ALL
                    .into_iter()
                    .find(|&slot| self.ledger.is_depleted(slot))
                {
                    self.knock_out(loser);
                } else if let Some(remaining) = self.clock.update(time.previous) {
                    self.events.publish(BattleEvent::ClockTick { remaining });
                    if remaining == 0 {
                        self.time_over();
                    }
                }
            },
            RoundPhase::KnockOut { .. } | RoundPhase::Victory { .. } | RoundPhase::Over(_) => {},
        }

        match self.phase {
            RoundPhase::KnockOut { loser } => {
                let fighter = &mut self.fighters[loser.index()];
                if fighter.state() != FighterState::Ko {
                    fighter.change_state(FighterState::Ko);
                } else if fighter.ko_complete() {
                    self.declare_winner(loser.opponent(), time);
                }
            },
            RoundPhase::Victory { winner, since } => {
                let fighter = &mut self.fighters[winner.index()];
                if fighter.state() != FighterState::Victory {
                    fighter.change_state(FighterState::Victory);
                }
                if time.previous - since >= self.config.victory_hold_ms {
                    self.finish(RoundOutcome::Winner(winner));
                }
            },
            RoundPhase::Fighting | RoundPhase::Over(_) => {},
        }
    }

    fn knock_out(&mut self, loser: PlayerSlot) {
        info!(loser = %loser, "Knock out");
        self.clock.freeze();
        self.phase = RoundPhase::KnockOut { loser };
        self.events.publish(BattleEvent::KnockOut { loser });
    }

    fn declare_winner(&mut self, winner: PlayerSlot, time: FrameTime) {
        info!(winner = %winner, "Victory");
        let fighter = &mut self.fighters[winner.index()];
        fighter.set_victory(true);
        fighter.change_state(FighterState::Victory);
        self.phase = RoundPhase::Victory {
            winner,
            since: time.previous,
        };
        self.events.publish(BattleEvent::Victory { winner });
    }

    fn time_over(&mut self) {
        info!("Time over");
        self.events.publish(BattleEvent::TimeOver);

        for fighter in &mut self.fighters {
            fighter.change_state(FighterState::Idle);
            fighter.freeze();
            fighter.set_controls_enabled(false);
        }

        let one = self.ledger.hit_points(PlayerSlot::One);
        let two = self.ledger.hit_points(PlayerSlot::Two);
        match one.cmp(&two) {
            std::cmp::Ordering::Greater => self.knock_out(PlayerSlot::Two),
            std::cmp::Ordering::Less => self.knock_out(PlayerSlot::One),
            std::cmp::Ordering::Equal => self.finish(RoundOutcome::Draw),
        }
    }

    fn finish(&mut self, outcome: RoundOutcome) {
        info!(?outcome, "Round over");
        self.phase = RoundPhase::Over(outcome);
        self.events.publish(BattleEvent::RoundOver {
            winner: outcome.winner(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Action, DecisionInput, NoInput};
    use brawl_common::Vec2;

    fn config() -> BattleConfig {
        BattleConfig {
            seed: Some(3),
            spawn_one_x: 600.0,
            spawn_two_x: 640.0,
            max_hit_points: 10,
            victory_hold_ms: 1000.0,
            ..BattleConfig::default()
        }
    }

    fn puncher() -> Box<dyn InputProvider> {
        Box::new(DecisionInput::new(
            |_: &Observation| Action::HeavyPunch,
            100.0,
        ))
    }

    fn run(battle: &mut Battle, ticks: std::ops::Range<u64>) {
        for tick in ticks {
            battle.tick(FrameTime::fixed_step(tick));
        }
    }

    #[test]
    fn test_new_battle() {
        let battle = Battle::from_config(BattleConfig::default(), [Box::new(NoInput), Box::new(NoInput)])
            .expect("battle");
        assert_eq!(battle.phase(), RoundPhase::Fighting);
        assert_eq!(battle.fighter(PlayerSlot::One).direction(), Direction::Right);
        assert_eq!(battle.fighter(PlayerSlot::Two).direction(), Direction::Left);
        assert_eq!(battle.fighter(PlayerSlot::Two).position(), Vec2::new(720.0, 220.0));
        assert_eq!(battle.ledger().hit_points(PlayerSlot::One), 144);
        assert_eq!(battle.clock().remaining(), 99);
    }

    #[test]
    fn test_unknown_fighter() {
        let mut config = BattleConfig::default();
        config.fighters[1] = "guile".to_string();
        let err = Battle::from_config(config, [Box::new(NoInput), Box::new(NoInput)]).unwrap_err();
        assert!(matches!(
            err,
            BattleError::Fighter {
                slot: PlayerSlot::Two,
                ..
            }
        ));
    }

    #[test]
    fn test_spawn_outside_stage() {
        let mut config = BattleConfig::default();
        config.spawn_one_x = config.viewport_x;
        let err = Battle::from_config(config, [Box::new(NoInput), Box::new(NoInput)]).unwrap_err();
        assert!(matches!(
            err,
            BattleError::SpawnOutsideStage {
                slot: PlayerSlot::One
            }
        ));
    }

    #[test]
    fn test_clock_counts_and_freezes() {
        let mut clock = RoundClock::new(2, 100.0);
        assert_eq!(clock.update(0.0), None);
        assert_eq!(clock.update(100.0), None);
        assert_eq!(clock.update(101.0), Some(1));
        assert_eq!(clock.update(150.0), None);
        assert_eq!(clock.update(202.0), Some(0));
        assert!(clock.is_frozen());
        assert_eq!(clock.update(1000.0), None);
    }

    #[test]
    fn test_hit_starts_hit_stop() {
        let mut battle = Battle::from_config(
            BattleConfig {
                max_hit_points: 144,
                ..config()
            },
            [puncher(), Box::new(NoInput)],
        )
        .expect("battle");

        let mut tick = 1;
        while battle.ledger().hit_points(PlayerSlot::Two) == 144 {
            battle.tick(FrameTime::fixed_step(tick));
            tick += 1;
            assert!(tick < 120, "no hit landed");
        }
        assert_eq!(battle.ledger().hit_points(PlayerSlot::Two), 116);
        assert_eq!(battle.ledger().score(PlayerSlot::One), 500);

        let now = FrameTime::fixed_step(tick);
        assert!(battle.in_hit_stop(now.previous));
        let frozen = battle.fighter(PlayerSlot::Two).position();
        let state = battle.fighter(PlayerSlot::Two).state();
        battle.tick(now);
        assert_eq!(battle.fighter(PlayerSlot::Two).position(), frozen);
        assert_eq!(battle.fighter(PlayerSlot::Two).state(), state);

        let events = battle.events().drain();
        assert!(events.iter().any(|event| matches!(event, BattleEvent::Hit(hit) if hit.attacker == PlayerSlot::One)));
    }

    #[test]
    fn test_knock_out_to_victory() {
        let mut battle =
            Battle::from_config(config(), [puncher(), Box::new(NoInput)]).expect("battle");

        let mut tick = 1;
        while !matches!(battle.phase(), RoundPhase::Victory { .. }) {
            battle.tick(FrameTime::fixed_step(tick));
            tick += 1;
            assert!(tick < 600, "stuck in {:?}", battle.phase());
        }
        assert_eq!(battle.ledger().hit_points(PlayerSlot::Two), 0);
        assert!(battle.fighter(PlayerSlot::Two).ko_complete());
        assert!(battle.fighter(PlayerSlot::One).victory());
        assert!(battle.clock().is_frozen());

        run(&mut battle, tick..tick + 120);
        assert_eq!(battle.fighter(PlayerSlot::One).state(), FighterState::Victory);
        assert!(battle.phase().is_over());
        assert_eq!(
            battle.phase(),
            RoundPhase::Over(RoundOutcome::Winner(PlayerSlot::One))
        );

        let events = battle.events().drain();
        let milestones: Vec<_> = events
            .into_iter()
            .filter(|event| {
                matches!(
                    event,
                    BattleEvent::KnockOut { .. }
                        | BattleEvent::Victory { .. }
                        | BattleEvent::RoundOver { .. }
                )
            })
            .collect();
        assert_eq!(
            milestones,
            vec![
                BattleEvent::KnockOut {
                    loser: PlayerSlot::Two
                },
                BattleEvent::Victory {
                    winner: PlayerSlot::One
                },
                BattleEvent::RoundOver {
                    winner: Some(PlayerSlot::One)
                },
            ]
        );
    }

    #[test]
    fn test_time_over_draw() {
        let config = BattleConfig {
            round_time: 2,
            clock_delay_ms: 100.0,
            ..BattleConfig::default()
        };
        let mut battle =
            Battle::from_config(config, [Box::new(NoInput), Box::new(NoInput)]).expect("battle");
        run(&mut battle, 1..30);

        assert_eq!(battle.phase(), RoundPhase::Over(RoundOutcome::Draw));
        for slot in PlayerSlot::ALL {
            let fighter = battle.fighter(slot);
            assert_eq!(fighter.state(), FighterState::Idle);
            assert!(!fighter.controls_enabled());
        }
        let events = battle.events().drain();
        assert!(events.contains(&BattleEvent::TimeOver));
        assert!(events.contains(&BattleEvent::ClockTick { remaining: 0 }));
        assert!(events.contains(&BattleEvent::RoundOver { winner: None }));
    }

    #[test]
    fn test_time_over_with_health_lead() {
        let config = BattleConfig {
            round_time: 3,
            clock_delay_ms: 200.0,
            max_hit_points: 144,
            ..config()
        };
        let mut battle = Battle::from_config(config, [puncher(), Box::new(NoInput)]).expect("battle");

        let mut tick = 1;
        while battle.phase() == RoundPhase::Fighting {
            battle.tick(FrameTime::fixed_step(tick));
            tick += 1;
            assert!(tick < 120);
        }
        assert!(battle.ledger().hit_points(PlayerSlot::Two) < 144);
        assert_eq!(
            battle.phase(),
            RoundPhase::KnockOut {
                loser: PlayerSlot::Two
            }
        );
        run(&mut battle, tick..tick + 600);
        assert_eq!(
            battle.phase(),
            RoundPhase::Over(RoundOutcome::Winner(PlayerSlot::One))
        );
    }

    #[test]
    fn test_over_battle_ignores_ticks() {
        let config = BattleConfig {
            round_time: 1,
            clock_delay_ms: 16.0,
            ..BattleConfig::default()
        };
        let mut battle =
            Battle::from_config(config, [Box::new(NoInput), Box::new(NoInput)]).expect("battle");
        run(&mut battle, 1..10);
        assert!(battle.phase().is_over());
        battle.events().drain();

        run(&mut battle, 10..20);
        assert_eq!(battle.events().pending_count(), 0);
    }

    #[test]
    fn test_set_viewport() {
        let mut battle =
            Battle::from_config(BattleConfig::default(), [Box::new(NoInput), Box::new(NoInput)])
                .expect("battle");
        let viewport = Rect::new(500.0, 16.0, 384.0, 224.0);
        battle.set_viewport(viewport);
        assert_eq!(battle.arena().viewport, viewport);
    }
}
