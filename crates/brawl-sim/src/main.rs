//! # Brawl Sim
//!
//! Headless battle runner. Loads a `BattleConfig` (first argument, default
//! `brawl.toml`), drives both fighters with computer players or a keyboard
//! replay at a fixed 60 Hz step and prints a JSON summary of the round.
//!
//! ```text
//! brawl-sim [CONFIG] [heuristic|random|script REPLAY]
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod ai;
mod replay;

use anyhow::Result;
use brawl_combat::prelude::*;
use brawl_common::PlayerSlot;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::ai::{HeuristicPlayer, RandomPlayer};
use crate::replay::{script_inputs, KeyScript};

/// Hard stop for a round that never ends.
const MAX_TICKS: u64 = 60 * 60 * 10;

/// What the runner prints when the round is done.
#[derive(Debug, Serialize)]
struct Summary {
    fighters: [String; 2],
    outcome: Option<RoundOutcome>,
    ticks: u64,
    hit_points: [i32; 2],
    scores: [u32; 2],
    hits: [u32; 2],
    time_remaining: u32,
}

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("brawl=info".parse()?))
        .init();

    info!("Brawl sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "brawl.toml".to_string());
    let players = args.next().unwrap_or_else(|| "heuristic".to_string());

    let config = BattleConfig::load_from(&path);
    let seed = config.seed.unwrap_or_else(|| fastrand::u64(..));
    let interval = config.decision_interval_ms;

    let inputs = match players.as_str() {
        "heuristic" => heuristic_inputs(seed, interval),
        "random" => random_inputs(seed, interval),
        "script" => {
            let Some(replay) = args.next() else {
                anyhow::bail!("'script' needs a replay file");
            };
            script_inputs(KeyScript::load(replay)?)
        },
        other => {
            anyhow::bail!("unknown player kind '{other}' (expected heuristic, random or script)")
        },
    };
    info!(seed, players = %players, "Fighters ready");
    let mut battle = Battle::from_config(config, inputs)?;

    let summary = run(&mut battle);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!("Brawl sim finished");
    Ok(())
}

/// Step the battle until the round is over.
fn run(battle: &mut Battle) -> Summary {
    let mut hits = [0u32; 2];
    let mut ticks = 0;

    while ticks < MAX_TICKS && !battle.phase().is_over() {
        ticks += 1;
        battle.tick(FrameTime::fixed_step(ticks));

        for event in battle.events().drain() {
            match &event {
                BattleEvent::Hit(hit) => {
                    hits[hit.attacker.index()] += 1;
                    debug!(
                        attacker = %hit.attacker,
                        location = ?hit.location,
                        strength = ?hit.strength,
                        "hit"
                    );
                },
                BattleEvent::StateChanged { .. } | BattleEvent::Sound { .. } => {},
                BattleEvent::ClockTick { remaining } => debug!(remaining, "clock"),
                other => info!(event = ?other, tick = ticks, "round event"),
            }
        }
    }

    let ledger = battle.ledger();
    let outcome = match battle.phase() {
        RoundPhase::Over(outcome) => Some(outcome),
        _ => None,
    };
    Summary {
        fighters: PlayerSlot::ALL.map(|slot| battle.fighter(slot).name().to_string()),
        outcome,
        ticks,
        hit_points: PlayerSlot::ALL.map(|slot| ledger.hit_points(slot)),
        scores: PlayerSlot::ALL.map(|slot| ledger.score(slot)),
        hits,
        time_remaining: battle.clock().remaining(),
    }
}

fn heuristic_inputs(seed: u64, interval: f64) -> [Box<dyn InputProvider>; 2] {
    [
        Box::new(DecisionInput::new(HeuristicPlayer::new(seed, 0.7), interval)),
        Box::new(DecisionInput::new(
            HeuristicPlayer::new(seed.wrapping_add(1), 0.4),
            interval,
        )),
    ]
}

fn random_inputs(seed: u64, interval: f64) -> [Box<dyn InputProvider>; 2] {
    [
        Box::new(DecisionInput::new(RandomPlayer::new(seed), interval)),
        Box::new(DecisionInput::new(RandomPlayer::new(seed ^ 0x5eed), interval)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_finishes_round() {
        let config = BattleConfig {
            seed: Some(11),
            round_time: 5,
            ..BattleConfig::default()
        };
        let mut battle =
            Battle::from_config(config, random_inputs(11, 100.0)).expect("battle");
        let summary = run(&mut battle);
        assert!(summary.outcome.is_some());
        assert!(summary.ticks < MAX_TICKS);
        assert!(summary.hit_points.iter().all(|hp| (0..=144).contains(hp)));
    }

    #[test]
    fn test_replay_drives_round() {
        use crate::replay::KeyEvent;

        let config = BattleConfig {
            spawn_one_x: 600.0,
            spawn_two_x: 640.0,
            max_hit_points: 12,
            ..BattleConfig::default()
        };
        // Player one taps light punch every 200 ms.
        let events = (0..20)
            .flat_map(|i| {
                let at = f64::from(i) * 200.0;
                [(at, true), (at + 100.0, false)]
            })
            .map(|(at_ms, down)| KeyEvent {
                at_ms,
                key: "ControlRight".to_string(),
                down,
            })
            .collect();
        let mut battle =
            Battle::from_config(config, script_inputs(KeyScript { events })).expect("battle");
        let summary = run(&mut battle);
        assert_eq!(summary.outcome, Some(RoundOutcome::Winner(PlayerSlot::One)));
        assert!(summary.hits[0] >= 1);
        assert_eq!(summary.hit_points[1], 0);
    }

    #[test]
    fn test_heuristic_players_land_hits() {
        let config = BattleConfig {
            seed: Some(3),
            ..BattleConfig::default()
        };
        let mut battle =
            Battle::from_config(config, heuristic_inputs(3, 100.0)).expect("battle");
        let summary = run(&mut battle);
        assert!(summary.outcome.is_some());
        assert!(summary.hits.iter().sum::<u32>() > 0);
    }
}
