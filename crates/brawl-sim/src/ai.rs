//! Decision providers for computer-controlled fighters.

use brawl_combat::input::{Action, DecisionProvider, Observation};

/// Distance at which the heuristic player starts attacking.
const STRIKE_RANGE: f32 = 70.0;

/// Distance beyond which the heuristic player closes in.
const APPROACH_RANGE: f32 = 110.0;

/// Picks any action uniformly.
#[derive(Debug)]
pub struct RandomPlayer {
    rng: fastrand::Rng,
}

impl RandomPlayer {
    /// Creates a player with its own random stream.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl DecisionProvider for RandomPlayer {
    fn decide(&mut self, _observation: &Observation) -> Action {
        Action::ALL[self.rng.usize(..Action::ALL.len())]
    }
}

/// Walks in, attacks in range, backs off when hurt and pressured.
#[derive(Debug)]
pub struct HeuristicPlayer {
    rng: fastrand::Rng,
    aggression: f32,
}

impl HeuristicPlayer {
    /// Creates a player. `aggression` in `[0, 1]` biases toward attacking.
    pub fn new(seed: u64, aggression: f32) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            aggression: aggression.clamp(0.0, 1.0),
        }
    }

    fn pick_attack(&mut self, distance: f32) -> Action {
        // Kicks reach further than punches.
        let pool: &[Action] = if distance > STRIKE_RANGE * 0.75 {
            &[Action::MediumKick, Action::HeavyKick, Action::HeavyPunch]
        } else {
            &[
                Action::LightPunch,
                Action::MediumPunch,
                Action::LightKick,
                Action::MediumKick,
            ]
        };
        pool[self.rng.usize(..pool.len())]
    }
}

impl DecisionProvider for HeuristicPlayer {
    fn decide(&mut self, observation: &Observation) -> Action {
        let distance = observation.distance();
        let losing = observation.hit_points < observation.opponent_hit_points;

        if observation.opponent_attacking() && distance < STRIKE_RANGE {
            if losing && self.rng.f32() < 0.5 {
                return Action::MoveBackward;
            }
            if self.rng.f32() < 0.3 {
                return Action::Crouch;
            }
        }

        if distance > APPROACH_RANGE {
            return if self.rng.f32() < 0.1 {
                Action::Jump
            } else {
                Action::MoveForward
            };
        }

        if distance <= STRIKE_RANGE && self.rng.f32() < 0.4 + self.aggression * 0.6 {
            return self.pick_attack(distance);
        }

        match self.rng.u8(..4) {
            0 => Action::Idle,
            1 => Action::MoveBackward,
            _ => Action::MoveForward,
        }
    }
}
