//! Keyboard replays.
//!
//! A replay is a RON list of timed key events, routed to the two players
//! through the default [`KeyBindings`]:
//!
//! ```text
//! (
//!     events: [
//!         (at_ms: 0.0, key: "ArrowLeft", down: true),
//!         (at_ms: 400.0, key: "ArrowLeft", down: false),
//!         (at_ms: 450.0, key: "ControlRight", down: true),
//!     ],
//! )
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use brawl_combat::geometry::FrameTime;
use brawl_combat::input::{Control, ControllerState, InputProvider, KeyBindings, Observation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One key going down or up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Battle time at which the event fires
    pub at_ms: f64,
    /// Physical key code name
    pub key: String,
    /// Pressed or released
    pub down: bool,
}

/// A recorded key sequence for both players.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyScript {
    /// Events, in any order
    pub events: Vec<KeyEvent>,
}

impl KeyScript {
    /// Load a replay file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading replay {}", path.display()))?;
        let script: Self = ron::from_str(&contents)
            .with_context(|| format!("parsing replay {}", path.display()))?;
        info!("Loaded {} key events from {}", script.events.len(), path.display());
        Ok(script)
    }

    /// Split the script into one input per player. Unbound keys are skipped.
    pub fn into_inputs(self, bindings: &KeyBindings) -> [ScriptedKeyboard; 2] {
        let mut events = self.events;
        events.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));

        let mut inputs = [ScriptedKeyboard::default(), ScriptedKeyboard::default()];
        for event in events {
            match bindings.lookup(&event.key) {
                Some((slot, control)) => {
                    inputs[slot.index()]
                        .pending
                        .push_back((event.at_ms, control, event.down));
                },
                None => warn!(key = %event.key, "Replay key is not bound, skipping"),
            }
        }
        inputs
    }
}

/// Plays one player's share of a [`KeyScript`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeyboard {
    pad: ControllerState,
    pending: VecDeque<(f64, Control, bool)>,
}

impl ScriptedKeyboard {
    /// Events not yet played.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl InputProvider for ScriptedKeyboard {
    fn is_held(&self, control: Control) -> bool {
        self.pad.is_held(control)
    }

    fn is_pressed(&mut self, control: Control) -> bool {
        self.pad.is_pressed(control)
    }

    fn prepare(&mut self, _observation: &Observation, time: FrameTime) {
        while let Some(&(at_ms, control, down)) = self.pending.front() {
            if at_ms > time.previous {
                break;
            }
            self.pad.set_control(control, down);
            self.pending.pop_front();
        }
    }
}

/// Boxed inputs for a battle, routed with the default layout.
pub fn script_inputs(script: KeyScript) -> [Box<dyn InputProvider>; 2] {
    let [one, two] = script.into_inputs(&KeyBindings::default_bindings());
    info!(one = one.remaining(), two = two.remaining(), "Replay ready");
    [Box::new(one), Box::new(two)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_common::{Direction, PlayerSlot, Vec2};
    use brawl_combat::state::FighterState;

    fn observation() -> Observation {
        Observation {
            slot: PlayerSlot::One,
            position: Vec2::new(580.0, 220.0),
            opponent_position: Vec2::new(720.0, 220.0),
            state: FighterState::Idle,
            opponent_state: FighterState::Idle,
            direction: Direction::Right,
            hit_points: 144,
            opponent_hit_points: 144,
            time_remaining: 99,
        }
    }

    fn event(at_ms: f64, key: &str, down: bool) -> KeyEvent {
        KeyEvent {
            at_ms,
            key: key.to_string(),
            down,
        }
    }

    #[test]
    fn test_script_routes_keys_to_players() {
        let script = KeyScript {
            events: vec![
                event(50.0, "KeyA", true),
                event(0.0, "ArrowRight", true),
                event(10.0, "F12", true),
            ],
        };
        let [one, two] = script.into_inputs(&KeyBindings::default_bindings());
        assert_eq!(one.remaining(), 1);
        assert_eq!(two.remaining(), 1);
    }

    #[test]
    fn test_scripted_keyboard_plays_in_time() {
        let script = KeyScript {
            events: vec![
                event(100.0, "ArrowRight", false),
                event(0.0, "ArrowRight", true),
                event(50.0, "ControlRight", true),
            ],
        };
        let [mut one, _] = script.into_inputs(&KeyBindings::default_bindings());
        let obs = observation();

        one.prepare(&obs, FrameTime::fixed_step(1));
        assert!(one.is_held(Control::Right));
        assert!(!one.is_pressed(Control::LightPunch));

        one.prepare(&obs, FrameTime::fixed_step(4));
        assert!(one.is_pressed(Control::LightPunch));
        assert!(!one.is_pressed(Control::LightPunch));

        one.prepare(&obs, FrameTime::fixed_step(7));
        assert!(!one.is_held(Control::Right));
        assert_eq!(one.remaining(), 0);
    }

    #[test]
    fn test_load_replay_file() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("replay.ron");
        fs::write(
            &path,
            r#"(events: [(at_ms: 0.0, key: "KeyE", down: true)])"#,
        )
        .expect("write");

        let script = KeyScript::load(&path).expect("load");
        assert_eq!(script.events, vec![event(0.0, "KeyE", true)]);
        assert!(KeyScript::load(dir.path().join("missing.ron")).is_err());
    }
}
