//! Input contracts.
//!
//! A fighter only ever asks two questions of its input: is a control held
//! (level-triggered, used for directions) and was it freshly pressed
//! (edge-triggered, used for attacks; true once per physical press).
//! Keyboards, scripted inputs and decision providers all answer through
//! [`InputProvider`].

use ahash::AHashMap;
use brawl_common::{Direction, PlayerSlot, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::FrameTime;
use crate::state::FighterState;

/// Errors that can occur in the input system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Key already bound to another control
    #[error("key '{key}' already bound to {slot} {control:?}")]
    KeyAlreadyBound {
        /// The key that's already bound
        key: String,
        /// Slot owning the binding
        slot: PlayerSlot,
        /// Control it's bound to
        control: Control,
    },
}

/// A physical control of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    /// Left direction
    Left,
    /// Right direction
    Right,
    /// Up direction
    Up,
    /// Down direction
    Down,
    /// Light punch button
    LightPunch,
    /// Medium punch button
    MediumPunch,
    /// Heavy punch button
    HeavyPunch,
    /// Light kick button
    LightKick,
    /// Medium kick button
    MediumKick,
    /// Heavy kick button
    HeavyKick,
}

impl Control {
    /// Every control.
    pub const ALL: [Self; 10] = [
        Self::Left,
        Self::Right,
        Self::Up,
        Self::Down,
        Self::LightPunch,
        Self::MediumPunch,
        Self::HeavyPunch,
        Self::LightKick,
        Self::MediumKick,
        Self::HeavyKick,
    ];

    /// Attack buttons in the order they are checked, with the state each requests.
    pub const ATTACKS: [(Self, FighterState); 6] = [
        (Self::LightPunch, FighterState::LightPunch),
        (Self::MediumPunch, FighterState::MediumPunch),
        (Self::HeavyPunch, FighterState::HeavyPunch),
        (Self::LightKick, FighterState::LightKick),
        (Self::MediumKick, FighterState::MediumKick),
        (Self::HeavyKick, FighterState::HeavyKick),
    ];

    /// Number of controls.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index of this control.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction control pointing toward `direction`.
    #[must_use]
    pub const fn toward(direction: Direction) -> Self {
        match direction {
            Direction::Left => Self::Left,
            Direction::Right => Self::Right,
        }
    }

    /// Button that starts `state`, if it is an attack.
    #[must_use]
    pub fn for_attack(state: FighterState) -> Option<Self> {
        Self::ATTACKS
            .iter()
            .find(|(_, attack)| *attack == state)
            .map(|(control, _)| *control)
    }
}

/// Source of control queries for one player slot.
pub trait InputProvider {
    /// Level-triggered: the control is currently down.
    fn is_held(&self, control: Control) -> bool;

    /// Edge-triggered: true exactly once per physical press. Consumes the press.
    fn is_pressed(&mut self, control: Control) -> bool;

    /// Called by the battle once per tick before any fighter updates.
    fn prepare(&mut self, _observation: &Observation, _time: FrameTime) {}

    /// Held toward the way the fighter faces.
    fn is_forward(&self, facing: Direction) -> bool {
        self.is_held(Control::toward(facing))
    }

    /// Held away from the way the fighter faces.
    fn is_backward(&self, facing: Direction) -> bool {
        self.is_held(Control::toward(facing.flipped()))
    }

    /// No direction held.
    fn is_idle(&self) -> bool {
        ![Control::Left, Control::Right, Control::Up, Control::Down]
            .into_iter()
            .any(|control| self.is_held(control))
    }
}

/// Input that never reports anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputProvider for NoInput {
    fn is_held(&self, _control: Control) -> bool {
        false
    }

    fn is_pressed(&mut self, _control: Control) -> bool {
        false
    }
}

// ============================================================================
// Controller state
// ============================================================================

/// Physical control state of one player.
#[derive(Debug, Clone)]
pub struct ControllerState {
    held: [bool; Control::COUNT],
    consumed: [bool; Control::COUNT],
    enabled: bool,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerState {
    /// Creates an enabled controller with nothing held.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            held: [false; Control::COUNT],
            consumed: [false; Control::COUNT],
            enabled: true,
        }
    }

    /// Mark a control as pushed down.
    pub fn press(&mut self, control: Control) {
        self.held[control.index()] = true;
    }

    /// Mark a control as let go. Re-arms its edge trigger.
    pub fn release(&mut self, control: Control) {
        self.held[control.index()] = false;
        self.consumed[control.index()] = false;
    }

    /// Press or release.
    pub fn set_control(&mut self, control: Control, down: bool) {
        if down {
            self.press(control);
        } else {
            self.release(control);
        }
    }

    /// Let go of every control.
    pub fn release_all(&mut self) {
        for control in Control::ALL {
            self.release(control);
        }
    }

    /// Enable or disable the controller. A disabled controller reads as idle.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the controller is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl InputProvider for ControllerState {
    fn is_held(&self, control: Control) -> bool {
        self.enabled && self.held[control.index()]
    }

    fn is_pressed(&mut self, control: Control) -> bool {
        let i = control.index();
        if self.enabled && self.held[i] && !self.consumed[i] {
            self.consumed[i] = true;
            return true;
        }
        false
    }
}

// ============================================================================
// Keyboard routing
// ============================================================================

/// Keyboard layout for both players.
///
/// Keys are identified by their physical key code name (`"ArrowLeft"`,
/// `"KeyA"`, ...).
#[derive(Debug, Clone, Default)]
pub struct KeyBindings {
    bindings: AHashMap<String, (PlayerSlot, Control)>,
}

impl KeyBindings {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The two default layouts: arrows and right-hand keys for player one,
    /// WASD and left-hand keys for player two.
    #[must_use]
    pub fn default_bindings() -> Self {
        const ONE: [(&str, Control); 10] = [
            ("ArrowLeft", Control::Left),
            ("ArrowRight", Control::Right),
            ("ArrowUp", Control::Up),
            ("ArrowDown", Control::Down),
            ("ControlRight", Control::LightPunch),
            ("Slash", Control::MediumPunch),
            ("Period", Control::HeavyPunch),
            ("Quote", Control::LightKick),
            ("Enter", Control::MediumKick),
            ("ShiftRight", Control::HeavyKick),
        ];
        const TWO: [(&str, Control); 10] = [
            ("KeyA", Control::Left),
            ("KeyD", Control::Right),
            ("KeyW", Control::Up),
            ("KeyS", Control::Down),
            ("KeyE", Control::LightPunch),
            ("Digit3", Control::MediumPunch),
            ("Digit4", Control::HeavyPunch),
            ("KeyR", Control::LightKick),
            ("KeyF", Control::MediumKick),
            ("KeyT", Control::HeavyKick),
        ];

        let mut layout = Self::new();
        for (slot, keys) in [(PlayerSlot::One, ONE), (PlayerSlot::Two, TWO)] {
            for (key, control) in keys {
                layout
                    .bindings
                    .insert(key.to_string(), (slot, control));
            }
        }
        layout
    }

    /// Bind a key.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::KeyAlreadyBound`] if the key is taken.
    pub fn bind(
        &mut self,
        key: impl Into<String>,
        slot: PlayerSlot,
        control: Control,
    ) -> Result<(), InputError> {
        let key = key.into();
        if let Some(&(bound_slot, bound_control)) = self.bindings.get(&key) {
            return Err(InputError::KeyAlreadyBound {
                key,
                slot: bound_slot,
                control: bound_control,
            });
        }
        self.bindings.insert(key, (slot, control));
        Ok(())
    }

    /// Remove a key binding, returning what it was bound to.
    pub fn unbind(&mut self, key: &str) -> Option<(PlayerSlot, Control)> {
        self.bindings.remove(key)
    }

    /// What a key is bound to.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<(PlayerSlot, Control)> {
        self.bindings.get(key).copied()
    }

    /// Number of bound keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no key is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Forward a key event to the owning controller. Returns whether the key
    /// was bound.
    pub fn route(&self, key: &str, down: bool, controllers: &mut [ControllerState; 2]) -> bool {
        let Some((slot, control)) = self.lookup(key) else {
            return false;
        };
        controllers[slot.index()].set_control(control, down);
        true
    }
}

// ============================================================================
// Decision providers
// ============================================================================

/// What a decision provider sees of the battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Slot being decided for
    pub slot: PlayerSlot,
    /// Own position
    pub position: Vec2,
    /// Opponent position
    pub opponent_position: Vec2,
    /// Own state
    pub state: FighterState,
    /// Opponent state
    pub opponent_state: FighterState,
    /// Own facing
    pub direction: Direction,
    /// Own hit points
    pub hit_points: i32,
    /// Opponent hit points
    pub opponent_hit_points: i32,
    /// Clock counts left in the round
    pub time_remaining: u32,
}

impl Observation {
    /// Horizontal distance between the fighters.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.position.horizontal_distance(self.opponent_position)
    }

    /// Whether the opponent is mid-attack.
    #[must_use]
    pub fn opponent_attacking(&self) -> bool {
        self.opponent_state.is_attack()
    }
}

/// One decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Release everything
    Idle,
    /// Hold toward the opponent
    MoveForward,
    /// Hold away from the opponent
    MoveBackward,
    /// Hold up
    Jump,
    /// Hold down
    Crouch,
    /// Press light punch
    LightPunch,
    /// Press medium punch
    MediumPunch,
    /// Press heavy punch
    HeavyPunch,
    /// Press light kick
    LightKick,
    /// Press medium kick
    MediumKick,
    /// Press heavy kick
    HeavyKick,
}

impl Action {
    /// Every action.
    pub const ALL: [Self; 11] = [
        Self::Idle,
        Self::MoveForward,
        Self::MoveBackward,
        Self::Jump,
        Self::Crouch,
        Self::LightPunch,
        Self::MediumPunch,
        Self::HeavyPunch,
        Self::LightKick,
        Self::MediumKick,
        Self::HeavyKick,
    ];

    /// Control held for this action by a fighter facing `facing`.
    #[must_use]
    pub const fn control(self, facing: Direction) -> Option<Control> {
        match self {
            Self::Idle => None,
            Self::MoveForward => Some(Control::toward(facing)),
            Self::MoveBackward => Some(Control::toward(facing.flipped())),
            Self::Jump => Some(Control::Up),
            Self::Crouch => Some(Control::Down),
            Self::LightPunch => Some(Control::LightPunch),
            Self::MediumPunch => Some(Control::MediumPunch),
            Self::HeavyPunch => Some(Control::HeavyPunch),
            Self::LightKick => Some(Control::LightKick),
            Self::MediumKick => Some(Control::MediumKick),
            Self::HeavyKick => Some(Control::HeavyKick),
        }
    }
}

/// Strategy choosing actions for a non-human fighter.
pub trait DecisionProvider {
    /// Pick the next action.
    fn decide(&mut self, observation: &Observation) -> Action;
}

impl<F> DecisionProvider for F
where
    F: FnMut(&Observation) -> Action,
{
    fn decide(&mut self, observation: &Observation) -> Action {
        self(observation)
    }
}

/// Drives a fighter from a [`DecisionProvider`] polled at a fixed cadence.
///
/// Each decision holds one control until the next decision, so attack buttons
/// fire once per decision through the usual edge trigger.
#[derive(Debug)]
pub struct DecisionInput<P> {
    provider: P,
    interval_ms: f64,
    last_decision_ms: Option<f64>,
    last_action: Action,
    controller: ControllerState,
}

impl<P: DecisionProvider> DecisionInput<P> {
    /// Wraps a provider polled every `interval_ms`.
    pub fn new(provider: P, interval_ms: f64) -> Self {
        Self {
            provider,
            interval_ms,
            last_decision_ms: None,
            last_action: Action::Idle,
            controller: ControllerState::new(),
        }
    }

    /// Most recent decision.
    #[must_use]
    pub const fn last_action(&self) -> Action {
        self.last_action
    }

    /// The wrapped provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn due(&self, now: f64) -> bool {
        self.last_decision_ms
            .map_or(true, |last| now - last > self.interval_ms)
    }
}

impl<P: DecisionProvider> InputProvider for DecisionInput<P> {
    fn is_held(&self, control: Control) -> bool {
        self.controller.is_held(control)
    }

    fn is_pressed(&mut self, control: Control) -> bool {
        self.controller.is_pressed(control)
    }

    fn prepare(&mut self, observation: &Observation, time: FrameTime) {
        if !self.due(time.previous) {
            return;
        }
        self.last_decision_ms = Some(time.previous);

        let action = self.provider.decide(observation);
        self.controller.release_all();
        if let Some(control) = action.control(observation.direction) {
            self.controller.press(control);
        }
        self.last_action = action;
    }
}
