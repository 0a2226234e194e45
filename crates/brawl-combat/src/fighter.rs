//! Fighter state machine.
//!
//! A [`Fighter`] owns its position, velocity, facing, current state, animation
//! cursor and knockback slide. It never stores its opponent: the battle passes
//! the other fighter into every [`Fighter::update`] by mutable reference, and
//! the update may move the opponent directly (push-out, slide transfer, hits).
//!
//! Per-tick order: state behavior, position integration, slide decay,
//! animation advance, stage and push constraints, attack resolution.

use std::sync::Arc;

use brawl_common::{Direction, GeometryError, PlayerSlot, Rect, Vec2};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::combat::{self, CombatListener, SoundCue};
use crate::geometry::{
    actual_box, FrameBoxes, FrameDelay, FrameTime, GeometryTable, ResolvedGeometry, WorldBoxes,
    FRAME_TIME_MS,
};
use crate::input::{Control, InputProvider, NoInput};
use crate::slide::Slide;
use crate::stage::{self, Arena};
use crate::state::{AttackStrength, Behavior, Entry, FighterState, HurtLocation};

/// Shake amplitude applied when a hurt state is entered.
pub const HURT_SHAKE: f32 = 2.0;

/// Frame-times both fighters freeze for after a hit.
pub const HURT_DELAY_FRAMES: u32 = 15;

/// Animation frame at which a knocked-out fighter meets the floor.
pub const KO_LANDING_FRAME: usize = 2;

/// Fastest a knocked-out fighter falls, in units per second.
pub const KO_FALL_CAP: f32 = 120.0;

/// First animation frame at which a light attack may be restarted.
pub const LIGHT_RESET_FRAME: usize = 2;

// ============================================================================
// Profiles
// ============================================================================

/// Movement constants of a fighter type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movement {
    /// Walk speed toward the opponent
    pub walk_forward: f32,
    /// Walk speed away from the opponent (negative)
    pub walk_backward: f32,
    /// Horizontal speed of a forward jump
    pub jump_forward: f32,
    /// Horizontal speed of a backward jump (negative)
    pub jump_backward: f32,
    /// Take-off vertical velocity (negative is up)
    pub jump_velocity: f32,
    /// Downward acceleration while airborne
    pub gravity: f32,
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            walk_forward: 180.0,
            walk_backward: -120.0,
            jump_forward: 168.0,
            jump_backward: -225.0,
            jump_velocity: -420.0,
            gravity: 1000.0,
        }
    }
}

impl Movement {
    /// Horizontal velocity set on entering `state`.
    #[must_use]
    pub fn horizontal(&self, state: FighterState) -> f32 {
        match state {
            FighterState::WalkForward => self.walk_forward,
            FighterState::WalkBackward => self.walk_backward,
            FighterState::JumpForward => self.jump_forward,
            FighterState::JumpBackward => self.jump_backward,
            _ => 0.0,
        }
    }
}

/// Everything that distinguishes one fighter type from another.
///
/// Only constructible from a valid geometry table.
#[derive(Debug, Clone)]
pub struct FighterProfile {
    name: String,
    movement: Movement,
    geometry: ResolvedGeometry,
}

impl FighterProfile {
    /// Builds a profile, validating the geometry table.
    ///
    /// # Errors
    ///
    /// Returns the first geometry problem found.
    pub fn new(table: &GeometryTable, movement: Movement) -> Result<Self, GeometryError> {
        Ok(Self {
            name: table.name().to_string(),
            movement,
            geometry: table.resolve()?,
        })
    }

    /// Fighter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Movement constants.
    #[must_use]
    pub fn movement(&self) -> &Movement {
        &self.movement
    }

    /// Resolved geometry.
    #[must_use]
    pub fn geometry(&self) -> &ResolvedGeometry {
        &self.geometry
    }
}

// ============================================================================
// Tick context
// ============================================================================

/// Shared data handed to a fighter for one update.
pub struct TickContext<'a> {
    /// Current tick timestamp
    pub time: FrameTime,
    /// Stage bounds
    pub arena: &'a Arena,
    /// Input of the fighter being updated
    pub input: &'a mut dyn InputProvider,
    /// Receiver of hits and sound cues
    pub listener: &'a mut dyn CombatListener,
    /// Jitter source for hit effect placement
    pub rng: &'a mut fastrand::Rng,
}

// ============================================================================
// Fighter
// ============================================================================

/// One combatant.
#[derive(Debug, Clone)]
pub struct Fighter {
    slot: PlayerSlot,
    profile: Arc<FighterProfile>,
    position: Vec2,
    velocity: Vec2,
    direction: Direction,
    state: FighterState,
    animation_frame: usize,
    animation_timer: f64,
    boxes: FrameBoxes,
    attack_struck: bool,
    slide: Slide,
    controls_enabled: bool,
    victory: bool,
    hurt_shake: f32,
    hurt_shake_timer: f64,
    clock_ms: f64,
    cues: Vec<SoundCue>,
}

impl Fighter {
    /// Creates a fighter in the idle state.
    #[must_use]
    pub fn new(
        slot: PlayerSlot,
        profile: Arc<FighterProfile>,
        position: Vec2,
        direction: Direction,
    ) -> Self {
        let mut fighter = Self {
            slot,
            profile,
            position,
            velocity: Vec2::ZERO,
            direction,
            state: FighterState::Idle,
            animation_frame: 0,
            animation_timer: 0.0,
            boxes: FrameBoxes::default(),
            attack_struck: false,
            slide: Slide::NONE,
            controls_enabled: true,
            victory: false,
            hurt_shake: 0.0,
            hurt_shake_timer: 0.0,
            clock_ms: 0.0,
            cues: Vec::new(),
        };
        fighter.refresh_boxes();
        fighter
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Player slot.
    #[must_use]
    pub fn slot(&self) -> PlayerSlot {
        self.slot
    }

    /// Fighter type.
    #[must_use]
    pub fn profile(&self) -> &FighterProfile {
        &self.profile
    }

    /// Fighter type name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.profile.name()
    }

    /// Position of the fighter's feet.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleport the fighter.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Movement velocity (excluding slide).
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Facing.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Force the facing.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> FighterState {
        self.state
    }

    /// Index into the current state's animation.
    #[must_use]
    pub fn animation_frame(&self) -> usize {
        self.animation_frame
    }

    /// Timestamp of the last animation step.
    #[must_use]
    pub fn animation_timer(&self) -> f64 {
        self.animation_timer
    }

    /// Key of the current animation frame.
    #[must_use]
    pub fn frame_key(&self) -> &str {
        self.profile
            .geometry()
            .frame(self.state, self.animation_frame)
            .map_or("", |frame| frame.key.as_str())
    }

    /// Whether the current attack has already connected.
    #[must_use]
    pub fn attack_struck(&self) -> bool {
        self.attack_struck
    }

    /// Outstanding knockback.
    #[must_use]
    pub fn slide(&self) -> Slide {
        self.slide
    }

    /// Replace the outstanding knockback.
    pub fn set_slide(&mut self, slide: Slide) {
        self.slide.apply(slide);
    }

    /// Whether the fighter reacts to input.
    #[must_use]
    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    /// Enable or disable input handling.
    pub fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }

    /// Whether the fighter has been declared the winner.
    #[must_use]
    pub fn victory(&self) -> bool {
        self.victory
    }

    /// Flag the fighter as the winner. Idle picks this up and enters victory.
    pub fn set_victory(&mut self, victory: bool) {
        self.victory = victory;
    }

    /// Horizontal draw offset of the hurt shake.
    #[must_use]
    pub fn hurt_shake(&self) -> f32 {
        self.hurt_shake
    }

    /// Local boxes of the current frame.
    #[must_use]
    pub fn local_boxes(&self) -> &FrameBoxes {
        &self.boxes
    }

    /// All boxes in stage space.
    #[must_use]
    pub fn world_boxes(&self) -> WorldBoxes {
        self.boxes.to_world(self.position, self.direction)
    }

    /// Push box in stage space.
    #[must_use]
    pub fn push_box(&self) -> Rect {
        actual_box(self.position, self.direction, self.boxes.push)
    }

    /// Hurt boxes in stage space, in [`HurtLocation::PRIORITY`] order.
    #[must_use]
    pub fn hurt_boxes(&self) -> [Rect; 3] {
        self.world_boxes().hurt
    }

    /// Hit box in stage space.
    #[must_use]
    pub fn hit_box(&self) -> Rect {
        actual_box(self.position, self.direction, self.boxes.hit)
    }

    /// Whether the two push boxes overlap.
    #[must_use]
    pub fn has_collided_with(&self, opponent: &Fighter) -> bool {
        self.push_box().overlaps(&opponent.push_box())
    }

    /// Facing toward the opponent, or the current facing while the push boxes
    /// overlap horizontally.
    #[must_use]
    pub fn direction_to(&self, opponent: &Fighter) -> Direction {
        let mine = self.push_box();
        let theirs = opponent.push_box();
        if mine.right() <= theirs.x {
            Direction::Right
        } else if mine.x >= theirs.right() {
            Direction::Left
        } else {
            self.direction
        }
    }

    /// Whether the current frame is the last one of its animation.
    #[must_use]
    pub fn is_animation_completed(&self) -> bool {
        self.profile
            .geometry()
            .frame(self.state, self.animation_frame)
            .is_some_and(|frame| frame.delay == FrameDelay::Transition)
    }

    /// Knocked out and finished falling.
    #[must_use]
    pub fn ko_complete(&self) -> bool {
        self.state == FighterState::Ko && self.is_animation_completed()
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Request a transition.
    ///
    /// Requests for the current state or from a state outside the target's
    /// predecessor set are ignored. Returns whether the transition happened.
    pub fn change_state(&mut self, target: FighterState) -> bool {
        if !target.can_enter_from(self.state) {
            return false;
        }
        trace!(slot = %self.slot, from = %self.state, to = %target, "state change");

        self.state = target;
        self.animation_frame = 0;
        self.refresh_boxes();
        self.enter(target);
        true
    }

    fn enter(&mut self, state: FighterState) {
        match state.def().entry {
            Entry::None => {},
            Entry::Idle | Entry::JumpStart | Entry::CrouchDown => self.reset_velocities(),
            Entry::Move => {
                self.velocity.x = self.profile.movement().horizontal(state);
            },
            Entry::Jump => {
                self.velocity.y = self.profile.movement().jump_velocity;
                self.velocity.x = self.profile.movement().horizontal(state);
            },
            Entry::JumpLand => {
                self.reset_velocities();
                self.cues.push(SoundCue::Land);
            },
            Entry::Attack => {
                self.reset_velocities();
                self.attack_struck = false;
                if let Some((_, strength)) = state.attack() {
                    self.cues.push(SoundCue::Swing(strength));
                }
            },
            Entry::Hurt => {
                self.reset_velocities();
                self.hurt_shake = HURT_SHAKE;
                self.hurt_shake_timer = self.clock_ms;
            },
            Entry::Ko => {
                self.reset_velocities();
                self.controls_enabled = false;
            },
        }
    }

    /// Stop all movement. Knockback is left alone.
    pub fn freeze(&mut self) {
        self.reset_velocities();
    }

    fn reset_velocities(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    fn refresh_boxes(&mut self) {
        if let Some(frame) = self.profile.geometry().frame(self.state, self.animation_frame) {
            self.boxes = frame.boxes;
        }
    }

    // ------------------------------------------------------------------
    // Hits
    // ------------------------------------------------------------------

    /// React to being hit: take the knockback for `strength` and enter the
    /// matching hurt state. Returns whether the hurt state was entered.
    pub fn receive_hit(&mut self, strength: AttackStrength, location: HurtLocation) -> bool {
        self.slide.apply(Slide::from_strength(strength));
        self.change_state(FighterState::hurt_for(strength, location))
    }

    /// Move the animation cursor to `index` (clamped to the last frame) and
    /// refresh the boxes.
    pub fn force_frame(&mut self, index: usize) {
        let count = self.profile.geometry().frame_count(self.state);
        self.animation_frame = index.min(count.saturating_sub(1));
        self.refresh_boxes();
    }

    /// Sound cues not yet delivered to a listener.
    #[must_use]
    pub fn pending_cues(&self) -> &[SoundCue] {
        &self.cues
    }

    pub(crate) fn mark_attack_struck(&mut self) {
        self.attack_struck = true;
    }

    pub(crate) fn sync_clock(&mut self, now: f64) {
        self.clock_ms = now;
    }

    pub(crate) fn queue_cue(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }

    pub(crate) fn position_mut(&mut self) -> &mut Vec2 {
        &mut self.position
    }

    pub(crate) fn slide_mut(&mut self) -> &mut Slide {
        &mut self.slide
    }

    /// Oscillate the hurt shake while the battle's hit-stop runs until
    /// `hit_stop_until` (milliseconds).
    pub fn update_hurt_shake(&mut self, time: FrameTime, hit_stop_until: f64) {
        self.clock_ms = time.previous;
        if self.hurt_shake_timer == 0.0 || time.previous <= self.hurt_shake_timer {
            return;
        }
        let half_delay = f64::from(HURT_DELAY_FRAMES) * FRAME_TIME_MS / 2.0;
        let amount = if hit_stop_until - time.previous < half_delay {
            1.0
        } else {
            2.0
        };
        self.hurt_shake = amount - self.hurt_shake;
        self.hurt_shake_timer = time.previous + FRAME_TIME_MS;
    }

    fn clear_hurt_shake(&mut self) {
        self.hurt_shake = 0.0;
        self.hurt_shake_timer = 0.0;
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance one tick.
    pub fn update(&mut self, opponent: &mut Fighter, ctx: &mut TickContext<'_>) {
        self.clock_ms = ctx.time.previous;

        let mut disabled = NoInput;
        let input: &mut dyn InputProvider = if self.controls_enabled {
            &mut *ctx.input
        } else {
            &mut disabled
        };
        self.run_behavior(opponent, input, ctx.time, ctx.arena);

        self.update_position(ctx.time);
        self.slide.decay(ctx.time.seconds_passed);
        self.update_animation(ctx.time);

        stage::constrain_to_stage(self, opponent, ctx.arena);
        stage::resolve_push(self, opponent, ctx.arena, ctx.time);
        combat::resolve_attack(self, opponent, ctx);

        self.flush_cues(ctx.listener);
        opponent.flush_cues(ctx.listener);
    }

    fn flush_cues(&mut self, listener: &mut dyn CombatListener) {
        for cue in self.cues.drain(..) {
            listener.on_sound_cue(self.slot, cue);
        }
    }

    fn update_position(&mut self, time: FrameTime) {
        let dt = time.seconds_passed;
        self.position.x +=
            (self.velocity.x + self.slide.velocity) * self.direction.sign() * dt;
        self.position.y += self.velocity.y * dt;
    }

    fn update_animation(&mut self, time: FrameTime) {
        let geometry = self.profile.geometry();
        let count = geometry.frame_count(self.state);
        let Some(delay) = geometry
            .frame(self.state, self.animation_frame)
            .map(|frame| frame.delay)
        else {
            return;
        };

        if time.previous <= self.animation_timer + delay.duration_ms() {
            return;
        }
        self.animation_timer = time.previous;

        if !delay.advances() {
            return;
        }
        self.animation_frame += 1;
        if self.animation_frame >= count {
            self.animation_frame = 0;
        }
        self.refresh_boxes();
    }

    fn run_behavior(
        &mut self,
        opponent: &Fighter,
        input: &mut dyn InputProvider,
        time: FrameTime,
        arena: &Arena,
    ) {
        match self.state.def().behavior {
            Behavior::Idle => self.handle_idle(opponent, input),
            Behavior::WalkForward => {
                if input.is_forward(self.direction) {
                    self.handle_walk_interrupts(input);
                } else {
                    self.change_state(FighterState::Idle);
                }
                self.direction = self.direction_to(opponent);
            },
            Behavior::WalkBackward => {
                if input.is_backward(self.direction) {
                    self.handle_walk_interrupts(input);
                } else {
                    self.change_state(FighterState::Idle);
                }
                self.direction = self.direction_to(opponent);
            },
            Behavior::JumpStart => {
                if !self.is_animation_completed() {
                    return;
                }
                if input.is_backward(self.direction) {
                    self.change_state(FighterState::JumpBackward);
                } else if input.is_forward(self.direction) {
                    self.change_state(FighterState::JumpForward);
                } else {
                    self.change_state(FighterState::JumpUp);
                }
            },
            Behavior::Airborne => {
                self.velocity.y += self.profile.movement().gravity * time.seconds_passed;
                if self.position.y > arena.floor {
                    self.position.y = arena.floor;
                    self.change_state(FighterState::JumpLand);
                }
            },
            Behavior::JumpLand => self.handle_jump_land(opponent, input),
            Behavior::Crouch => {
                if !input.is_held(Control::Down) {
                    self.change_state(FighterState::CrouchUp);
                    return;
                }
                self.direction = self.direction_to(opponent);
            },
            Behavior::CrouchDown => {
                if self.is_animation_completed() {
                    self.change_state(FighterState::Crouch);
                } else if !input.is_held(Control::Down) {
                    self.change_state(FighterState::CrouchUp);
                }
            },
            Behavior::CrouchUp | Behavior::IdleTurn | Behavior::Attack => {
                if self.is_animation_completed() {
                    self.change_state(FighterState::Idle);
                }
            },
            Behavior::CrouchTurn => {
                if !input.is_held(Control::Down) {
                    self.change_state(FighterState::CrouchUp);
                    return;
                }
                if self.is_animation_completed() {
                    self.change_state(FighterState::Crouch);
                }
                self.direction = self.direction_to(opponent);
            },
            Behavior::LightAttack => self.handle_light_attack(input),
            Behavior::Hurt => {
                if self.is_animation_completed() {
                    self.clear_hurt_shake();
                    self.change_state(FighterState::Idle);
                }
            },
            Behavior::Ko => self.handle_fall(time, arena),
            Behavior::Victory => {},
        }
    }

    fn handle_idle(&mut self, opponent: &Fighter, input: &mut dyn InputProvider) {
        if !self.controls_enabled {
            return;
        }
        if self.victory {
            self.change_state(FighterState::Victory);
            return;
        }

        if input.is_backward(self.direction) {
            self.change_state(FighterState::WalkBackward);
        } else if input.is_forward(self.direction) {
            self.change_state(FighterState::WalkForward);
        } else if input.is_held(Control::Up) {
            self.change_state(FighterState::JumpStart);
        } else if input.is_held(Control::Down) {
            self.change_state(FighterState::CrouchDown);
        } else {
            self.handle_attack_presses(input);
        }

        let facing = self.direction_to(opponent);
        if facing != self.direction {
            self.direction = facing;
            self.change_state(FighterState::IdleTurn);
        }
    }

    fn handle_walk_interrupts(&mut self, input: &mut dyn InputProvider) {
        if input.is_held(Control::Up) {
            self.change_state(FighterState::JumpStart);
        } else {
            self.handle_attack_presses(input);
        }
    }

    /// Checks attack buttons in priority order. Stops at the first press so
    /// lower-priority presses stay unconsumed.
    fn handle_attack_presses(&mut self, input: &mut dyn InputProvider) {
        for (control, state) in Control::ATTACKS {
            if input.is_pressed(control) {
                self.change_state(state);
                return;
            }
        }
    }

    fn handle_jump_land(&mut self, opponent: &Fighter, input: &mut dyn InputProvider) {
        if self.animation_frame < 1 {
            return;
        }

        let mut next = FighterState::Idle;
        if input.is_idle() {
            let facing = self.direction_to(opponent);
            if facing != self.direction {
                self.direction = facing;
                next = FighterState::IdleTurn;
            } else if !self.is_animation_completed() {
                return;
            }
        } else {
            self.direction = self.direction_to(opponent);
            self.handle_idle(opponent, input);
        }
        self.change_state(next);
    }

    fn handle_light_attack(&mut self, input: &mut dyn InputProvider) {
        if self.animation_frame < LIGHT_RESET_FRAME {
            return;
        }
        if let Some(control) = Control::for_attack(self.state) {
            if input.is_pressed(control) {
                self.animation_frame = 0;
                self.refresh_boxes();
                self.enter(self.state);
            }
        }
        if self.is_animation_completed() {
            self.change_state(FighterState::Idle);
        }
    }

    fn handle_fall(&mut self, time: FrameTime, arena: &Arena) {
        if self.animation_frame != KO_LANDING_FRAME {
            return;
        }
        if self.position.y >= arena.floor {
            self.position.y = arena.floor;
            self.velocity.y = 0.0;
            if self.animation_frame + 1 < self.profile.geometry().frame_count(self.state) {
                self.animation_frame += 1;
                self.refresh_boxes();
            }
            self.clear_hurt_shake();
        } else {
            let gravity = self.profile.movement().gravity;
            self.velocity.y = (self.velocity.y + gravity * time.seconds_passed).min(KO_FALL_CAP);
        }
    }
}
