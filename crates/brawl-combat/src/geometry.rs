//! Collision geometry.
//!
//! A [`GeometryTable`] is the per-fighter asset: for each state an ordered list
//! of `(frame key, delay)` pairs, and for each frame key the sprite rectangle,
//! draw origin, push box, three hurt boxes and hit box. Boxes are authored in
//! local space for a right-facing fighter and mirrored at lookup time.
//!
//! Tables are validated once and then resolved into a [`ResolvedGeometry`], an
//! index-addressed form the fighter reads every tick without fallible lookups.

use ahash::AHashMap;
use brawl_common::{Direction, GeometryError, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::state::{FighterState, HurtLocation};

/// Duration of one animation time unit, in milliseconds.
pub const FRAME_TIME_MS: f64 = 1000.0 / 60.0;

// ============================================================================
// Frame timing
// ============================================================================

/// How long an animation frame is held.
///
/// Serialized as an integer: `0` freezes, `-2` marks the final frame, and any
/// positive value is a hold in frame-time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum FrameDelay {
    /// Hold until a state handler moves the cursor
    Freeze,
    /// Last frame of the animation; reported by `is_animation_completed`
    Transition,
    /// Hold for this many frame-times, then advance
    Ticks(u16),
}

impl FrameDelay {
    const FREEZE: i32 = 0;
    const TRANSITION: i32 = -2;

    /// Raw delay in frame-time units.
    #[must_use]
    pub const fn units(self) -> i32 {
        match self {
            Self::Freeze => Self::FREEZE,
            Self::Transition => Self::TRANSITION,
            Self::Ticks(n) => n as i32,
        }
    }

    /// Hold time in milliseconds (may be negative for the transition marker).
    #[must_use]
    pub fn duration_ms(self) -> f64 {
        f64::from(self.units()) * FRAME_TIME_MS
    }

    /// Whether the animation cursor moves past this frame on its own.
    #[must_use]
    pub const fn advances(self) -> bool {
        matches!(self, Self::Ticks(_))
    }
}

/// Timestamp of the tick being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameTime {
    /// Milliseconds since the simulation started
    pub previous: f64,
    /// Seconds elapsed since the last tick
    pub seconds_passed: f32,
}

impl FrameTime {
    /// Creates a timestamp.
    #[must_use]
    pub const fn new(previous: f64, seconds_passed: f32) -> Self {
        Self {
            previous,
            seconds_passed,
        }
    }

    /// Timestamp of fixed-step tick number `tick` (the first tick is 1).
    #[must_use]
    pub fn fixed_step(tick: u64) -> Self {
        Self {
            previous: tick as f64 * FRAME_TIME_MS,
            seconds_passed: (FRAME_TIME_MS / 1000.0) as f32,
        }
    }
}

impl TryFrom<i32> for FrameDelay {
    type Error = GeometryError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            Self::FREEZE => Ok(Self::Freeze),
            Self::TRANSITION => Ok(Self::Transition),
            n if n > 0 => u16::try_from(n)
                .map(Self::Ticks)
                .map_err(|_| GeometryError::InvalidFrameDelay { value }),
            _ => Err(GeometryError::InvalidFrameDelay { value }),
        }
    }
}

impl From<FrameDelay> for i32 {
    fn from(delay: FrameDelay) -> Self {
        delay.units()
    }
}

// ============================================================================
// Boxes
// ============================================================================

/// Collision boxes of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameBoxes {
    /// Solid body box
    pub push: Rect,
    /// Vulnerable regions, indexed by [`HurtLocation::index`]
    pub hurt: [Rect; 3],
    /// Attack box (empty outside strike frames)
    pub hit: Rect,
}

impl FrameBoxes {
    /// Local hurt box at `location`.
    #[must_use]
    pub fn hurt_box(&self, location: HurtLocation) -> Rect {
        self.hurt[location.index()]
    }

    /// Place these local boxes in the world.
    #[must_use]
    pub fn to_world(&self, position: Vec2, direction: Direction) -> WorldBoxes {
        WorldBoxes {
            push: actual_box(position, direction, self.push),
            hurt: self.hurt.map(|local| actual_box(position, direction, local)),
            hit: actual_box(position, direction, self.hit),
        }
    }
}

/// Collision boxes in stage space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldBoxes {
    /// Solid body box
    pub push: Rect,
    /// Vulnerable regions, indexed by [`HurtLocation::index`]
    pub hurt: [Rect; 3],
    /// Attack box
    pub hit: Rect,
}

/// Convert a local box to stage space.
///
/// The local x offset is mirrored when facing left; the result always has a
/// non-negative width.
#[must_use]
pub fn actual_box(position: Vec2, direction: Direction, local: Rect) -> Rect {
    let sign = direction.sign();
    let x1 = position.x + local.x * sign;
    let x2 = x1 + local.width * sign;
    Rect::new(
        x1.min(x2),
        position.y + local.y,
        local.width.abs(),
        local.height,
    )
}

/// Strict axis-aligned overlap; touching edges do not count.
#[must_use]
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

// ============================================================================
// Geometry table
// ============================================================================

/// One authored frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDef {
    /// Region of the sprite sheet
    pub sprite: Rect,
    /// Draw origin inside the sprite
    pub origin: Vec2,
    /// Local collision boxes
    pub boxes: FrameBoxes,
}

/// One entry of a state's animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrame {
    /// Frame key into the table's frame map
    pub key: String,
    /// Hold time
    pub delay: FrameDelay,
}

impl AnimationFrame {
    /// Creates an animation entry.
    pub fn new(key: impl Into<String>, delay: FrameDelay) -> Self {
        Self {
            key: key.into(),
            delay,
        }
    }
}

/// Per-fighter geometry asset.
#[derive(Debug, Clone, Default)]
pub struct GeometryTable {
    name: String,
    frames: AHashMap<String, FrameDef>,
    animations: AHashMap<FighterState, Vec<AnimationFrame>>,
}

impl GeometryTable {
    /// Creates an empty table for the named fighter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fighter name used in error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds or replaces a frame.
    pub fn insert_frame(&mut self, key: impl Into<String>, frame: FrameDef) {
        self.frames.insert(key.into(), frame);
    }

    /// Sets the animation of a state.
    pub fn set_animation(&mut self, state: FighterState, frames: Vec<AnimationFrame>) {
        self.animations.insert(state, frames);
    }

    /// Frame definition by key.
    #[must_use]
    pub fn frame(&self, key: &str) -> Option<&FrameDef> {
        self.frames.get(key)
    }

    /// Animation of a state.
    #[must_use]
    pub fn animation(&self, state: FighterState) -> Option<&[AnimationFrame]> {
        self.animations.get(&state).map(Vec::as_slice)
    }

    /// All frames, keyed.
    pub fn frames(&self) -> impl Iterator<Item = (&str, &FrameDef)> {
        self.frames.iter().map(|(key, def)| (key.as_str(), def))
    }

    /// World-space boxes of `frame_key` for a fighter at `position` facing
    /// `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MissingFrame`] if the key is not in the table.
    pub fn compute_boxes(
        &self,
        frame_key: &str,
        position: Vec2,
        direction: Direction,
    ) -> Result<WorldBoxes, GeometryError> {
        self.frames
            .get(frame_key)
            .map(|frame| frame.boxes.to_world(position, direction))
            .ok_or_else(|| self.missing_frame(frame_key))
    }

    /// Check the table is complete.
    ///
    /// Every state needs a non-empty animation, every referenced key must
    /// exist, and no box may have negative extents.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), GeometryError> {
        for state in FighterState::ALL {
            let animation = self.animations.get(&state).ok_or_else(|| {
                GeometryError::MissingAnimation {
                    fighter: self.name.clone(),
                    state: state.as_str().to_string(),
                }
            })?;
            if animation.is_empty() {
                return Err(GeometryError::EmptyAnimation {
                    fighter: self.name.clone(),
                    state: state.as_str().to_string(),
                });
            }
            for entry in animation {
                if !self.frames.contains_key(&entry.key) {
                    return Err(self.missing_frame(&entry.key));
                }
            }
        }

        for (key, frame) in &self.frames {
            let boxes = &frame.boxes;
            let checks = [
                ("push", boxes.push),
                ("head", boxes.hurt[0]),
                ("body", boxes.hurt[1]),
                ("feet", boxes.hurt[2]),
                ("hit", boxes.hit),
                ("sprite", frame.sprite),
            ];
            for (which, rect) in checks {
                if rect.width < 0.0 || rect.height < 0.0 {
                    return Err(GeometryError::MalformedBox {
                        fighter: self.name.clone(),
                        frame_key: key.clone(),
                        which,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate and flatten into the form used at runtime.
    ///
    /// # Errors
    ///
    /// Returns any error from [`GeometryTable::validate`].
    pub fn resolve(&self) -> Result<ResolvedGeometry, GeometryError> {
        self.validate()?;

        let mut states = Vec::with_capacity(FighterState::COUNT);
        for state in FighterState::ALL {
            let animation = self.animation(state).unwrap_or_default();
            let mut frames = Vec::with_capacity(animation.len());
            for entry in animation {
                let def = self
                    .frames
                    .get(&entry.key)
                    .ok_or_else(|| self.missing_frame(&entry.key))?;
                frames.push(ResolvedFrame {
                    key: entry.key.clone(),
                    delay: entry.delay,
                    boxes: def.boxes,
                });
            }
            states.push(frames);
        }

        Ok(ResolvedGeometry {
            name: self.name.clone(),
            states,
        })
    }

    fn missing_frame(&self, key: &str) -> GeometryError {
        GeometryError::MissingFrame {
            fighter: self.name.clone(),
            frame_key: key.to_string(),
        }
    }
}

/// A frame with its boxes inlined.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFrame {
    /// Frame key
    pub key: String,
    /// Hold time
    pub delay: FrameDelay,
    /// Local collision boxes
    pub boxes: FrameBoxes,
}

/// Validated geometry, indexed by [`FighterState::index`].
///
/// Every state has at least one frame.
#[derive(Debug, Clone)]
pub struct ResolvedGeometry {
    name: String,
    states: Vec<Vec<ResolvedFrame>>,
}

impl ResolvedGeometry {
    /// Fighter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frames of a state.
    #[must_use]
    pub fn animation(&self, state: FighterState) -> &[ResolvedFrame] {
        self.states
            .get(state.index())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Frame `index` of a state. Out-of-range indices wrap.
    ///
    /// Returns `None` only for a state without frames, which validation rules out.
    #[must_use]
    pub fn frame(&self, state: FighterState, index: usize) -> Option<&ResolvedFrame> {
        let animation = self.animation(state);
        if animation.is_empty() {
            return None;
        }
        animation.get(index % animation.len())
    }

    /// Number of frames in a state's animation.
    #[must_use]
    pub fn frame_count(&self, state: FighterState) -> usize {
        self.animation(state).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(push: Rect, hit: Rect) -> FrameDef {
        FrameDef {
            sprite: Rect::new(0.0, 0.0, 64.0, 96.0),
            origin: Vec2::new(32.0, 92.0),
            boxes: FrameBoxes {
                push,
                hurt: [
                    Rect::new(-8.0, -88.0, 24.0, 16.0),
                    Rect::new(-26.0, -74.0, 40.0, 42.0),
                    Rect::new(-26.0, -31.0, 40.0, 32.0),
                ],
                hit,
            },
        }
    }

    fn complete_table() -> GeometryTable {
        let mut table = GeometryTable::new("test");
        table.insert_frame(
            "stand",
            frame(Rect::new(-16.0, -80.0, 32.0, 78.0), Rect::EMPTY),
        );
        for state in FighterState::ALL {
            table.set_animation(
                state,
                vec![
                    AnimationFrame::new("stand", FrameDelay::Ticks(4)),
                    AnimationFrame::new("stand", FrameDelay::Transition),
                ],
            );
        }
        table
    }

    #[test]
    fn test_frame_delay_parsing() {
        assert_eq!(FrameDelay::try_from(0), Ok(FrameDelay::Freeze));
        assert_eq!(FrameDelay::try_from(-2), Ok(FrameDelay::Transition));
        assert_eq!(FrameDelay::try_from(7), Ok(FrameDelay::Ticks(7)));
        assert_eq!(
            FrameDelay::try_from(-1),
            Err(GeometryError::InvalidFrameDelay { value: -1 })
        );
        assert_eq!(i32::from(FrameDelay::Transition), -2);
    }

    #[test]
    fn test_frame_delay_duration() {
        assert_eq!(FrameDelay::Freeze.duration_ms(), 0.0);
        assert!((FrameDelay::Ticks(6).duration_ms() - 100.0).abs() < 1e-9);
        assert!(FrameDelay::Transition.duration_ms() < 0.0);
        assert!(FrameDelay::Ticks(1).advances());
        assert!(!FrameDelay::Freeze.advances());
        assert!(!FrameDelay::Transition.advances());
    }

    #[test]
    fn test_actual_box_mirrors_when_facing_left() {
        let local = Rect::new(10.0, -50.0, 30.0, 20.0);
        let pos = Vec2::new(100.0, 200.0);

        let right = actual_box(pos, Direction::Right, local);
        assert_eq!(right, Rect::new(110.0, 150.0, 30.0, 20.0));

        let left = actual_box(pos, Direction::Left, local);
        assert_eq!(left, Rect::new(60.0, 150.0, 30.0, 20.0));
    }

    #[test]
    fn test_symmetric_box_is_direction_independent() {
        let local = Rect::new(-16.0, -80.0, 32.0, 78.0);
        let pos = Vec2::new(300.0, 220.0);
        assert_eq!(
            actual_box(pos, Direction::Left, local),
            actual_box(pos, Direction::Right, local)
        );
    }

    #[test]
    fn test_rects_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!rects_overlap(&a, &Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(!rects_overlap(&a, &Rect::new(0.0, 10.0, 5.0, 5.0)));
        assert!(rects_overlap(&a, &Rect::new(9.5, 9.5, 5.0, 5.0)));
    }

    #[test]
    fn test_compute_boxes() {
        let table = complete_table();
        let boxes = table
            .compute_boxes("stand", Vec2::new(100.0, 220.0), Direction::Right)
            .expect("frame exists");
        assert_eq!(boxes.push, Rect::new(84.0, 140.0, 32.0, 78.0));
        assert_eq!(boxes.hurt[0], Rect::new(92.0, 132.0, 24.0, 16.0));

        let err = table
            .compute_boxes("nope", Vec2::ZERO, Direction::Right)
            .unwrap_err();
        assert!(matches!(err, GeometryError::MissingFrame { .. }));
    }

    #[test]
    fn test_validate_complete_table() {
        assert!(complete_table().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_animation() {
        let mut table = complete_table();
        table.animations.remove(&FighterState::Victory);
        assert_eq!(
            table.validate(),
            Err(GeometryError::MissingAnimation {
                fighter: "test".to_string(),
                state: "victory".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_empty_animation() {
        let mut table = complete_table();
        table.set_animation(FighterState::Crouch, Vec::new());
        assert!(matches!(
            table.validate(),
            Err(GeometryError::EmptyAnimation { .. })
        ));
    }

    #[test]
    fn test_validate_unknown_frame_key() {
        let mut table = complete_table();
        table.set_animation(
            FighterState::Idle,
            vec![AnimationFrame::new("missing", FrameDelay::Freeze)],
        );
        assert_eq!(
            table.validate(),
            Err(GeometryError::MissingFrame {
                fighter: "test".to_string(),
                frame_key: "missing".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_malformed_box() {
        let mut table = complete_table();
        table.insert_frame(
            "stand",
            frame(
                Rect::new(-16.0, -80.0, -32.0, 78.0),
                Rect::EMPTY,
            ),
        );
        assert!(matches!(
            table.validate(),
            Err(GeometryError::MalformedBox { which: "push", .. })
        ));
    }

    #[test]
    fn test_resolve_indexes_every_state() {
        let resolved = complete_table().resolve().expect("valid table");
        for state in FighterState::ALL {
            assert_eq!(resolved.frame_count(state), 2);
        }
        let wrapped = resolved.frame(FighterState::Idle, 3).expect("frames");
        assert_eq!(wrapped.delay, FrameDelay::Transition);
    }

    #[test]
    fn test_resolve_fails_fast() {
        let mut table = complete_table();
        table.set_animation(FighterState::Ko, Vec::new());
        assert!(table.resolve().is_err());
    }
}
