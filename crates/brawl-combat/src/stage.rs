//! Stage bounds and fighter-to-fighter push resolution.
//!
//! Both operations run inside the updating fighter's tick and may move the
//! opponent. The second fighter to update sees the first one's resolved
//! position, so push-out is not symmetric within a tick.

use brawl_common::Rect;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fighter::Fighter;
use crate::geometry::FrameTime;

/// Height of the stage floor.
pub const STAGE_FLOOR: f32 = 220.0;

/// Rate at which an overlapping idle or airborne opponent is nudged away.
pub const PUSH_FRICTION: f32 = 66.0;

/// Visible play area and floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    /// Region both push boxes must stay inside
    pub viewport: Rect,
    /// Floor height
    pub floor: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            viewport: Rect::new(448.0, 16.0, 384.0, 224.0),
            floor: STAGE_FLOOR,
        }
    }
}

impl Arena {
    /// Creates an arena.
    #[must_use]
    pub const fn new(viewport: Rect, floor: f32) -> Self {
        Self { viewport, floor }
    }
}

/// Keep `fighter`'s push box inside the viewport.
///
/// A fighter stopped by a wall gives its outstanding slide to the opponent.
/// Returns whether a wall was hit.
pub fn constrain_to_stage(fighter: &mut Fighter, opponent: &mut Fighter, arena: &Arena) -> bool {
    let viewport = arena.viewport;
    let mut clamped = false;

    let push = fighter.push_box();
    if push.right() > viewport.right() {
        fighter.position_mut().x -= push.right() - viewport.right();
        transfer_slide(fighter, opponent);
        clamped = true;
    }

    let push = fighter.push_box();
    if push.x < viewport.x {
        fighter.position_mut().x += viewport.x - push.x;
        transfer_slide(fighter, opponent);
        clamped = true;
    }

    clamped
}

fn transfer_slide(fighter: &mut Fighter, opponent: &mut Fighter) {
    let slide = fighter.slide_mut().take();
    if slide.is_active() {
        debug!(
            from = %fighter.slot(),
            to = %opponent.slot(),
            velocity = slide.velocity,
            "wall slide transfer"
        );
    }
    opponent.slide_mut().apply(slide);
}

/// Separate overlapping push boxes.
///
/// `fighter` is moved to just outside `opponent`'s push box (never past the
/// viewport). An opponent standing, crouching or airborne is also nudged away.
/// Returns whether the boxes overlapped.
pub fn resolve_push(
    fighter: &mut Fighter,
    opponent: &mut Fighter,
    arena: &Arena,
    time: FrameTime,
) -> bool {
    if !fighter.has_collided_with(opponent) {
        return false;
    }
    let viewport = arena.viewport;
    let nudge = PUSH_FRICTION * time.seconds_passed;

    if fighter.position().x <= opponent.position().x {
        let mine = fighter.push_box();
        let theirs = opponent.push_box();
        let x = fighter.position().x;
        let target = x + (theirs.x - mine.right());
        let min_x = x + (viewport.x - mine.x);
        fighter.position_mut().x = target.max(min_x);

        if opponent.state().is_passively_pushable() {
            nudge_within(opponent, nudge, viewport);
        }
    }

    if fighter.position().x >= opponent.position().x {
        let mine = fighter.push_box();
        let theirs = opponent.push_box();
        let x = fighter.position().x;
        let target = x + (theirs.right() - mine.x);
        let max_x = x + (viewport.right() - mine.right());
        fighter.position_mut().x = target.min(max_x);

        if opponent.state().is_passively_pushable() {
            nudge_within(opponent, -nudge, viewport);
        }
    }

    true
}

fn nudge_within(fighter: &mut Fighter, dx: f32, viewport: Rect) {
    fighter.position_mut().x += dx;
    let push = fighter.push_box();
    if push.right() > viewport.right() {
        fighter.position_mut().x -= push.right() - viewport.right();
    } else if push.x < viewport.x {
        fighter.position_mut().x += viewport.x - push.x;
    }
}
