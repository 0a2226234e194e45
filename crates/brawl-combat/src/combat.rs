//! Attack resolution and the health/score ledger.

use brawl_common::{PlayerSlot, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fighter::{Fighter, TickContext};
use crate::geometry::rects_overlap;
use crate::state::{AttackKind, AttackStrength, HurtLocation};

/// Half-width of the random offset applied to hit effect positions.
pub const HIT_JITTER: f32 = 4.0;

/// A registered hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    /// Attacking slot
    pub attacker: PlayerSlot,
    /// Defending slot
    pub defender: PlayerSlot,
    /// Where to spawn the hit effect
    pub position: Vec2,
    /// Attack strength
    pub strength: AttackStrength,
    /// Punch or kick
    pub kind: AttackKind,
    /// Hurt box that was struck
    pub location: HurtLocation,
}

/// Sound a fighter wants played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// An attack started
    Swing(AttackStrength),
    /// An attack connected
    Hit {
        /// Attack strength
        strength: AttackStrength,
        /// Punch or kick
        kind: AttackKind,
    },
    /// Landed from a jump
    Land,
}

/// Receiver of combat notifications, called synchronously during a tick.
pub trait CombatListener {
    /// An attack connected.
    fn on_attack_hit(&mut self, event: &HitEvent);

    /// A fighter requested a sound.
    fn on_sound_cue(&mut self, _slot: PlayerSlot, _cue: SoundCue) {}
}

/// Listener that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullListener;

impl CombatListener for NullListener {
    fn on_attack_hit(&mut self, _event: &HitEvent) {}
}

/// Test `attacker`'s hit box against `defender`'s hurt boxes.
///
/// Only fighters in an attack state that has not yet connected are tested.
/// Hurt boxes are checked head, body, feet; the first overlap is the only hit.
/// On a hit the listener is notified, the defender reacts and the attacker's
/// strike guard is set.
pub fn resolve_attack(
    attacker: &mut Fighter,
    defender: &mut Fighter,
    ctx: &mut TickContext<'_>,
) -> Option<HitEvent> {
    if attacker.attack_struck() {
        return None;
    }
    let (kind, strength) = attacker.state().attack()?;

    let hit_box = attacker.hit_box();
    let hurt_boxes = defender.hurt_boxes();
    let location = HurtLocation::PRIORITY
        .into_iter()
        .find(|location| rects_overlap(&hit_box, &hurt_boxes[location.index()]))?;
    let hurt_box = hurt_boxes[location.index()];

    let center = hit_box.center().midpoint(hurt_box.center());
    let position = Vec2::new(
        center.x - (HIT_JITTER - ctx.rng.f32() * HIT_JITTER * 2.0),
        center.y - (HIT_JITTER - ctx.rng.f32() * HIT_JITTER * 2.0),
    );

    let event = HitEvent {
        attacker: attacker.slot(),
        defender: defender.slot(),
        position,
        strength,
        kind,
        location,
    };
    debug!(
        attacker = %event.attacker,
        defender = %event.defender,
        ?strength,
        ?kind,
        ?location,
        "attack hit"
    );

    attacker.queue_cue(SoundCue::Hit { strength, kind });
    ctx.listener.on_attack_hit(&event);
    defender.sync_clock(ctx.time.previous);
    defender.receive_hit(strength, location);
    attacker.mark_attack_struck();
    Some(event)
}

// ============================================================================
// Ledger
// ============================================================================

/// Health and score of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Fighter name
    pub name: String,
    /// Remaining hit points, in `[0, max]`
    pub hit_points: i32,
    /// Accumulated score
    pub score: u32,
}

/// Health and score of both players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleLedger {
    records: [PlayerRecord; 2],
    max_hit_points: i32,
}

impl BattleLedger {
    /// Creates a ledger with both players at full health.
    #[must_use]
    pub fn new(names: [&str; 2], max_hit_points: i32) -> Self {
        let max_hit_points = max_hit_points.max(0);
        Self {
            records: names.map(|name| PlayerRecord {
                name: name.to_string(),
                hit_points: max_hit_points,
                score: 0,
            }),
            max_hit_points,
        }
    }

    /// Record of one player.
    #[must_use]
    pub fn record(&self, slot: PlayerSlot) -> &PlayerRecord {
        &self.records[slot.index()]
    }

    /// Remaining hit points.
    #[must_use]
    pub fn hit_points(&self, slot: PlayerSlot) -> i32 {
        self.records[slot.index()].hit_points
    }

    /// Score.
    #[must_use]
    pub fn score(&self, slot: PlayerSlot) -> u32 {
        self.records[slot.index()].score
    }

    /// Health ceiling.
    #[must_use]
    pub fn max_hit_points(&self) -> i32 {
        self.max_hit_points
    }

    /// Credit the attacker and damage the defender, clamping health at zero.
    pub fn apply_hit(&mut self, event: &HitEvent) {
        let data = event.strength.data();

        let attacker = &mut self.records[event.attacker.index()];
        attacker.score = attacker.score.saturating_add(data.score);

        let defender = &mut self.records[event.defender.index()];
        defender.hit_points = (defender.hit_points - data.damage).clamp(0, self.max_hit_points);
    }

    /// Whether a player has no health left.
    #[must_use]
    pub fn is_depleted(&self, slot: PlayerSlot) -> bool {
        self.hit_points(slot) <= 0
    }
}

impl CombatListener for BattleLedger {
    fn on_attack_hit(&mut self, event: &HitEvent) {
        self.apply_hit(event);
    }
}
