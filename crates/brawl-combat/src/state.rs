//! Fighter states and the per-state definition table.
//!
//! Every state is described by a [`StateDef`]: its one-shot entry action, its
//! per-tick behavior, the set of states it may be entered from, and (for
//! attacks) the strike it performs. The fighter dispatches on these tags
//! instead of carrying one handler type per state.

use serde::{Deserialize, Serialize};

use crate::geometry::FRAME_TIME_MS;

// ============================================================================
// Attack descriptors
// ============================================================================

/// Strength of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackStrength {
    /// Light attack
    Light,
    /// Medium attack
    Medium,
    /// Heavy attack
    Heavy,
}

/// Score, damage and knockback of one attack strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackData {
    /// Score awarded to the attacker
    pub score: u32,
    /// Hit points removed from the defender
    pub damage: i32,
    /// Initial slide velocity applied to the defender (non-positive)
    pub slide_velocity: f32,
    /// Rate at which the slide decays back to zero
    pub slide_friction: f32,
}

impl AttackStrength {
    /// All strengths, weakest first.
    pub const ALL: [Self; 3] = [Self::Light, Self::Medium, Self::Heavy];

    /// Fixed balance table for this strength.
    #[must_use]
    pub fn data(self) -> AttackData {
        let frame = FRAME_TIME_MS as f32;
        match self {
            Self::Light => AttackData {
                score: 100,
                damage: 12,
                slide_velocity: -12.0 * frame,
                slide_friction: 600.0,
            },
            Self::Medium => AttackData {
                score: 300,
                damage: 20,
                slide_velocity: -16.0 * frame,
                slide_friction: 600.0,
            },
            Self::Heavy => AttackData {
                score: 500,
                damage: 28,
                slide_velocity: -22.0 * frame,
                slide_friction: 800.0,
            },
        }
    }
}

/// Limb used by an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackKind {
    /// Punch
    Punch,
    /// Kick
    Kick,
}

/// Named vulnerable region of a fighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HurtLocation {
    /// Head box
    Head,
    /// Body box
    Body,
    /// Feet box
    Feet,
}

impl HurtLocation {
    /// Order in which hurt boxes are tested; the first overlap wins.
    pub const PRIORITY: [Self; 3] = [Self::Head, Self::Body, Self::Feet];

    /// Index into a `[Rect; 3]` hurt box array.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Head => 0,
            Self::Body => 1,
            Self::Feet => 2,
        }
    }
}

// ============================================================================
// Fighter states
// ============================================================================

/// What a fighter is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FighterState {
    /// Standing still
    Idle,
    /// Walking toward the opponent
    WalkForward,
    /// Walking away from the opponent
    WalkBackward,
    /// Crouching before take-off
    JumpStart,
    /// Airborne, straight up
    JumpUp,
    /// Airborne, toward the opponent
    JumpForward,
    /// Airborne, away from the opponent
    JumpBackward,
    /// Recovering from a landing
    JumpLand,
    /// Holding a crouch
    Crouch,
    /// Going down into a crouch
    CrouchDown,
    /// Standing up from a crouch
    CrouchUp,
    /// Turning around while standing
    IdleTurn,
    /// Turning around while crouched
    CrouchTurn,
    /// Light punch
    LightPunch,
    /// Medium punch
    MediumPunch,
    /// Heavy punch
    HeavyPunch,
    /// Light kick
    LightKick,
    /// Medium kick
    MediumKick,
    /// Heavy kick
    HeavyKick,
    /// Hit in the head by a light attack
    HurtHeadLight,
    /// Hit in the head by a medium attack
    HurtHeadMedium,
    /// Hit in the head by a heavy attack
    HurtHeadHeavy,
    /// Hit in the body by a light attack
    HurtBodyLight,
    /// Hit in the body by a medium attack
    HurtBodyMedium,
    /// Hit in the body by a heavy attack
    HurtBodyHeavy,
    /// Knocked out (terminal)
    Ko,
    /// Won the round (terminal)
    Victory,
}

/// One-shot action run when a state is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Nothing
    None,
    /// Zero velocity
    Idle,
    /// Set horizontal walk velocity
    Move,
    /// Zero velocity before take-off
    JumpStart,
    /// Set take-off velocity
    Jump,
    /// Zero velocity, landing cue
    JumpLand,
    /// Zero velocity
    CrouchDown,
    /// Zero velocity, clear strike guard, swing cue
    Attack,
    /// Zero velocity, start hurt shake
    Hurt,
    /// Zero velocity, disable controls
    Ko,
}

/// Per-tick behavior of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Reads all inputs
    Idle,
    /// Walks forward until released
    WalkForward,
    /// Walks backward until released
    WalkBackward,
    /// Branches into an aerial state on completion
    JumpStart,
    /// Falls under gravity until the floor
    Airborne,
    /// Branches after landing
    JumpLand,
    /// Holds the crouch while down is held
    Crouch,
    /// Goes down while down is held
    CrouchDown,
    /// Returns to idle on completion
    CrouchUp,
    /// Returns to idle on completion
    IdleTurn,
    /// Returns to crouch on completion
    CrouchTurn,
    /// Attack with a chain window on a fresh press of the same button
    LightAttack,
    /// Attack that returns to idle on completion
    Attack,
    /// Hit reaction
    Hurt,
    /// Falls to the floor and stays down
    Ko,
    /// Display marker
    Victory,
}

/// Definition of one state.
#[derive(Debug, Clone, Copy)]
pub struct StateDef {
    /// Entry action
    pub entry: Entry,
    /// Per-tick behavior
    pub behavior: Behavior,
    /// States this state may be entered from
    pub valid_from: &'static [FighterState],
    /// Strike performed while in this state
    pub attack: Option<(AttackKind, AttackStrength)>,
}

use FighterState as S;

const FROM_IDLE: &[FighterState] = &[
    S::Idle,
    S::WalkForward,
    S::WalkBackward,
    S::JumpUp,
    S::JumpForward,
    S::JumpBackward,
    S::CrouchUp,
    S::JumpLand,
    S::IdleTurn,
    S::LightPunch,
    S::MediumPunch,
    S::HeavyPunch,
    S::LightKick,
    S::MediumKick,
    S::HeavyKick,
    S::HurtHeadLight,
    S::HurtHeadMedium,
    S::HurtHeadHeavy,
    S::HurtBodyLight,
    S::HurtBodyMedium,
    S::HurtBodyHeavy,
];

const FROM_GROUNDED: &[FighterState] = &[S::Idle, S::WalkForward, S::WalkBackward];

const FROM_JUMP_START: &[FighterState] = &[S::JumpStart];

const FROM_HURTABLE: &[FighterState] = &[
    S::Idle,
    S::IdleTurn,
    S::WalkForward,
    S::WalkBackward,
    S::JumpStart,
    S::JumpLand,
    S::LightPunch,
    S::MediumPunch,
    S::HeavyPunch,
    S::LightKick,
    S::MediumKick,
    S::HeavyKick,
    S::HurtHeadLight,
    S::HurtHeadMedium,
    S::HurtHeadHeavy,
    S::HurtBodyLight,
    S::HurtBodyMedium,
    S::HurtBodyHeavy,
    S::Crouch,
    S::CrouchUp,
    S::CrouchDown,
];

const FROM_KO: &[FighterState] = &[
    S::Idle,
    S::WalkForward,
    S::WalkBackward,
    S::JumpUp,
    S::JumpForward,
    S::JumpBackward,
    S::Crouch,
    S::CrouchDown,
    S::CrouchUp,
    S::HurtBodyLight,
    S::HurtBodyMedium,
    S::HurtBodyHeavy,
    S::HurtHeadLight,
    S::HurtHeadMedium,
    S::HurtHeadHeavy,
];

impl FighterState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 27] = [
        S::Idle,
        S::WalkForward,
        S::WalkBackward,
        S::JumpStart,
        S::JumpUp,
        S::JumpForward,
        S::JumpBackward,
        S::JumpLand,
        S::Crouch,
        S::CrouchDown,
        S::CrouchUp,
        S::IdleTurn,
        S::CrouchTurn,
        S::LightPunch,
        S::MediumPunch,
        S::HeavyPunch,
        S::LightKick,
        S::MediumKick,
        S::HeavyKick,
        S::HurtHeadLight,
        S::HurtHeadMedium,
        S::HurtHeadHeavy,
        S::HurtBodyLight,
        S::HurtBodyMedium,
        S::HurtBodyHeavy,
        S::Ko,
        S::Victory,
    ];

    /// Number of states.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index of this state, matching its position in [`FighterState::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Asset key of this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            S::Idle => "idle",
            S::WalkForward => "walk-forwards",
            S::WalkBackward => "walk-backwards",
            S::JumpStart => "jump-start",
            S::JumpUp => "jump-up",
            S::JumpForward => "jump-forwards",
            S::JumpBackward => "jump-backwards",
            S::JumpLand => "jump-land",
            S::Crouch => "crouch",
            S::CrouchDown => "crouch-down",
            S::CrouchUp => "crouch-up",
            S::IdleTurn => "idle-turn",
            S::CrouchTurn => "crouch-turn",
            S::LightPunch => "light-punch",
            S::MediumPunch => "medium-punch",
            S::HeavyPunch => "heavy-punch",
            S::LightKick => "light-kick",
            S::MediumKick => "medium-kick",
            S::HeavyKick => "heavy-kick",
            S::HurtHeadLight => "hurt-head-light",
            S::HurtHeadMedium => "hurt-head-medium",
            S::HurtHeadHeavy => "hurt-head-heavy",
            S::HurtBodyLight => "hurt-body-light",
            S::HurtBodyMedium => "hurt-body-medium",
            S::HurtBodyHeavy => "hurt-body-heavy",
            S::Ko => "ko",
            S::Victory => "victory",
        }
    }

    /// Parse an asset key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == key)
    }

    /// Definition of this state.
    #[must_use]
    pub fn def(self) -> StateDef {
        let (entry, behavior, valid_from, attack) = match self {
            S::Idle => (Entry::Idle, Behavior::Idle, FROM_IDLE, None),
            S::WalkForward => (
                Entry::Move,
                Behavior::WalkForward,
                &[S::Idle, S::WalkBackward][..],
                None,
            ),
            S::WalkBackward => (
                Entry::Move,
                Behavior::WalkBackward,
                &[S::Idle, S::WalkForward][..],
                None,
            ),
            S::JumpStart => (
                Entry::JumpStart,
                Behavior::JumpStart,
                &[S::Idle, S::WalkForward, S::WalkBackward, S::JumpLand][..],
                None,
            ),
            S::JumpUp | S::JumpForward | S::JumpBackward => {
                (Entry::Jump, Behavior::Airborne, FROM_JUMP_START, None)
            },
            S::JumpLand => (
                Entry::JumpLand,
                Behavior::JumpLand,
                &[S::JumpUp, S::JumpForward, S::JumpBackward][..],
                None,
            ),
            S::Crouch => (
                Entry::None,
                Behavior::Crouch,
                &[S::CrouchDown, S::CrouchTurn][..],
                None,
            ),
            S::CrouchDown => (Entry::CrouchDown, Behavior::CrouchDown, FROM_GROUNDED, None),
            S::CrouchUp => (
                Entry::None,
                Behavior::CrouchUp,
                &[S::Crouch, S::CrouchDown, S::CrouchTurn][..],
                None,
            ),
            S::IdleTurn => (
                Entry::None,
                Behavior::IdleTurn,
                &[S::Idle, S::JumpLand, S::WalkForward, S::WalkBackward][..],
                None,
            ),
            S::CrouchTurn => (Entry::None, Behavior::CrouchTurn, &[S::Crouch][..], None),
            S::LightPunch => (
                Entry::Attack,
                Behavior::LightAttack,
                FROM_GROUNDED,
                Some((AttackKind::Punch, AttackStrength::Light)),
            ),
            S::MediumPunch => (
                Entry::Attack,
                Behavior::Attack,
                FROM_GROUNDED,
                Some((AttackKind::Punch, AttackStrength::Medium)),
            ),
            S::HeavyPunch => (
                Entry::Attack,
                Behavior::Attack,
                FROM_GROUNDED,
                Some((AttackKind::Punch, AttackStrength::Heavy)),
            ),
            S::LightKick => (
                Entry::Attack,
                Behavior::LightAttack,
                FROM_GROUNDED,
                Some((AttackKind::Kick, AttackStrength::Light)),
            ),
            S::MediumKick => (
                Entry::Attack,
                Behavior::Attack,
                FROM_GROUNDED,
                Some((AttackKind::Kick, AttackStrength::Medium)),
            ),
            S::HeavyKick => (
                Entry::Attack,
                Behavior::Attack,
                FROM_GROUNDED,
                Some((AttackKind::Kick, AttackStrength::Heavy)),
            ),
            S::HurtHeadLight
            | S::HurtHeadMedium
            | S::HurtHeadHeavy
            | S::HurtBodyLight
            | S::HurtBodyMedium
            | S::HurtBodyHeavy => (Entry::Hurt, Behavior::Hurt, FROM_HURTABLE, None),
            S::Ko => (Entry::Ko, Behavior::Ko, FROM_KO, None),
            S::Victory => (Entry::None, Behavior::Victory, &[S::Idle][..], None),
        };

        StateDef {
            entry,
            behavior,
            valid_from,
            attack,
        }
    }

    /// Whether a transition from `current` into this state is legal.
    #[must_use]
    pub fn can_enter_from(self, current: Self) -> bool {
        self != current && self.def().valid_from.contains(&current)
    }

    /// Attack performed in this state, if any.
    #[must_use]
    pub fn attack(self) -> Option<(AttackKind, AttackStrength)> {
        self.def().attack
    }

    /// Whether this is one of the six attack states.
    #[must_use]
    pub fn is_attack(self) -> bool {
        self.attack().is_some()
    }

    /// Whether this is one of the six hurt states.
    #[must_use]
    pub fn is_hurt(self) -> bool {
        matches!(self.def().behavior, Behavior::Hurt)
    }

    /// Whether the fighter is in the air.
    #[must_use]
    pub fn is_airborne(self) -> bool {
        matches!(self, S::JumpUp | S::JumpForward | S::JumpBackward)
    }

    /// States an overlapping opponent may nudge out of the way.
    #[must_use]
    pub fn is_passively_pushable(self) -> bool {
        matches!(self, S::Idle | S::Crouch) || self.is_airborne()
    }

    /// Hurt state for a hit of `strength` landing on `location`.
    ///
    /// Feet hits use the body reaction.
    #[must_use]
    pub fn hurt_for(strength: AttackStrength, location: HurtLocation) -> Self {
        match (strength, location) {
            (AttackStrength::Light, HurtLocation::Head) => S::HurtHeadLight,
            (AttackStrength::Medium, HurtLocation::Head) => S::HurtHeadMedium,
            (AttackStrength::Heavy, HurtLocation::Head) => S::HurtHeadHeavy,
            (AttackStrength::Light, _) => S::HurtBodyLight,
            (AttackStrength::Medium, _) => S::HurtBodyMedium,
            (AttackStrength::Heavy, _) => S::HurtBodyHeavy,
        }
    }
}

impl std::fmt::Display for FighterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
