//! Fighter roster.
//!
//! Two fighter types ship with the crate, `ryu` and `ken`. Additional fighters
//! are loaded from RON assets:
//!
//! ```ron
//! (
//!     name: "dan",
//!     movement: (walk_forward: 150.0),
//!     frames: {
//!         "idle-1": (
//!             sprite: (0.0, 0.0, 96.0, 112.0),
//!             origin: (48.0, 104.0),
//!             push: (-16.0, -80.0, 32.0, 78.0),
//!             hurt: ((-8.0, -88.0, 24.0, 16.0), (-26.0, -74.0, 40.0, 42.0), (-26.0, -31.0, 40.0, 32.0)),
//!         ),
//!     },
//!     animations: {
//!         "idle": [("idle-1", 0)],
//!     },
//! )
//! ```
//!
//! Delays use the integer encoding of [`FrameDelay`]. Assets are validated on
//! load; an incomplete asset is rejected.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use brawl_common::{AssetError, Rect, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::fighter::{FighterProfile, Movement};
use crate::geometry::{AnimationFrame, FrameBoxes, FrameDef, FrameDelay, GeometryTable};
use crate::state::FighterState;

/// Names of the fighters built into the crate.
pub const BUILTIN_FIGHTERS: [&str; 2] = ["ryu", "ken"];

/// Errors that can occur while building a fighter profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No built-in fighter has this name
    #[error("unknown fighter '{0}'")]
    UnknownFighter(String),

    /// An asset names a state that does not exist
    #[error("fighter '{fighter}' has an animation for unknown state '{key}'")]
    UnknownState {
        /// Fighter name
        fighter: String,
        /// Offending key
        key: String,
    },

    /// The asset could not be read, parsed or validated
    #[error(transparent)]
    Asset(#[from] AssetError),
}

// ============================================================================
// Box presets
// ============================================================================

mod boxes {
    pub const PUSH_IDLE: [f32; 4] = [-16.0, -80.0, 32.0, 78.0];
    pub const PUSH_JUMP: [f32; 4] = [-16.0, -91.0, 32.0, 66.0];
    pub const PUSH_BEND: [f32; 4] = [-16.0, -58.0, 32.0, 58.0];
    pub const PUSH_CROUCH: [f32; 4] = [-16.0, -50.0, 32.0, 50.0];

    pub const HURT_INVINCIBLE: [[f32; 4]; 3] = [[0.0; 4]; 3];
    pub const HURT_IDLE: [[f32; 4]; 3] = [
        [-8.0, -88.0, 24.0, 16.0],
        [-26.0, -74.0, 40.0, 42.0],
        [-26.0, -31.0, 40.0, 32.0],
    ];
    pub const HURT_BACKWARD: [[f32; 4]; 3] = [
        [-19.0, -88.0, 24.0, 16.0],
        [-26.0, -74.0, 40.0, 42.0],
        [-26.0, -31.0, 40.0, 32.0],
    ];
    pub const HURT_FORWARD: [[f32; 4]; 3] = [
        [-3.0, -88.0, 24.0, 16.0],
        [-26.0, -74.0, 40.0, 42.0],
        [-26.0, -31.0, 40.0, 32.0],
    ];
    pub const HURT_JUMP: [[f32; 4]; 3] = [
        [-13.0, -106.0, 28.0, 18.0],
        [-26.0, -90.0, 40.0, 42.0],
        [-22.0, -66.0, 38.0, 18.0],
    ];
    pub const HURT_BEND: [[f32; 4]; 3] = [
        [-2.0, -68.0, 24.0, 18.0],
        [-16.0, -53.0, 44.0, 24.0],
        [-16.0, -24.0, 44.0, 24.0],
    ];
    pub const HURT_CROUCH: [[f32; 4]; 3] = [
        [6.0, -61.0, 24.0, 18.0],
        [-16.0, -46.0, 44.0, 24.0],
        [-16.0, -24.0, 44.0, 24.0],
    ];
    pub const HURT_PUNCH: [[f32; 4]; 3] = [
        [11.0, -94.0, 24.0, 18.0],
        [-7.0, -77.0, 40.0, 43.0],
        [-7.0, -33.0, 40.0, 33.0],
    ];

    pub const NONE: [f32; 4] = [0.0; 4];
}

fn rect([x, y, width, height]: [f32; 4]) -> Rect {
    Rect::new(x, y, width, height)
}

fn rect_array(r: Rect) -> [f32; 4] {
    [r.x, r.y, r.width, r.height]
}

// ============================================================================
// Built-in fighters
// ============================================================================

/// One animation of a built-in fighter.
struct Clip {
    state: FighterState,
    push: [f32; 4],
    hurt: [[f32; 4]; 3],
    /// Delay per frame, with the frame's hit box
    frames: Vec<(i32, [f32; 4])>,
}

impl Clip {
    fn new(state: FighterState, push: [f32; 4], hurt: [[f32; 4]; 3], delays: &[i32]) -> Self {
        Self {
            state,
            push,
            hurt,
            frames: delays.iter().map(|&delay| (delay, boxes::NONE)).collect(),
        }
    }

    /// Give frame `index` a hit box.
    fn strike(mut self, index: usize, hit: [f32; 4]) -> Self {
        if let Some(frame) = self.frames.get_mut(index) {
            frame.1 = hit;
        }
        self
    }
}

const SPRITE_WIDTH: f32 = 96.0;
const SPRITE_HEIGHT: f32 = 112.0;
const SHEET_COLUMNS: usize = 16;

/// Strike boxes that differ between the built-in fighters.
struct Reach {
    light_punch: [f32; 4],
    medium_punch: [f32; 4],
    heavy_punch: [f32; 4],
    light_kick: [f32; 4],
    medium_kick: [f32; 4],
    heavy_kick: [f32; 4],
}

fn reach(name: &str) -> Option<Reach> {
    match name {
        "ryu" => Some(Reach {
            light_punch: [16.0, -84.0, 40.0, 14.0],
            medium_punch: [18.0, -84.0, 44.0, 14.0],
            heavy_punch: [20.0, -86.0, 48.0, 16.0],
            light_kick: [20.0, -60.0, 40.0, 14.0],
            medium_kick: [24.0, -70.0, 48.0, 16.0],
            heavy_kick: [24.0, -84.0, 52.0, 18.0],
        }),
        "ken" => Some(Reach {
            light_punch: [16.0, -84.0, 40.0, 14.0],
            medium_punch: [18.0, -85.0, 46.0, 14.0],
            heavy_punch: [20.0, -86.0, 50.0, 16.0],
            light_kick: [20.0, -62.0, 42.0, 14.0],
            medium_kick: [24.0, -72.0, 50.0, 16.0],
            heavy_kick: [26.0, -86.0, 54.0, 18.0],
        }),
        _ => None,
    }
}

fn clips(reach: &Reach) -> Vec<Clip> {
    use boxes::*;
    use FighterState as S;

    const T: i32 = -2;
    const F: i32 = 0;

    let hurt = |state: FighterState| -> Clip {
        let hold = match state {
            S::HurtHeadLight | S::HurtBodyLight => 7,
            S::HurtHeadMedium | S::HurtBodyMedium => 9,
            _ => 13,
        };
        Clip::new(state, PUSH_IDLE, HURT_IDLE, &[7, 7, hold, T])
    };

    vec![
        Clip::new(S::Idle, PUSH_IDLE, HURT_IDLE, &[4, 4, 4, 4]),
        Clip::new(S::WalkForward, PUSH_IDLE, HURT_FORWARD, &[3, 6, 4, 4, 6, 3]),
        Clip::new(S::WalkBackward, PUSH_IDLE, HURT_BACKWARD, &[3, 6, 4, 4, 6, 3]),
        Clip::new(S::JumpStart, PUSH_BEND, HURT_BEND, &[2, T]),
        Clip::new(S::JumpUp, PUSH_JUMP, HURT_JUMP, &[8, 10, 10, 10, 8, F]),
        Clip::new(S::JumpForward, PUSH_JUMP, HURT_JUMP, &[13, 5, 3, 3, 3, 5, F]),
        Clip::new(S::JumpBackward, PUSH_JUMP, HURT_JUMP, &[15, 3, 3, 3, 3, 6, F]),
        Clip::new(S::JumpLand, PUSH_BEND, HURT_BEND, &[2, 10, T]),
        Clip::new(S::Crouch, PUSH_CROUCH, HURT_CROUCH, &[F]),
        Clip::new(S::CrouchDown, PUSH_BEND, HURT_BEND, &[2, 2, 2, T]),
        Clip::new(S::CrouchUp, PUSH_BEND, HURT_BEND, &[2, 2, 2, T]),
        Clip::new(S::IdleTurn, PUSH_IDLE, HURT_IDLE, &[2, 2, T]),
        Clip::new(S::CrouchTurn, PUSH_CROUCH, HURT_CROUCH, &[2, 2, T]),
        Clip::new(S::LightPunch, PUSH_IDLE, HURT_PUNCH, &[4, 8, 4, T]).strike(1, reach.light_punch),
        Clip::new(S::MediumPunch, PUSH_IDLE, HURT_PUNCH, &[3, 2, 4, 4, 3, T])
            .strike(2, reach.medium_punch),
        Clip::new(S::HeavyPunch, PUSH_IDLE, HURT_PUNCH, &[3, 2, 6, 10, 10, T])
            .strike(2, reach.heavy_punch),
        Clip::new(S::LightKick, PUSH_IDLE, HURT_IDLE, &[3, 7, 5, T]).strike(1, reach.light_kick),
        Clip::new(S::MediumKick, PUSH_IDLE, HURT_IDLE, &[5, 6, 12, T]).strike(1, reach.medium_kick),
        Clip::new(S::HeavyKick, PUSH_IDLE, HURT_IDLE, &[2, 4, 8, 10, 7, T])
            .strike(2, reach.heavy_kick),
        hurt(S::HurtHeadLight),
        hurt(S::HurtHeadMedium),
        hurt(S::HurtHeadHeavy),
        hurt(S::HurtBodyLight),
        hurt(S::HurtBodyMedium),
        hurt(S::HurtBodyHeavy),
        Clip::new(S::Ko, PUSH_IDLE, HURT_INVINCIBLE, &[2, 5, F, 10, T]),
        Clip::new(S::Victory, PUSH_IDLE, HURT_IDLE, &[4, 4, 4, F]),
    ]
}

/// Geometry table of a built-in fighter.
pub fn builtin_table(name: &str) -> Result<GeometryTable, ProfileError> {
    let key = name.to_ascii_lowercase();
    let reach = reach(&key).ok_or_else(|| ProfileError::UnknownFighter(name.to_string()))?;
    build_table(key, clips(&reach))
}

fn build_table(name: String, clips: Vec<Clip>) -> Result<GeometryTable, ProfileError> {
    let mut table = GeometryTable::new(name);
    let mut sprite_index = 0usize;

    for clip in clips {
        let mut animation = Vec::with_capacity(clip.frames.len());
        for (i, (delay, hit)) in clip.frames.iter().enumerate() {
            let key = format!("{}-{}", clip.state.as_str(), i + 1);
            let column = sprite_index % SHEET_COLUMNS;
            let row = sprite_index / SHEET_COLUMNS;
            sprite_index += 1;

            table.insert_frame(
                key.clone(),
                FrameDef {
                    sprite: Rect::new(
                        column as f32 * SPRITE_WIDTH,
                        row as f32 * SPRITE_HEIGHT,
                        SPRITE_WIDTH,
                        SPRITE_HEIGHT,
                    ),
                    origin: Vec2::new(SPRITE_WIDTH / 2.0, SPRITE_HEIGHT - 8.0),
                    boxes: FrameBoxes {
                        push: rect(clip.push),
                        hurt: clip.hurt.map(rect),
                        hit: rect(*hit),
                    },
                },
            );
            let delay = FrameDelay::try_from(*delay).map_err(AssetError::from)?;
            animation.push(AnimationFrame::new(key, delay));
        }
        table.set_animation(clip.state, animation);
    }
    Ok(table)
}

/// Profile of a built-in fighter.
pub fn builtin(name: &str) -> Result<Arc<FighterProfile>, ProfileError> {
    let table = builtin_table(name)?;
    let profile = FighterProfile::new(&table, Movement::default()).map_err(AssetError::from)?;
    Ok(Arc::new(profile))
}

/// Resolve a fighter reference: a built-in name, or a path to a `.ron` asset.
pub fn resolve(reference: &str) -> Result<Arc<FighterProfile>, ProfileError> {
    if Path::new(reference)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ron"))
    {
        let asset = FighterAsset::load(reference)?;
        return asset.into_profile().map(Arc::new);
    }
    builtin(reference)
}

// ============================================================================
// RON assets
// ============================================================================

/// One frame of a fighter asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAsset {
    /// Sprite sheet region `(x, y, width, height)`
    pub sprite: [f32; 4],
    /// Draw origin inside the sprite
    pub origin: [f32; 2],
    /// Push box
    pub push: [f32; 4],
    /// Head, body and feet hurt boxes
    pub hurt: [[f32; 4]; 3],
    /// Hit box, if the frame strikes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit: Option<[f32; 4]>,
}

/// Serialized fighter definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterAsset {
    /// Fighter name
    pub name: String,
    /// Movement constants
    #[serde(default)]
    pub movement: Movement,
    /// Frames by key
    pub frames: BTreeMap<String, FrameAsset>,
    /// Animations by state key
    pub animations: BTreeMap<String, Vec<(String, FrameDelay)>>,
}

impl FighterAsset {
    /// Read an asset from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(AssetError::from)?;
        let asset = Self::from_ron_str(&contents)?;
        info!("Loaded fighter '{}' from {}", asset.name, path.display());
        Ok(asset)
    }

    /// Parse an asset.
    pub fn from_ron_str(contents: &str) -> Result<Self, ProfileError> {
        ron::from_str(contents).map_err(|e| AssetError::Parse(e.to_string()).into())
    }

    /// Serialize as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ProfileError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| AssetError::Parse(e.to_string()).into())
    }

    /// Capture a geometry table as an asset.
    #[must_use]
    pub fn from_table(table: &GeometryTable, movement: Movement) -> Self {
        let frames = table
            .frames()
            .map(|(key, frame)| {
                let hit = (!frame.boxes.hit.is_empty()).then(|| rect_array(frame.boxes.hit));
                (
                    key.to_string(),
                    FrameAsset {
                        sprite: rect_array(frame.sprite),
                        origin: [frame.origin.x, frame.origin.y],
                        push: rect_array(frame.boxes.push),
                        hurt: frame.boxes.hurt.map(rect_array),
                        hit,
                    },
                )
            })
            .collect();

        let animations = FighterState::ALL
            .into_iter()
            .filter_map(|state| {
                let frames = table.animation(state)?;
                Some((
                    state.as_str().to_string(),
                    frames
                        .iter()
                        .map(|frame| (frame.key.clone(), frame.delay))
                        .collect(),
                ))
            })
            .collect();

        Self {
            name: table.name().to_string(),
            movement,
            frames,
            animations,
        }
    }

    /// Build the geometry table described by this asset.
    pub fn to_table(&self) -> Result<GeometryTable, ProfileError> {
        let mut table = GeometryTable::new(self.name.clone());
        for (key, frame) in &self.frames {
            table.insert_frame(
                key.clone(),
                FrameDef {
                    sprite: rect(frame.sprite),
                    origin: Vec2::new(frame.origin[0], frame.origin[1]),
                    boxes: FrameBoxes {
                        push: rect(frame.push),
                        hurt: frame.hurt.map(rect),
                        hit: frame.hit.map_or(Rect::EMPTY, rect),
                    },
                },
            );
        }
        for (key, frames) in &self.animations {
            let state = FighterState::from_key(key).ok_or_else(|| ProfileError::UnknownState {
                fighter: self.name.clone(),
                key: key.clone(),
            })?;
            table.set_animation(
                state,
                frames
                    .iter()
                    .map(|(frame_key, delay)| AnimationFrame::new(frame_key.clone(), *delay))
                    .collect(),
            );
        }
        Ok(table)
    }

    /// Validate and build a profile.
    pub fn into_profile(self) -> Result<FighterProfile, ProfileError> {
        let table = self.to_table()?;
        FighterProfile::new(&table, self.movement).map_err(|e| AssetError::from(e).into())
    }
}
