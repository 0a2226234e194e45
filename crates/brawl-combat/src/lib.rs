//! # Brawl Combat
//!
//! Combat core of a two-player side-view fighting game.
//!
//! This crate provides:
//! - Fighter state machine with per-state entry and update behavior
//! - Per-frame collision geometry (push, hurt and hit boxes)
//! - Combat resolution with a health/score ledger
//! - Knockback slide physics
//! - Stage bounds and mutual push-out
//! - Input contracts for keyboards and decision providers
//! - Battle orchestration: round clock, hit-stop, knock-out and time-over
//! - Configuration, built-in roster and RON fighter assets
//! - Event bus for front ends

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod battle;
pub mod combat;
pub mod config;
pub mod events;
pub mod fighter;
pub mod geometry;
pub mod input;
pub mod roster;
pub mod slide;
pub mod stage;
pub mod state;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::battle::*;
    pub use crate::combat::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::fighter::*;
    pub use crate::geometry::*;
    pub use crate::input::*;
    pub use crate::roster::{builtin, resolve, FighterAsset, FrameAsset, ProfileError, BUILTIN_FIGHTERS};
    pub use crate::slide::*;
    pub use crate::stage::*;
    pub use crate::state::*;
}
