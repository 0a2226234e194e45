//! # Brawl Common
//!
//! Common types, utilities, and shared abstractions for the Brawl combat core.
//!
//! This crate provides foundational types used across the Brawl crates:
//! - Stage-space coordinates (`Vec2`, `Rect`, `Direction`)
//! - Player slot identifiers
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_exports() {
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        assert!(!rect.is_empty());
        assert_eq!(PlayerSlot::One.opponent(), PlayerSlot::Two);
        assert_eq!(Direction::Right.flipped(), Direction::Left);
    }
}
