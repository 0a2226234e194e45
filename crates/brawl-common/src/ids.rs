//! Identifier types for combatants.

use serde::{Deserialize, Serialize};

/// Player slot of a combatant.
///
/// Combatants refer to each other through slots rather than references; the
/// battle owns both fighters and hands the opponent in on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerSlot {
    /// First player (updated first every tick)
    One,
    /// Second player
    Two,
}

impl PlayerSlot {
    /// Both slots in update order.
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    /// Array index of this slot.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// The other slot.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl std::fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => write!(f, "P1"),
            Self::Two => write!(f, "P2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index_and_opponent() {
        assert_eq!(PlayerSlot::One.index(), 0);
        assert_eq!(PlayerSlot::Two.index(), 1);
        assert_eq!(PlayerSlot::One.opponent(), PlayerSlot::Two);
        assert_eq!(PlayerSlot::Two.opponent(), PlayerSlot::One);
    }

    #[test]
    fn test_slot_display() {
        assert_eq!(PlayerSlot::One.to_string(), "P1");
        assert_eq!(PlayerSlot::Two.to_string(), "P2");
    }
}
