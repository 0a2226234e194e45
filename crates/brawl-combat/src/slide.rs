//! Knockback slide.
//!
//! A slide is a horizontal impulse stored as a non-positive velocity (it always
//! pushes a fighter away from the way it faces) that decays toward zero under
//! a per-strength friction. It never changes sign.

use serde::{Deserialize, Serialize};

use crate::state::AttackStrength;

/// Outstanding knockback impulse.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Slide {
    /// Slide velocity in units per second (never positive)
    pub velocity: f32,
    /// Decay rate in units per second squared
    pub friction: f32,
}

impl Slide {
    /// No slide.
    pub const NONE: Self = Self {
        velocity: 0.0,
        friction: 0.0,
    };

    /// Slide applied by a hit of the given strength.
    #[must_use]
    pub fn from_strength(strength: AttackStrength) -> Self {
        let data = strength.data();
        Self {
            velocity: data.slide_velocity,
            friction: data.slide_friction,
        }
    }

    /// Whether an impulse is outstanding.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.velocity < 0.0
    }

    /// Replace the outstanding impulse.
    pub fn apply(&mut self, slide: Slide) {
        *self = slide;
    }

    /// Advance the decay by `seconds`.
    ///
    /// Once the velocity reaches zero it is pinned to exactly zero and the
    /// friction is cleared.
    pub fn decay(&mut self, seconds: f32) {
        if self.velocity >= 0.0 {
            return;
        }
        self.velocity += self.friction * seconds;
        if self.velocity < 0.0 {
            return;
        }
        self.reset();
    }

    /// Cancel the impulse.
    pub fn reset(&mut self) {
        *self = Self::NONE;
    }

    /// Cancel the impulse and return what was outstanding.
    pub fn take(&mut self) -> Slide {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_strength() {
        let slide = Slide::from_strength(AttackStrength::Light);
        assert!((slide.velocity - -200.0).abs() < 1e-3);
        assert_eq!(slide.friction, 600.0);
        assert!(slide.is_active());
    }

    #[test]
    fn test_decay_reaches_exact_zero() {
        let mut slide = Slide {
            velocity: -10.0,
            friction: 600.0,
        };
        slide.decay(1.0 / 60.0);
        assert_eq!(slide, Slide::NONE);
    }

    #[test]
    fn test_decay_is_gradual() {
        let mut slide = Slide::from_strength(AttackStrength::Heavy);
        let before = slide.velocity;
        slide.decay(1.0 / 60.0);
        assert!(slide.velocity > before);
        assert!(slide.velocity < 0.0);
        assert_eq!(slide.friction, 800.0);
    }

    #[test]
    fn test_inactive_slide_is_untouched() {
        let mut slide = Slide {
            velocity: 0.0,
            friction: 600.0,
        };
        slide.decay(1.0);
        assert_eq!(slide.velocity, 0.0);
        assert_eq!(slide.friction, 600.0);
    }

    #[test]
    fn test_take_resets() {
        let mut slide = Slide::from_strength(AttackStrength::Medium);
        let taken = slide.take();
        assert_eq!(taken, Slide::from_strength(AttackStrength::Medium));
        assert_eq!(slide, Slide::NONE);
    }

    proptest! {
        #[test]
        fn test_slide_never_turns_positive(
            velocity in -1000.0f32..0.0,
            friction in 1.0f32..2000.0,
            steps in proptest::collection::vec(0.001f32..0.1, 1..400),
        ) {
            let mut slide = Slide { velocity, friction };
            let mut settled = false;
            for dt in steps {
                slide.decay(dt);
                prop_assert!(slide.velocity <= 0.0);
                if settled {
                    prop_assert_eq!(slide, Slide::NONE);
                }
                if slide.velocity == 0.0 {
                    prop_assert_eq!(slide.friction, 0.0);
                    settled = true;
                }
            }
        }
    }
}
