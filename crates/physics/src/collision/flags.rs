//! Content flags for collision filtering.
//!
//! Every collider in the world carries a set of content flags, and every
//! query carries a mask. A collider takes part in a query only when the two
//! intersect. This is the layer-mask mechanism the locomotion probes use to
//! pick what counts as ground or as a runnable wall.

use serde::{Deserialize, Serialize};

/// Content flags describe what type of volume a collider is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentFlags(pub u32);

impl ContentFlags {
    /// Empty space - nothing here.
    pub const EMPTY: Self = Self(0);

    /// Solid world geometry - walls, floors, ceilings.
    pub const SOLID: Self = Self(1 << 0);

    /// Player clip - blocks players but is invisible.
    pub const PLAYER_CLIP: Self = Self(1 << 1);

    /// Trigger volume - never blocks movement.
    pub const TRIGGER: Self = Self(1 << 2);

    /// Another character's body.
    pub const PLAYER_BODY: Self = Self(1 << 3);

    /// Geometry the player may not wall-run on (glass, fences).
    pub const NO_WALL_RUN: Self = Self(1 << 4);

    /// Standard mask for player movement queries.
    pub const MASK_PLAYER_SOLID: Self =
        Self(Self::SOLID.0 | Self::PLAYER_CLIP.0 | Self::PLAYER_BODY.0);

    /// Everything, triggers included.
    pub const MASK_ALL: Self = Self(u32::MAX);

    /// Check if these flags contain a specific flag.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any of the given flags are set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Remove flags from this set.
    #[inline]
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for ContentFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for ContentFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_mask() {
        let mask = ContentFlags::MASK_PLAYER_SOLID;
        assert!(mask.contains(ContentFlags::SOLID));
        assert!(mask.contains(ContentFlags::PLAYER_CLIP));
        assert!(!mask.intersects(ContentFlags::TRIGGER));
    }

    #[test]
    fn test_no_wall_run_is_still_solid_for_movement() {
        let glass = ContentFlags::SOLID | ContentFlags::NO_WALL_RUN;
        assert!(ContentFlags::MASK_PLAYER_SOLID.intersects(glass));

        let wall_mask = ContentFlags::MASK_PLAYER_SOLID;
        assert!(glass.contains(ContentFlags::NO_WALL_RUN));
        assert!(wall_mask.difference(ContentFlags::SOLID).contains(ContentFlags::PLAYER_CLIP));
    }
}
