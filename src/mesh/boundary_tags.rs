//! Boundary tags for the sides of a rectangular mesh.
//!
//! Each side carries a tag that determines which velocity components are
//! pinned on its nodes.

use serde::{Deserialize, Serialize};

/// Tag identifying the kinematic condition on a boundary side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryTag {
    /// Solid wall: zero normal velocity.
    #[default]
    Wall,

    /// Free boundary: nothing pinned.
    Free,
}

impl BoundaryTag {
    /// Check if this is a solid wall.
    pub fn is_wall(&self) -> bool {
        matches!(self, BoundaryTag::Wall)
    }
}

/// Side of a rectangular domain, in the order used by side tag arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    South,
    East,
    North,
    West,
}

impl BoundarySide {
    pub const ALL: [BoundarySide; 4] = [
        BoundarySide::South,
        BoundarySide::East,
        BoundarySide::North,
        BoundarySide::West,
    ];

    /// Position in a `[south, east, north, west]` array.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Velocity component normal to this side (0 = x, 1 = y).
    #[inline]
    pub fn normal_component(self) -> usize {
        match self {
            BoundarySide::East | BoundarySide::West => 0,
            BoundarySide::South | BoundarySide::North => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_wall() {
        assert_eq!(BoundaryTag::default(), BoundaryTag::Wall);
        assert!(BoundaryTag::Wall.is_wall());
        assert!(!BoundaryTag::Free.is_wall());
    }

    #[test]
    fn test_side_normals() {
        assert_eq!(BoundarySide::West.normal_component(), 0);
        assert_eq!(BoundarySide::East.normal_component(), 0);
        assert_eq!(BoundarySide::South.normal_component(), 1);
        assert_eq!(BoundarySide::North.normal_component(), 1);
        for (i, side) in BoundarySide::ALL.iter().enumerate() {
            assert_eq!(side.index(), i);
        }
    }
}
