//! # Block Type Module
//!
//! This module defines the built-in block types of the voxel world and the
//! per-type properties the generator and populator rely on.

use num_derive::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates the built-in block types.
///
/// The discriminant is the block id stored in chunk grids. The `FromPrimitive`
/// derive allows turning a stored id back into a type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Non-solid and transparent.
    AIR = 0,

    /// Top block of a terrain column.
    GRASS = 1,

    /// The few blocks directly under the surface.
    DIRT = 2,

    /// Deep terrain and the rail bed.
    STONE = 3,

    /// Loose ballast. Registered but not placed by the default terrain.
    GRAVEL = 4,
}

impl BlockType {
    /// Converts a stored id to a built-in `BlockType`.
    ///
    /// # Returns
    /// `None` if the id belongs to a config-defined material.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    /// The registry name of this type.
    pub fn name(self) -> &'static str {
        match self {
            BlockType::AIR => "air",
            BlockType::GRASS => "grass",
            BlockType::DIRT => "dirt",
            BlockType::STONE => "stone",
            BlockType::GRAVEL => "gravel",
        }
    }

    /// Whether bodies collide with this type.
    pub fn is_solid(self) -> bool {
        self != BlockType::AIR
    }

    /// Whether light and sight pass through this type.
    pub fn is_transparent(self) -> bool {
        self == BlockType::AIR
    }

    /// The id stored in chunk grids.
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }
}
