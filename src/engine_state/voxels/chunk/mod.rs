//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a 16x16x16 cube of block ids together with
//! the data the streaming core keeps beside it.
//!
//! ## Storage
//!
//! - `blocks`: one block id per cell, x fastest, then y, then z
//! - `solid_array`: a bit vector (1 bit per cell) mirroring which cells are solid
//! - `height_map`: per column, the world-space y of the highest non-air block
//! - `entities`: ids of the entities currently located inside the chunk
//!
//! The grid is written through [`ChunkCreationIterator`] while generating and through
//! [`Chunk::set_block_at`] afterwards; both keep the solid mask and height map in step
//! with the grid.

use std::collections::HashSet;

use bitvec::prelude::BitVec;
use cgmath::Point3;

use super::block::block_type::BlockType;
use super::block::{Block, BlockTypeSize};
use crate::engine_state::entities::EntityId;

pub use chunk_creation::ChunkCreationIterator;
pub use chunk_iteration::ChunkBlockIterator;

mod chunk_creation;
pub mod chunk_iteration;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 16;
/// The number of blocks in a single 2D plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of blocks in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;

/// Converts a world-space position to the coordinate of the chunk containing it.
///
/// Uses floor division on every axis, so `-0.5` lands in chunk `-1`.
pub fn chunk_coordinate_of(position: Point3<f32>) -> Point3<i32> {
    Point3::new(
        (position.x / CHUNK_DIMENSION as f32).floor() as i32,
        (position.y / CHUNK_DIMENSION as f32).floor() as i32,
        (position.z / CHUNK_DIMENSION as f32).floor() as i32,
    )
}

/// Index of a chunk-local cell in the block grid.
#[inline]
fn cell_index(x: usize, y: usize, z: usize) -> usize {
    x + CHUNK_DIMENSION as usize * y + CHUNK_PLANE_SIZE as usize * z
}

/// Index of a chunk-local column in the height map.
#[inline]
fn column_index(x: usize, z: usize) -> usize {
    x + CHUNK_DIMENSION as usize * z
}

/// A 16x16x16 cube of blocks and the entities located in it.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: Point3<i32>,

    /// Block ids, `x + 16 * y + 256 * z`.
    blocks: Vec<BlockTypeSize>,

    /// One bit per cell, set when the cell's block is solid.
    solid_array: BitVec,

    /// World-space y of the highest non-air block per column, `x + 16 * z`.
    height_map: Vec<Option<i32>>,

    /// Ids of the entities whose position lies inside this chunk.
    entities: HashSet<EntityId>,

    /// Set once the populator has scattered entities over this chunk.
    populated: bool,
}

impl Chunk {
    /// Creates a chunk of air.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the new chunk
    pub fn empty(position: Point3<i32>) -> Self {
        let mut cci = ChunkCreationIterator::new(position);
        let air = Block::new(BlockType::AIR);
        for _ in 0..CHUNK_SIZE {
            cci.push_block(&air);
        }
        cci.return_chunk()
    }

    /// Creates a chunk whose terrain surface is flat at world-space `surface_y`.
    ///
    /// Every cell at or below `surface_y` holds `material`, everything above is air.
    /// Mostly useful for exercising population and membership without noise.
    pub fn flat(position: Point3<i32>, surface_y: i32, material: &Block) -> Self {
        let mut cci = ChunkCreationIterator::new(position);
        let air = Block::new(BlockType::AIR);
        let origin_y = position.y * CHUNK_DIMENSION;
        for _z in 0..CHUNK_DIMENSION {
            for y in 0..CHUNK_DIMENSION {
                let block = if origin_y + y <= surface_y { material } else { &air };
                for _x in 0..CHUNK_DIMENSION {
                    cci.push_block(block);
                }
            }
        }
        cci.return_chunk()
    }

    /// World-space position of the chunk's minimum corner.
    pub fn origin(&self) -> Point3<i32> {
        Point3::new(
            self.position.x * CHUNK_DIMENSION,
            self.position.y * CHUNK_DIMENSION,
            self.position.z * CHUNK_DIMENSION,
        )
    }

    /// Gets the block id at the specified chunk-relative coordinates.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn get_block_at(&self, x: usize, y: usize, z: usize) -> BlockTypeSize {
        self.blocks[cell_index(x, y, z)]
    }

    /// Checks if the block at the specified chunk-relative coordinates is solid.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn is_block_solid(&self, x: usize, y: usize, z: usize) -> bool {
        self.solid_array[cell_index(x, y, z)]
    }

    /// Overwrites one cell and refreshes that column's height.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - Chunk-relative coordinates
    /// * `block` - The new block
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn set_block_at(&mut self, x: usize, y: usize, z: usize, block: &Block) {
        let index = cell_index(x, y, z);
        self.blocks[index] = block.id;
        self.solid_array.set(index, block.solid);
        self.refresh_column_height(x, z);
    }

    fn refresh_column_height(&mut self, x: usize, z: usize) {
        let origin_y = self.position.y * CHUNK_DIMENSION;
        let highest = (0..CHUNK_DIMENSION as usize)
            .rev()
            .find(|y| self.blocks[cell_index(x, *y, z)] != BlockType::AIR.id())
            .map(|y| origin_y + y as i32);
        self.height_map[column_index(x, z)] = highest;
    }

    /// World-space y of the highest non-air block in a column, if the column has one.
    pub fn surface_height(&self, x: usize, z: usize) -> Option<i32> {
        self.height_map[column_index(x, z)]
    }

    /// Lowest column surface in the chunk.
    ///
    /// # Returns
    /// `None` if every column of the chunk is air.
    pub fn min_block_height(&self) -> Option<i32> {
        self.height_map.iter().flatten().copied().min()
    }

    /// Highest column surface in the chunk.
    ///
    /// # Returns
    /// `None` if every column of the chunk is air.
    pub fn max_block_height(&self) -> Option<i32> {
        self.height_map.iter().flatten().copied().max()
    }

    /// Iterates over every non-air block with its chunk-relative position.
    pub fn blocks(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }

    /// Counts the cells holding the given block id.
    pub fn count_blocks(&self, id: BlockTypeSize) -> usize {
        self.blocks.iter().filter(|block| **block == id).count()
    }

    /// The ids of entities currently located in this chunk.
    pub fn entities(&self) -> &HashSet<EntityId> {
        &self.entities
    }

    /// Records an entity as located in this chunk.
    ///
    /// # Returns
    /// `false` if the entity was already recorded.
    pub fn add_entity(&mut self, id: EntityId) -> bool {
        self.entities.insert(id)
    }

    /// Forgets an entity.
    ///
    /// # Returns
    /// `false` if the entity was not recorded here.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        self.entities.remove(&id)
    }

    /// Whether the entity is recorded in this chunk.
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    /// Whether the populator already ran over this chunk.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Marks the chunk as populated.
    pub fn mark_populated(&mut self) {
        self.populated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_coordinates_floor_toward_negative_infinity() {
        assert_eq!(chunk_coordinate_of(Point3::new(0.0, 0.0, 0.0)), Point3::new(0, 0, 0));
        assert_eq!(chunk_coordinate_of(Point3::new(15.9, 16.0, -0.1)), Point3::new(0, 1, -1));
        assert_eq!(chunk_coordinate_of(Point3::new(-16.0, -16.5, 33.0)), Point3::new(-1, -2, 2));
    }

    #[test]
    fn empty_chunk_has_no_surface() {
        let chunk = Chunk::empty(Point3::new(0, 0, 0));
        assert_eq!(chunk.max_block_height(), None);
        assert_eq!(chunk.min_block_height(), None);
        assert_eq!(chunk.blocks().count(), 0);
    }

    #[test]
    fn flat_chunk_reports_its_surface() {
        let chunk = Chunk::flat(Point3::new(2, 0, -1), 4, &Block::new(BlockType::STONE));
        assert_eq!(chunk.max_block_height(), Some(4));
        assert_eq!(chunk.min_block_height(), Some(4));
        assert_eq!(chunk.surface_height(3, 9), Some(4));
        assert_eq!(chunk.count_blocks(BlockType::STONE.id()), 5 * 256);
        assert!(chunk.is_block_solid(0, 4, 0));
        assert!(!chunk.is_block_solid(0, 5, 0));
        assert_eq!(chunk.origin(), Point3::new(32, 0, -16));
    }

    #[test]
    fn height_map_uses_world_space_y() {
        let chunk = Chunk::flat(Point3::new(0, 1, 0), 20, &Block::new(BlockType::DIRT));
        assert_eq!(chunk.max_block_height(), Some(20));
        assert_eq!(chunk.get_block_at(0, 4, 0), BlockType::DIRT.id());
        assert_eq!(chunk.get_block_at(0, 5, 0), BlockType::AIR.id());
    }

    #[test]
    fn set_block_keeps_height_map_in_step() {
        let mut chunk = Chunk::flat(Point3::new(0, 0, 0), 0, &Block::new(BlockType::GRASS));
        chunk.set_block_at(3, 7, 3, &Block::new(BlockType::STONE));
        assert_eq!(chunk.surface_height(3, 3), Some(7));
        assert_eq!(chunk.max_block_height(), Some(7));

        chunk.set_block_at(3, 7, 3, &Block::new(BlockType::AIR));
        chunk.set_block_at(3, 0, 3, &Block::new(BlockType::AIR));
        assert_eq!(chunk.surface_height(3, 3), None);
        assert!(!chunk.is_block_solid(3, 0, 3));
        assert_eq!(chunk.min_block_height(), Some(0));
    }

    #[test]
    fn entity_membership_is_a_set() {
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        let id = EntityId(7);
        assert!(chunk.add_entity(id));
        assert!(!chunk.add_entity(id));
        assert!(chunk.contains_entity(id));
        assert!(chunk.remove_entity(id));
        assert!(!chunk.remove_entity(id));
        assert!(chunk.entities().is_empty());
    }
}
