//! # Chunk Creation Module
//!
//! A builder that fills a chunk cell by cell in grid order while maintaining the
//! solidity bit vector and the height map alongside the block ids.
//!
//! Cells are pushed x fastest, then y, then z. Because y increases within each
//! z-plane, the last non-air block pushed for a column is its highest one, so the
//! height map is complete as soon as the final cell is pushed.

use std::collections::HashSet;

use bitvec::vec::BitVec;
use cgmath::Point3;

use crate::engine_state::voxels::block::{Block, BlockTypeSize};

use super::{column_index, Chunk, CHUNK_DIMENSION, CHUNK_PLANE_SIZE, CHUNK_SIZE};

/// A builder for creating and populating chunks in grid order.
///
/// The builder keeps three structures consistent as blocks are added:
/// 1. The block id grid
/// 2. The bit vector tracking solid blocks (`solid_array`)
/// 3. The per-column height map
pub struct ChunkCreationIterator {
    /// The chunk coordinate of the chunk being created
    position: Point3<i32>,
    /// Block ids pushed so far
    blocks: Vec<BlockTypeSize>,
    /// One bit per pushed cell, set when the block is solid
    solid_array: BitVec,
    /// Highest non-air world y per column seen so far
    height_map: Vec<Option<i32>>,
    /// Current X position within the chunk
    local_x: i32,
    /// Current Y position within the chunk
    local_y: i32,
    /// Current Z position within the chunk
    local_z: i32,
}

impl ChunkCreationIterator {
    /// Creates a new `ChunkCreationIterator` for building a chunk at the given position.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinate of the chunk to create
    pub fn new(position: Point3<i32>) -> Self {
        ChunkCreationIterator {
            position,
            blocks: Vec::with_capacity(CHUNK_SIZE as usize),
            solid_array: BitVec::with_capacity(CHUNK_SIZE as usize),
            height_map: vec![None; CHUNK_PLANE_SIZE as usize],
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    /// Chunk-relative position the next pushed block will occupy.
    pub fn cursor(&self) -> Point3<i32> {
        Point3::new(self.local_x, self.local_y, self.local_z)
    }

    /// Finalizes the chunk creation and returns the constructed `Chunk`.
    ///
    /// # Panics
    /// Panics if fewer or more than `CHUNK_SIZE` blocks were pushed.
    pub fn return_chunk(self) -> Chunk {
        assert_eq!(
            self.blocks.len(),
            CHUNK_SIZE as usize,
            "chunk {:?} built with the wrong number of blocks",
            self.position
        );
        Chunk {
            position: self.position,
            blocks: self.blocks,
            solid_array: self.solid_array,
            height_map: self.height_map,
            entities: HashSet::new(),
            populated: false,
        }
    }

    /// Adds a block at the current position and advances the position.
    ///
    /// # Arguments
    /// * `block` - The block to place
    pub fn push_block(&mut self, block: &Block) {
        self.blocks.push(block.id);
        self.solid_array.push(block.solid);

        if !block.is_air() {
            let world_y = self.position.y * CHUNK_DIMENSION + self.local_y;
            self.height_map[column_index(self.local_x as usize, self.local_z as usize)] =
                Some(world_y);
        }

        self.local_x += 1;
        if self.local_x == CHUNK_DIMENSION {
            self.local_x = 0;
            self.local_y += 1;
            if self.local_y == CHUNK_DIMENSION {
                self.local_y = 0;
                self.local_z += 1;
            }
        }
    }
}
