//! # Chunk Iteration Module
//!
//! An iterator over the non-air blocks of a chunk. It walks the block grid in storage
//! order and yields each occupied cell with its chunk-relative position.

use cgmath::Point3;

use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::BlockTypeSize;

use super::{Chunk, CHUNK_DIMENSION, CHUNK_PLANE_SIZE};

/// An iterator over all non-air blocks in a chunk.
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Next grid index to inspect
    current_offset: usize,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates a new `ChunkBlockIterator` for the given chunk.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            current_offset: 0,
        }
    }
}

impl Iterator for ChunkBlockIterator<'_> {
    type Item = (Point3<usize>, BlockTypeSize);

    fn next(&mut self) -> Option<Self::Item> {
        let blocks = &self.chunk_ref.blocks;
        while self.current_offset < blocks.len() {
            let offset = self.current_offset;
            self.current_offset += 1;

            let id = blocks[offset];
            if id == BlockType::AIR.id() {
                continue;
            }

            let dimension = CHUNK_DIMENSION as usize;
            let plane = CHUNK_PLANE_SIZE as usize;
            let position = Point3::new(offset % dimension, (offset % plane) / dimension, offset / plane);
            return Some((position, id));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::block::Block;
    use crate::engine_state::voxels::chunk::Chunk;
    use cgmath::Point3;

    #[test]
    fn yields_positions_of_non_air_blocks() {
        let mut chunk = Chunk::empty(Point3::new(0, 0, 0));
        chunk.set_block_at(1, 2, 3, &Block::new(BlockType::STONE));
        chunk.set_block_at(15, 15, 15, &Block::new(BlockType::DIRT));

        let found: Vec<_> = chunk.blocks().collect();
        assert_eq!(
            found,
            vec![
                (Point3::new(1, 2, 3), BlockType::STONE.id()),
                (Point3::new(15, 15, 15), BlockType::DIRT.id()),
            ]
        );
    }

    #[test]
    fn flat_chunk_yields_every_filled_cell() {
        let chunk = Chunk::flat(Point3::new(0, 0, 0), 1, &Block::new(BlockType::GRASS));
        assert_eq!(chunk.blocks().count(), 2 * 256);
        assert!(chunk.blocks().all(|(position, _)| position.y <= 1));
    }
}
