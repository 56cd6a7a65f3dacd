//! # World Module
//!
//! This module provides the `World` struct which manages the resident chunks of the
//! voxel world, and `WorldShape`, the fixed extent of the playable area.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach where only chunks near the viewpoint are
//! kept in memory. Chunks are stored in thread-safe containers so generation workers and
//! the driving thread can share them; the chunk map itself is only mutated by the
//! driving thread.
//!
//! ## Bounds
//!
//! The rail runs along x from `start_x` to `end_x`. Chunk coordinates are additionally
//! clamped per axis by `min_chunk`/`max_chunk`; a chunk outside those bounds is never
//! resident.

use std::collections::HashMap;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::core::MtResource;
use crate::engine_state::voxels::chunk::{chunk_coordinate_of, Chunk};

/// The fixed extent of the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldShape {
    /// World-space x where the rail begins.
    pub start_x: i32,
    /// World-space x where the rail ends.
    pub end_x: i32,
    /// Smallest resident chunk coordinate per axis, inclusive.
    pub min_chunk: [i32; 3],
    /// Largest resident chunk coordinate per axis, inclusive.
    pub max_chunk: [i32; 3],
}

impl Default for WorldShape {
    fn default() -> Self {
        Self {
            start_x: -256,
            end_x: 256,
            min_chunk: [-24, -1, -8],
            max_chunk: [24, 2, 8],
        }
    }
}

impl WorldShape {
    /// A world whose rail spans `start_x..end_x`, with the default chunk bounds.
    pub fn with_rail(start_x: i32, end_x: i32) -> Self {
        Self {
            start_x,
            end_x,
            ..Self::default()
        }
    }

    /// A world `length` blocks long, centered on the origin.
    pub fn centered(length: i32) -> Self {
        Self::with_rail(-length / 2, length / 2)
    }

    /// Length of the rail in blocks.
    pub fn rail_length(&self) -> i32 {
        self.end_x - self.start_x
    }

    /// Whether a chunk coordinate lies inside the hard bounds.
    pub fn contains_chunk(&self, coordinate: Point3<i32>) -> bool {
        let coordinate = [coordinate.x, coordinate.y, coordinate.z];
        (0..3).all(|axis| {
            coordinate[axis] >= self.min_chunk[axis] && coordinate[axis] <= self.max_chunk[axis]
        })
    }

    /// How far a world-space x lies past either end of the rail.
    ///
    /// # Returns
    /// `None` when `x` is within `start_x..=end_x`.
    pub fn distance_past_rail(&self, x: i32) -> Option<i32> {
        if x > self.end_x {
            Some(x - self.end_x)
        } else if x < self.start_x {
            Some(self.start_x - x)
        } else {
            None
        }
    }
}

/// The resident chunks of the voxel world.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use rail_world::engine_state::voxels::chunk::Chunk;
/// use rail_world::engine_state::voxels::world::{World, WorldShape};
///
/// let mut world = World::new(WorldShape::default());
/// world.add_chunk(Point3::new(0, 0, 0), Chunk::empty(Point3::new(0, 0, 0)));
/// assert!(world.get_chunk(Point3::new(0, 0, 0)).is_some());
/// ```
pub struct World {
    /// A mapping from chunk coordinates to chunk data.
    chunks: HashMap<Point3<i32>, MtResource<Chunk>>,
    /// The fixed extent of the world.
    shape: WorldShape,
}

impl World {
    /// Creates a new, empty world.
    pub fn new(shape: WorldShape) -> Self {
        World {
            chunks: HashMap::new(),
            shape,
        }
    }

    /// The world's extent.
    pub fn shape(&self) -> &WorldShape {
        &self.shape
    }

    /// Inserts a chunk at the given coordinate.
    ///
    /// # Returns
    /// `false` and leaves the world unchanged if the coordinate is outside the bounds
    /// or already holds a chunk.
    pub fn add_chunk(&mut self, coordinate: Point3<i32>, chunk: Chunk) -> bool {
        if !self.shape.contains_chunk(coordinate) || self.chunks.contains_key(&coordinate) {
            return false;
        }
        self.chunks.insert(coordinate, MtResource::new(chunk));
        true
    }

    /// Removes the chunk at the given coordinate.
    pub fn remove_chunk(&mut self, coordinate: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.remove(&coordinate)
    }

    /// Retrieves the chunk at the specified chunk coordinates.
    ///
    /// # Returns
    /// A clone of the `MtResource<Chunk>` if the chunk exists, or `None` if not.
    pub fn get_chunk(&self, coordinate: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.get(&coordinate).cloned()
    }

    /// Retrieves the chunk containing a world-space position.
    pub fn get_chunk_containing_position(&self, position: Point3<f32>) -> Option<MtResource<Chunk>> {
        self.get_chunk(chunk_coordinate_of(position))
    }

    /// Whether a chunk is resident at the coordinate.
    pub fn contains_chunk(&self, coordinate: Point3<i32>) -> bool {
        self.chunks.contains_key(&coordinate)
    }

    /// Coordinates of all resident chunks, in no particular order.
    pub fn chunk_coordinates(&self) -> impl Iterator<Item = Point3<i32>> + '_ {
        self.chunks.keys().copied()
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk is resident.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
