//! # Chunk Radius Manager
//!
//! Decides which chunks should be resident around the viewpoint and how that differs
//! from what is resident now.
//!
//! The desired set is a box of `±horizontal_radius` chunks on x and z and
//! `±vertical_radius` on y around the viewpoint's chunk, with every coordinate outside
//! the world's hard bounds dropped. Against the resident set `R` and desired set `D`:
//!
//! * `to_generate = D - R`
//! * `to_update = D ∩ R`
//! * `to_unload = (R ∪ to_generate) - D`
//! * `to_load = to_generate`
//!
//! Every set is sorted by `(x, y, z)`.

use std::collections::BTreeSet;

use cgmath::Point3;
use log::debug;

use crate::config::StreamingConfig;
use crate::engine_state::voxels::chunk::chunk_coordinate_of;
use crate::engine_state::voxels::world::World;

/// Ordering key of a chunk coordinate.
type CoordinateKey = (i32, i32, i32);

fn key(coordinate: Point3<i32>) -> CoordinateKey {
    (coordinate.x, coordinate.y, coordinate.z)
}

fn point((x, y, z): CoordinateKey) -> Point3<i32> {
    Point3::new(x, y, z)
}

/// The residency changes for one viewpoint position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkDiff {
    /// Desired chunks with no resident data yet.
    pub to_generate: Vec<Point3<i32>>,
    /// Chunks becoming resident this tick; equal to `to_generate`.
    pub to_load: Vec<Point3<i32>>,
    /// Resident chunks that are no longer desired.
    pub to_unload: Vec<Point3<i32>>,
    /// Resident chunks that stay desired.
    pub to_update: Vec<Point3<i32>>,
}

impl ChunkDiff {
    /// Whether nothing is generated or unloaded.
    pub fn is_stationary(&self) -> bool {
        self.to_generate.is_empty() && self.to_unload.is_empty()
    }
}

/// Computes [`ChunkDiff`]s from a viewpoint position.
#[derive(Clone, Copy, Debug)]
pub struct ChunkRadiusManager {
    streaming: StreamingConfig,
}

impl ChunkRadiusManager {
    pub fn new(streaming: StreamingConfig) -> Self {
        Self { streaming }
    }

    /// The chunk coordinates that should be resident around `center`, sorted.
    ///
    /// Coordinates outside the world's hard bounds are left out.
    pub fn desired_chunks(&self, world: &World, center: Point3<i32>) -> Vec<Point3<i32>> {
        let horizontal = self.streaming.horizontal_radius;
        let vertical = self.streaming.vertical_radius;
        let shape = world.shape();

        let mut desired = Vec::new();
        let mut excluded = 0usize;
        for x in center.x - horizontal..=center.x + horizontal {
            for y in center.y - vertical..=center.y + vertical {
                for z in center.z - horizontal..=center.z + horizontal {
                    let coordinate = Point3::new(x, y, z);
                    if shape.contains_chunk(coordinate) {
                        desired.push(coordinate);
                    } else {
                        excluded += 1;
                    }
                }
            }
        }
        if excluded > 0 {
            debug!("{excluded} chunks around {center:?} are outside the world bounds");
        }
        desired
    }

    /// Diffs the desired set around `viewpoint` against the world's resident chunks.
    ///
    /// # Arguments
    /// * `world` - The world whose resident chunks are compared
    /// * `viewpoint` - World-space position of the viewpoint entity
    pub fn execute(&self, world: &World, viewpoint: Point3<f32>) -> ChunkDiff {
        let center = chunk_coordinate_of(viewpoint);
        let desired: BTreeSet<CoordinateKey> =
            self.desired_chunks(world, center).into_iter().map(key).collect();
        let resident: BTreeSet<CoordinateKey> = world.chunk_coordinates().map(key).collect();

        let to_generate: BTreeSet<CoordinateKey> = desired.difference(&resident).copied().collect();
        let to_update: Vec<Point3<i32>> = desired.intersection(&resident).copied().map(point).collect();
        let to_unload: Vec<Point3<i32>> = resident
            .union(&to_generate)
            .filter(|coordinate| !desired.contains(coordinate))
            .copied()
            .map(point)
            .collect();
        let to_generate: Vec<Point3<i32>> = to_generate.into_iter().map(point).collect();

        ChunkDiff {
            to_load: to_generate.clone(),
            to_generate,
            to_unload,
            to_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::Chunk;
    use crate::engine_state::voxels::world::WorldShape;

    fn apply(world: &mut World, diff: &ChunkDiff) {
        for coordinate in &diff.to_unload {
            world.remove_chunk(*coordinate);
        }
        for coordinate in &diff.to_generate {
            world.add_chunk(*coordinate, Chunk::empty(*coordinate));
        }
    }

    fn manager(horizontal_radius: i32, vertical_radius: i32) -> ChunkRadiusManager {
        ChunkRadiusManager::new(StreamingConfig {
            horizontal_radius,
            vertical_radius,
        })
    }

    #[test]
    fn first_call_generates_the_whole_box() {
        let world = World::new(WorldShape::default());
        let diff = manager(1, 1).execute(&world, Point3::new(8.0, 8.0, 8.0));
        assert_eq!(diff.to_generate.len(), 27);
        assert_eq!(diff.to_load, diff.to_generate);
        assert!(diff.to_unload.is_empty());
        assert!(diff.to_update.is_empty());
    }

    #[test]
    fn output_sets_are_sorted() {
        let world = World::new(WorldShape::default());
        let diff = manager(2, 1).execute(&world, Point3::new(-20.0, 3.0, 40.0));
        let keys: Vec<_> = diff.to_generate.iter().map(|c| key(*c)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn stationary_viewpoint_is_a_no_op_the_second_time() {
        let mut world = World::new(WorldShape::default());
        let manager = manager(2, 1);
        let viewpoint = Point3::new(3.0, 4.0, 5.0);

        let first = manager.execute(&world, viewpoint);
        apply(&mut world, &first);
        let second = manager.execute(&world, viewpoint);

        assert!(second.to_generate.is_empty());
        assert!(second.to_load.is_empty());
        assert!(second.to_unload.is_empty());
        assert!(second.is_stationary());
        assert_eq!(second.to_update, first.to_load);
    }

    #[test]
    fn moving_one_chunk_unloads_the_trailing_slab() {
        let mut world = World::new(WorldShape::default());
        let manager = manager(1, 0);

        let first = manager.execute(&world, Point3::new(8.0, 8.0, 8.0));
        apply(&mut world, &first);
        let moved = manager.execute(&world, Point3::new(24.0, 8.0, 8.0));

        assert_eq!(moved.to_generate.len(), 3);
        assert!(moved.to_generate.iter().all(|c| c.x == 2));
        assert_eq!(moved.to_unload.len(), 3);
        assert!(moved.to_unload.iter().all(|c| c.x == -1));
        assert_eq!(moved.to_update.len(), 6);
    }

    #[test]
    fn coordinates_outside_the_bounds_are_never_desired() {
        let shape = WorldShape {
            min_chunk: [-1, 0, -1],
            max_chunk: [1, 0, 1],
            ..WorldShape::default()
        };
        let world = World::new(shape);
        let diff = manager(3, 2).execute(&world, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(diff.to_generate.len(), 9);
        assert!(diff.to_generate.iter().all(|c| shape.contains_chunk(*c)));
    }

    #[test]
    fn far_jump_unloads_everything_resident() {
        let mut world = World::new(WorldShape::default());
        let manager = manager(1, 0);
        let first = manager.execute(&world, Point3::new(0.0, 0.0, 0.0));
        apply(&mut world, &first);

        let jumped = manager.execute(&world, Point3::new(160.0, 0.0, 0.0));
        assert_eq!(jumped.to_unload.len(), 9);
        assert!(jumped.to_update.is_empty());
        assert_eq!(jumped.to_generate.len(), 9);
    }
}
