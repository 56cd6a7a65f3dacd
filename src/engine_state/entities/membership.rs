//! # Chunk Membership
//!
//! Keeps every chunk's entity set in step with entity positions. The tracker is a flat
//! map from entity id to the chunk the entity was last recorded in; moving an entity
//! between chunks is a removal from one set and an insertion into another.

use std::collections::HashMap;

use cgmath::Point3;
use log::debug;

use super::EntityId;
use crate::engine_state::voxels::chunk::chunk_coordinate_of;
use crate::engine_state::voxels::world::World;

/// Outcome of re-bucketing one entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MembershipChange {
    /// The entity stayed in its chunk.
    Unchanged,
    /// A previously untracked entity was recorded in `to`.
    Entered { to: Point3<i32> },
    /// The entity moved between two resident chunks.
    Moved { from: Point3<i32>, to: Point3<i32> },
    /// The entity left `from` for a chunk that is not resident. It is untracked until
    /// a later tick finds it inside a resident chunk.
    Dangling { from: Option<Point3<i32>> },
}

/// Last-known chunk of every tracked entity.
#[derive(Debug, Default)]
pub struct ChunkMembershipTracker {
    locations: HashMap<EntityId, Point3<i32>>,
}

impl ChunkMembershipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id` as belonging to `chunk` without touching any chunk's set.
    pub fn track(&mut self, id: EntityId, chunk: Point3<i32>) {
        self.locations.insert(id, chunk);
    }

    /// The chunk `id` was last recorded in.
    pub fn last_known(&self, id: EntityId) -> Option<Point3<i32>> {
        self.locations.get(&id).copied()
    }

    /// Stops tracking `id`, returning its last chunk.
    pub fn forget(&mut self, id: EntityId) -> Option<Point3<i32>> {
        self.locations.remove(&id)
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Moves `id` from its `previous` chunk to the chunk containing `position`.
    ///
    /// # Arguments
    /// * `world` - Resident chunks whose entity sets are updated
    /// * `id` - The entity to re-bucket
    /// * `previous` - The chunk the entity was in before this tick, if any
    /// * `position` - The entity's current world-space position
    pub fn rebucket(
        &mut self,
        world: &World,
        id: EntityId,
        previous: Option<Point3<i32>>,
        position: Point3<f32>,
    ) -> MembershipChange {
        let current = chunk_coordinate_of(position);
        if let Some(from) = previous {
            if from != current {
                if let Some(chunk) = world.get_chunk(from) {
                    chunk.get_mut().remove_entity(id);
                }
            }
        }

        match world.get_chunk(current) {
            Some(chunk) => {
                chunk.get_mut().add_entity(id);
                self.track(id, current);
                match previous {
                    Some(from) if from != current => MembershipChange::Moved { from, to: current },
                    Some(_) => MembershipChange::Unchanged,
                    None => MembershipChange::Entered { to: current },
                }
            }
            None => {
                self.forget(id);
                debug!("Entity {id} left resident chunks at {current:?}");
                MembershipChange::Dangling { from: previous }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::Chunk;
    use crate::engine_state::voxels::world::WorldShape;

    fn world_with(coordinates: &[Point3<i32>]) -> World {
        let mut world = World::new(WorldShape::default());
        for coordinate in coordinates {
            world.add_chunk(*coordinate, Chunk::empty(*coordinate));
        }
        world
    }

    #[test]
    fn moving_across_a_border_switches_sets() {
        let a = Point3::new(0, 0, 0);
        let b = Point3::new(1, 0, 0);
        let world = world_with(&[a, b]);
        let mut tracker = ChunkMembershipTracker::new();
        let id = EntityId(1);

        world.get_chunk(a).unwrap().get_mut().add_entity(id);
        tracker.track(id, a);

        let change = tracker.rebucket(&world, id, Some(a), Point3::new(17.0, 1.0, 1.0));
        assert_eq!(change, MembershipChange::Moved { from: a, to: b });
        assert!(!world.get_chunk(a).unwrap().get().contains_entity(id));
        assert!(world.get_chunk(b).unwrap().get().contains_entity(id));
        assert_eq!(tracker.last_known(id), Some(b));
    }

    #[test]
    fn staying_put_is_unchanged() {
        let a = Point3::new(0, 0, 0);
        let world = world_with(&[a]);
        let mut tracker = ChunkMembershipTracker::new();
        let id = EntityId(2);
        tracker.track(id, a);
        world.get_chunk(a).unwrap().get_mut().add_entity(id);

        let change = tracker.rebucket(&world, id, Some(a), Point3::new(3.0, 3.0, 3.0));
        assert_eq!(change, MembershipChange::Unchanged);
        assert_eq!(world.get_chunk(a).unwrap().get().entities().len(), 1);
    }

    #[test]
    fn new_entities_enter_their_chunk() {
        let a = Point3::new(0, 0, 0);
        let world = world_with(&[a]);
        let mut tracker = ChunkMembershipTracker::new();

        let change = tracker.rebucket(&world, EntityId(5), None, Point3::new(1.0, 1.0, 1.0));
        assert_eq!(change, MembershipChange::Entered { to: a });
        assert!(world.get_chunk(a).unwrap().get().contains_entity(EntityId(5)));
    }

    #[test]
    fn leaving_resident_chunks_dangles_and_untracks() {
        let a = Point3::new(0, 0, 0);
        let world = world_with(&[a]);
        let mut tracker = ChunkMembershipTracker::new();
        let id = EntityId(9);
        tracker.track(id, a);
        world.get_chunk(a).unwrap().get_mut().add_entity(id);

        let change = tracker.rebucket(&world, id, Some(a), Point3::new(100.0, 1.0, 1.0));
        assert_eq!(change, MembershipChange::Dangling { from: Some(a) });
        assert!(world.get_chunk(a).unwrap().get().entities().is_empty());
        assert!(tracker.is_empty());
    }
}
