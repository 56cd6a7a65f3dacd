//! # Entity Behavior System
//!
//! Drives every active entity once per tick. Behaviors are plain functions looked up
//! by [`EntityKind`] in a table filled at construction; a kind without an entry is
//! skipped.
//!
//! ## Tick
//!
//! 1. Snapshot the chunk each active entity was in.
//! 2. Run the behavior registered for each entity's kind.
//! 3. Re-bucket every entity into the chunk containing its new position.

use std::collections::HashMap;

use cgmath::{InnerSpace, Point3, Vector3};
use log::debug;

use super::membership::{ChunkMembershipTracker, MembershipChange};
use super::physics::PhysicsControl;
use super::{EntityId, EntityKind, EntityState, EntityStore};
use crate::config::BehaviorConfig;
use crate::engine_state::voxels::chunk::chunk_coordinate_of;
use crate::engine_state::voxels::world::World;

/// Throttle magnitudes below this snap to zero.
const THROTTLE_EPSILON: f32 = 1e-3;

/// Everything a behavior may read or change during one tick.
pub struct BehaviorContext<'a> {
    /// All entities.
    pub entities: &'a mut EntityStore,
    /// Velocity and orientation control.
    pub physics: &'a mut dyn PhysicsControl,
    /// The entity the world streams around.
    pub viewpoint: EntityId,
    /// Where the viewpoint was at the start of the tick.
    pub viewpoint_position: Option<Point3<f32>>,
    /// Seconds since the previous tick.
    pub delta_time: f32,
    /// Movement tuning.
    pub tuning: BehaviorConfig,
}

/// A per-kind behavior.
pub type BehaviorFn = fn(EntityId, &mut BehaviorContext<'_>);

/// Per-kind behavior dispatch plus chunk membership upkeep.
pub struct EntityBehaviorSystem {
    behaviors: HashMap<EntityKind, BehaviorFn>,
    membership: ChunkMembershipTracker,
    tuning: BehaviorConfig,
}

impl EntityBehaviorSystem {
    /// Creates a system with the zombie, projectile and train behaviors registered.
    pub fn new(tuning: BehaviorConfig) -> Self {
        let mut system = Self {
            behaviors: HashMap::new(),
            membership: ChunkMembershipTracker::new(),
            tuning,
        };
        system.register(EntityKind::Zombie, hazard_behavior);
        system.register(EntityKind::Projectile, projectile_behavior);
        system.register(EntityKind::Train, vehicle_behavior);
        system
    }

    /// Sets the behavior of a kind, replacing any previous one.
    pub fn register(&mut self, kind: EntityKind, behavior: BehaviorFn) {
        self.behaviors.insert(kind, behavior);
    }

    pub fn has_behavior(&self, kind: EntityKind) -> bool {
        self.behaviors.contains_key(&kind)
    }

    pub fn membership(&self) -> &ChunkMembershipTracker {
        &self.membership
    }

    pub fn membership_mut(&mut self) -> &mut ChunkMembershipTracker {
        &mut self.membership
    }

    /// Runs one tick over `active_ids`.
    ///
    /// # Arguments
    /// * `active_ids` - Entities to update; ids missing from `entities` are skipped
    /// * `delta_time` - Seconds since the previous tick
    /// * `world` - Resident chunks whose membership sets are maintained
    /// * `entities` - The entity store
    /// * `physics` - Velocity and orientation control
    /// * `viewpoint` - The entity zombies chase
    ///
    /// # Returns
    /// How many entities ended the tick outside every resident chunk.
    pub fn tick(
        &mut self,
        active_ids: &[EntityId],
        delta_time: f32,
        world: &World,
        entities: &mut EntityStore,
        physics: &mut dyn PhysicsControl,
        viewpoint: EntityId,
    ) -> usize {
        let previous: Vec<Option<Point3<i32>>> = active_ids
            .iter()
            .map(|id| {
                self.membership.last_known(*id).or_else(|| {
                    entities
                        .position_of(*id)
                        .map(chunk_coordinate_of)
                })
            })
            .collect();

        let mut context = BehaviorContext {
            viewpoint_position: entities.position_of(viewpoint),
            entities,
            physics,
            viewpoint,
            delta_time,
            tuning: self.tuning,
        };
        for id in active_ids {
            let Some(kind) = context.entities.get_entity_by_id(*id).map(|e| e.kind()) else {
                continue;
            };
            if let Some(behavior) = self.behaviors.get(&kind) {
                behavior(*id, &mut context);
            }
        }

        let mut dangling = 0;
        for (id, previous) in active_ids.iter().zip(previous) {
            let Some(position) = context.entities.position_of(*id) else {
                continue;
            };
            if let MembershipChange::Dangling { .. } =
                self.membership.rebucket(world, *id, previous, position)
            {
                dangling += 1;
            }
        }
        if dangling > 0 {
            debug!("{dangling} entities outside resident chunks after behavior tick");
        }
        dangling
    }
}

/// Walks toward the viewpoint on the horizontal plane, keeping its fall speed.
pub fn hazard_behavior(id: EntityId, context: &mut BehaviorContext<'_>) {
    let (Some(target), Some(position)) = (context.viewpoint_position, context.entities.position_of(id))
    else {
        return;
    };
    let toward = Vector3::new(target.x - position.x, 0.0, target.z - position.z);
    let horizontal = if toward.magnitude2() > f32::EPSILON {
        toward.normalize() * context.tuning.zombie_speed
    } else {
        Vector3::new(0.0, 0.0, 0.0)
    };
    let vertical = context.physics.linear_velocity(id).y;
    context
        .physics
        .set_linear_velocity(id, Vector3::new(horizontal.x, vertical, horizontal.z));
    context
        .physics
        .look_at(id, Point3::new(target.x, position.y, target.z));
}

/// Flies along its direction and expires when its lifetime runs out.
pub fn projectile_behavior(id: EntityId, context: &mut BehaviorContext<'_>) {
    let Some(entity) = context.entities.get_entity_by_id_mut(id) else {
        return;
    };
    let EntityState::Projectile(state) = &mut entity.state else {
        return;
    };
    state.remaining_life -= context.delta_time;
    let velocity = state.direction * context.tuning.projectile_speed;
    if state.remaining_life <= 0.0 {
        entity.mark_for_removal();
    }
    context.physics.set_linear_velocity(id, velocity);
}

/// Runs along the rail under throttle, carrying its rider, then loses throttle to
/// friction.
pub fn vehicle_behavior(id: EntityId, context: &mut BehaviorContext<'_>) {
    let tuning = context.tuning;
    let delta_time = context.delta_time;
    let Some(entity) = context.entities.get_entity_by_id_mut(id) else {
        return;
    };
    let EntityState::Train(state) = &mut entity.state else {
        return;
    };

    if state.throttle != 0.0 && state.fuel > 0.0 {
        entity.position.x += tuning.train_speed * state.throttle * delta_time;
        state.fuel = (state.fuel - state.throttle.abs() * tuning.fuel_burn_rate * delta_time).max(0.0);
    }
    state.throttle = decay_throttle(state.throttle, tuning.train_friction, delta_time);

    let rider = state.rider;
    let seat = entity.position + Vector3::from(tuning.seat_offset);
    let Some(rider) = rider else {
        return;
    };
    if let Some(rider_entity) = context.entities.get_entity_by_id_mut(rider) {
        if rider_entity.as_rider().and_then(|r| r.mount) == Some(id) {
            rider_entity.position = seat;
        }
    }
}

/// Applies one tick of friction to a throttle value.
///
/// The result never crosses zero and never grows in magnitude.
pub fn decay_throttle(throttle: f32, friction: f32, delta_time: f32) -> f32 {
    let decayed = throttle * (1.0 - friction * delta_time).max(0.0);
    if decayed.abs() < THROTTLE_EPSILON {
        0.0
    } else {
        decayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::entities::physics::KinematicBodies;
    use crate::engine_state::entities::ItemKind;
    use crate::engine_state::voxels::chunk::Chunk;
    use crate::engine_state::voxels::world::WorldShape;

    fn resident_world(coordinates: &[Point3<i32>]) -> World {
        let mut world = World::new(WorldShape::default());
        for coordinate in coordinates {
            world.add_chunk(*coordinate, Chunk::empty(*coordinate));
        }
        world
    }

    #[test]
    fn zombies_walk_toward_the_viewpoint_and_keep_falling() {
        let world = resident_world(&[Point3::new(0, 0, 0)]);
        let mut store = EntityStore::default();
        let player = store.create_entity(EntityKind::Player, Point3::new(10.0, 1.0, 0.0));
        let zombie = store.create_entity(EntityKind::Zombie, Point3::new(0.0, 5.0, 0.0));
        let mut bodies = KinematicBodies::new();
        bodies.set_linear_velocity(zombie, Vector3::new(0.0, -2.0, 0.0));

        let mut system = EntityBehaviorSystem::new(BehaviorConfig::default());
        system.tick(&[player, zombie], 0.1, &world, &mut store, &mut bodies, player);

        let velocity = bodies.linear_velocity(zombie);
        assert_eq!(velocity, Vector3::new(3.0, -2.0, 0.0));
        assert_eq!(
            bodies.body(zombie).unwrap().look_target,
            Some(Point3::new(10.0, 5.0, 0.0))
        );
    }

    #[test]
    fn unregistered_kinds_are_skipped() {
        let world = resident_world(&[Point3::new(0, 0, 0)]);
        let mut store = EntityStore::default();
        let player = store.create_entity(EntityKind::Player, Point3::new(1.0, 1.0, 1.0));
        let item = store.create_item(ItemKind::Medkit, Point3::new(2.0, 1.0, 2.0));
        let mut bodies = KinematicBodies::new();

        let mut system = EntityBehaviorSystem::new(BehaviorConfig::default());
        assert!(!system.has_behavior(EntityKind::Item));
        system.tick(&[player, item], 0.1, &world, &mut store, &mut bodies, player);

        assert_eq!(store.position_of(item), Some(Point3::new(2.0, 1.0, 2.0)));
        assert!(bodies.is_empty());
    }

    #[test]
    fn projectiles_expire_after_their_lifetime() {
        let world = resident_world(&[Point3::new(0, 0, 0)]);
        let mut store = EntityStore::default();
        let player = store.create_entity(EntityKind::Player, Point3::new(1.0, 1.0, 1.0));
        let shot = store.fire_projectile(player, Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let mut bodies = KinematicBodies::new();
        let mut system = EntityBehaviorSystem::new(BehaviorConfig::default());

        system.tick(&[shot], 1.0, &world, &mut store, &mut bodies, player);
        assert!(!store.get_entity_by_id(shot).unwrap().is_marked_for_removal());
        assert_eq!(bodies.linear_velocity(shot), Vector3::new(40.0, 0.0, 0.0));

        system.tick(&[shot], 2.5, &world, &mut store, &mut bodies, player);
        assert!(store.get_entity_by_id(shot).unwrap().is_marked_for_removal());
    }

    #[test]
    fn trains_advance_burn_fuel_and_carry_their_rider() {
        let world = resident_world(&[Point3::new(0, 0, 0)]);
        let mut store = EntityStore::default();
        let player = store.create_entity(EntityKind::Player, Point3::new(0.0, 1.0, 0.0));
        let train = store.create_entity(EntityKind::Train, Point3::new(2.0, 1.0, 8.0));
        assert!(store.mount(player, train));
        store.set_throttle(train, 1.0);
        let mut bodies = KinematicBodies::new();
        let mut system = EntityBehaviorSystem::new(BehaviorConfig::default());

        system.tick(&[player, train], 0.5, &world, &mut store, &mut bodies, player);

        assert_eq!(store.position_of(train), Some(Point3::new(6.0, 1.0, 8.0)));
        assert_eq!(store.position_of(player), Some(Point3::new(6.0, 2.5, 8.0)));
        let vehicle = store.get_entity_by_id(train).unwrap().as_vehicle().unwrap().clone();
        assert_eq!(vehicle.fuel, 99.5);
        assert_eq!(vehicle.throttle, 0.75);
    }

    #[test]
    fn trains_without_fuel_stay_put() {
        let world = resident_world(&[Point3::new(0, 0, 0)]);
        let mut store = EntityStore::default();
        let player = store.create_entity(EntityKind::Player, Point3::new(0.0, 1.0, 0.0));
        let train = store.create_entity(EntityKind::Train, Point3::new(2.0, 1.0, 8.0));
        if let Some(EntityState::Train(state)) = store.get_entity_by_id_mut(train).map(|e| &mut e.state) {
            state.fuel = 0.0;
        }
        store.set_throttle(train, 1.0);
        let mut bodies = KinematicBodies::new();
        let mut system = EntityBehaviorSystem::new(BehaviorConfig::default());

        system.tick(&[train], 0.5, &world, &mut store, &mut bodies, player);
        assert_eq!(store.position_of(train), Some(Point3::new(2.0, 1.0, 8.0)));
    }

    #[test]
    fn throttle_decay_is_monotonic_and_never_crosses_zero() {
        for start in [1.0_f32, -1.0, 0.3] {
            let mut throttle = start;
            for _ in 0..200 {
                let next = decay_throttle(throttle, 0.5, 0.1);
                assert!(next.abs() <= throttle.abs());
                assert!(next == 0.0 || next.signum() == start.signum());
                throttle = next;
            }
            assert_eq!(throttle, 0.0);
        }
        assert_eq!(decay_throttle(1.0, 20.0, 0.1), 0.0);
    }

    #[test]
    fn crossing_a_chunk_border_moves_membership() {
        let left = Point3::new(0, 0, 0);
        let right = Point3::new(1, 0, 0);
        let world = resident_world(&[left, right]);
        let mut store = EntityStore::default();
        let player = store.create_entity(EntityKind::Player, Point3::new(1.0, 1.0, 1.0));
        let train = store.create_entity(EntityKind::Train, Point3::new(15.0, 1.0, 8.0));
        store.set_throttle(train, 1.0);
        let mut bodies = KinematicBodies::new();
        let mut system = EntityBehaviorSystem::new(BehaviorConfig::default());

        system.tick(&[player, train], 0.01, &world, &mut store, &mut bodies, player);
        assert!(world.get_chunk(left).unwrap().get().contains_entity(train));

        system.tick(&[player, train], 0.5, &world, &mut store, &mut bodies, player);
        assert!(!world.get_chunk(left).unwrap().get().contains_entity(train));
        assert!(world.get_chunk(right).unwrap().get().contains_entity(train));
        assert_eq!(system.membership().last_known(train), Some(right));
    }

    #[test]
    fn leaving_resident_chunks_is_counted_not_fatal() {
        let world = resident_world(&[Point3::new(0, 0, 0)]);
        let mut store = EntityStore::default();
        let player = store.create_entity(EntityKind::Player, Point3::new(1.0, 1.0, 1.0));
        let zombie = store.create_entity(EntityKind::Zombie, Point3::new(100.0, 1.0, 1.0));
        let mut bodies = KinematicBodies::new();
        let mut system = EntityBehaviorSystem::new(BehaviorConfig::default());

        let dangling = system.tick(&[player, zombie], 0.1, &world, &mut store, &mut bodies, player);
        assert_eq!(dangling, 1);
        assert!(system.membership().last_known(zombie).is_none());
        assert_eq!(system.membership().last_known(player), Some(Point3::new(0, 0, 0)));
    }
}
