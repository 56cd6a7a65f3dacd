//! # Physics Module
//!
//! The boundary to the physics collaborator. Behaviors only ever talk to
//! [`PhysicsControl`]; [`KinematicBodies`] implements it without collision so the
//! simulation runs headless.

use std::collections::HashMap;

use cgmath::{Point3, Vector3};

use super::{EntityId, EntityStore};

/// Velocity and orientation control over simulated bodies.
pub trait PhysicsControl {
    /// Replaces the linear velocity of a body, creating the body if needed.
    fn set_linear_velocity(&mut self, id: EntityId, velocity: Vector3<f32>);

    /// Current linear velocity of a body; zero for unknown bodies.
    fn linear_velocity(&self, id: EntityId) -> Vector3<f32>;

    /// Turns a body to face a world-space point.
    fn look_at(&mut self, id: EntityId, target: Point3<f32>);
}

/// Per-body data of the kinematic stand-in.
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicBody {
    /// Linear velocity in blocks per second.
    pub velocity: Vector3<f32>,
    /// Last point the body was turned toward.
    pub look_target: Option<Point3<f32>>,
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self {
            velocity: Vector3::new(0.0, 0.0, 0.0),
            look_target: None,
        }
    }
}

/// Velocity table that moves entities in straight lines.
#[derive(Debug, Default)]
pub struct KinematicBodies {
    bodies: HashMap<EntityId, KinematicBody>,
}

impl KinematicBodies {
    pub fn new() -> Self {
        Self::default()
    }

    /// The body of an entity, if it has one.
    pub fn body(&self, id: EntityId) -> Option<&KinematicBody> {
        self.bodies.get(&id)
    }

    /// Drops the body of a removed entity.
    pub fn remove_body(&mut self, id: EntityId) -> Option<KinematicBody> {
        self.bodies.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Advances every body's entity by `velocity * delta_time`.
    ///
    /// Bodies whose entity no longer exists are dropped.
    pub fn integrate(&mut self, entities: &mut EntityStore, delta_time: f32) {
        self.bodies.retain(|id, body| match entities.get_entity_by_id_mut(*id) {
            Some(entity) => {
                entity.position += body.velocity * delta_time;
                true
            }
            None => false,
        });
    }
}

impl PhysicsControl for KinematicBodies {
    fn set_linear_velocity(&mut self, id: EntityId, velocity: Vector3<f32>) {
        self.bodies.entry(id).or_default().velocity = velocity;
    }

    fn linear_velocity(&self, id: EntityId) -> Vector3<f32> {
        self.bodies
            .get(&id)
            .map(|body| body.velocity)
            .unwrap_or(Vector3::new(0.0, 0.0, 0.0))
    }

    fn look_at(&mut self, id: EntityId, target: Point3<f32>) {
        self.bodies.entry(id).or_default().look_target = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::entities::EntityKind;

    #[test]
    fn unknown_bodies_are_at_rest() {
        let bodies = KinematicBodies::new();
        assert_eq!(bodies.linear_velocity(EntityId(3)), Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn integrate_moves_entities_along_velocity() {
        let mut store = EntityStore::default();
        let zombie = store.create_entity(EntityKind::Zombie, Point3::new(0.0, 1.0, 0.0));
        let mut bodies = KinematicBodies::new();
        bodies.set_linear_velocity(zombie, Vector3::new(2.0, 0.0, -4.0));

        bodies.integrate(&mut store, 0.5);
        assert_eq!(store.position_of(zombie), Some(Point3::new(1.0, 1.0, -2.0)));
    }

    #[test]
    fn integrate_drops_bodies_of_removed_entities() {
        let mut store = EntityStore::default();
        let zombie = store.create_entity(EntityKind::Zombie, Point3::new(0.0, 0.0, 0.0));
        let mut bodies = KinematicBodies::new();
        bodies.look_at(zombie, Point3::new(1.0, 0.0, 0.0));
        store.remove_entity(zombie);

        bodies.integrate(&mut store, 1.0);
        assert!(bodies.is_empty());
    }
}
