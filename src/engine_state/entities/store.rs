//! # Entity Store
//!
//! Owns every entity and carries out gameplay events: mounting, shooting, damage and
//! the removal sweep.
//!
//! Rule violations such as mounting a rider that is already seated are reported with a
//! `false` return and leave the store untouched.

use std::collections::HashMap;

use cgmath::{InnerSpace, Point3, Vector3};
use log::debug;

use super::{
    Entity, EntityId, EntityKind, EntityState, HazardState, ItemKind, ProjectileState,
    RiderState, VehicleState,
};
use crate::config::BehaviorConfig;

/// Distance in front of the shooter at which projectiles appear.
const MUZZLE_DISTANCE: f32 = 1.0;

/// Port through which world population creates entities.
pub trait EntitySpawner {
    /// Creates an entity of the given kind with its default state.
    fn create_entity(&mut self, kind: EntityKind, position: Point3<f32>) -> EntityId;

    /// Creates an item pickup of a specific kind.
    fn create_item(&mut self, item: ItemKind, position: Point3<f32>) -> EntityId;

    /// Whether an entity of the given kind exists anywhere in the world.
    fn has_entity_of_kind(&self, kind: EntityKind) -> bool;
}

/// All entities of the world, by id.
#[derive(Debug)]
pub struct EntityStore {
    entities: HashMap<EntityId, Entity>,
    next_id: u64,
    tuning: BehaviorConfig,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(BehaviorConfig::default())
    }
}

impl EntityStore {
    /// Creates an empty store; `tuning` supplies starting health, fuel and lifetimes.
    pub fn new(tuning: BehaviorConfig) -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
            tuning,
        }
    }

    fn insert(&mut self, position: Point3<f32>, state: EntityState) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, position, state));
        id
    }

    fn default_state(&self, kind: EntityKind) -> EntityState {
        match kind {
            EntityKind::Player => EntityState::Player(RiderState {
                mount: None,
                health: self.tuning.player_health,
            }),
            EntityKind::Zombie => EntityState::Zombie(HazardState {
                health: self.tuning.zombie_health,
            }),
            EntityKind::Projectile => EntityState::Projectile(ProjectileState {
                direction: Vector3::new(0.0, 0.0, 0.0),
                remaining_life: self.tuning.projectile_lifetime,
                shooter: None,
            }),
            EntityKind::Train => EntityState::Train(VehicleState {
                throttle: 0.0,
                fuel: self.tuning.starting_fuel,
                rider: None,
            }),
            EntityKind::Item => EntityState::Item(ItemKind::Fuel),
        }
    }

    /// Creates an entity of the given kind with its default state.
    ///
    /// Items created this way are fuel; use [`Self::create_item`] for other kinds.
    pub fn create_entity(&mut self, kind: EntityKind, position: Point3<f32>) -> EntityId {
        let state = self.default_state(kind);
        self.insert(position, state)
    }

    /// Creates an item pickup.
    pub fn create_item(&mut self, item: ItemKind, position: Point3<f32>) -> EntityId {
        self.insert(position, EntityState::Item(item))
    }

    /// Looks an entity up.
    pub fn get_entity_by_id(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Looks an entity up for modification.
    pub fn get_entity_by_id_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Position of an entity.
    pub fn position_of(&self, id: EntityId) -> Option<Point3<f32>> {
        self.entities.get(&id).map(|entity| entity.position)
    }

    /// Deletes an entity, unseating anything it was riding or carrying.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        match &entity.state {
            EntityState::Player(RiderState {
                mount: Some(vehicle),
                ..
            }) => {
                if let Some(EntityState::Train(state)) =
                    self.entities.get_mut(vehicle).map(|e| &mut e.state)
                {
                    state.rider = None;
                }
            }
            EntityState::Train(VehicleState {
                rider: Some(rider), ..
            }) => {
                if let Some(EntityState::Player(state)) =
                    self.entities.get_mut(rider).map(|e| &mut e.state)
                {
                    state.mount = None;
                }
            }
            _ => {}
        }
        Some(entity)
    }

    /// Ids of every entity not marked for removal, in ascending order.
    pub fn all_active_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| !entity.is_marked_for_removal())
            .map(|entity| entity.id)
            .collect();
        ids.sort();
        ids
    }

    /// Ids of every entity of a kind, in ascending order.
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| entity.kind() == kind)
            .map(|entity| entity.id)
            .collect();
        ids.sort();
        ids
    }

    /// Number of stored entities, including those marked for removal.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store holds no entity.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Seats `rider` on `vehicle`.
    ///
    /// # Returns
    /// `false` without changing anything unless `rider` is an unseated player and
    /// `vehicle` is a train without a rider.
    pub fn mount(&mut self, rider: EntityId, vehicle: EntityId) -> bool {
        let rider_free = matches!(
            self.entities.get(&rider).map(|e| &e.state),
            Some(EntityState::Player(RiderState { mount: None, .. }))
        );
        let vehicle_free = matches!(
            self.entities.get(&vehicle).map(|e| &e.state),
            Some(EntityState::Train(VehicleState { rider: None, .. }))
        );
        if !rider_free || !vehicle_free {
            debug!("Rejected mounting {rider} on {vehicle}");
            return false;
        }

        if let Some(EntityState::Player(state)) = self.entities.get_mut(&rider).map(|e| &mut e.state)
        {
            state.mount = Some(vehicle);
        }
        if let Some(EntityState::Train(state)) =
            self.entities.get_mut(&vehicle).map(|e| &mut e.state)
        {
            state.rider = Some(rider);
        }
        true
    }

    /// Unseats `rider`.
    ///
    /// # Returns
    /// `false` without changing anything if `rider` is not a seated player.
    pub fn dismount(&mut self, rider: EntityId) -> bool {
        let vehicle = match self.entities.get_mut(&rider).map(|e| &mut e.state) {
            Some(EntityState::Player(state)) => match state.mount.take() {
                Some(vehicle) => vehicle,
                None => return false,
            },
            _ => return false,
        };
        if let Some(EntityState::Train(state)) =
            self.entities.get_mut(&vehicle).map(|e| &mut e.state)
        {
            if state.rider == Some(rider) {
                state.rider = None;
            }
        }
        true
    }

    /// Sets a train's throttle, clamped to `-1.0..=1.0`.
    ///
    /// # Returns
    /// `false` if `vehicle` is not a train.
    pub fn set_throttle(&mut self, vehicle: EntityId, throttle: f32) -> bool {
        match self.entities.get_mut(&vehicle).map(|e| &mut e.state) {
            Some(EntityState::Train(state)) => {
                state.throttle = throttle.clamp(-1.0, 1.0);
                true
            }
            _ => false,
        }
    }

    /// Adds fuel to a train.
    ///
    /// # Returns
    /// `false` if `vehicle` is not a train or `amount` is negative.
    pub fn refuel(&mut self, vehicle: EntityId, amount: f32) -> bool {
        if amount < 0.0 {
            return false;
        }
        match self.entities.get_mut(&vehicle).map(|e| &mut e.state) {
            Some(EntityState::Train(state)) => {
                state.fuel += amount;
                true
            }
            _ => false,
        }
    }

    /// Fires a projectile from `shooter` along `direction`.
    ///
    /// # Returns
    /// The projectile id, or `None` if the shooter does not exist or the direction is
    /// zero.
    pub fn fire_projectile(&mut self, shooter: EntityId, direction: Vector3<f32>) -> Option<EntityId> {
        let origin = self.position_of(shooter)?;
        if direction.magnitude2() <= f32::EPSILON {
            return None;
        }
        let direction = direction.normalize();
        let state = EntityState::Projectile(ProjectileState {
            direction,
            remaining_life: self.tuning.projectile_lifetime,
            shooter: Some(shooter),
        });
        Some(self.insert(origin + direction * MUZZLE_DISTANCE, state))
    }

    /// Subtracts health from the player or a zombie, marking it for removal at zero.
    ///
    /// # Returns
    /// `false` if the entity does not exist or has no health.
    pub fn apply_damage(&mut self, id: EntityId, amount: f32) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        let health = match &mut entity.state {
            EntityState::Player(state) => &mut state.health,
            EntityState::Zombie(state) => &mut state.health,
            _ => return false,
        };
        *health -= amount;
        if *health <= 0.0 {
            entity.mark_for_removal();
        }
        true
    }

    /// Flags an entity for the cleanup pass, e.g. a projectile that hit something.
    ///
    /// # Returns
    /// `false` if the entity does not exist.
    pub fn mark_for_removal(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.mark_for_removal();
                true
            }
            None => false,
        }
    }

    /// Deletes every entity marked for removal.
    ///
    /// # Returns
    /// The deleted entities in ascending id order.
    pub fn sweep_marked_for_removal(&mut self) -> Vec<Entity> {
        let mut marked: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| entity.is_marked_for_removal())
            .map(|entity| entity.id)
            .collect();
        marked.sort();
        marked
            .into_iter()
            .filter_map(|id| self.remove_entity(id))
            .collect()
    }
}

impl EntitySpawner for EntityStore {
    fn create_entity(&mut self, kind: EntityKind, position: Point3<f32>) -> EntityId {
        EntityStore::create_entity(self, kind, position)
    }

    fn create_item(&mut self, item: ItemKind, position: Point3<f32>) -> EntityId {
        EntityStore::create_item(self, item, position)
    }

    fn has_entity_of_kind(&self, kind: EntityKind) -> bool {
        self.entities.values().any(|entity| entity.kind() == kind)
    }
}
