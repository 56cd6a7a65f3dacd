//! # Entities Module
//!
//! Everything that moves in the world: the player, zombies, projectiles, the train and
//! item pickups.
//!
//! ## Architecture
//!
//! * **Entity** - id, position and a closed [`EntityState`] union holding the
//!   kind-specific data
//! * **Store** - owns every entity and implements the spawning port the populator uses
//! * **Physics** - the velocity/orientation port behaviors drive, plus a kinematic
//!   stand-in for a physics engine
//! * **Behavior** - the per-tick dispatch table keyed by [`EntityKind`]
//! * **Membership** - keeps each chunk's entity set in step with entity positions

use std::fmt;

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

pub mod behavior;
pub mod membership;
pub mod physics;
pub mod store;

pub use behavior::{BehaviorContext, BehaviorFn, EntityBehaviorSystem};
pub use membership::{ChunkMembershipTracker, MembershipChange};
pub use physics::{KinematicBodies, PhysicsControl};
pub use store::{EntitySpawner, EntityStore};

/// Unique identifier of an entity. Ids are never reused by a store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind tag of an entity, used to pick its behavior.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// The player; the streaming viewpoint.
    Player,
    /// A hazard that walks toward the player.
    Zombie,
    /// A fired shot.
    Projectile,
    /// The rideable vehicle running on the rail.
    Train,
    /// A pickup lying on the ground.
    Item,
}

/// The pickups the populator scatters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Refills the train.
    Fuel,
    /// Rounds for the player's weapon.
    Ammo,
    /// Restores player health.
    Medkit,
    /// A spread weapon.
    Shotgun,
    /// A long range weapon.
    Rifle,
    /// A large fuel refill.
    GoldenFuel,
    /// The rarest weapon.
    RainbowGun,
}

/// State of the player.
#[derive(Clone, Debug, PartialEq)]
pub struct RiderState {
    /// The vehicle the player is riding.
    pub mount: Option<EntityId>,
    /// Remaining health.
    pub health: f32,
}

/// State of a zombie.
#[derive(Clone, Debug, PartialEq)]
pub struct HazardState {
    /// Remaining health.
    pub health: f32,
}

/// State of a projectile.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileState {
    /// Unit direction of travel.
    pub direction: Vector3<f32>,
    /// Seconds until the projectile expires.
    pub remaining_life: f32,
    /// Who fired it.
    pub shooter: Option<EntityId>,
}

/// State of the train.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleState {
    /// Signed fraction of full speed, within `-1.0..=1.0`.
    pub throttle: f32,
    /// Fuel left; the train does not move without it.
    pub fuel: f32,
    /// The entity seated on the train.
    pub rider: Option<EntityId>,
}

/// Kind-specific entity data.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityState {
    /// See [`RiderState`].
    Player(RiderState),
    /// See [`HazardState`].
    Zombie(HazardState),
    /// See [`ProjectileState`].
    Projectile(ProjectileState),
    /// See [`VehicleState`].
    Train(VehicleState),
    /// A pickup of the given kind.
    Item(ItemKind),
}

impl EntityState {
    /// The kind tag of this state.
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityState::Player(_) => EntityKind::Player,
            EntityState::Zombie(_) => EntityKind::Zombie,
            EntityState::Projectile(_) => EntityKind::Projectile,
            EntityState::Train(_) => EntityKind::Train,
            EntityState::Item(_) => EntityKind::Item,
        }
    }
}

/// An entity of the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Unique id.
    pub id: EntityId,
    /// World-space position.
    pub position: Point3<f32>,
    /// Kind-specific data.
    pub state: EntityState,
    marked_for_removal: bool,
}

impl Entity {
    /// Creates an entity that is not marked for removal.
    pub fn new(id: EntityId, position: Point3<f32>, state: EntityState) -> Self {
        Self {
            id,
            position,
            state,
            marked_for_removal: false,
        }
    }

    /// The kind tag of this entity.
    pub fn kind(&self) -> EntityKind {
        self.state.kind()
    }

    /// Whether the cleanup pass should delete this entity.
    pub fn is_marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }

    /// Flags this entity for the cleanup pass.
    pub fn mark_for_removal(&mut self) {
        self.marked_for_removal = true;
    }

    /// The vehicle data, if this is a train.
    pub fn as_vehicle(&self) -> Option<&VehicleState> {
        match &self.state {
            EntityState::Train(vehicle) => Some(vehicle),
            _ => None,
        }
    }

    /// The rider data, if this is the player.
    pub fn as_rider(&self) -> Option<&RiderState> {
        match &self.state {
            EntityState::Player(rider) => Some(rider),
            _ => None,
        }
    }
}
