//! # Engine State Module
//!
//! The per-tick driver of the world core.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the world, the entities and every subsystem, and runs ticks
//! * `entities` - Entity storage, behaviors, the physics port and chunk membership
//! * `task_management` - The worker pool chunk generation runs on
//! * `voxels` - Blocks, chunks, the world and its generation
//!
//! ## Tick
//!
//! 1. Advance bodies by the velocities set last tick
//! 2. Diff the desired chunks around the viewpoint against the resident ones
//! 3. Unload chunks that are no longer desired, despawning what they held
//! 4. Generate every new chunk and insert it into the world (a barrier)
//! 5. Populate the new chunks
//! 6. Run entity behaviors and re-bucket entities into chunks
//! 7. Delete entities marked for removal

use std::collections::HashSet;
use std::sync::Arc;

use cgmath::{Point3, Vector3};
use log::{debug, error, info};
use web_time::Instant;

use crate::config::GameConfig;
use crate::error::WorldError;
use entities::{
    EntityBehaviorSystem, EntityId, EntityKind, EntityStore, KinematicBodies,
};
use task_management::TaskManager;
use voxels::block::MaterialRegistry;
use voxels::generation::{ChunkGenerator, ChunkPopulator, ChunkRadiusManager};
use voxels::tasks::chunk_generation_task::ChunkGenerationTask;
use voxels::world::World;

pub mod entities;
pub mod task_management;
pub mod voxels;

/// What one tick changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Chunks generated and inserted.
    pub generated: usize,
    /// Chunks that became resident.
    pub loaded: usize,
    /// Resident chunks that stayed desired.
    pub updated: usize,
    /// Chunks removed from the world.
    pub unloaded: usize,
    /// Entities created by population.
    pub spawned: usize,
    /// Entities deleted along with unloaded chunks.
    pub despawned: usize,
    /// Entities the behavior system updated.
    pub active_entities: usize,
    /// Entities outside every resident chunk after the behavior pass.
    pub dangling: usize,
    /// Entities deleted by the removal sweep.
    pub removed: usize,
}

/// The world core: terrain streaming, population and entity simulation.
///
/// # Examples
///
/// ```
/// use rail_world::config::GameConfig;
/// use rail_world::engine_state::EngineState;
///
/// let config = GameConfig {
///     generation_workers: 0,
///     ..GameConfig::default()
/// };
/// let mut engine = EngineState::new(config).unwrap();
/// let report = engine.tick(1.0 / 60.0).unwrap();
/// assert!(report.generated > 0);
/// assert!(engine.mount_viewpoint_on_vehicle());
/// ```
pub struct EngineState {
    /// The configuration the engine was built from
    config: GameConfig,
    /// The resident chunks
    world: World,
    /// Every entity
    entities: EntityStore,
    /// Velocity table standing in for a physics engine
    physics: KinematicBodies,
    /// Per-kind behaviors and chunk membership
    behaviors: EntityBehaviorSystem,
    /// Decides which chunks should be resident
    radius_manager: ChunkRadiusManager,
    /// Terrain generator shared with generation tasks
    generator: Arc<ChunkGenerator>,
    /// Scatters entities over generated chunks
    populator: ChunkPopulator,
    /// Worker pool for chunk generation
    task_manager: TaskManager,
    /// The player; chunks stream around it
    viewpoint: EntityId,
    /// Where the viewpoint was last seen, kept for when it has been removed
    viewpoint_position: Point3<f32>,
}

impl EngineState {
    /// Creates an engine with an empty world and the player at its spawn point.
    ///
    /// # Errors
    /// `InvalidConfig` when the configuration fails validation.
    pub fn new(config: GameConfig) -> Result<Self, WorldError> {
        config.validate()?;

        let registry = Arc::new(MaterialRegistry::with_materials(config.materials.clone()));
        let generator = Arc::new(ChunkGenerator::new(
            config.seed,
            config.world,
            config.terrain.clone(),
            registry,
        ));
        let populator = ChunkPopulator::new(config.seed, config.population.clone());

        let mut entities = EntityStore::new(config.behavior);
        let viewpoint_position = Point3::from(config.player_spawn);
        let viewpoint = entities.create_entity(EntityKind::Player, viewpoint_position);

        info!(
            "World seed {} with rail {}..{}, player {viewpoint} at {viewpoint_position:?}",
            config.seed, config.world.start_x, config.world.end_x
        );

        Ok(Self {
            world: World::new(config.world),
            entities,
            physics: KinematicBodies::new(),
            behaviors: EntityBehaviorSystem::new(config.behavior),
            radius_manager: ChunkRadiusManager::new(config.streaming),
            generator,
            populator,
            task_manager: TaskManager::new(config.generation_workers),
            viewpoint,
            viewpoint_position,
            config,
        })
    }

    /// Advances the world by `delta_time` seconds.
    ///
    /// # Errors
    /// The first chunk generation error. The tick stops after the generation barrier in
    /// that case and the chunks it did generate are taken out of the world again, so the
    /// next tick generates and populates them afresh.
    pub fn tick(&mut self, delta_time: f32) -> Result<TickReport, WorldError> {
        let tick_start = Instant::now();
        let mut report = TickReport::default();

        self.physics.integrate(&mut self.entities, delta_time);
        if let Some(position) = self.entities.position_of(self.viewpoint) {
            self.viewpoint_position = position;
        }

        let diff = self.radius_manager.execute(&self.world, self.viewpoint_position);
        report.loaded = diff.to_load.len();
        report.updated = diff.to_update.len();

        let (unloaded, despawned) = self.unload_chunks(&diff.to_unload);
        report.unloaded = unloaded;
        report.despawned = despawned;

        let generation_start = Instant::now();
        for coordinate in &diff.to_generate {
            let task = ChunkGenerationTask::new(self.generator.clone(), *coordinate);
            self.task_manager.publish_task(Box::new(task));
        }
        if let Err(err) = self.task_manager.finish_all(&mut self.world) {
            let discarded = self.discard_unpopulated(&diff.to_generate);
            error!("Chunk generation failed, abandoning tick and {discarded} new chunks: {err}");
            return Err(err);
        }
        report.generated = diff.to_generate.len();
        let generation_time = generation_start.elapsed();

        for coordinate in &diff.to_generate {
            let Some(chunk) = self.world.get_chunk(*coordinate) else {
                continue;
            };
            let spawned = self.populator.execute(&mut chunk.get_mut(), &mut self.entities);
            for id in &spawned {
                self.behaviors.membership_mut().track(*id, *coordinate);
            }
            report.spawned += spawned.len();
        }

        let active = self.entities.all_active_ids();
        report.active_entities = active.len();
        report.dangling = self.behaviors.tick(
            &active,
            delta_time,
            &self.world,
            &mut self.entities,
            &mut self.physics,
            self.viewpoint,
        );

        report.removed = self.sweep_removed();

        if !diff.is_stationary() {
            debug!(
                "Tick generated {} chunks in {:?}, unloaded {}, spawned {}, total {:?}",
                report.generated,
                generation_time,
                report.unloaded,
                report.spawned,
                tick_start.elapsed()
            );
        }
        Ok(report)
    }

    /// Removes chunks from the world along with the entities they hold.
    ///
    /// The viewpoint and the vehicle it rides survive; they are re-bucketed when they
    /// reach a resident chunk again.
    fn unload_chunks(&mut self, coordinates: &[Point3<i32>]) -> (usize, usize) {
        let mut retained: HashSet<EntityId> = HashSet::from([self.viewpoint]);
        if let Some(mount) = self
            .entities
            .get_entity_by_id(self.viewpoint)
            .and_then(|entity| entity.as_rider())
            .and_then(|rider| rider.mount)
        {
            retained.insert(mount);
        }

        let mut unloaded = 0;
        let mut despawned = 0;
        for coordinate in coordinates {
            let Some(chunk) = self.world.remove_chunk(*coordinate) else {
                continue;
            };
            unloaded += 1;
            let members: Vec<EntityId> = chunk.get().entities().iter().copied().collect();
            for id in members {
                self.behaviors.membership_mut().forget(id);
                if retained.contains(&id) {
                    continue;
                }
                self.physics.remove_body(id);
                if self.entities.remove_entity(id).is_some() {
                    despawned += 1;
                }
            }
        }
        (unloaded, despawned)
    }

    /// Removes chunks that were inserted but never populated.
    fn discard_unpopulated(&mut self, coordinates: &[Point3<i32>]) -> usize {
        let mut discarded = 0;
        for coordinate in coordinates {
            let Some(chunk) = self.world.get_chunk(*coordinate) else {
                continue;
            };
            let populated = chunk.get().is_populated();
            if !populated {
                self.world.remove_chunk(*coordinate);
                discarded += 1;
            }
        }
        discarded
    }

    /// Deletes entities marked for removal and drops them from every index.
    fn sweep_removed(&mut self) -> usize {
        let removed = self.entities.sweep_marked_for_removal();
        for entity in &removed {
            if let Some(coordinate) = self.behaviors.membership_mut().forget(entity.id) {
                if let Some(chunk) = self.world.get_chunk(coordinate) {
                    chunk.get_mut().remove_entity(entity.id);
                }
            }
            self.physics.remove_body(entity.id);
        }
        removed.len()
    }

    /// Seats the player on the train.
    ///
    /// # Returns
    /// `false` if there is no train yet or the player is already seated.
    pub fn mount_viewpoint_on_vehicle(&mut self) -> bool {
        match self.entities.ids_of_kind(EntityKind::Train).first() {
            Some(train) => self.entities.mount(self.viewpoint, *train),
            None => false,
        }
    }

    /// Unseats the player.
    pub fn dismount_viewpoint(&mut self) -> bool {
        self.entities.dismount(self.viewpoint)
    }

    /// Sets the throttle of the train the player rides.
    ///
    /// # Returns
    /// `false` if the player is not riding.
    pub fn set_vehicle_throttle(&mut self, throttle: f32) -> bool {
        let mount = self
            .entities
            .get_entity_by_id(self.viewpoint)
            .and_then(|entity| entity.as_rider())
            .and_then(|rider| rider.mount);
        match mount {
            Some(vehicle) => self.entities.set_throttle(vehicle, throttle),
            None => false,
        }
    }

    /// Fires a projectile from the player.
    pub fn fire_from_viewpoint(&mut self, direction: Vector3<f32>) -> Option<EntityId> {
        self.entities.fire_projectile(self.viewpoint, direction)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Mutable access to entities, for gameplay events like damage.
    pub fn entities_mut(&mut self) -> &mut EntityStore {
        &mut self.entities
    }

    pub fn physics(&self) -> &KinematicBodies {
        &self.physics
    }

    pub fn behaviors(&self) -> &EntityBehaviorSystem {
        &self.behaviors
    }

    /// The player entity.
    pub fn viewpoint(&self) -> EntityId {
        self.viewpoint
    }

    /// Where chunks were last streamed around.
    pub fn viewpoint_position(&self) -> Point3<f32> {
        self.viewpoint_position
    }
}
