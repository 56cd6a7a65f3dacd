//! # Chunk Populator
//!
//! Scatters entities over a freshly generated chunk: the train at the world origin,
//! zombies and item pickups wherever their noise channels peak.
//!
//! The world holds a single train. A regenerated origin chunk gets no second one while
//! the first still exists.
//!
//! Spawning is gated per column. A column spawns only when the block above its surface
//! lies inside the chunk, its horizontal distance from the world origin exceeds the
//! channel's exclusion radius and the channel's noise exceeds its threshold. The item
//! kind is rolled from a generator seeded by the world seed, chunk and column, so the
//! outcome does not depend on the order chunks are populated in.

use cgmath::Point3;
use log::debug;

use crate::config::{ItemWeight, PopulationConfig, SpawnChannelConfig};
use crate::engine_state::entities::{EntityId, EntityKind, EntitySpawner, ItemKind};
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_DIMENSION};
use crate::engine_state::voxels::noise_field::octave_noise;

/// Mixed into the world seed for the item channel.
pub const ITEM_SEED_SALT: u32 = 0x5bd1_e995;

/// Chunk-local column the train is placed on in the origin chunk.
const VEHICLE_COLUMN: usize = 8;

/// Places entities on generated chunks.
#[derive(Clone, Debug)]
pub struct ChunkPopulator {
    seed: u32,
    population: PopulationConfig,
}

impl ChunkPopulator {
    pub fn new(seed: u32, population: PopulationConfig) -> Self {
        Self { seed, population }
    }

    /// Spawns the entities of one chunk and records them in its entity set.
    ///
    /// A chunk is populated once; later calls return no entities. The train is only
    /// spawned if the spawner has none.
    ///
    /// # Arguments
    /// * `chunk` - The generated chunk
    /// * `spawner` - Creates the entities
    ///
    /// # Returns
    /// The ids of every spawned entity.
    pub fn execute(&self, chunk: &mut Chunk, spawner: &mut dyn EntitySpawner) -> Vec<EntityId> {
        if chunk.is_populated() {
            return Vec::new();
        }
        chunk.mark_populated();

        let mut spawned = Vec::new();
        let origin = chunk.origin();

        let vehicle_missing = !spawner.has_entity_of_kind(EntityKind::Train);
        if chunk.position == Point3::new(0, 0, 0) && vehicle_missing {
            let surface = chunk
                .surface_height(VEHICLE_COLUMN, VEHICLE_COLUMN)
                .unwrap_or(origin.y);
            let position = Point3::new(
                (origin.x + VEHICLE_COLUMN as i32) as f32,
                (surface + self.population.spawn_height_offset) as f32,
                (origin.z + VEHICLE_COLUMN as i32) as f32,
            );
            spawned.push(spawner.create_entity(EntityKind::Train, position));
        }

        let offset = self.population.spawn_height_offset;
        let vertical_extent = origin.y..origin.y + CHUNK_DIMENSION;
        let band = match (chunk.min_block_height(), chunk.max_block_height()) {
            (Some(min), Some(max)) => (min + offset)..=(max + offset),
            _ => return self.record(chunk, spawned),
        };
        if *band.end() < vertical_extent.start || *band.start() >= vertical_extent.end {
            return self.record(chunk, spawned);
        }

        for k in 0..CHUNK_DIMENSION as usize {
            for i in 0..CHUNK_DIMENSION as usize {
                let Some(surface) = chunk.surface_height(i, k) else {
                    continue;
                };
                let spawn_y = surface + offset;
                if !vertical_extent.contains(&spawn_y) {
                    continue;
                }
                let x = origin.x + i as i32;
                let z = origin.z + k as i32;
                let center = |y: i32| Point3::new(x as f32 + 0.5, y as f32, z as f32 + 0.5);

                if channel_fires(&self.population.hazard, x, z, self.seed) {
                    spawned.push(spawner.create_entity(EntityKind::Zombie, center(spawn_y)));
                }
                if channel_fires(&self.population.item, x, z, self.seed ^ ITEM_SEED_SALT) {
                    let item = roll_item(
                        &self.population.item_table,
                        column_seed(self.seed, chunk.position, i, k),
                    );
                    spawned.push(spawner.create_item(item, center(spawn_y)));
                }
            }
        }

        self.record(chunk, spawned)
    }

    fn record(&self, chunk: &mut Chunk, spawned: Vec<EntityId>) -> Vec<EntityId> {
        for id in &spawned {
            chunk.add_entity(*id);
        }
        if !spawned.is_empty() {
            debug!("Populated chunk {:?} with {} entities", chunk.position, spawned.len());
        }
        spawned
    }
}

/// Whether a spawn channel fires at a world column.
fn channel_fires(channel: &SpawnChannelConfig, x: i32, z: i32, seed: u32) -> bool {
    let distance_squared = f64::from(x) * f64::from(x) + f64::from(z) * f64::from(z);
    if distance_squared <= channel.exclusion_radius * channel.exclusion_radius {
        return false;
    }
    let value = octave_noise(
        f64::from(x) * channel.scale + channel.offset,
        0.0,
        f64::from(z) * channel.scale + channel.offset,
        1,
        0.5,
        seed,
    );
    value > channel.threshold
}

/// Seed of the item roll of one column.
fn column_seed(seed: u32, chunk: Point3<i32>, i: usize, k: usize) -> u64 {
    let mut hash = u64::from(seed);
    for value in [chunk.x as u64, chunk.y as u64, chunk.z as u64, i as u64, k as u64] {
        hash = (hash ^ value).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        hash ^= hash >> 29;
    }
    hash
}

/// Rolls an item kind over cumulative percentage buckets.
///
/// Falls back to fuel if the table has no weight.
pub fn roll_item(table: &[ItemWeight], seed: u64) -> ItemKind {
    let total: u32 = table.iter().map(|weight| weight.percent).sum();
    if total == 0 {
        return ItemKind::Fuel;
    }
    let mut rng = fastrand::Rng::with_seed(seed);
    let roll = rng.u32(0..total);
    let mut cumulative = 0;
    for weight in table {
        cumulative += weight.percent;
        if roll < cumulative {
            return weight.item;
        }
    }
    ItemKind::Fuel
}
