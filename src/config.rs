//! # Configuration Module
//!
//! Every tunable of the world core lives in [`GameConfig`]. The defaults describe the
//! shipped game; a JSON file can override any subset of fields since every section is
//! `#[serde(default)]`.
//!
//! ## Sections
//!
//! * `world` - rail extent and hard chunk bounds
//! * `streaming` - how many chunks stay resident around the viewpoint
//! * `terrain` - noise sampling, valley shaping and material names
//! * `population` - spawn channels and the item weight table
//! * `behavior` - per-kind movement tuning
//! * `materials` - extra blocks registered on top of the built-in ones

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine_state::entities::ItemKind;
use crate::engine_state::voxels::block::{Block, BlockType, BlockTypeSize};
use crate::engine_state::voxels::world::WorldShape;
use crate::error::WorldError;

/// Top level configuration for an [`crate::engine_state::EngineState`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed shared by terrain and spawn noise.
    pub seed: u32,
    /// Rail extent and hard chunk bounds.
    pub world: WorldShape,
    /// Residency radii around the viewpoint.
    pub streaming: StreamingConfig,
    /// Terrain shaping.
    pub terrain: TerrainConfig,
    /// Entity scattering.
    pub population: PopulationConfig,
    /// Movement tuning for entity behaviors.
    pub behavior: BehaviorConfig,
    /// Materials registered in addition to the built-in block types.
    pub materials: Vec<Block>,
    /// Where the player (the streaming viewpoint) appears.
    pub player_spawn: [f32; 3],
    /// Worker threads used for chunk generation. `0` generates inline on the caller.
    pub generation_workers: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            world: WorldShape::default(),
            streaming: StreamingConfig::default(),
            terrain: TerrainConfig::default(),
            population: PopulationConfig::default(),
            behavior: BehaviorConfig::default(),
            materials: Vec::new(),
            player_spawn: [8.0, 2.0, 6.0],
            generation_workers: 2,
        }
    }
}

impl GameConfig {
    /// Parses and validates a configuration from JSON text.
    ///
    /// # Errors
    /// `ConfigParse` for malformed JSON, `InvalidConfig` when validation fails.
    pub fn from_json_str(text: &str) -> Result<Self, WorldError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    /// `ConfigIo` when the file cannot be read, otherwise as [`Self::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        debug!("Loading config from {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| WorldError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, WorldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the values that would otherwise surface as nonsense at runtime.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.world.start_x >= self.world.end_x {
            return Err(WorldError::InvalidConfig(format!(
                "rail start {} must be before rail end {}",
                self.world.start_x, self.world.end_x
            )));
        }
        for axis in 0..3 {
            if self.world.min_chunk[axis] > self.world.max_chunk[axis] {
                return Err(WorldError::InvalidConfig(format!(
                    "chunk bound min {} exceeds max {} on axis {axis}",
                    self.world.min_chunk[axis], self.world.max_chunk[axis]
                )));
            }
        }
        if self.streaming.horizontal_radius < 0 || self.streaming.vertical_radius < 0 {
            return Err(WorldError::InvalidConfig(
                "streaming radii must not be negative".to_string(),
            ));
        }
        if self.population.item_table.iter().map(|w| w.percent).sum::<u32>() == 0 {
            return Err(WorldError::InvalidConfig(
                "item table needs at least one non-zero weight".to_string(),
            ));
        }
        for material in &self.materials {
            if is_builtin_id(material.id) {
                return Err(WorldError::InvalidConfig(format!(
                    "material '{}' reuses built-in block id {}",
                    material.name, material.id
                )));
            }
        }
        Ok(())
    }
}

/// Residency radii, in chunks, around the viewpoint chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Radius on the x and z axes.
    pub horizontal_radius: i32,
    /// Radius on the y axis.
    pub vertical_radius: i32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            horizontal_radius: 3,
            vertical_radius: 1,
        }
    }
}

/// Terrain noise and valley shaping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Horizontal scale applied to world coordinates before sampling noise.
    pub horizontal_scale: f64,
    /// Octaves of the terrain signal.
    pub octaves: i32,
    /// Amplitude falloff per octave.
    pub persistence: f64,
    /// World z of the rail line the valley is centered on.
    pub rail_z: i32,
    /// Quadratic growth of the valley away from the rail line.
    pub valley_scale: f64,
    /// Quadratic growth of the valley past the rail's x extent.
    pub edge_scale: f64,
    /// Upper clamp of either valley term.
    pub valley_cap: f64,
    /// Blocks of subsurface material below the surface block.
    pub subsurface_depth: i32,
    /// Material of the top block of each column.
    pub surface_material: String,
    /// Material of the few blocks under the surface.
    pub subsurface_material: String,
    /// Material of everything deeper, and of the rail bed.
    pub bedrock_material: String,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            horizontal_scale: 0.05,
            octaves: 4,
            persistence: 0.5,
            rail_z: 8,
            valley_scale: 0.01,
            edge_scale: 0.01,
            valley_cap: 6.0,
            subsurface_depth: 3,
            surface_material: "grass".to_string(),
            subsurface_material: "dirt".to_string(),
            bedrock_material: "stone".to_string(),
        }
    }
}

/// One noise channel gating a kind of spawn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnChannelConfig {
    /// Horizontal scale of the channel's noise.
    pub scale: f64,
    /// Offset added after scaling, decorrelating channels.
    pub offset: f64,
    /// Noise value a column must exceed to spawn.
    pub threshold: f64,
    /// No spawns within this horizontal distance of the world origin.
    pub exclusion_radius: f64,
}

/// Weight of one item kind in the item table, in percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemWeight {
    /// The item rolled by this bucket.
    pub item: ItemKind,
    /// Width of the bucket.
    pub percent: u32,
}

/// Entity scattering over generated chunks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Height above the surface at which entities are placed.
    pub spawn_height_offset: i32,
    /// Zombie channel.
    pub hazard: SpawnChannelConfig,
    /// Item pickup channel.
    pub item: SpawnChannelConfig,
    /// Cumulative buckets rolled for each item spawn.
    pub item_table: Vec<ItemWeight>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            spawn_height_offset: 1,
            hazard: SpawnChannelConfig {
                scale: 0.37,
                offset: 1000.5,
                threshold: 0.78,
                exclusion_radius: 48.0,
            },
            item: SpawnChannelConfig {
                scale: 0.23,
                offset: -500.25,
                threshold: 0.80,
                exclusion_radius: 64.0,
            },
            item_table: vec![
                ItemWeight { item: ItemKind::Fuel, percent: 40 },
                ItemWeight { item: ItemKind::Ammo, percent: 25 },
                ItemWeight { item: ItemKind::Medkit, percent: 15 },
                ItemWeight { item: ItemKind::Shotgun, percent: 10 },
                ItemWeight { item: ItemKind::Rifle, percent: 6 },
                ItemWeight { item: ItemKind::GoldenFuel, percent: 3 },
                ItemWeight { item: ItemKind::RainbowGun, percent: 1 },
            ],
        }
    }
}

/// Movement tuning used by entity behaviors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Horizontal speed of zombies, blocks per second.
    pub zombie_speed: f32,
    /// Starting health of zombies.
    pub zombie_health: f32,
    /// Starting health of the player.
    pub player_health: f32,
    /// Speed of fired projectiles.
    pub projectile_speed: f32,
    /// Seconds before an unmatched projectile expires.
    pub projectile_lifetime: f32,
    /// Train speed at full throttle.
    pub train_speed: f32,
    /// Fraction of throttle lost per second.
    pub train_friction: f32,
    /// Fuel burned per second at full throttle.
    pub fuel_burn_rate: f32,
    /// Fuel a freshly spawned train carries.
    pub starting_fuel: f32,
    /// Rider position relative to the train.
    pub seat_offset: [f32; 3],
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            zombie_speed: 3.0,
            zombie_health: 20.0,
            player_health: 100.0,
            projectile_speed: 40.0,
            projectile_lifetime: 3.0,
            train_speed: 8.0,
            train_friction: 0.5,
            fuel_burn_rate: 1.0,
            starting_fuel: 100.0,
            seat_offset: [0.0, 1.5, 0.0],
        }
    }
}

/// Built-in block ids are reserved; config materials must pick others.
fn is_builtin_id(id: BlockTypeSize) -> bool {
    BlockType::from_id(id).is_some()
}
