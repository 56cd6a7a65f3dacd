//! # Chunk Generator
//!
//! Fills a chunk from layered noise shaped into a valley around the rail.
//!
//! ## Column height
//!
//! For every world column `(x, z)`:
//!
//! ```text
//! signal = octave_noise(x * scale, 0, z * scale, octaves, persistence, seed)
//! valley = min(cap, (z - rail_z)^2 * valley_scale)
//! valley = max(valley, min(cap, d^2 * edge_scale))   where x is d blocks past the rail
//! height = floor(signal * valley^2)
//! ```
//!
//! Near the rail line `valley` is close to zero, so the ground is flat at `y = 0`;
//! away from it, and past either end of the rail, hills rise up to `cap^2` blocks.
//!
//! ## Cells
//!
//! With `delta = height - y`: negative is air, zero is the surface material, the next
//! `subsurface_depth` blocks are subsurface, anything deeper is bedrock. The two rows the
//! rail lies on are then paved with bedrock in the rail's chunks.

use std::sync::Arc;

use cgmath::Point3;

use crate::config::TerrainConfig;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::{Block, MaterialRegistry};
use crate::engine_state::voxels::chunk::{Chunk, ChunkCreationIterator, CHUNK_DIMENSION};
use crate::engine_state::voxels::noise_field::octave_noise;
use crate::engine_state::voxels::world::WorldShape;
use crate::error::WorldError;

/// Chunk-local z of the two rows the rail bed occupies.
pub const RAIL_ROWS: [usize; 2] = [7, 8];

/// The materials a column is built from.
struct TerrainMaterials {
    air: Block,
    surface: Block,
    subsurface: Block,
    bedrock: Block,
}

/// Deterministic terrain for chunk coordinates.
///
/// The generator holds no mutable state, so it can be shared by generation workers
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ChunkGenerator {
    seed: u32,
    shape: WorldShape,
    terrain: TerrainConfig,
    registry: Arc<MaterialRegistry>,
}

impl ChunkGenerator {
    /// Creates a generator.
    ///
    /// # Arguments
    /// * `seed` - Seed of the terrain noise
    /// * `shape` - World extent; the rail ends shape the edge valleys
    /// * `terrain` - Noise and valley tuning plus material names
    /// * `registry` - Where material names are resolved
    pub fn new(
        seed: u32,
        shape: WorldShape,
        terrain: TerrainConfig,
        registry: Arc<MaterialRegistry>,
    ) -> Self {
        Self {
            seed,
            shape,
            terrain,
            registry,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn shape(&self) -> &WorldShape {
        &self.shape
    }

    fn resolve_materials(&self) -> Result<TerrainMaterials, WorldError> {
        Ok(TerrainMaterials {
            air: Block::new(BlockType::AIR),
            surface: self.registry.find_material_by_name(&self.terrain.surface_material)?,
            subsurface: self
                .registry
                .find_material_by_name(&self.terrain.subsurface_material)?,
            bedrock: self.registry.find_material_by_name(&self.terrain.bedrock_material)?,
        })
    }

    /// Valley depth factor of a world column.
    fn valley_factor(&self, x: i32, z: i32) -> f64 {
        let terrain = &self.terrain;
        let from_rail = f64::from(z - terrain.rail_z);
        let mut valley = (from_rail * from_rail * terrain.valley_scale).min(terrain.valley_cap);
        if let Some(distance) = self.shape.distance_past_rail(x) {
            let distance = f64::from(distance);
            let edge = (distance * distance * terrain.edge_scale).min(terrain.valley_cap);
            valley = valley.max(edge);
        }
        valley
    }

    /// Terrain surface height of a world column.
    pub fn column_height(&self, x: i32, z: i32) -> i32 {
        let terrain = &self.terrain;
        let signal = octave_noise(
            f64::from(x) * terrain.horizontal_scale,
            0.0,
            f64::from(z) * terrain.horizontal_scale,
            terrain.octaves,
            terrain.persistence,
            self.seed,
        );
        let valley = self.valley_factor(x, z);
        (signal * valley * valley).floor() as i32
    }

    /// Builds the chunk at a chunk coordinate.
    ///
    /// # Errors
    /// `UnknownMaterial` when one of the terrain materials is not registered. No chunk is
    /// produced in that case.
    pub fn generate(&self, coordinate: Point3<i32>) -> Result<Chunk, WorldError> {
        let materials = self.resolve_materials()?;
        let origin = coordinate * CHUNK_DIMENSION;

        let mut heights = [[0i32; CHUNK_DIMENSION as usize]; CHUNK_DIMENSION as usize];
        for (k, row) in heights.iter_mut().enumerate() {
            for (i, height) in row.iter_mut().enumerate() {
                *height = self.column_height(origin.x + i as i32, origin.z + k as i32);
            }
        }

        let mut cci = ChunkCreationIterator::new(coordinate);
        for row in &heights {
            for j in 0..CHUNK_DIMENSION {
                let y = origin.y + j;
                for height in row {
                    cci.push_block(self.block_for(&materials, *height - y));
                }
            }
        }
        let mut chunk = cci.return_chunk();

        if coordinate.y == 0 && coordinate.z == 0 {
            for z in RAIL_ROWS {
                for x in 0..CHUNK_DIMENSION as usize {
                    chunk.set_block_at(x, 0, z, &materials.bedrock);
                }
            }
        }

        Ok(chunk)
    }

    fn block_for<'a>(&self, materials: &'a TerrainMaterials, delta: i32) -> &'a Block {
        if delta < 0 {
            &materials.air
        } else if delta == 0 {
            &materials.surface
        } else if delta <= self.terrain.subsurface_depth {
            &materials.subsurface
        } else {
            &materials.bedrock
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(shape: WorldShape) -> ChunkGenerator {
        ChunkGenerator::new(
            1337,
            shape,
            TerrainConfig::default(),
            Arc::new(MaterialRegistry::new()),
        )
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generator(WorldShape::default());
        let b = generator(WorldShape::default());
        for coordinate in [Point3::new(0, 0, 0), Point3::new(-3, 0, 5), Point3::new(4, -1, -6)] {
            let first = a.generate(coordinate).unwrap();
            let second = b.generate(coordinate).unwrap();
            assert!(first.blocks().eq(second.blocks()));
        }
    }

    #[test]
    fn origin_chunk_is_flat_at_zero() {
        let chunk = generator(WorldShape::with_rail(0, 100))
            .generate(Point3::new(0, 0, 0))
            .unwrap();
        assert_eq!(chunk.min_block_height(), Some(0));
        assert_eq!(chunk.max_block_height(), Some(0));
    }

    #[test]
    fn rail_rows_are_paved_with_bedrock() {
        let chunk = generator(WorldShape::default())
            .generate(Point3::new(0, 0, 0))
            .unwrap();
        let stone = BlockType::STONE.id();
        for z in RAIL_ROWS {
            for x in 0..16 {
                assert_eq!(chunk.get_block_at(x, 0, z), stone);
            }
        }
        assert_eq!(chunk.get_block_at(0, 0, 0), BlockType::GRASS.id());
    }

    #[test]
    fn valley_widens_past_the_rail_ends() {
        let generator = generator(WorldShape::centered(32));
        for x in [6, -6] {
            let chunk = generator.generate(Point3::new(x, 0, 0)).unwrap();
            assert!(chunk.max_block_height().unwrap() > 0, "chunk x={x} stayed flat");
        }
    }

    #[test]
    fn valley_widens_away_from_the_rail_line() {
        let generator = generator(WorldShape::centered(32));
        for z in [4, -4] {
            let chunk = generator.generate(Point3::new(0, 0, z)).unwrap();
            assert!(chunk.max_block_height().unwrap() > 0, "chunk z={z} stayed flat");
        }
    }

    #[test]
    fn deep_terrain_reaches_bedrock() {
        let chunk = generator(WorldShape::centered(32))
            .generate(Point3::new(0, 0, 18))
            .unwrap();
        assert!(chunk.count_blocks(BlockType::STONE.id()) > 0);
    }

    #[test]
    fn chunks_above_the_terrain_are_air() {
        let chunk = generator(WorldShape::default())
            .generate(Point3::new(0, 2, 0))
            .unwrap();
        assert_eq!(chunk.max_block_height(), None);
    }

    #[test]
    fn unknown_materials_abort_generation() {
        let terrain = TerrainConfig {
            surface_material: "obsidian".to_string(),
            ..TerrainConfig::default()
        };
        let generator = ChunkGenerator::new(
            1,
            WorldShape::default(),
            terrain,
            Arc::new(MaterialRegistry::new()),
        );
        match generator.generate(Point3::new(0, 0, 0)) {
            Err(WorldError::UnknownMaterial { name }) => assert_eq!(name, "obsidian"),
            other => panic!("expected unknown material, got {other:?}"),
        }
    }

    #[test]
    fn registered_materials_can_be_used_for_terrain() {
        let sand = Block {
            id: 40,
            name: "sand".to_string(),
            solid: true,
            transparent: false,
        };
        let terrain = TerrainConfig {
            surface_material: "sand".to_string(),
            ..TerrainConfig::default()
        };
        let generator = ChunkGenerator::new(
            1,
            WorldShape::default(),
            terrain,
            Arc::new(MaterialRegistry::with_materials([sand])),
        );
        let chunk = generator.generate(Point3::new(0, 0, 0)).unwrap();
        assert!(chunk.count_blocks(40) > 0);
    }
}
