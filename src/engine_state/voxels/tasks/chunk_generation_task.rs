//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which generates the terrain of one
//! chunk on a worker thread. The chunk is inserted into the world when the result is
//! handled on the driving thread.

use std::sync::Arc;

use cgmath::Point3;
use log::{error, warn};

use crate::engine_state::task_management::task::{Task, TaskResult};
use crate::engine_state::voxels::chunk::Chunk;
use crate::engine_state::voxels::generation::ChunkGenerator;
use crate::engine_state::voxels::world::World;
use crate::error::WorldError;

/// A task that generates chunk data off the driving thread.
pub struct ChunkGenerationTask {
    /// The shared, immutable terrain generator
    generator: Arc<ChunkGenerator>,
    /// The position of the chunk to generate (in chunk coordinates)
    position: Point3<i32>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `generator` - The terrain generator shared by all generation tasks
    /// * `position` - The chunk coordinates where the chunk should be generated
    pub fn new(generator: Arc<ChunkGenerator>, position: Point3<i32>) -> Self {
        ChunkGenerationTask {
            generator,
            position,
        }
    }
}

impl Task for ChunkGenerationTask {
    /// Generates the chunk. Nothing is shared with other tasks but the generator.
    fn process(&self) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkGenerationTaskResult {
            position: self.position,
            chunk: self.generator.generate(self.position),
        })
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    /// The coordinate the chunk was generated for
    position: Point3<i32>,
    /// The generated chunk, or why generation failed
    chunk: Result<Chunk, WorldError>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Inserts the generated chunk into the world.
    ///
    /// A coordinate that is already resident keeps its existing chunk.
    fn handle_result(self: Box<Self>, world: &mut World) -> Result<(), WorldError> {
        match self.chunk {
            Ok(chunk) => {
                if !world.add_chunk(self.position, chunk) {
                    warn!("Dropped generated chunk {:?}; the world refused it", self.position);
                }
                Ok(())
            }
            Err(err) => {
                error!("Failed to generate chunk {:?}: {err}", self.position);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use crate::engine_state::voxels::block::MaterialRegistry;
    use crate::engine_state::voxels::world::WorldShape;

    fn generator(terrain: TerrainConfig) -> Arc<ChunkGenerator> {
        Arc::new(ChunkGenerator::new(
            3,
            WorldShape::default(),
            terrain,
            Arc::new(MaterialRegistry::new()),
        ))
    }

    #[test]
    fn handled_results_land_in_the_world() {
        let mut world = World::new(WorldShape::default());
        let task = ChunkGenerationTask::new(generator(TerrainConfig::default()), Point3::new(1, 0, 2));
        task.process().handle_result(&mut world).unwrap();
        assert!(world.contains_chunk(Point3::new(1, 0, 2)));
    }

    #[test]
    fn generation_errors_surface_when_handled() {
        let mut world = World::new(WorldShape::default());
        let terrain = TerrainConfig {
            bedrock_material: "basalt".to_string(),
            ..TerrainConfig::default()
        };
        let task = ChunkGenerationTask::new(generator(terrain), Point3::new(0, 0, 0));
        let result = task.process().handle_result(&mut world);
        assert!(matches!(result, Err(WorldError::UnknownMaterial { .. })));
        assert!(world.is_empty());
    }
}
