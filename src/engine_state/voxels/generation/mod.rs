//! # World Generation
//!
//! The three stages that turn a viewpoint position into a populated neighbourhood:
//!
//! 1. [`ChunkRadiusManager`] diffs the desired chunk box against the resident chunks.
//! 2. [`ChunkGenerator`] fills every newly desired chunk with terrain.
//! 3. [`ChunkPopulator`] scatters entities over each generated chunk.
//!
//! All chunks of a diff are generated and inserted before any of them is populated.

pub mod chunk_generator;
pub mod chunk_populator;
pub mod chunk_radius_manager;

pub use chunk_generator::ChunkGenerator;
pub use chunk_populator::ChunkPopulator;
pub use chunk_radius_manager::{ChunkDiff, ChunkRadiusManager};
