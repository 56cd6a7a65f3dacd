//! # Voxel World
//!
//! This module contains the voxel side of the world core: how terrain is represented,
//! stored and produced.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: Block values, the built-in block types and the material registry
//! * **Chunk**: Fixed-size 3D arrays of blocks with their height map and entity set
//! * **World**: The sparse map of resident chunks and the world's fixed extent
//! * **NoiseField**: The seeded gradient noise terrain and spawns are sampled from
//! * **Generation**: Radius streaming, terrain generation and population
//! * **Tasks**: Chunk generation packaged for the worker pool
//!
//! ## Data Flow
//!
//! 1. The radius manager diffs the chunks desired around the viewpoint against the world
//! 2. Generation tasks build the missing chunks on workers
//! 3. Results are inserted into the world on the driving thread
//! 4. The populator scatters entities over each inserted chunk
//!
//! ## Thread Safety
//!
//! * Generation reads nothing but its own immutable inputs
//! * Chunks are shared as `MtResource<Chunk>`
//! * Only the driving thread adds or removes chunks

pub mod block;
pub mod chunk;
pub mod generation;
pub mod noise_field;
pub mod tasks;
pub mod world;
