#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Rail World
//!
//! The world core of a survival game in which a train runs along a rail line through
//! procedurally generated voxel terrain while zombies close in on its rider.
//!
//! This crate streams chunks of terrain around a moving viewpoint, generates their
//! blocks deterministically from seeded noise, scatters entities over the generated
//! surface and advances those entities every tick.
//!
//! ## Key Modules
//!
//! * `config` - Every tunable, loadable from JSON
//! * `core` - Shared-ownership primitives used throughout the crate
//! * `engine_state` - The tick driver with its voxel, entity and task subsystems
//! * `error` - The error type of the crate
//!
//! ## Architecture
//!
//! Each tick runs on one driving thread:
//! * The radius manager decides which chunks should be resident
//! * Missing chunks are generated on the worker pool and inserted at a barrier
//! * New chunks are populated with the train, zombies and items
//! * Entity behaviors run and entities are re-bucketed into chunks
//!
//! Rendering, input and a real physics engine live outside this crate; a kinematic
//! velocity table stands in for physics so the core runs headless.
//!
//! ## Usage
//!
//! ```rust
//! use rail_world::config::GameConfig;
//! use rail_world::engine_state::EngineState;
//!
//! let mut engine = EngineState::new(GameConfig::default()).unwrap();
//! for _ in 0..10 {
//!     engine.tick(1.0 / 60.0).unwrap();
//! }
//! ```

use std::path::Path;

use log::info;

use config::GameConfig;
use engine_state::EngineState;
use error::WorldError;

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

/// Number of ticks the headless driver simulates.
pub const DRIVER_TICKS: usize = 600;

/// Simulated seconds per driver tick.
pub const DRIVER_DELTA_TIME: f32 = 1.0 / 60.0;

/// Runs the headless driver: loads the configuration, seats the player on the train
/// and rides at full throttle for [`DRIVER_TICKS`] ticks.
///
/// # Arguments
/// * `config_path` - JSON configuration file; the built-in defaults when `None`
///
/// # Errors
/// Configuration and generation errors.
pub fn run(config_path: Option<&Path>) -> Result<(), WorldError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match config_path {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let mut engine = EngineState::new(config)?;

    let ticks_per_second = (1.0 / DRIVER_DELTA_TIME).round() as usize;
    for tick in 0..DRIVER_TICKS {
        if tick == 1 && !engine.mount_viewpoint_on_vehicle() {
            info!("No train to ride; the player stays on foot");
        }
        engine.set_vehicle_throttle(1.0);

        let report = engine.tick(DRIVER_DELTA_TIME)?;
        if tick % ticks_per_second == 0 {
            info!(
                "t={}s player at {:?}: {} chunks resident, {} entities active",
                tick / ticks_per_second,
                engine.viewpoint_position(),
                engine.world().len(),
                report.active_entities
            );
        }
    }

    info!(
        "Ride finished at {:?} with {} entities",
        engine.viewpoint_position(),
        engine.entities().len()
    );
    Ok(())
}
